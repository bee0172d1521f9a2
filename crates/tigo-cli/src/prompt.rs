use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use std::io::IsTerminal;

/// Ask a yes/no question. `--yes` answers yes; without a terminal the
/// default answer is taken.
pub fn confirm(message: &str, default: bool, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        tracing::debug!("no terminal, answering '{message}' with {default}");
        return Ok(default);
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(default)
        .interact()?)
}
