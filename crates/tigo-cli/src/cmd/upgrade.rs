use crate::context::AppContext;
use anyhow::Context;
use tigo_core::installer::{self, UpgradeOutcome};
use tigo_core::npm::Npm;
use tigo_core::registry::Registry;

pub fn run(ctx: &mut AppContext, name: &str) -> anyhow::Result<()> {
    let server_dir = ctx.server_dir()?;
    ctx.check_env()?;
    let registry = Registry::from_env()?;

    let out = installer::upgrade_plugin(&server_dir, name, &registry, &Npm)
        .with_context(|| format!("cannot upgrade module {name}"))?;
    match out {
        UpgradeOutcome::UpToDate { package, version } => {
            println!("Module {package} on the server is the latest version ({version}).");
        }
        UpgradeOutcome::Upgraded { package, from, to } => match from {
            Some(from) => println!("Module {package} has been upgraded from {from} to {to}."),
            None => println!("Module {package} has been upgraded to {to}."),
        },
    }
    Ok(())
}
