use crate::context::AppContext;
use crate::output::warn;
use anyhow::Context;
use tigo_core::installer;
use tigo_core::npm::Npm;

pub fn run(ctx: &mut AppContext, name: &str) -> anyhow::Result<()> {
    let server_dir = ctx.server_dir()?;
    ctx.check_env()?;

    let out = installer::remove_plugin(&server_dir, name, &Npm)
        .with_context(|| format!("cannot remove module {name}"))?;

    match &out.removed_entry {
        Some(key) => println!("Runtime config has been updated, plugins.{key} removed."),
        None => warn(&format!("no plugin entry used {}", out.package)),
    }
    println!("Module {} has been removed successfully.", out.package);
    Ok(())
}
