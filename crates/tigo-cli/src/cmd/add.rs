use crate::context::AppContext;
use crate::output::warn;
use anyhow::Context;
use tigo_core::installer;
use tigo_core::npm::Npm;
use tigo_core::registry::Registry;

pub fn run(ctx: &mut AppContext, name: &str) -> anyhow::Result<()> {
    let server_dir = ctx.server_dir()?;
    ctx.check_env()?;
    let registry = Registry::from_env()?;

    println!("Fetching package information from {}...", registry.base());
    let out = installer::add_plugin(&server_dir, name, &registry, &Npm)
        .with_context(|| format!("cannot add module {name}"))?;

    if out.already_present {
        warn(&format!("module {name} was already registered, its entry was refreshed"));
    }
    if out.converted_js {
        println!("Converted .tigorc.js to {}.", out.config_path.display());
    }
    println!(
        "Module {}@{} has been added to your tigo server, set its config in .tigorc if necessary.",
        out.package, out.version
    );
    Ok(())
}
