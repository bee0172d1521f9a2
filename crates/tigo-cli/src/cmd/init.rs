use crate::context::AppContext;
use crate::output::warn;
use anyhow::Context;
use tigo_core::io;
use tigo_core::npm::Npm;
use tigo_core::registry::Registry;
use tigo_core::scaffold::{self, Template};

pub fn run(ctx: &mut AppContext, template: &str) -> anyhow::Result<()> {
    let template: Template = template.parse()?;

    if !io::is_empty_dir(&ctx.work_dir)?
        && !ctx.confirm(
            "Current folder is not empty, continue initializing?",
            false,
        )?
    {
        println!("Initialization cancelled.");
        return Ok(());
    }
    ctx.check_env()?;

    match template {
        Template::Server => {
            let registry = Registry::from_env()?;
            println!("Fetching the tigo server package...");
            let out = scaffold::init_server(&ctx.work_dir, &ctx.temp_dir(), &registry, &Npm)
                .context("cannot initialize the tigo server")?;
            if let Some(err) = &out.install_error {
                warn(&format!(
                    "cannot install the dependencies of tigo server, run `npm install` manually: {err}"
                ));
            }
            println!(
                "tigo server {} is ready in {} ({} files).",
                out.package.version,
                ctx.work_dir.display(),
                out.files
            );
        }
    }
    Ok(())
}
