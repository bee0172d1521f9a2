use crate::context::AppContext;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use tigo_core::rc::OpenRc;

#[derive(Subcommand)]
pub enum ShowSubcommand {
    /// Print the content of .tigorc (or .tigodev)
    Rc,
}

pub fn run(ctx: &AppContext, subcmd: ShowSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ShowSubcommand::Rc => {
            let rc = OpenRc::open(&ctx.work_dir)
                .context("cannot find any configuration file in the project directory")?;
            eprintln!("Here's your {} content:", rc.file_name());
            print_json(&rc.doc)
        }
    }
}
