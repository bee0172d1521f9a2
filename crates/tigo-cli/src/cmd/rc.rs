use crate::context::AppContext;
use crate::output::print_value;
use anyhow::Context;
use clap::Subcommand;
use tigo_core::rc::{document, OpenRc};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum RcSubcommand {
    /// Set an item in .tigorc (or .tigodev), e.g. `server.port 8080`
    Set {
        /// Dotted key path
        key: String,
        /// Value; numbers and true/false are stored typed
        value: String,
    },

    /// Print an item from .tigorc (or .tigodev)
    Get {
        /// Dotted key path
        key: String,
    },

    /// Remove an item from .tigorc (or .tigodev)
    Remove {
        /// Dotted key path
        key: String,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &AppContext, subcmd: RcSubcommand) -> anyhow::Result<()> {
    match subcmd {
        RcSubcommand::Set { key, value } => set(ctx, &key, &value),
        RcSubcommand::Get { key } => get(ctx, &key),
        RcSubcommand::Remove { key } => remove(ctx, &key),
    }
}

fn open(ctx: &AppContext) -> anyhow::Result<OpenRc> {
    OpenRc::open(&ctx.work_dir).context("cannot get contents from .tigorc or .tigodev")
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn set(ctx: &AppContext, key: &str, value: &str) -> anyhow::Result<()> {
    let mut rc = open(ctx)?;
    document::set(&mut rc.doc, key, value)?;
    let path = rc.save()?;
    tracing::debug!(path = %path.display(), "runtime config written");
    println!("Option {key} has been set.");
    Ok(())
}

// ---------------------------------------------------------------------------
// get
// ---------------------------------------------------------------------------

fn get(ctx: &AppContext, key: &str) -> anyhow::Result<()> {
    let rc = open(ctx)?;
    print_value(document::get(&rc.doc, key)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// remove
// ---------------------------------------------------------------------------

fn remove(ctx: &AppContext, key: &str) -> anyhow::Result<()> {
    let mut rc = open(ctx)?;
    let current = document::get(&rc.doc, key)?;
    println!(
        "The configuration item is:\n{key} = {}",
        document::display_value(current)
    );
    if !ctx.confirm("Sure to delete it?", false)? {
        println!("Nothing removed.");
        return Ok(());
    }
    document::remove(&mut rc.doc, key)?;
    rc.save()?;
    println!("Option {key} has been removed from {}.", rc.file_name());
    Ok(())
}
