use crate::context::AppContext;
use crate::output::{print_table, print_value};
use clap::Subcommand;
use tigo_core::rc::document::{coerce_value, display_value};
use tigo_core::user_config::KNOWN_KEYS;
use tigo_core::TigoError;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Set a CLI config value
    Set {
        /// Key, e.g. server_default_start_type
        key: String,
        /// Value; numbers and true/false are stored typed
        value: String,
    },

    /// Print a CLI config value
    Get {
        /// Key
        key: String,
    },

    /// List all CLI config values
    List,
}

pub fn run(ctx: &mut AppContext, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Set { key, value } => set(ctx, &key, &value),
        ConfigSubcommand::Get { key } => get(ctx, &key),
        ConfigSubcommand::List => list(ctx),
    }
}

fn set(ctx: &mut AppContext, key: &str, value: &str) -> anyhow::Result<()> {
    if key.trim().is_empty() {
        return Err(TigoError::InvalidKey(key.to_string()).into());
    }
    if !KNOWN_KEYS.contains(&key) {
        tracing::warn!("'{key}' is not a key tigo reads, storing it anyway");
    }
    ctx.config.set(key, coerce_value(value))?;
    println!("Configuration saved.");
    Ok(())
}

fn get(ctx: &AppContext, key: &str) -> anyhow::Result<()> {
    let value = ctx
        .config
        .get(key)
        .ok_or_else(|| TigoError::KeyNotFound(key.to_string()))?;
    print_value(value);
    Ok(())
}

fn list(ctx: &AppContext) -> anyhow::Result<()> {
    if ctx.config.is_empty() {
        println!("No configuration yet.");
        return Ok(());
    }
    let rows = ctx
        .config
        .entries()
        .map(|(k, v)| vec![k.clone(), display_value(v)])
        .collect();
    print_table(&["KEY", "VALUE"], rows);
    Ok(())
}
