use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::{cli::ConfigCmd, types::Config};

/// Known keys: `window-days` (default stats window), `unit` (display only).
pub fn config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("ironlog").join("config"))
        .context("Could not determine config directory")
}

pub async fn handle(cmd: ConfigCmd) -> Result<()> {
    let config_path = config_path()?;
    let mut cfg = Config::load(&config_path)?;

    match cmd {
        ConfigCmd::List => {
            if cfg.map.is_empty() {
                println!("{}", "(no config set)".dimmed());
            } else {
                println!("{}", "Config:".cyan().bold());
                for (k, v) in &cfg.map {
                    println!("  {} = {}", k.green(), v);
                }
            }
        }

        ConfigCmd::Get { key } => {
            match cfg.map.get(&key) {
                Some(val) => println!("{}", val),
                None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
            }
        }

        ConfigCmd::Set { key, val } => {
            cfg.map.insert(key.clone(), val.clone());
            cfg.save(&config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(&config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
