use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use db::open;
use types::OutputFmt;

mod cli;
mod commands;
mod db;
mod models;
mod stats;
mod storage;
mod types;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let fmt = if cli.json { OutputFmt::Json } else { OutputFmt::Text };

    let db_path = "./ironlog.db";
    assert!(!db_path.is_empty(), "database path must not be empty");

    let pool = open(db_path).await?;
    db::init(&pool).await?;

    match cli.cmd {
        Commands::Workout(cmd) => commands::workout::handle(cmd, &pool, fmt).await?,
        Commands::Exercise(cmd) => commands::exercise::handle(cmd, &pool, fmt).await?,
        Commands::Gtg(cmd) => commands::gtg::handle(cmd, &pool).await?,
        Commands::Stats { days, graph } => commands::stats::handle(days, graph, &pool, fmt).await?,
        Commands::Calendar { year, month } => commands::calendar::handle(&pool, year, month).await?,
        Commands::Db(cmd) => commands::db::handle(cmd, &pool).await?,
        Commands::Config(cmd) => commands::config::handle(cmd).await?,
    }

    Ok(())
}
