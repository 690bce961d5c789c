use std::path::PathBuf;

use anyhow::{Context, Result};
use env_logger::Env;
use log::info;

use fpl_improver::{catalog_store, config, fpl_fetch};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let db_path = parse_path_arg("db")
        .or_else(config::default_snapshot_path)
        .context("unable to resolve sqlite path")?;

    let snapshot = fpl_fetch::fetch_snapshot()?;
    info!("fetched {} player records", snapshot.records.len());

    let mut conn = catalog_store::open_db(&db_path)?;
    let summary = catalog_store::store_snapshot(&mut conn, &snapshot.records)?;

    println!("FPL snapshot ingest complete");
    println!("DB: {}", db_path.display());
    println!("Run: {}", summary.run_id);
    println!("Players upserted: {}", summary.players_upserted);
    println!("Players removed: {}", summary.players_removed);

    if let Some(json_path) = parse_path_arg("json") {
        catalog_store::write_json_snapshot(&json_path, &snapshot.records)?;
        println!("JSON: {}", json_path.display());
    }

    if !snapshot.team_mismatches.is_empty() {
        println!("Team table mismatches: {}", snapshot.team_mismatches.len());
        for line in snapshot.team_mismatches.iter().take(8) {
            println!(" - {line}");
        }
    }

    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let long = format!("--{name}");
    let prefixed = format!("--{name}=");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefixed) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if *arg == long {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
