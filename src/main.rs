use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use env_logger::Env;
use log::{error, info};

use fpl_improver::config::EngineConfig;
use fpl_improver::error::RequestError;
use fpl_improver::request::{TransferRequest, parse_squad_list, parse_transfer_request};
use fpl_improver::squad::SquadAnalysis;
use fpl_improver::transfers::TransferPlan;
use fpl_improver::{Engine, export, synthetic};

const USAGE: &str = "usage:
  fpl_improver analyze --squad 1,2,3 [options]
  fpl_improver recommend --squad 1,2,3 --budget 1.5 --free-transfers 2 [options]
  fpl_improver recommend --request req.json|- [options]
options: --snapshot PATH  --model PATH  --xlsx PATH  --demo";

const DEMO_PLAYERS: usize = 600;
const DEMO_SEED: u64 = 42;

enum Command {
    Analyze { squad: Vec<u32> },
    Recommend(TransferRequest),
}

struct CliArgs {
    command: Command,
    snapshot: Option<PathBuf>,
    model: Option<PathBuf>,
    xlsx: Option<PathBuf>,
    demo: bool,
}

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err:#}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let engine = match build_engine(&cli) {
        Ok(engine) => engine,
        Err(err) => {
            error!("refusing to serve predictions: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&engine, &cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_engine(cli: &CliArgs) -> Result<Engine> {
    if cli.demo {
        info!("demo mode: {DEMO_PLAYERS} synthetic players, seed {DEMO_SEED}");
        return Engine::from_parts(
            synthetic::synthetic_records(DEMO_PLAYERS, DEMO_SEED),
            synthetic::synthetic_model_artifact(),
        );
    }
    let mut config = EngineConfig::from_env();
    if let Some(path) = cli.snapshot.clone() {
        config.snapshot_path = path;
    }
    if let Some(path) = cli.model.clone() {
        config.model_path = path;
    }
    Engine::load(&config)
}

fn run(engine: &Engine, cli: &CliArgs) -> Result<()> {
    let (analysis, plan, json) = match &cli.command {
        Command::Analyze { squad } => {
            let analysis = engine.analyze_squad(squad);
            let json = serde_json::to_string_pretty(&analysis)?;
            (analysis, TransferPlan::default(), json)
        }
        Command::Recommend(req) => {
            let plan = engine.recommend_transfers(&req.squad, req.budget, req.free_transfers);
            let json = serde_json::to_string_pretty(&plan)?;
            let analysis = if cli.xlsx.is_some() {
                engine.analyze_squad(&req.squad)
            } else {
                SquadAnalysis::default()
            };
            (analysis, plan, json)
        }
    };
    println!("{json}");

    if let Some(path) = cli.xlsx.as_ref() {
        let report = export::export_report(path, &analysis, &plan)?;
        info!(
            "wrote {} ({} squad rows, {} transfers, {} skipped)",
            path.display(),
            report.squad_rows,
            report.transfer_rows,
            report.skipped_rows
        );
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let Some(verb) = args.first() else {
        bail!("missing command");
    };
    let rest = &args[1..];

    let command = match verb.as_str() {
        "analyze" => Command::Analyze {
            squad: parse_squad_list(&required(rest, "squad")?)?,
        },
        "recommend" => {
            let req = match flag_value(rest, "request") {
                Some(source) => {
                    let raw = read_request(&source)?;
                    parse_transfer_request(&raw)?
                }
                None => TransferRequest {
                    squad: parse_squad_list(&required(rest, "squad")?)?,
                    budget: parse_number(rest, "budget")?,
                    free_transfers: parse_number(rest, "free-transfers")?,
                }
                .validate()?,
            };
            Command::Recommend(req)
        }
        other => bail!("unknown command {other:?}"),
    };

    Ok(CliArgs {
        command,
        snapshot: flag_value(rest, "snapshot").map(PathBuf::from),
        model: flag_value(rest, "model").map(PathBuf::from),
        xlsx: flag_value(rest, "xlsx").map(PathBuf::from),
        demo: rest.iter().any(|a| a == "--demo"),
    })
}

fn read_request(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("read request from stdin")?;
        return Ok(raw);
    }
    fs::read_to_string(source).with_context(|| format!("read request {source}"))
}

fn required(args: &[String], name: &'static str) -> Result<String, RequestError> {
    flag_value(args, name).ok_or(RequestError::MissingArgument(name))
}

fn parse_number<T: std::str::FromStr>(
    args: &[String],
    name: &'static str,
) -> Result<T, RequestError> {
    let raw = required(args, name)?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| RequestError::InvalidArgument { name, value: raw })
}

/// Accepts both `--name=value` and `--name value`.
fn flag_value(args: &[String], name: &str) -> Option<String> {
    let long = format!("--{name}");
    let prefixed = format!("--{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefixed) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == long {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    None
}
