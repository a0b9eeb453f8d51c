use std::path::PathBuf;

use crate::config::{self, ConfigError};
use crate::core_service::{ServiceError, TabFinderService};
use crate::logging;
use crate::search::CandidateOrigin;
use crate::transport::JsonLinesDispatcher;

pub const USAGE: &str = "usage: tabfinder-core [--config PATH] <command>

commands:
  rank [QUERY...]     print ranked candidates for QUERY (empty lists all)
  windows             print persisted window snapshots
  switch ID           send switchtabto for an open tab
  close ID            send closetab for an open tab
  transparent 0|1     send changetoolbaricontransparency
  help                show this message";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("logging error: {0}")]
    Logging(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Rank { query: String },
    Windows,
    Switch { id: i64 },
    Close { id: i64 },
    Transparent { transparent: bool },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub config_path: Option<PathBuf>,
    pub command: CliCommand,
}

pub fn parse_cli_args(args: &[String]) -> Result<CliOptions, String> {
    let mut config_path = None;
    let mut rest: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "-h" | "--help" => rest.push("help"),
            other => rest.push(other),
        }
    }

    let command = match rest.split_first() {
        None => CliCommand::Help,
        Some((&"help", _)) => CliCommand::Help,
        Some((&"rank", words)) => CliCommand::Rank {
            query: words.join(" "),
        },
        Some((&"windows", [])) => CliCommand::Windows,
        Some((&"switch", [id])) => CliCommand::Switch { id: parse_id(id)? },
        Some((&"close", [id])) => CliCommand::Close { id: parse_id(id)? },
        Some((&"transparent", [flag])) => CliCommand::Transparent {
            transparent: match *flag {
                "1" => true,
                "0" => false,
                other => return Err(format!("transparent expects 0 or 1, got '{other}'")),
            },
        },
        Some((command, _)) => return Err(format!("unknown or malformed command '{command}'\n{USAGE}")),
    };

    Ok(CliOptions {
        config_path,
        command,
    })
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .map_err(|_| format!("tab id must be an integer, got '{raw}'"))
}

pub fn run_with_options(options: CliOptions) -> Result<(), RuntimeError> {
    if options.command == CliCommand::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = config::load(options.config_path.as_deref())?;
    let data_dir = config
        .config_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(config::stable_app_data_dir);
    logging::init(&data_dir, &config.log_level)?;
    tracing::info!(
        config_path = %config.config_path.display(),
        sort_mode = ?config.sort_mode,
        "starting"
    );

    let dispatcher = Box::new(JsonLinesDispatcher::new(std::io::stdout()));
    let mut service = TabFinderService::open(config, dispatcher)?;
    let open_tabs = service.load_latest_window();
    tracing::info!(open_tabs, "loaded latest window");

    match options.command {
        CliCommand::Rank { query } => {
            service.refresh_closed_tabs()?;
            for candidate in service.set_query(&query) {
                let marker = match candidate.origin {
                    CandidateOrigin::Open => "open",
                    CandidateOrigin::Closed { .. } => "closed",
                };
                println!(
                    "[{:>3}] {:>5} {:<6} {} ({})",
                    candidate.render_index(),
                    candidate.score,
                    marker,
                    candidate.record.display_title(),
                    candidate.record.host,
                );
            }
        }
        CliCommand::Windows => {
            for snapshot in service.windows().load().iter() {
                println!("{} tabs  {}", snapshot.tabs.len(), snapshot.combined_id);
            }
        }
        CliCommand::Switch { id } => {
            if !service.activate_tab(id) {
                eprintln!("[tabfinder-core] tab {id} was not switched to");
            }
        }
        CliCommand::Close { id } => {
            if !service.close_tab(id)? {
                eprintln!("[tabfinder-core] tab {id} was not closed");
            }
        }
        CliCommand::Transparent { transparent } => {
            service.set_toolbar_transparent(transparent);
        }
        CliCommand::Help => {}
    }

    Ok(())
}
