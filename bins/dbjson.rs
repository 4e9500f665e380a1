use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use common::{env::ensure_parent_dir, utils::logging};
use configs::{AppConfig, LogFormat};
use dotenvy::dotenv;
use serde_json::Value;
use store::{DbJsonOptions, JsonCollection, Selector, TracingLogger};
use tracing::{error, info};

/// Inspect and edit a JSON collection file.
#[derive(Debug, Parser)]
#[command(name = "dbjson", version)]
struct Cli {
    /// Collection file; overrides `store.path` and `DBJSON_PATH`.
    #[arg(long, short = 'f', global = true)]
    file: Option<PathBuf>,
    /// Create an empty collection file if it is missing.
    #[arg(long, global = true)]
    force_create: bool,
    /// Log the resolved absolute path of the collection file.
    #[arg(long, global = true)]
    log_full_path: bool,
    /// Emit structured JSON logs.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the whole collection.
    Get,
    /// Overwrite the collection with a JSON array.
    Set { records: String },
    /// Append one JSON record.
    Add { record: String },
    /// Replace every selected record with a JSON record.
    Replace {
        record: String,
        #[command(flatten)]
        target: Target,
    },
    /// Remove every selected record.
    Delete {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Zero-based position of the record.
    #[arg(long)]
    index: Option<usize>,
    /// Match object records by field, e.g. `id=2` or `name=bob`.
    #[arg(long = "where", value_name = "FIELD=VALUE")]
    field: Option<Selector>,
}

impl Target {
    fn into_selector(self) -> anyhow::Result<Selector> {
        match (self.index, self.field) {
            (Some(i), _) => Ok(Selector::Index(i)),
            (None, Some(selector)) => Ok(selector),
            (None, None) => Err(anyhow!("either --index or --where is required")),
        }
    }
}

fn init_logging(format: LogFormat) {
    match format {
        LogFormat::Json => logging::init_logging_json(),
        LogFormat::Compact => logging::init_logging_default(),
    }
    info!(service = "dbjson", event = "logger_init", "tracing subscriber initialized");
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = configs::load_default()?;
    if let Some(file) = &cli.file {
        cfg.store.path = file.display().to_string();
    }
    cfg.store.force_create |= cli.force_create;
    cfg.store.log_full_path |= cli.log_full_path;
    if cli.json_logs {
        cfg.logging.format = LogFormat::Json;
    }
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

fn parse_record(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("record is not valid JSON: {raw}"))
}

async fn run(command: Command, cfg: AppConfig) -> anyhow::Result<Vec<Value>> {
    let options = DbJsonOptions::default()
        .force_create(cfg.store.force_create)
        .log_full_path(cfg.store.log_full_path);
    let path = PathBuf::from(&cfg.store.path);
    if options.force_create {
        ensure_parent_dir(&path).await?;
    }
    let store = JsonCollection::<Value>::with_logger(&path, options, Arc::new(TracingLogger)).await?;

    let records = match command {
        Command::Get => store.get().await?,
        Command::Set { records } => {
            let records: Vec<Value> =
                serde_json::from_str(&records).context("records must be a JSON array")?;
            store.set(records).await?
        }
        Command::Add { record } => store.add(parse_record(&record)?).await?,
        Command::Replace { record, target } => {
            let selector = target.into_selector()?;
            store.replace(parse_record(&record)?, |e, i| selector.matches(e, i)).await?
        }
        Command::Delete { target } => {
            let selector = target.into_selector()?;
            store.delete(|e, i| selector.matches(e, i)).await?
        }
    };
    Ok(records)
}

fn main() -> ExitCode {
    // .env may carry RUST_LOG, CONFIG_PATH and DBJSON_PATH
    dotenv().ok();
    let cli = Cli::parse();

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_logging(if cli.json_logs { LogFormat::Json } else { LogFormat::Compact });
            error!(service = "dbjson", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(cfg.logging.format);

    std::panic::set_hook(Box::new(|info| {
        error!(service = "dbjson", event = "panic", message = %info, "unhandled panic occurred");
    }));

    // operations are strictly sequential; one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "dbjson", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let path = cfg.store.path.clone();
    match rt.block_on(run(cli.command, cfg)) {
        Ok(records) => match serde_json::to_string_pretty(&records) {
            Ok(out) => {
                println!("{out}");
                info!(service = "dbjson", event = "done", %path, count = records.len(), "command completed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "dbjson", event = "encode_failed", error = %e, "cannot print collection");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!(service = "dbjson", event = "command_failed", %path, error = %format!("{e:#}"), "command failed");
            ExitCode::FAILURE
        }
    }
}
