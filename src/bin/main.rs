use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use user_records::csv_records::{
    read_records, read_records_csv, sort_by_last, write_records_csv, write_records_to_path,
};
use user_records::{copy_users_with, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "user-records", version, about = "Decode, copy and sort user record files")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the decoder channel capacity
    #[arg(long, global = true)]
    capacity: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a `name:id` file and optionally copy the valid records
    Decode {
        input: PathBuf,

        /// Write every decoded record to this file (created or truncated)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Sort a two-column CSV file by its second column
    SortCsv {
        input: PathBuf,
        output: PathBuf,

        /// The first line is a header
        #[arg(long)]
        header: bool,

        /// Parse and write with the RFC 4180 reader/writer
        #[arg(long)]
        rfc4180: bool,
    },
}

/// Read from the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "user-records.toml";

fn load_config(explicit: Option<&Path>, capacity: Option<usize>, fallback: &Path) -> Result<PipelineConfig> {
    let path = match explicit {
        Some(path) => Some(path),
        None if fallback.is_file() => Some(fallback),
        None => None,
    };

    let mut config = match path {
        Some(path) => {
            info!(config = %path.display(), "loading config");
            PipelineConfig::from_path(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    if let Some(capacity) = capacity {
        config.channel_capacity = capacity;
    }
    config.validate().context("Config validation failed")?;
    Ok(config)
}

async fn decode(
    config: &PipelineConfig,
    token: CancellationToken,
    input: &Path,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let source = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("Failed to open {}", input.display()))?;

    let mut sink: Box<dyn AsyncWrite + Unpin + Send> = match output {
        Some(path) => Box::new(tokio::io::BufWriter::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(tokio::io::sink()),
    };

    info!(input = %input.display(), "decoding users");
    let mut count = 0usize;
    let result = copy_users_with(config, &token, source, &mut sink, |user| {
        count += 1;
        if json {
            match serde_json::to_string(user) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(%err, "failed to serialize user"),
            }
        } else {
            println!("{} {}", "✓".green(), user);
        }
    })
    .await;

    match result {
        Ok(summary) => {
            println!("{}", format!("Decoded {} user(s)", summary.decoded).bold());
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {}", "Decoding stopped:".red().bold(), err);
            bail!("decoding stopped after {count} record(s): {err}");
        }
    }
}

fn sort_csv(config: &PipelineConfig, input: &Path, output: &Path, header: bool, rfc4180: bool) -> Result<()> {
    let has_header = header || config.csv.has_header;
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;

    let mut records = if rfc4180 || config.csv.rfc4180 {
        read_records_csv(file, has_header)?
    } else {
        read_records(BufReader::new(file), has_header)?
    };

    println!("{}", "CSV records (last, first):".bold());
    for record in &records {
        println!("  {}, {}", record.last(), record.first());
    }

    if rfc4180 || config.csv.rfc4180 {
        sort_by_last(&mut records);
        let out = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
        write_records_csv(BufWriter::new(out), &records)?;
    } else {
        write_records_to_path(output, &mut records)
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }

    println!(
        "{}",
        format!("Wrote {} record(s) to {}", records.len(), output.display()).green()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.capacity, Path::new(DEFAULT_CONFIG_FILE))?;

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    match &cli.command {
        Command::Decode { input, output, json } => {
            decode(&config, token, input, output.as_deref(), *json).await
        }
        Command::SortCsv {
            input,
            output,
            header,
            rfc4180,
        } => sort_csv(&config, input, output, *header, *rfc4180),
    }
}
