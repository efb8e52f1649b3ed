mod cli;

use streamforged::{config, output};
use streamforged_container::{
    container_from_extension, detect_container, ContainerReader, ContainerStream, Record,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "streamforged=trace,streamforged_container=trace".to_string()
        } else {
            "streamforged=debug,streamforged_container=debug".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Probe { file, json } => probe_file(&file, json, config_path),
        Commands::Records { file, limit } => list_records(&file, limit, config_path),
        Commands::Tracks { file, json } => list_tracks(&file, json, config_path),
        Commands::Detect { files } => detect_files(&files),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

fn open(file: &Path, config: &config::Config) -> Result<ContainerReader<BufReader<File>>> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    ContainerReader::open(file, config.reader.options())
        .with_context(|| format!("Failed to open container: {:?}", file))
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut reader = open(file, &config)?;

    tracing::info!("Probing {:?}", file);
    let media_info = reader
        .summarize(file.display().to_string())
        .with_context(|| format!("Failed to probe {:?}", file))?;

    if json || config.output.json {
        println!("{}", serde_json::to_string_pretty(&media_info)?);
    } else {
        print!("{}", output::render_summary(&media_info));
    }

    Ok(())
}

fn list_records(file: &Path, limit: Option<usize>, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut reader = open(file, &config)?;
    let limit = limit.or(config.output.record_limit).unwrap_or(usize::MAX);

    let mut records: Vec<Record> = Vec::new();
    let mut failure = None;
    for record in reader.records().take(limit) {
        match record {
            Ok(record) => records.push(record),
            Err(e) => failure = Some(e),
        }
    }

    let depths = output::record_depths(&records, |r| reader.descends_into(r));
    println!("{:>10}  {:>3}  {:>10}  {}", "offset", "hdr", "payload", "record");
    for (record, depth) in records.iter().zip(depths) {
        let name = reader.describe(record)?;
        println!("{}", output::render_record(record, &name, depth));
    }

    if let Some(e) = failure {
        return Err(e).with_context(|| {
            format!("Stopped after {} records in {:?}", records.len(), file)
        });
    }

    Ok(())
}

fn list_tracks(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut reader = open(file, &config)?;
    let tracks = reader
        .tracks()
        .with_context(|| format!("Failed to read tracks of {:?}", file))?;

    if json || config.output.json {
        println!("{}", serde_json::to_string_pretty(tracks)?);
    } else {
        println!("Tracks: {}", tracks.len());
        for track in tracks {
            println!("  {}", output::render_track(track));
        }
    }

    Ok(())
}

fn detect_files(files: &[PathBuf]) -> Result<()> {
    for file in files {
        if !file.exists() {
            anyhow::bail!("File does not exist: {:?}", file);
        }

        let detected = match detect_container(file) {
            Ok(container) => Some(container),
            Err(e) => {
                tracing::debug!("Magic detection failed for {:?}: {}", file, e);
                container_from_extension(file)
            }
        };

        match detected {
            Some(container) => println!("{}: {}", file.display(), container),
            None => println!("{}: unknown", file.display()),
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Max payload size: {} bytes", config.reader.max_payload_size);
            println!("  JSON output: {}", config.output.json);
            match config.output.record_limit {
                Some(limit) => println!("  Record limit: {}", limit),
                None => println!("  Record limit: none"),
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Max payload size: {} bytes", config.reader.max_payload_size);
        }
    }

    Ok(())
}
