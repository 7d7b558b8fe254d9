//! Clashforge - converts a vless descriptor list into a Clash configuration.
//!
//! Reads one descriptor per line, drops what cannot be parsed or validated,
//! and writes a document with proxies, selection groups and rules. If no
//! endpoint survives, nothing is written and the process exits non-zero.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use clashforge_app::{
    init_logging, load_config, read_lines, write_document, LogOptions, OutputFormat,
};
use clashforge_core::{ConversionStats, ConvertError, Converter, SidPolicy};

/// Convert vless descriptors into a Clash configuration
#[derive(Parser, Debug)]
#[command(name = "clashforge", version, about)]
struct Args {
    /// Input file with one descriptor per line
    #[arg(default_value = "vless_lite.txt")]
    input: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "clash_config.yaml")]
    output: PathBuf,

    /// Output format (defaults to the output file extension, then YAML)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Handling of non-hex reality short ids (reject, sanitize)
    #[arg(long)]
    sid_policy: Option<SidPolicy>,

    /// Number of endpoints listed directly in the PROXY menu
    #[arg(long)]
    menu_cap: Option<usize>,

    /// Number of endpoints substituted into an empty group (at least 1)
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    fallback_cap: Option<usize>,

    /// Print conversion statistics as JSON to stdout
    #[arg(long)]
    stats: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write rolling log files to this directory
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&LogOptions {
        debug: args.debug,
        level: args.log_level.clone(),
        log_dir: args.log_file.clone(),
    });

    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("Failed to load config {:?}", args.config))?;
    if let Some(policy) = args.sid_policy {
        config = config.with_sid_policy(policy);
    }
    if let Some(cap) = args.menu_cap {
        config = config.with_menu_cap(cap);
    }
    if let Some(cap) = args.fallback_cap {
        config = config.with_fallback_cap(cap);
    }
    tracing::debug!("Short id policy: {}", config.sid_policy);

    tracing::info!("Reading {}", args.input.display());
    let lines = read_lines(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let conversion = match Converter::new(config).convert(&lines) {
        Ok(conversion) => conversion,
        Err(ConvertError::NoValidEndpoints(stats)) => {
            if args.stats {
                print_stats(&stats)?;
            }
            bail!("No valid endpoints found in {}", args.input.display());
        }
        Err(e) => return Err(e.into()),
    };

    let format = args
        .format
        .or_else(|| OutputFormat::from_path(&args.output))
        .unwrap_or_default();
    write_document(&conversion.document, &args.output, format)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    tracing::info!(
        "Wrote {} proxies and {} groups to {}",
        conversion.document.proxies.len(),
        conversion.document.proxy_groups.len(),
        args.output.display()
    );

    if args.stats {
        print_stats(&conversion.stats)?;
    }

    Ok(())
}

fn print_stats(stats: &ConversionStats) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_cap_must_be_positive() {
        assert!(Args::try_parse_from(["clashforge", "--fallback-cap", "0"]).is_err());
        let args = Args::try_parse_from(["clashforge", "--fallback-cap", "3"]).unwrap();
        assert_eq!(args.fallback_cap, Some(3));
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["clashforge"]).unwrap();
        assert_eq!(args.input, PathBuf::from("vless_lite.txt"));
        assert_eq!(args.output, PathBuf::from("clash_config.yaml"));
        assert_eq!(args.sid_policy, None);
    }
}
