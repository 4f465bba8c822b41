//! # CLI - BasaltKV store tool
//!
//! A small command-line front end for building and inspecting store
//! files. Designed for scripted use: feed it a tab-separated file, get a
//! single self-contained store out, query it back.
//!
//! ## Commands
//!
//! ```text
//! build <input.tsv> <store>   Build a store from tab-separated key/value lines
//! get <store> <key>           Look up a key (prints value or "(nil)")
//! info <store>                Print header and directory statistics
//! ```
//!
//! ## Configuration
//!
//! Build settings are controlled via environment variables:
//!
//! ```text
//! BASALT_LOAD_FACTOR   Hash table fill ratio        (default: 0.75)
//! BASALT_SEGMENT_SIZE  Mmap segment size in bytes   (default: 1 GiB)
//! BASALT_BLOOM         Embed a bloom filter         (default: "false")
//! BASALT_BLOOM_ERROR   Bloom false-positive target  (default: 0.01)
//! ```
//!
//! ## Example
//!
//! ```text
//! $ printf 'alice\t42\nbob\t7\n' > users.tsv
//! $ basalt build users.tsv users.store
//! built users.store (2 keys, 2 values)
//! $ basalt get users.store alice
//! 42
//! $ basalt get users.store carol
//! (nil)
//! ```

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use store::{ConfigBuilder, Configuration, StoreReader, StoreWriter};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Assembles the build configuration from `BASALT_*` environment variables.
fn config_from_env() -> Result<Configuration> {
    let load_factor: f64 = env_or("BASALT_LOAD_FACTOR", "0.75")
        .parse()
        .context("BASALT_LOAD_FACTOR must be a float")?;
    let segment_size: u64 = env_or(
        "BASALT_SEGMENT_SIZE",
        &Configuration::DEFAULT_MMAP_SEGMENT_SIZE.to_string(),
    )
    .parse()
    .context("BASALT_SEGMENT_SIZE must be an integer")?;
    let bloom: bool = env_or("BASALT_BLOOM", "false")
        .parse()
        .context("BASALT_BLOOM must be true or false")?;
    let bloom_error: f64 = env_or("BASALT_BLOOM_ERROR", "0.01")
        .parse()
        .context("BASALT_BLOOM_ERROR must be a float")?;

    Ok(ConfigBuilder::new()
        .with_load_factor(load_factor)
        .with_segment_size(segment_size)
        .with_bloom_filter(bloom)
        .with_bloom_error_factor(bloom_error)
        .build())
}

fn cmd_build(input: &str, output: &str) -> Result<()> {
    let config = config_from_env()?;
    let sink = File::create(output)
        .with_context(|| format!("cannot create output file {}", output))?;
    let mut writer = StoreWriter::new(config, sink)?;

    let reader = BufReader::new(
        File::open(input).with_context(|| format!("cannot open input file {}", input))?,
    );
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('\t') else {
            bail!("line {}: expected <key>\\t<value>", line_no + 1);
        };
        writer.put(key.as_bytes(), value.as_bytes())?;
    }

    let keys = writer.key_count();
    let values = writer.value_count();
    writer.close()?;
    println!("built {} ({} keys, {} values)", output, keys, values);
    Ok(())
}

fn cmd_get(path: &str, key: &str) -> Result<()> {
    let reader = StoreReader::open(path)?;
    match reader.get(key.as_bytes())? {
        Some(value) => println!("{}", String::from_utf8_lossy(value)),
        None => println!("(nil)"),
    }
    Ok(())
}

fn cmd_info(path: &str) -> Result<()> {
    let reader = StoreReader::open(path)?;
    println!("version:      {}", store::FORMAT_VERSION);
    println!("keys:         {}", reader.key_count());
    println!("built at:     {} ms since epoch", reader.build_time_ms());
    println!("file size:    {} bytes", reader.file_size());
    match reader.bloom_filter() {
        Some(filter) => println!(
            "bloom:        {} bits, {} hash functions",
            filter.bit_size(),
            filter.hash_functions()
        ),
        None => println!("bloom:        disabled"),
    }
    println!("key lengths:");
    for entry in reader.directory() {
        println!(
            "  L={:<4} keys={:<10} slots={:<10} slot_size={}",
            entry.key_length, entry.key_count, entry.num_slots, entry.slot_size
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("build") if args.len() == 4 => cmd_build(&args[2], &args[3]),
        Some("get") if args.len() == 4 => cmd_get(&args[2], &args[3]),
        Some("info") if args.len() == 3 => cmd_info(&args[2]),
        _ => {
            eprintln!("usage: basalt build <input.tsv> <store>");
            eprintln!("       basalt get <store> <key>");
            eprintln!("       basalt info <store>");
            std::process::exit(2);
        }
    }
}
