//! Rookery CLI
//!
//! Pipes triples between JSON and the declare-once line format:
//! - `rookery encode` — JSON triples on stdin → line format on stdout
//! - `rookery decode` — line format on stdin → JSON triples on stdout
//! - `rookery search <filter>` — line format on stdin, JSON query filter,
//!   matching triples re-encoded on stdout

use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rookery_store::{Decoder, Encoder, Triple, TripleStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rookery")]
#[command(author, version, about = "Rookery: indexed triple store tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// JSON array of `[source, relation, target]` triples → line format.
    Encode,
    /// Line format → JSON array of triples.
    Decode,
    /// Filter line-format triples with a JSON query, re-encoding matches.
    ///
    /// The filter takes the same shape as `TripleStore::search`: a
    /// `{source, relation, target}` object or a positional 3-element array.
    Search {
        /// JSON query filter
        filter: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Encode => encode(),
        Commands::Decode => decode(),
        Commands::Search { filter } => search(&filter),
    }
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("reading stdin")?;
    Ok(input)
}

fn encode() -> Result<()> {
    let input = read_stdin()?;
    let triples: Vec<Triple> =
        serde_json::from_str(&input).context("stdin is not a JSON array of triples")?;
    tracing::debug!(count = triples.len(), "encoding triples");
    if !triples.is_empty() {
        println!("{}", Encoder::new().encode_all(&triples));
    }
    Ok(())
}

fn decode() -> Result<()> {
    let input = read_stdin()?;
    let triples = Decoder::new()
        .decode_all(&input)
        .context("decoding line format")?;
    println!("{}", serde_json::to_string_pretty(&triples)?);
    Ok(())
}

fn search(filter: &str) -> Result<()> {
    let input = read_stdin()?;
    let triples = Decoder::new()
        .decode_all(&input)
        .context("decoding line format")?;
    let store = TripleStore::new(&triples);
    let matched = store.search_json(filter).context("running query filter")?;
    let matched = matched.triples();
    tracing::debug!(matched = matched.len(), total = store.len(), "search complete");
    if !matched.is_empty() {
        println!("{}", Encoder::new().encode_all(&matched));
    }
    Ok(())
}
