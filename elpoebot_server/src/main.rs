// CLI entry point for ELPOEBOT.
//
// Usage:
//   elpoebot serve [--config FILE] [--host H] [--port P] [--data-dir DIR]
//                  [--interval SECS] [--seed N]
//   elpoebot generate --corpus FILE [--seed N] [--config FILE] [--json]
//   elpoebot add-verse [--addr A] VERSE
//   elpoebot corpus [--addr A]
//   elpoebot book [--addr A]
//   elpoebot publish [--addr A]
//   elpoebot combine [--addr A] [--json] VERSE
//
// `serve` runs the poem server in the foreground until the process is
// killed. `generate` works offline on a corpus file, and `combine` works
// offline unless given `--addr`. The remaining commands talk to a running
// server. Log verbosity follows `RUST_LOG` (default
// `elpoebot=info`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use elpoebot_core::{Combination, GeneratorConfig, Poem, PoemRng, combine, generate_poem};
use elpoebot_prng::seed_from_clock;
use elpoebot_server::{Library, ListenConfig, PoetClient, ServerConfig, start_server};
use elpoebot_store::corpus::parse_corpus;
use elpoebot_store::open_data_dir;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "elpoebot", version, about = "Rhyming poems from a shared verse corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the poem server
    Serve {
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Directory holding corpus.txt and book.json
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Seconds between scheduled poems (0 disables)
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate one poem from a corpus file, without a server
    Generate {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        /// JSON file with generator settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the poem as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a verse to a running server's corpus
    AddVerse {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
        verse: String,
    },
    /// Print a running server's corpus
    Corpus {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
    },
    /// Print a running server's book as JSON
    Book {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
    },
    /// Ask a running server to generate and publish a poem now
    Publish {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
    },
    /// Print every combination of one verse
    Combine {
        /// Ask this server instead of combining locally
        #[arg(long)]
        addr: Option<String>,
        /// Print the combinations as JSON
        #[arg(long)]
        json: bool,
        verse: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("elpoebot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve {
            config,
            host,
            port,
            data_dir,
            interval,
            seed,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::load(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(secs) = interval {
                config.publish_interval_secs = secs;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            serve(config)
        }
        Command::Generate {
            corpus,
            seed,
            config,
            json,
        } => generate(&corpus, seed, config, json),
        Command::AddVerse { addr, verse } => {
            let mut client = PoetClient::connect(&addr)?;
            let lines = client.add_verse(&verse)?;
            println!("corpus now holds {} verses", lines.len());
            client.disconnect();
            Ok(())
        }
        Command::Corpus { addr } => {
            let mut client = PoetClient::connect(&addr)?;
            for line in client.corpus()? {
                println!("{line}");
            }
            client.disconnect();
            Ok(())
        }
        Command::Book { addr } => {
            let mut client = PoetClient::connect(&addr)?;
            let entries = client.book()?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            client.disconnect();
            Ok(())
        }
        Command::Publish { addr } => {
            let mut client = PoetClient::connect(&addr)?;
            let (poem, entry) = client.generate(true)?;
            if let Some(entry) = entry {
                println!("[{}] {}", entry.date, poem.kind());
            }
            println!("{poem}");
            client.disconnect();
            Ok(())
        }
        Command::Combine { addr, json, verse } => {
            let combinations = match addr {
                Some(addr) => {
                    let mut client = PoetClient::connect(&addr)?;
                    let combinations = client.combine(&verse)?;
                    client.disconnect();
                    combinations
                }
                None => {
                    anyhow::ensure!(!verse.trim().is_empty(), "verse is empty");
                    combine(verse.trim())
                }
            };
            print_combinations(&combinations, json)
        }
    }
}

fn print_combinations(combinations: &[Combination], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(combinations)?);
        return Ok(());
    }
    for (i, combination) in combinations.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ({})", combination.kind, combination.kind.description());
        println!("{}", combination.result);
    }
    Ok(())
}

fn serve(config: ServerConfig) -> Result<()> {
    let (corpus, book) = open_data_dir(&config.data_dir)
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
    let seed = config.seed.unwrap_or_else(seed_from_clock);
    info!(seed, data_dir = %config.data_dir.display(), "starting poem server");

    let library = Library::new(
        Box::new(corpus),
        Box::new(book),
        config.generator.clone(),
        PoemRng::new(seed),
    );
    let listen = ListenConfig {
        host: config.host.clone(),
        port: config.port,
        publish_interval: config.publish_interval(),
    };
    let (handle, addr) = start_server(listen, library)
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    println!("ELPOEBOT listening on {addr}");
    handle.wait();
    Ok(())
}

fn generate(
    corpus_path: &Path,
    seed: Option<u64>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let generator = match config {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            GeneratorConfig::from_json(&text)?
        }
        None => GeneratorConfig::default(),
    };
    let text = std::fs::read_to_string(corpus_path)
        .with_context(|| format!("reading {}", corpus_path.display()))?;
    let corpus = parse_corpus(&text);

    let mut rng = PoemRng::new(seed.unwrap_or_else(seed_from_clock));
    let poem: Poem = generate_poem(&corpus, &generator, &mut rng)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&poem)?);
    } else {
        println!("{poem}");
    }
    Ok(())
}
