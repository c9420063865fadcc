// ABOUTME: CLI for harvesting tender listings with tender-harvest source adapters.
// ABOUTME: Fetches registered sources (or reads a saved page) and prints records as text or JSON.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tender_harvest::render::{outcomes_json, render_text};
use tender_harvest::{
    load_builtin_sources, load_sources_file, Harvester, RelevanceFilter, SourceOutcome,
    SourceRegistry,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Extract tender notices from listing pages.
#[derive(Parser, Debug)]
#[command(name = "tender-harvest")]
#[command(about = "Extract tender and opportunity records from listing pages", long_about = None)]
struct Args {
    /// Source keys to harvest (see --list).
    #[arg()]
    keys: Vec<String>,

    /// Harvest every registered source.
    #[arg(long, conflicts_with = "keys")]
    all: bool,

    /// List registered sources and exit.
    #[arg(long)]
    list: bool,

    /// JSON file with additional source adapters; same keys replace built-in ones.
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Extract a saved listing page instead of fetching (requires exactly one key).
    #[arg(long)]
    html: Option<PathBuf>,

    /// Output JSON instead of the text listing.
    #[arg(long)]
    json: bool,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Keep only records matching the evaluation keywords and Bangladesh.
    #[arg(long)]
    relevant: bool,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// User-Agent header for requests.
    #[arg(long)]
    user_agent: Option<String>,

    /// Verbose logging to stderr (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn load_registry(extra: Option<&PathBuf>) -> Result<SourceRegistry> {
    let mut registry = load_builtin_sources()?;
    if let Some(path) = extra {
        for adapter in load_sources_file(path)? {
            tracing::debug!(source = %adapter.key, "registered from {}", path.display());
            registry.register(adapter);
        }
    }
    Ok(registry)
}

fn print_list(registry: &SourceRegistry) {
    let width = registry.keys().map(str::len).max().unwrap_or(0);
    for adapter in registry.iter() {
        println!(
            "{:<width$}  {}  {}",
            adapter.key,
            adapter.name,
            adapter.base_url,
            width = width
        );
    }
}

fn print_outcomes(outcomes: &[SourceOutcome], json: bool, compact: bool) -> Result<()> {
    if json {
        let value = outcomes_json(outcomes);
        if compact {
            println!("{}", serde_json::to_string(&value)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        return Ok(());
    }

    for outcome in outcomes {
        match &outcome.result {
            Ok(result) => println!("{}", render_text(result)),
            Err(e) => eprintln!("error: {}", e),
        }
    }
    Ok(())
}

async fn execute(args: Args) -> Result<bool> {
    let registry = load_registry(args.sources.as_ref())?;

    if args.list {
        print_list(&registry);
        return Ok(true);
    }

    let mut builder = Harvester::builder()
        .timeout(Duration::from_secs(args.timeout))
        .registry(registry);
    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    let harvester = builder.build()?;

    let mut outcomes = if let Some(html_path) = &args.html {
        if args.all || args.keys.len() != 1 {
            bail!("--html requires exactly one source key");
        }
        let html = fs::read_to_string(html_path)
            .with_context(|| format!("reading {}", html_path.display()))?;
        let key = &args.keys[0];
        vec![SourceOutcome {
            key: key.clone(),
            result: harvester.extract_html(key, &html),
        }]
    } else if args.all {
        harvester.harvest_registered().await
    } else if args.keys.is_empty() {
        bail!("at least one source key is required, or use --all or --list");
    } else {
        harvester.harvest_all(&args.keys).await
    };

    if args.relevant {
        let filter = RelevanceFilter::default();
        for outcome in &mut outcomes {
            if let Ok(result) = &outcome.result {
                outcome.result = Ok(filter.filter(result));
            }
        }
    }

    print_outcomes(&outcomes, args.json, args.compact)?;
    Ok(outcomes.iter().all(|o| o.result.is_ok()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match execute(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
