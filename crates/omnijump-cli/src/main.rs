use anyhow::Result;
use clap::{Parser, Subcommand};
use omnijump_core::{CandidateSource, Error};
use omnijump_local::{
    chrome, pinned_entries, resolve_query, ChromeHistorySource, Dispatcher, RankerConfig,
    SnapshotSource, SuggestionRanker,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "omnijump")]
#[command(about = "Launcher suggestions from browsing history and top sites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank suggestions for a query (json).
    Suggest(SuggestCmd),
    /// Resolve a raw query to the URL it would open (json).
    Resolve(ResolveCmd),
    /// Serve overlay requests as JSON lines over stdin/stdout.
    Serve(ServeCmd),
    /// Show effective configuration and source availability (json).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// JSON snapshot with `history` and `topSites` arrays.
    ///
    /// Takes precedence over `--chrome-history` when both are given.
    #[arg(long, env = "OMNIJUMP_SNAPSHOT")]
    snapshot: Option<PathBuf>,
    /// Chromium `History` SQLite database (default: the Chrome "Default" profile).
    #[arg(long, env = "OMNIJUMP_CHROME_HISTORY")]
    chrome_history: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct SuggestCmd {
    /// Query text.
    query: String,
    #[command(flatten)]
    source: SourceArgs,
    /// Override "now" (unix ms) for deterministic outputs.
    #[arg(long)]
    now_ms: Option<i64>,
    /// Prepend the New Tab / Ask ChatGPT / Ask Perplexity entries.
    #[arg(long)]
    with_pinned: bool,
}

#[derive(clap::Args, Debug)]
struct ResolveCmd {
    /// Query text.
    query: String,
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    #[command(flatten)]
    source: SourceArgs,
    /// Override "now" (unix ms) for deterministic outputs.
    #[arg(long)]
    now_ms: Option<i64>,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn init_logging() {
    let filter = std::env::var("OMNIJUMP_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    // stdout carries JSON; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_env_file() {
    // Sets vars only if not already set in the process environment.
    let Ok(p) = std::env::var("OMNIJUMP_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn open_source(args: &SourceArgs, cfg: &RankerConfig) -> Result<Arc<dyn CandidateSource>> {
    if let Some(p) = &args.snapshot {
        return Ok(Arc::new(SnapshotSource::from_path(p)?));
    }
    let db = args
        .chrome_history
        .clone()
        .or_else(|| chrome::default_history_path().filter(|p| p.exists()))
        .ok_or_else(|| {
            Error::NotConfigured(
                "no candidate source: pass --snapshot or --chrome-history \
                 (or set OMNIJUMP_SNAPSHOT / OMNIJUMP_CHROME_HISTORY)"
                    .to_string(),
            )
        })?;
    Ok(Arc::new(ChromeHistorySource::new(db, cfg.top_sites_limit)))
}

fn ranker_for(
    args: &SourceArgs,
    cfg: RankerConfig,
    now_ms: Option<i64>,
) -> Result<SuggestionRanker> {
    let source = open_source(args, &cfg)?;
    let ranker = SuggestionRanker::new(source, cfg);
    Ok(match now_ms {
        Some(n) => ranker.with_now_ms(n),
        None => ranker,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    init_logging();

    let cli = Cli::parse();
    let cfg = RankerConfig::from_env();

    match cli.command {
        Commands::Suggest(args) => {
            let query = args.query.trim().to_string();
            let ranker = ranker_for(&args.source, cfg, args.now_ms)?;
            let mut suggestions = if query.is_empty() {
                Vec::new()
            } else {
                ranker.suggestions(&query).await
            };
            if args.with_pinned && !query.is_empty() {
                let mut all = pinned_entries(&query);
                all.append(&mut suggestions);
                suggestions = all;
            }
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "suggest",
                "query": query,
                "source": ranker.source_name(),
                "suggestions": suggestions,
            });
            println!("{v}");
        }
        Commands::Resolve(args) => {
            let dest = resolve_query(&args.query, &cfg);
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "resolve",
                "query": args.query.trim(),
                "destination": dest,
            });
            println!("{v}");
        }
        Commands::Serve(args) => {
            let ranker = ranker_for(&args.source, cfg, args.now_ms)?;
            tracing::info!(source = ranker.source_name(), "serving JSON-lines requests on stdio");
            let dispatcher = Dispatcher::new(ranker);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            dispatcher.serve(stdin, tokio::io::stdout()).await?;
        }
        Commands::Doctor(args) => {
            let default_chrome = chrome::default_history_path();
            let source = open_source(&args.source, &cfg);
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "doctor",
                "name": "omnijump",
                "version": env!("CARGO_PKG_VERSION"),
                "source": {
                    "ok": source.is_ok(),
                    "name": source.as_ref().map(|s| s.name()).ok(),
                    "error": source.as_ref().err().map(|e| e.to_string()),
                },
                "chrome_default_history": {
                    "path": default_chrome.as_ref().map(|p| p.display().to_string()),
                    "exists": default_chrome.as_ref().is_some_and(|p| p.exists()),
                },
                "config": {
                    "history_window_days": cfg.history_window_days,
                    "history_max_results": cfg.history_max_results,
                    "dedup_cap": cfg.dedup_cap,
                    "max_suggestions": cfg.max_suggestions,
                    "top_sites_limit": cfg.top_sites_limit,
                    "favicon_endpoint": cfg.favicon_endpoint,
                    "favicon_size": cfg.favicon_size,
                    "search_endpoint": cfg.search_endpoint,
                },
            });
            println!("{v}");
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "omnijump",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("omnijump {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }

    Ok(())
}
