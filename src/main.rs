use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use eventsieve::config::DEFAULT_REGEX_SIZE_LIMIT;
use eventsieve::input::{EventLineCodec, InputLine, DEFAULT_MAX_LINE_LENGTH};
use eventsieve::{load_rules, EngineConfig, Event, RuleEngine};
use futures::StreamExt;
use miette::IntoDiagnostic;
use slog::{o, Drain, Logger};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::codec::FramedRead;

/// Filter and rewrite JSON-lines events with a sieve rule file
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// rule file to apply
    #[clap(short, long)]
    rules: PathBuf,

    /// JSON-lines input, one event object per line (defaults to stdin)
    input: Option<PathBuf>,

    /// field that actions may not set or remove, can be repeated
    #[clap(short, long, value_name = "KEY")]
    protect: Vec<String>,

    /// upper bound on the compiled size of each rule regex, in bytes
    #[clap(long, default_value_t = DEFAULT_REGEX_SIZE_LIMIT)]
    regex_size_limit: usize,

    /// longer input lines are skipped, in bytes
    #[clap(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,

    /// only parse and check the rule file
    #[clap(long)]
    check: bool,

    /// log rule matches and halting actions to stderr
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Stats {
    kept: usize,
    dropped: usize,
    rejected: usize,
}

#[tokio::main]
pub async fn main() -> miette::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();

    let config = EngineConfig::default()
        .protect(args.protect.iter().cloned())
        .with_regex_size_limit(args.regex_size_limit);

    let rules = load_rules(&args.rules, &config)?;
    log::info!("loaded {} rules from {}", rules.len(), args.rules.display());

    if args.check {
        println!("{}: {} rules ok", args.rules.display(), rules.len());
        return Ok(());
    }

    let engine = RuleEngine::new(rules, config, &build_logger(args.verbose));

    let stats = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.into_diagnostic()?;
            run(&engine, file, args.max_line_length).await
        }
        None => run(&engine, tokio::io::stdin(), args.max_line_length).await,
    }
    .map_err(|e| miette::miette!("{:#}", e))?;

    log::info!(
        "done: {} kept, {} dropped, {} rejected",
        stats.kept,
        stats.dropped,
        stats.rejected
    );
    Ok(())
}

fn build_logger(verbose: bool) -> Logger {
    let level = if verbose {
        slog::Level::Debug
    } else {
        slog::Level::Warning
    };
    let plain = slog_term::PlainSyncDecorator::new(std::io::stderr());
    Logger::root(
        slog_term::FullFormat::new(plain)
            .build()
            .filter_level(level)
            .fuse(),
        o!(),
    )
}

/// Stream events through the engine one at a time, writing kept events to stdout
async fn run<R: AsyncRead + Unpin>(
    engine: &RuleEngine,
    input: R,
    max_line_length: usize,
) -> anyhow::Result<Stats> {
    let mut lines = FramedRead::new(input, EventLineCodec::new(max_line_length));
    let mut stdout = tokio::io::stdout();
    let mut stats = Stats::default();
    let mut line_no = 0usize;

    while let Some(line) = lines.next().await {
        line_no += 1;
        let line = match line.with_context(|| format!("reading input line {}", line_no))? {
            InputLine::Text(line) => line,
            InputLine::Rejected(reason) => {
                log::warn!("line {}: skipping unreadable input: {}", line_no, reason);
                stats.rejected += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("line {}: skipping malformed event: {}", line_no, e);
                stats.rejected += 1;
                continue;
            }
        };

        match engine.process(event) {
            Some(event) => {
                let mut out = serde_json::to_string(&event)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stats.kept += 1;
            }
            None => stats.dropped += 1,
        }
    }

    stdout.flush().await?;
    Ok(stats)
}
