//! Line-oriented REPL/batch runner over `notecalc_engine`.
//!
//! Grounded on the bare-bones `clap::Parser` + `anyhow::Context` +
//! `tracing_subscriber::fmt().with_env_filter(...)` shape used by the
//! teacher's own standalone binaries (e.g.
//! `apps/server/src/bin/bench_indexing.rs`), minus the OpenTelemetry layer
//! `apps/server/src/logging.rs` wires in for the HTTP server — this binary
//! only ever needs a subscriber, not a collector.

use anyhow::{Context, Result};
use clap::Parser;
use notecalc_engine::context::EngineOptions;
use notecalc_engine::Engine;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "notecalc", about = "Evaluate a notebook-style document line by line")]
struct Args {
    /// Notebook file to evaluate; reads stdin line-by-line as a REPL when omitted.
    #[clap(value_name = "FILE")]
    input: Option<PathBuf>,

    /// JSON file of `EngineOptions` overrides, composed over the defaults.
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print only the `display_text` of each render node, one per line.
    #[clap(long)]
    quiet: bool,
}

fn load_options(path: &Option<PathBuf>) -> Result<EngineOptions> {
    let defaults = EngineOptions::default();
    let Some(path) = path else {
        return Ok(defaults);
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    let overrides: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}' as JSON", path.display()))?;
    let mut merged = serde_json::to_value(&defaults)?;
    merge_json(&mut merged, &overrides);
    serde_json::from_value(merged).context("config file does not match EngineOptions shape")
}

fn merge_json(base: &mut serde_json::Value, overrides: &serde_json::Value) {
    let (serde_json::Value::Object(base_map), serde_json::Value::Object(override_map)) =
        (base, overrides)
    else {
        return;
    };
    for (key, value) in override_map {
        base_map.insert(key.clone(), value.clone());
    }
}

fn run_line(engine: &mut Engine, line_number: usize, raw: &str, now: i64, quiet: bool) {
    if raw.trim().is_empty() {
        return;
    }
    let render = engine.evaluate(line_number, raw, now);
    if quiet {
        println!("{}", render.display_text());
    } else {
        println!("{line_number:>4} | {}", render.display_text());
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let options = load_options(&args.config)?;
    let mut engine = Engine::with_options(options);
    let now = now_unix();

    match &args.input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read notebook file '{}'", path.display()))?;
            for (i, line) in content.lines().enumerate() {
                run_line(&mut engine, i + 1, line, now, args.quiet);
            }
        }
        None => {
            let stdin = io::stdin();
            let mut line_number = 0usize;
            loop {
                print!("> ");
                io::stdout().flush().ok();
                let mut buf = String::new();
                let read = stdin.lock().read_line(&mut buf)?;
                if read == 0 {
                    break;
                }
                line_number += 1;
                run_line(&mut engine, line_number, buf.trim_end_matches('\n'), now, args.quiet);
            }
        }
    }

    Ok(())
}

/// The host's wall-clock reading, kept to this one call site — the engine
/// itself never reads the clock (spec.md 9).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
