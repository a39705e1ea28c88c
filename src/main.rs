mod app;
mod config;
mod input;
mod pipeline;
mod sinks;
mod utils;

use anyhow::{Context, Result, bail};
use clap::Parser;
use docsieve::Filter;

use app::{Cli, explain, filter_documents, init_sink};
use config::{FilterConfig, RuntimeConfig};
use input::InputBuffer;
use utils::ProgressCounter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let file_config = match &cli.filters {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::default(),
    };

    let Some(source) = cli.expression.as_ref().or(file_config.expression.as_ref()) else {
        bail!("Config: No filter expression; use --expression or set `expression` in --filters");
    };

    let filter = Filter::new(source)
        .with_context(|| format!("CLI: Invalid filter expression {source:?}"))?;
    tracing::info!(
        "Filter: {} ({} fields)",
        filter.expr(),
        filter.predicate().slots().len()
    );

    if cli.explain {
        let stdout = std::io::stdout();
        explain(&filter, &mut stdout.lock())?;
        return Ok(());
    }

    let runtime = RuntimeConfig::resolve(
        &file_config,
        cli.on_decode_error,
        cli.invert,
        cli.batch_size,
    )?;

    let buffer = InputBuffer::open(&cli.input)?;
    let lines = buffer.lines();
    tracing::info!("Input: {} documents from {:?}", lines.len(), cli.input);

    let mut sink = init_sink(&cli.output)?;
    let progress = ProgressCounter::new("Documents", 100_000, cli.verbose);

    let start = std::time::Instant::now();
    let stats = filter_documents(
        &lines,
        filter.predicate(),
        &runtime,
        sink.as_mut(),
        &progress,
    )?;
    sink.finish().context("Pipeline: Failed to finalize sink")?;
    progress.finish();

    if stats.decode_errors > 0 {
        tracing::warn!("Skipped {} lines that were not valid JSON", stats.decode_errors);
    }

    let elapsed = start.elapsed();
    tracing::info!(
        "Done! Selected {} of {} documents in {:.2}s",
        stats.selected,
        stats.processed,
        elapsed.as_secs_f64()
    );

    Ok(())
}
