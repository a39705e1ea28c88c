use anyhow::{Result, anyhow};
use clap::Parser;
use crossbeam_channel::bounded;
use docsieve::{CompiledPredicate, Filter};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{DecodeErrorPolicy, RuntimeConfig};
use crate::input::Line;
use crate::pipeline::{BatchResult, RunStats, process_batch};
use crate::sinks::{DataSink, JsonlSink};
use crate::utils::ProgressCounter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filter expression, e.g. 'type = "order" AND total >= 100'
    #[arg(short, long, env = "DOCSIEVE_EXPRESSION")]
    pub expression: Option<String>,

    /// Filter configuration file (YAML)
    #[arg(short, long)]
    pub filters: Option<PathBuf>,

    /// Input JSON lines file, or - for stdin
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Output file, or - for stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Number of threads (default: all cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Documents per work unit
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// What to do with lines that are not valid JSON
    #[arg(long, value_enum)]
    pub on_decode_error: Option<DecodeErrorPolicy>,

    /// Output documents that do NOT match
    #[arg(long)]
    pub invert: bool,

    /// Print the normalized expression and the fields it reads, then exit
    #[arg(long)]
    pub explain: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn init_sink(output: &Path) -> Result<Box<dyn DataSink + Send>> {
    if output == Path::new("-") {
        tracing::info!("Sink: jsonl -> stdout");
        Ok(Box::new(JsonlSink::stdout()))
    } else {
        tracing::info!("Sink: jsonl -> {:?}", output);
        Ok(Box::new(JsonlSink::new(output)?))
    }
}

/// Write what the filter compiled to.
pub fn explain(filter: &Filter, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "expression: {}", filter.expr())?;
    let predicate = filter.predicate();
    if let Some(verdict) = predicate.constant() {
        writeln!(out, "constant: {}", verdict)?;
    }
    for slot in predicate.slots() {
        writeln!(out, "field: {}", slot.path())?;
    }
    Ok(())
}

/// Filter `lines` in parallel batches, writing selected documents to `sink`
/// in input order.
///
/// Each rayon worker owns one matcher over the shared predicate; a single
/// writer thread receives finished batches and puts them back in order.
pub fn filter_documents(
    lines: &[Line<'_>],
    predicate: &CompiledPredicate,
    runtime: &RuntimeConfig,
    sink: &mut (dyn DataSink + Send),
    progress: &ProgressCounter,
) -> Result<RunStats> {
    let (tx, rx) = bounded::<BatchResult<'_>>(64);

    std::thread::scope(|scope| {
        let writer = scope.spawn(move || -> Result<RunStats> {
            let mut stats = RunStats::default();
            let mut pending = BTreeMap::new();
            let mut next = 0usize;

            for batch in rx {
                pending.insert(batch.index, batch);
                while let Some(batch) = pending.remove(&next) {
                    for document in &batch.selected {
                        sink.add_document(document)?;
                    }
                    stats.add(&batch);
                    progress.inc(batch.processed);
                    next += 1;
                }
            }
            Ok(stats)
        });

        let filter_result = lines
            .par_chunks(runtime.batch_size)
            .enumerate()
            .map_init(
                || predicate.matcher(),
                |matcher, (index, chunk)| process_batch(matcher, runtime, index, chunk),
            )
            .try_for_each(|batch| -> Result<()> {
                tx.send(batch?)
                    .map_err(|err| anyhow!("Pipeline: Failed to send batch: {}", err))
            });

        drop(tx);

        // Check writer thread first - it has the real error if the channel disconnected
        let stats = match writer.join() {
            Ok(Ok(stats)) => stats,
            Ok(Err(writer_err)) => {
                return if filter_result.is_err() {
                    Err(writer_err
                        .context("Pipeline: Sink writer thread failed (caused channel disconnect)"))
                } else {
                    Err(writer_err)
                };
            }
            Err(panic_payload) => {
                let panic_msg = panic_payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                return Err(anyhow!(
                    "Pipeline: Sink writer thread panicked: {}",
                    panic_msg
                ));
            }
        };

        // Only check the filter result if the writer succeeded
        filter_result?;
        Ok(stats)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputBuffer;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<Vec<u8>>>>);

    impl DataSink for Collect {
        fn add_document(&mut self, document: &[u8]) -> Result<()> {
            self.0.lock().unwrap().push(document.to_vec());
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn run(source: &str, input: &str, runtime: RuntimeConfig) -> (Result<RunStats>, Vec<String>) {
        let filter = Filter::new(source).unwrap();
        let buffer = InputBuffer::from_bytes(input.as_bytes().to_vec());
        let lines = buffer.lines();
        let collect = Collect::default();
        let mut sink = collect.clone();
        let progress = ProgressCounter::new("test", 100, false);
        let result = filter_documents(&lines, filter.predicate(), &runtime, &mut sink, &progress);
        let written = collect
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|d| String::from_utf8(d.clone()).unwrap())
            .collect();
        (result, written)
    }

    #[test]
    fn keeps_input_order_across_batches() {
        let input: String = (0..1000).map(|n| format!("{{\"n\": {n}}}\n")).collect();
        let runtime = RuntimeConfig {
            batch_size: 7,
            ..Default::default()
        };
        let (result, written) = run("n >= 500 AND n < 600", &input, runtime);
        let stats = result.unwrap();
        assert_eq!(stats.processed, 1000);
        assert_eq!(stats.selected, 100);
        let expected: Vec<String> = (500..600).map(|n| format!("{{\"n\": {n}}}")).collect();
        assert_eq!(written, expected);
    }

    #[test]
    fn decode_failure_aborts_under_fail() {
        let runtime = RuntimeConfig {
            on_decode_error: DecodeErrorPolicy::Fail,
            batch_size: 2,
            ..Default::default()
        };
        let (result, _) = run("TRUE", "{}\n{}\n{\n{}\n", runtime);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Line 3"), "{err}");
    }

    #[test]
    fn decode_failure_counted_under_skip() {
        let (result, written) = run("a EXISTS", "{\"a\":1}\nxx\n{\"b\":1}\n", RuntimeConfig::default());
        let stats = result.unwrap();
        assert_eq!(stats.decode_errors, 1);
        assert_eq!(written, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn explain_lists_fields() {
        let filter = Filter::new("a.b = 1 OR NOT c EXISTS").unwrap();
        let mut out = Vec::new();
        explain(&filter, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "expression: (a.b = 1 OR NOT c EXISTS)\nfield: a.b\nfield: c\n");
    }

    #[test]
    fn explain_constant() {
        let filter = Filter::new("TRUE OR a = 1").unwrap();
        let mut out = Vec::new();
        explain(&filter, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("constant: true"), "{text}");
    }
}
