use anyhow::{Result, anyhow};
use docsieve::{FilterError, Matcher};

use crate::config::{DecodeErrorPolicy, RuntimeConfig};
use crate::input::Line;

/// Outcome of filtering one batch of input lines.
#[derive(Debug, Default)]
pub struct BatchResult<'a> {
    /// Position of the batch in the input, used to restore order.
    pub index: usize,
    /// Documents to write, in input order.
    pub selected: Vec<&'a [u8]>,
    pub processed: u64,
    pub decode_errors: u64,
}

/// Totals over a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub selected: u64,
    pub decode_errors: u64,
}

impl RunStats {
    pub fn add(&mut self, batch: &BatchResult<'_>) {
        self.processed += batch.processed;
        self.selected += batch.selected.len() as u64;
        self.decode_errors += batch.decode_errors;
    }
}

/// Run every line of a batch through `matcher`.
///
/// A line is selected when its verdict differs from `runtime.invert`. Lines
/// that fail to decode are never selected; under
/// [`DecodeErrorPolicy::Fail`] the first one aborts the batch.
pub fn process_batch<'a>(
    matcher: &mut Matcher<'_>,
    runtime: &RuntimeConfig,
    index: usize,
    lines: &[Line<'a>],
) -> Result<BatchResult<'a>> {
    let mut result = BatchResult {
        index,
        ..Default::default()
    };

    for line in lines {
        result.processed += 1;
        match matcher.matches(line.text) {
            Ok(verdict) => {
                if verdict != runtime.invert {
                    result.selected.push(line.text);
                }
            }
            Err(FilterError::Decode(message)) => match runtime.on_decode_error {
                DecodeErrorPolicy::Skip => {
                    tracing::debug!("Skipping line {}: {}", line.number, message);
                    result.decode_errors += 1;
                }
                DecodeErrorPolicy::Fail => {
                    return Err(anyhow!(
                        "Pipeline: Line {} is not valid JSON: {}",
                        line.number,
                        message
                    ));
                }
            },
            Err(err) => return Err(anyhow!("Pipeline: Line {}: {}", line.number, err)),
        }
    }

    Ok(result)
}
