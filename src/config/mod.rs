use anyhow::{Context, bail};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Filter settings file.
///
/// ```yaml
/// expression: "type = \"order\" AND total >= 100"
/// on_decode_error: skip
/// invert: false
/// batch_size: 4096
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub on_decode_error: Option<DecodeErrorPolicy>,
    #[serde(default)]
    pub invert: Option<bool>,
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl FilterConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .with_context(|| format!("Config: Failed to read {path:?}"))?;
        settings
            .try_deserialize()
            .with_context(|| format!("Config: Invalid settings in {path:?}"))
    }
}

/// Settings in effect for one run, after command-line overrides.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub on_decode_error: DecodeErrorPolicy,
    pub invert: bool,
    pub batch_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            on_decode_error: DecodeErrorPolicy::Skip,
            invert: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Layer command-line values over file values over defaults.
    pub fn resolve(
        file: &FilterConfig,
        on_decode_error: Option<DecodeErrorPolicy>,
        invert: bool,
        batch_size: Option<usize>,
    ) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let batch_size = batch_size.or(file.batch_size).unwrap_or(defaults.batch_size);
        if batch_size == 0 {
            bail!("Config: batch_size must be at least 1");
        }

        Ok(Self {
            on_decode_error: on_decode_error
                .or(file.on_decode_error)
                .unwrap_or(defaults.on_decode_error),
            invert: invert || file.invert.unwrap_or(defaults.invert),
            batch_size,
        })
    }
}

/// What to do with a line that is not valid JSON.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrorPolicy {
    /// Count it, log it at debug level and carry on.
    Skip,
    /// Abort the run.
    Fail,
}

impl FromStr for DecodeErrorPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "skip" => Ok(DecodeErrorPolicy::Skip),
            "fail" => Ok(DecodeErrorPolicy::Fail),
            _ => Err(format!("invalid on_decode_error: {value}")),
        }
    }
}
