use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

/// The whole input, either memory-mapped from a file or read from stdin.
pub struct InputBuffer {
    inner: InputBufferImpl,
}

enum InputBufferImpl {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl InputBuffer {
    /// Open `path`, or stdin when it is `-`.
    pub fn open(path: &Path) -> Result<Self> {
        if path == Path::new("-") {
            return Self::stdin();
        }

        let file = File::open(path).with_context(|| format!("CLI: Failed to open input {path:?}"))?;
        let len = file
            .metadata()
            .with_context(|| format!("CLI: Failed to stat input {path:?}"))?
            .len();
        // Mapping an empty file fails on some platforms.
        if len == 0 {
            return Ok(Self::from_bytes(Vec::new()));
        }

        // SAFETY: The map is read-only and lives no longer than this buffer.
        // The file is not expected to change while it is being filtered.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("CLI: Failed to map input {path:?}"))?;
        Ok(Self {
            inner: InputBufferImpl::Mapped(mmap),
        })
    }

    pub fn stdin() -> Result<Self> {
        let mut bytes = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("CLI: Failed to read stdin")?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            inner: InputBufferImpl::Owned(bytes),
        }
    }

    /// Non-blank lines with their 1-based line numbers. Trailing `\r` and
    /// surrounding whitespace are stripped.
    pub fn lines(&self) -> Vec<Line<'_>> {
        self.split(|byte| *byte == b'\n')
            .enumerate()
            .filter_map(|(index, raw)| {
                let text = raw.trim_ascii();
                (!text.is_empty()).then_some(Line {
                    number: index + 1,
                    text,
                })
            })
            .collect()
    }
}

impl Deref for InputBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.inner {
            InputBufferImpl::Mapped(mmap) => mmap,
            InputBufferImpl::Owned(bytes) => bytes,
        }
    }
}

/// One document of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: usize,
    pub text: &'a [u8],
}
