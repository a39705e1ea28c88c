use anyhow::Result;

pub mod jsonl;

pub use self::jsonl::JsonlSink;

/// Destination for matching documents.
pub trait DataSink: Send {
    /// Write one document; `document` is the raw input line.
    fn add_document(&mut self, document: &[u8]) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}
