//! # Output Formatting
//!
//! Search matches are written as they arrive, in one of two formats:
//!
//! - **Text**: project name, underlined permalink and the matched snippet
//! - **JSONL**: one JSON object per match batch for scripting
//!
//! ```bash
//! tanuki search -g backend hello_there --format jsonl | jq -r '.project.name'
//! ```

mod text;

use std::io::Write;

use anyhow::Result;
use tanuki_core::ComposedBlob;

pub use text::format_composed;

/// Output format options supported by `tanuki search`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty, human-readable text (default)
    #[default]
    Text,
    /// Newline-delimited JSON
    Jsonl,
}

/// Streams matches to a writer in the selected format.
pub struct MatchWriter<W: Write> {
    format: OutputFormat,
    out: W,
    blobs: usize,
}

impl<W: Write> MatchWriter<W> {
    /// Writer emitting `format` to `out`.
    pub const fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out,
            blobs: 0,
        }
    }

    /// Number of blobs written so far.
    pub const fn blobs_written(&self) -> usize {
        self.blobs
    }

    /// Write one match batch and flush, so results show up while the search
    /// continues.
    pub fn write(&mut self, composed: &ComposedBlob) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.out.write_all(format_composed(composed).as_bytes())?,
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut self.out, composed)?;
                self.out.write_all(b"\n")?;
            },
        }
        self.out.flush()?;
        self.blobs += composed.blobs.len();
        Ok(())
    }
}
