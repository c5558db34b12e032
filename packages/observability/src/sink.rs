//! Append-only JSONL file sink.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Shared append-mode writer that flushes after every write, so each log
/// line reaches the file before the next event is formatted.
#[derive(Clone)]
pub struct LineFlushedWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl LineFlushedWriter {
    /// Open (or create) `path` in append mode, creating parent directories.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for LineFlushedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// `MakeWriter` handing out clones of one [`LineFlushedWriter`].
#[derive(Clone)]
pub struct WriterFactory {
    writer: LineFlushedWriter,
}

impl WriterFactory {
    pub fn new(writer: LineFlushedWriter) -> Self {
        Self { writer }
    }
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = LineFlushedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}
