//! Side-channel copies of the input stream.
//!
//! Every input line can also be appended to a file, written to a gzip file,
//! or echoed to stdout. Sinks only ever see whole lines, without their
//! terminator.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use crate::config::Config;
use crate::{Error, Result};

/// Somewhere input lines can be copied to.
pub trait LineSink: Send {
    /// Short label for diagnostics.
    fn name(&self) -> &str;

    /// Write one line; the sink adds the terminator.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush and close the sink.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

fn open_with(options: &OpenOptions, path: &Path) -> Result<File> {
    options.open(path).map_err(|source| Error::OpenSink {
        path: path.to_path_buf(),
        source,
    })
}

/// Appends lines to a plain file, creating it if needed.
#[derive(Debug)]
pub struct AppendFile {
    label: String,
    out: BufWriter<File>,
}

impl AppendFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = open_with(OpenOptions::new().create(true).append(true), path)?;
        Ok(Self {
            label: path.display().to_string(),
            out: BufWriter::new(file),
        })
    }
}

impl LineSink for AppendFile {
    fn name(&self) -> &str {
        &self.label
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.out.flush()
    }
}

/// Writes lines gzip-compressed to a file. The file is truncated on open,
/// since a gzip stream cannot be appended to.
#[derive(Debug)]
pub struct GzipFile {
    label: String,
    out: GzEncoder<BufWriter<File>>,
}

impl GzipFile {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = open_with(
            OpenOptions::new().create(true).write(true).truncate(true),
            path,
        )?;
        Ok(Self {
            label: path.display().to_string(),
            out: GzEncoder::new(BufWriter::new(file), Compression::default()),
        })
    }
}

impl LineSink for GzipFile {
    fn name(&self) -> &str {
        &self.label
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        self.out.finish()?.flush()
    }
}

/// Echoes lines to stdout as they arrive.
#[derive(Debug, Default)]
pub struct Echo;

impl LineSink for Echo {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{line}")
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Fans every line out to a set of sinks.
///
/// A sink that fails to write is reported once and detached; sampling
/// carries on without it.
#[derive(Default)]
pub struct Tee {
    sinks: Vec<Box<dyn LineSink>>,
}

impl Tee {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the sinks `config` asks for.
    pub fn open(config: &Config) -> Result<Self> {
        let mut tee = Self::new();
        if let Some(path) = &config.append {
            tee.push(AppendFile::open(path)?);
        }
        if let Some(path) = &config.teez {
            tee.push(GzipFile::create(path)?);
        }
        if config.echo {
            tee.push(Echo);
        }
        Ok(tee)
    }

    pub fn push(&mut self, sink: impl LineSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn write_line(&mut self, line: &str) {
        self.sinks.retain_mut(|sink| match sink.write_line(line) {
            Ok(()) => true,
            Err(err) => {
                warn!(sink = sink.name(), %err, "detaching tee sink after write failure");
                false
            }
        });
    }

    /// Flush and close every remaining sink.
    pub fn finish(self) {
        for sink in self.sinks {
            let name = sink.name().to_owned();
            match sink.finish() {
                Ok(()) => debug!(sink = %name, "tee sink closed"),
                Err(err) => warn!(sink = %name, %err, "failed to close tee sink"),
            }
        }
    }
}

impl std::fmt::Debug for Tee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|sink| sink.name()))
            .finish()
    }
}
