use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::PathBuf;

use crate::error::{Result, ZipError};

/// Where the archive is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Create (or truncate) a file.
    File(PathBuf),
    /// Standard output. Flushed but never closed by the builder.
    Stdout,
}

impl Destination {
    /// `-` means standard output, anything else is a path.
    pub fn parse(s: &str) -> Self {
        if s == "-" {
            Destination::Stdout
        } else {
            Destination::File(PathBuf::from(s))
        }
    }

    pub fn open(&self) -> Result<ArchiveSink> {
        match self {
            Destination::File(path) => match File::create(path) {
                Ok(file) => Ok(ArchiveSink::File(BufWriter::new(file))),
                Err(source) => Err(ZipError::CannotOpenDestination {
                    path: path.clone(),
                    source,
                }),
            },
            Destination::Stdout => Ok(ArchiveSink::Stdout(io::stdout())),
        }
    }
}

impl From<PathBuf> for Destination {
    fn from(path: PathBuf) -> Self {
        Destination::File(path)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::File(path) => write!(f, "{}", path.display()),
            Destination::Stdout => f.write_str("<stdout>"),
        }
    }
}

/// An open destination with a uniform write/flush/close surface.
pub enum ArchiveSink {
    File(BufWriter<File>),
    Stdout(Stdout),
}

impl ArchiveSink {
    /// Flush, then close the file. Standard output is only flushed.
    pub fn close(self) -> io::Result<()> {
        match self {
            ArchiveSink::File(writer) => {
                let file = writer.into_inner().map_err(|e| e.into_error())?;
                file.sync_all()
            }
            ArchiveSink::Stdout(mut stdout) => stdout.flush(),
        }
    }
}

impl Write for ArchiveSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ArchiveSink::File(w) => w.write(buf),
            ArchiveSink::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ArchiveSink::File(w) => w.flush(),
            ArchiveSink::Stdout(w) => w.flush(),
        }
    }
}
