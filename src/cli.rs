use clap::Parser;
use std::path::PathBuf;

use crate::io::{Destination, EntrySource};
use crate::zip::{
    ArchiveOptions, CommentEncoding, CompressionMethod, DeflateCodec, MethodRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "streamzip")]
#[command(version)]
#[command(about = "Create ZIP archives in a single streaming pass", long_about = None)]
#[command(after_help = "Examples:\n  \
  streamzip logs.zip app.log db.log           deflate two files into logs.zip\n  \
  streamzip -m store - notes.txt > out.zip    store a file, write the archive to stdout\n  \
  streamzip out.zip docs/readme.txt=README.md add README.md as docs/readme.txt")]
pub struct Cli {
    /// Output archive path, or - for standard output
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Files to add, as PATH or NAME=PATH
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<String>,

    /// Compression method: store, deflate or a numeric method id
    #[arg(short = 'm', long, value_name = "METHOD", default_value = "deflate", value_parser = parse_method)]
    pub method: CompressionMethod,

    /// Deflate level, 0 (fastest) to 9 (smallest)
    #[arg(short = 'l', long, value_name = "LEVEL", value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: Option<u32>,

    /// Archive comment
    #[arg(short = 'z', long, value_name = "TEXT", default_value = "")]
    pub comment: String,

    /// Store the archive comment as UTF-8 instead of code page 866
    #[arg(long)]
    pub utf8_comment: bool,

    /// Quiet mode
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn destination(&self) -> Destination {
        Destination::parse(&self.archive)
    }

    /// Status output would mix with the archive on stdout.
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.destination() == Destination::Stdout
    }

    pub fn registry(&self) -> MethodRegistry {
        let deflate = match self.level {
            Some(level) => DeflateCodec::new(level),
            None => DeflateCodec::default(),
        };
        MethodRegistry::new().with(deflate)
    }

    pub fn options(&self) -> ArchiveOptions {
        let encoding = if self.utf8_comment {
            CommentEncoding::Utf8
        } else {
            CommentEncoding::Cp866
        };
        ArchiveOptions::new()
            .comment(self.comment.clone())
            .method(self.method)
            .comment_encoding(encoding)
    }

    /// `(archive name, source)` pairs in command-line order.
    pub fn entries(&self) -> Vec<(String, EntrySource)> {
        self.files
            .iter()
            .map(|spec| {
                let (name, path) = split_file_spec(spec);
                (name, EntrySource::path(path))
            })
            .collect()
    }
}

fn parse_method(s: &str) -> Result<CompressionMethod, String> {
    match s.to_ascii_lowercase().as_str() {
        "store" | "stored" => Ok(CompressionMethod::Stored),
        "deflate" | "deflated" => Ok(CompressionMethod::Deflate),
        other => other
            .parse::<u16>()
            .map(CompressionMethod::from_u16)
            .map_err(|_| format!("unknown method '{s}'")),
    }
}

/// Split `NAME=PATH`; a bare path is stored under a name derived from it.
fn split_file_spec(spec: &str) -> (String, PathBuf) {
    match spec.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            (name.to_string(), PathBuf::from(path))
        }
        _ => (archive_name(spec), PathBuf::from(spec)),
    }
}

/// Archive name for a filesystem path: forward slashes, no root, and no `.`
/// or `..` components.
pub fn archive_name(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !matches!(*part, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arguments() {
        let cli = Cli::try_parse_from([
            "streamzip", "-m", "store", "-z", "hi", "out.zip", "a.txt", "docs/b=b.md",
        ])
        .unwrap();

        assert_eq!(cli.destination(), Destination::File(PathBuf::from("out.zip")));
        assert_eq!(cli.method, CompressionMethod::Stored);
        assert_eq!(cli.options().comment, "hi");

        let entries = cli.entries();
        assert_eq!(entries[0].0, "a.txt");
        assert_eq!(entries[1].0, "docs/b");
        assert_eq!(entries[1].1.locator.label(), std::path::Path::new("b.md"));
    }

    #[test]
    fn defaults_and_stdout() {
        let cli = Cli::try_parse_from(["streamzip", "-", "a.txt"]).unwrap();
        assert_eq!(cli.method, CompressionMethod::Deflate);
        assert!(cli.is_quiet());
        assert!(cli.registry().contains(CompressionMethod::Deflate));
        assert_eq!(cli.options().comment_encoding, CommentEncoding::Cp866);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Cli::try_parse_from(["streamzip", "out.zip"]).is_err());
        assert!(Cli::try_parse_from(["streamzip", "-m", "zstdx", "out.zip", "a"]).is_err());
        assert!(Cli::try_parse_from(["streamzip", "-l", "10", "out.zip", "a"]).is_err());
    }

    #[test]
    fn numeric_methods_pass_through() {
        assert_eq!(parse_method("99").unwrap(), CompressionMethod::Unknown(99));
        assert_eq!(parse_method("8").unwrap(), CompressionMethod::Deflate);
    }

    #[test]
    fn archive_names() {
        assert_eq!(archive_name("./a/b.txt"), "a/b.txt");
        assert_eq!(archive_name("/etc/hosts"), "etc/hosts");
        assert_eq!(archive_name("dir\\file.txt"), "dir/file.txt");
        assert_eq!(archive_name(".//x"), "x");
    }

    #[test]
    fn archive_names_never_climb_out() {
        assert_eq!(archive_name("../secret"), "secret");
        assert_eq!(archive_name("a/../../b/./c"), "a/b/c");
        assert_eq!(archive_name("..\\up.txt"), "up.txt");
        assert_eq!(split_file_spec("../secret").0, "secret");
        assert_eq!(split_file_spec("../secret").1, PathBuf::from("../secret"));
    }
}
