//! Output of resolved values to standard output and destination files

use crate::Result;
use crate::resolver::ResolvedValue;
use clap::ValueEnum;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use vaultenv_core::SecretKind;

/// Line format for emitted assignments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `NAME="VALUE"`, for POSIX shells and dotenv files
    #[default]
    #[value(name = "FILE")]
    Nix,
    /// `set NAME="VALUE"`, for batch files
    #[value(name = "WINDOWS")]
    Windows,
}

/// Format one assignment line, newline included.
pub fn format_line(format: OutputFormat, name: &str, value: &str) -> String {
    match format {
        OutputFormat::Nix => format!("{}=\"{}\"\n", name, value),
        OutputFormat::Windows => format!("set {}=\"{}\"\n", name, value),
    }
}

/// Routes resolved values to standard output or to their destination file.
///
/// Each destination file is opened once, on first use, in append mode and is
/// kept open until the writer is dropped. Dropping the writer closes every
/// handle, whether the run succeeded or not. Lines already appended are not
/// rolled back on failure.
pub struct OutputWriter<W: Write> {
    format: OutputFormat,
    base_dir: PathBuf,
    default_output: PathBuf,
    stdout: W,
    files: HashMap<PathBuf, File>,
}

impl<W: Write> OutputWriter<W> {
    /// Creates a writer.
    ///
    /// # Arguments
    ///
    /// * `format` - Line format for every value
    /// * `input_file` - The config file; relative destinations resolve against its directory
    /// * `default_output` - Destination for `FILE` values that declare none
    /// * `stdout` - Sink for `ENV` values
    pub fn new(
        format: OutputFormat,
        input_file: &Path,
        default_output: impl Into<PathBuf>,
        stdout: W,
    ) -> Self {
        Self {
            format,
            base_dir: input_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            default_output: default_output.into(),
            stdout,
            files: HashMap::new(),
        }
    }

    /// The file a `FILE` value is appended to.
    ///
    /// `.` components are dropped, so `./out.env` and `out.env` name the
    /// same destination and share one handle.
    pub fn destination(&self, value: &ResolvedValue) -> PathBuf {
        let path = match value.file.as_deref() {
            Some(file) if !file.is_empty() => PathBuf::from(file),
            _ => self.default_output.clone(),
        };
        let path = if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        };
        path.components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect()
    }

    /// Write a single value.
    pub fn write(&mut self, value: &ResolvedValue) -> Result<()> {
        let line = format_line(self.format, &value.name, &value.value);

        match value.kind {
            SecretKind::Environment => {
                self.stdout.write_all(line.as_bytes())?;
            }
            SecretKind::File => {
                let path = self.destination(value);
                let file = match self.files.entry(path) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        let file = open_append(entry.key())?;
                        entry.insert(file)
                    }
                };

                if value.name.is_empty() {
                    debug!("skipping value with an empty name");
                    return Ok(());
                }
                file.write_all(line.as_bytes())?;
            }
        }

        Ok(())
    }

    /// Write every value in order, stopping at the first failure.
    pub fn write_all(&mut self, values: &[ResolvedValue]) -> Result<()> {
        for value in values {
            self.write(value)?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    /// Number of destination files opened so far.
    pub fn open_files(&self) -> usize {
        self.files.len()
    }

    /// Closes all destination files and returns the stdout sink.
    pub fn into_inner(self) -> W {
        self.stdout
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    options.mode(0o600);

    debug!(path = %path.display(), "opening output file");
    options.open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to open {}: {}", path.display(), e),
        )
    })
}
