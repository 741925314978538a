//! # Output writer
//!
//! A concrete text-based 1-D array writer fulfilling the `ncdf_writer_1d`
//! external of §6: one value per line, written through a `BufWriter`, each
//! call replacing the prior file's contents.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Persists a named 1-D array of reals after every refinement.
pub trait Writer {
    fn write(&self, name: &str, values: &[f64]) -> std::io::Result<()>;
}

/// Writes each named array to `<dir>/<name>` as one value per line,
/// truncating any prior contents.
pub struct TextWriter {
    dir: PathBuf,
}

impl TextWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Writer for TextWriter {
    fn write(&self, name: &str, values: &[f64]) -> std::io::Result<()> {
        let path: &Path = &self.dir.join(name);
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        for v in values {
            writeln!(out, "{v:e}")?;
        }
        out.flush()
    }
}
