//! Destinations for exported files.
//!
//! An export is handed to a sink as a fixed sequence of operations: one
//! `write` creating the file with the header, any number of `append`s with
//! payload blocks, and a final `finalize`. Each call completes before the
//! next one is issued; the core never reorders or retries them.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::PathBuf,
};

use fxhash::FxHashMap;

use crate::error::Error;


/// A destination for exported files.
pub trait ExportSink {
    /// Creates (or truncates) `name` with the given initial content.
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), Error>;

    /// Appends to a previously written `name`.
    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), Error>;

    /// Marks the export complete and makes it available under
    /// `public_name`. The two names are usually the same.
    fn finalize(&mut self, name: &str, public_name: &str) -> Result<(), Error>;
}


/// Writes exported files into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl ExportSink for FileSink {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), Error> {
        fs::write(self.path(name), data)?;
        Ok(())
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), Error> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.path(name))?;
        file.write_all(data)?;
        Ok(())
    }

    fn finalize(&mut self, name: &str, public_name: &str) -> Result<(), Error> {
        if name != public_name {
            fs::rename(self.path(name), self.path(public_name))?;
        }
        Ok(())
    }
}


/// Collects exported files in memory. Mainly useful for tests and for
/// callers that want the file bytes without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemSink {
    files: FxHashMap<String, Vec<u8>>,
    finalized: Vec<String>,
}

impl MemSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The content written under `name` so far, if any.
    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|data| data.as_slice())
    }

    /// Whether `finalize` has been called for `public_name`.
    pub fn is_finalized(&self, public_name: &str) -> bool {
        self.finalized.iter().any(|name| name == public_name)
    }
}

impl ExportSink for MemSink {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), Error> {
        self.files.insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), Error> {
        match self.files.get_mut(name) {
            Some(file) => {
                file.extend_from_slice(data);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("append to unknown file `{}`", name),
            ).into()),
        }
    }

    fn finalize(&mut self, name: &str, public_name: &str) -> Result<(), Error> {
        if name != public_name {
            match self.files.remove(name) {
                Some(data) => {
                    self.files.insert(public_name.to_string(), data);
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("finalize of unknown file `{}`", name),
                    ).into());
                }
            }
        }

        self.finalized.push(public_name.to_string());
        Ok(())
    }
}
