use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::RegistryError;
use super::types::Record;

/// Append-only node log. Every record is flushed as soon as it is written.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: File,
}

impl LogSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| RegistryError::resource(&path, e))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: &Record) -> Result<(), RegistryError> {
        writeln!(self.file, "{}", record)
            .and_then(|_| self.file.flush())
            .map_err(|e| RegistryError::resource(&self.path, e))
    }

    /// Syncs and releases the file. Consumes the sink, so it can only happen once.
    pub fn close(mut self) -> Result<(), RegistryError> {
        self.file
            .flush()
            .and_then(|_| self.file.sync_all())
            .map_err(|e| RegistryError::resource(&self.path, e))?;
        drop(self.file);
        Ok(())
    }
}
