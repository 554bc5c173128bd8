use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use parking_lot::Mutex;

use crate::{
    compose::rig::Rig,
    foundation::error::{RigError, RigResult},
};

/// Final persistence step for rendered rigs.
///
/// A failed insert persists nothing the caller can rely on; compensation for side effects that
/// happened before the insert belongs to the caller.
pub trait RigSink: Send + Sync {
    fn insert_rigs(&self, rigs: &[Rig]) -> RigResult<()>;
}

/// Appends one JSON document per rig to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn open(path: impl Into<PathBuf>) -> RigResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open rig sink '{}'", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RigSink for JsonLinesSink {
    fn insert_rigs(&self, rigs: &[Rig]) -> RigResult<()> {
        // Serialize the whole batch before touching the file.
        let mut buf = Vec::new();
        for rig in rigs {
            serde_json::to_writer(&mut buf, rig)?;
            buf.push(b'\n');
        }

        let mut file = self.file.lock();
        file.write_all(&buf)
            .and_then(|()| file.flush())
            .with_context(|| format!("append rigs to '{}'", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), rigs = rigs.len(), "inserted rigs");
        Ok(())
    }
}

/// In-memory sink. Can be told to reject inserts.
#[derive(Debug, Default)]
pub struct MemorySink {
    rigs: Mutex<Vec<Rig>>,
    reject: Mutex<Option<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every following insert with `reason`.
    pub fn reject_with(&self, reason: impl Into<String>) {
        *self.reject.lock() = Some(reason.into());
    }

    pub fn rigs(&self) -> Vec<Rig> {
        self.rigs.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.rigs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RigSink for MemorySink {
    fn insert_rigs(&self, rigs: &[Rig]) -> RigResult<()> {
        if let Some(reason) = self.reject.lock().as_deref() {
            return Err(RigError::resource(format!("sink rejected insert: {reason}")));
        }
        self.rigs.lock().extend_from_slice(rigs);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/publish/sink.rs"]
mod tests;
