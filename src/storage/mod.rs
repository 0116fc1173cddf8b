mod record;

pub use record::*;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// CSV-backed store of submission records.
///
/// Rows are appended to the end of the file, never rewritten. All access goes
/// through one mutex, so appends are serialized and a reader never sees a
/// partially written row.
pub struct ReviewStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReviewStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with its header row if it is missing or empty.
    pub fn init(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.ensure_initialized()
    }

    pub fn append(&self, record: &SubmissionRecord) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.ensure_initialized()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        debug!(rating = record.rating, "appended review to {}", self.path.display());
        Ok(())
    }

    /// All records in insertion order. A missing or empty file yields no records.
    pub fn load_all(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        let _guard = self.guard();
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize::<SubmissionRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Atomically replaces the store with a header-only file.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        write_header(tmp.as_file_mut())?;
        tmp.persist(&self.path)?;

        info!("cleared review store at {}", self.path.display());
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), StoreError> {
        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if !needs_header {
            return Ok(());
        }

        std::fs::create_dir_all(self.parent_dir())?;
        let mut file = std::fs::File::create(&self.path)?;
        write_header(&mut file)?;
        info!("initialized review store at {}", self.path.display());
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn write_header<W: Write>(out: W) -> Result<(), StoreError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(COLUMNS)?;
    writer.flush()?;
    Ok(())
}

/// Serializes records as CSV with the store's header row.
pub fn to_csv<'a>(records: impl IntoIterator<Item = &'a SubmissionRecord>) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))
}
