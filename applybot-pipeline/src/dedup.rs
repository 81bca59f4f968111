//! Persisted set of processed job ids.
//!
//! On disk the store is a plain text file with one id per line. It is read
//! fully at start-up and afterwards only appended to, so a crash loses at
//! most the id being written.
use crate::filter::SeenJobs;
use applybot_common::Result;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    ids: HashSet<String>,
    file: File,
}

impl DedupStore {
    /// Open (creating if needed) the store at `path` and load every id in it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let ids: HashSet<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        // The next append must start on its own line.
        if !text.is_empty() && !text.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        tracing::info!(path = %path.display(), ids = ids.len(), "dedup store loaded");
        Ok(Self { path, ids, file })
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.ids.contains(job_id.trim())
    }

    /// Record `job_id`. Returns whether it was new; known ids are not
    /// written again.
    pub fn insert(&mut self, job_id: &str) -> Result<bool> {
        let id = job_id.trim();
        if id.is_empty() || id.contains('\n') || self.ids.contains(id) {
            return Ok(false);
        }
        let mut out = BufWriter::new(&self.file);
        writeln!(out, "{id}")?;
        out.flush()?;
        self.ids.insert(id.to_string());
        Ok(true)
    }

    /// Forget every id, on disk as well.
    pub fn reset(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.ids.clear();
        tracing::info!(path = %self.path.display(), "dedup store cleared");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeenJobs for DedupStore {
    fn contains(&self, job_id: &str) -> bool {
        DedupStore::contains(self, job_id)
    }
}
