use giveaway_core::{CoreError, PrizeKey, ResourceError};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ordered queue of undistributed prize keys, backed by a newline-delimited
/// text file. Keys leave the pool exactly once, head first.
#[derive(Debug)]
pub struct KeyPool {
    keys: VecDeque<PrizeKey>,
    path: PathBuf,
    persist_awards: bool,
}

impl KeyPool {
    /// Read the key file, stripping whitespace and skipping blank lines.
    /// With `persist_awards` the backing file is rewritten on every award,
    /// so a restarted run reloads only the keys still unawarded.
    pub fn load(path: &Path, persist_awards: bool) -> Result<Self, CoreError> {
        let contents =
            fs::read_to_string(path).map_err(|source| ResourceError::KeyFileUnreadable {
                path: path.display().to_string(),
                source,
            })?;

        let keys: VecDeque<PrizeKey> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PrizeKey::new)
            .collect();

        info!("Loaded {} prize keys from {}", keys.len(), path.display());
        Ok(Self {
            keys,
            path: path.to_path_buf(),
            persist_awards,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn peek_next(&self) -> Option<&PrizeKey> {
        self.keys.front()
    }

    /// Remove and return the head key. With persistence on, the backing
    /// file is updated before the key is handed back: a crash in between
    /// leaves the key in the file to be awarded again, never the reverse.
    pub fn award(&mut self) -> Result<PrizeKey, CoreError> {
        let key = self.keys.pop_front().ok_or(CoreError::KeysExhausted)?;
        if self.persist_awards {
            self.rewrite_backing_file()?;
        }
        debug!("Awarded one key, {} remaining", self.keys.len());
        Ok(key)
    }

    fn rewrite_backing_file(&self) -> Result<(), CoreError> {
        let mut contents = self
            .keys
            .iter()
            .map(PrizeKey::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }

        // Write-then-rename keeps the file whole if the process dies mid-write.
        let tmp = self.path.with_extension("tmp");
        let unwritable = |source| ResourceError::KeyFileUnwritable {
            path: self.path.display().to_string(),
            source,
        };
        fs::write(&tmp, contents).map_err(unwritable)?;
        fs::rename(&tmp, &self.path).map_err(unwritable)?;
        Ok(())
    }
}
