use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use filechat_protocol::{ChunkEvent, decode_chunk_content};
use tracing::{debug, warn};

use crate::TransferError;
use crate::validation::validate_file_name;

/// Result of feeding one chunk to a [`FileAssembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleOutcome {
    /// More chunks are expected for this file.
    Partial { file_name: String, received: u64 },
    /// The last chunk arrived; the file is at this path.
    Completed(PathBuf),
}

struct PartialFile {
    file_name: String,
    next_index: u64,
    part_path: PathBuf,
    final_path: PathBuf,
    file: File,
}

/// Rebuilds files from chunk events on the receiving side.
///
/// Chunks of one file must arrive in index order; chunks of different
/// files may interleave. Data is appended to a `.part` file which is
/// renamed into place when the last chunk arrives. Files are keyed by
/// `fileId` when the sender tags events, otherwise by `fileName`, in which
/// case two concurrent uploads with the same name collide. Tagged files
/// never replace an existing file: a taken name becomes `name (1).ext`.
pub struct FileAssembler {
    base_path: PathBuf,
    partial: HashMap<String, PartialFile>,
}

impl FileAssembler {
    /// Creates an assembler writing into `base_path`.
    pub fn new(base_path: &Path) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
            partial: HashMap::new(),
        }
    }

    /// Decodes `event` and appends it to its file.
    pub fn accept(&mut self, event: &ChunkEvent) -> Result<AssembleOutcome, TransferError> {
        validate_file_name(&event.file_name)?;
        let data = decode_chunk_content(&event.chunk_content)?;

        let key = match event.file_id {
            Some(id) => id.to_string(),
            None => event.file_name.clone(),
        };

        if event.chunk_index == 0 {
            self.begin(&key, event)?;
        }

        let mut entry = self
            .partial
            .remove(&key)
            .ok_or_else(|| TransferError::OutOfOrder {
                file: event.file_name.clone(),
                expected: 0,
                got: event.chunk_index,
            })?;

        if event.chunk_index != entry.next_index {
            let err = TransferError::OutOfOrder {
                file: entry.file_name.clone(),
                expected: entry.next_index,
                got: event.chunk_index,
            };
            self.partial.insert(key, entry);
            return Err(err);
        }

        entry.file.write_all(&data)?;
        entry.next_index += 1;

        if !event.is_last_chunk {
            let outcome = AssembleOutcome::Partial {
                file_name: entry.file_name.clone(),
                received: entry.next_index,
            };
            self.partial.insert(key, entry);
            return Ok(outcome);
        }

        entry.file.flush()?;
        drop(entry.file);
        std::fs::rename(&entry.part_path, &entry.final_path)?;
        debug!(
            file = %entry.file_name,
            chunks = entry.next_index,
            path = %entry.final_path.display(),
            "file assembled"
        );
        Ok(AssembleOutcome::Completed(entry.final_path))
    }

    fn begin(&mut self, key: &str, event: &ChunkEvent) -> Result<(), TransferError> {
        if let Some(stale) = self.partial.remove(key) {
            warn!(file = %stale.file_name, "restarting incomplete file");
            drop(stale.file);
            if let Err(e) = std::fs::remove_file(&stale.part_path) {
                warn!(path = %stale.part_path.display(), error = %e, "failed to remove partial file");
            }
        }

        let final_path = match event.file_id {
            Some(_) => self.unclaimed_path(&event.file_name),
            None => self.base_path.join(&event.file_name),
        };
        let part_name = match event.file_id {
            Some(id) => format!("{}.{id}.part", event.file_name),
            None => format!("{}.part", event.file_name),
        };
        let part_path = self.base_path.join(part_name);

        if let Some(parent) = part_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&part_path)?;

        self.partial.insert(
            key.to_string(),
            PartialFile {
                file_name: event.file_name.clone(),
                next_index: 0,
                part_path,
                final_path,
                file,
            },
        );
        Ok(())
    }

    /// `base_path/file_name`, or `stem (n).ext` when that path exists or
    /// another incomplete file will be renamed onto it.
    fn unclaimed_path(&self, file_name: &str) -> PathBuf {
        let wanted = self.base_path.join(file_name);
        let taken = |p: &Path| p.exists() || self.partial.values().any(|f| f.final_path == p);
        if !taken(wanted.as_path()) {
            return wanted;
        }

        let stem = wanted
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = wanted
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut n = 1u32;
        loop {
            let candidate = wanted.with_file_name(format!("{stem} ({n}){ext}"));
            if !taken(candidate.as_path()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Names of files that started but have not received their last chunk.
    pub fn incomplete(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .partial
            .values()
            .map(|p| p.file_name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Deletes every incomplete `.part` file. Returns how many were removed.
    pub fn discard_incomplete(&mut self) -> usize {
        let count = self.partial.len();
        for (_, stale) in self.partial.drain() {
            drop(stale.file);
            if let Err(e) = std::fs::remove_file(&stale.part_path) {
                warn!(path = %stale.part_path.display(), error = %e, "failed to remove partial file");
            }
        }
        count
    }

    /// Returns the output directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
