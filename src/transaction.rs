//! File-backed resource update sessions.
//!
//! A [`ResourceTransaction`] locks an executable, buffers resource updates and deletions in issue order,
//! and applies them all at once on [`commit`](ResourceTransaction::commit). Nothing touches the target before commit.

use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{constants::*, errors::*, image::*, resource::*};

/// Single buffered change to the resources of the target.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceOperation {
    /// Set the data of a resource, replacing any existing data.
    Update {
        kind:     WORD,
        id:       WORD,
        language: LANGID,
        data:     Vec<u8>,
    },
    /// Remove a resource. Removing a resource that does not exist has no effect.
    Delete { kind: WORD, id: WORD, language: LANGID },
}
impl ResourceOperation {
    /// Returns the resource type, id and language the operation applies to.
    pub fn key(&self) -> (WORD, WORD, LANGID) {
        match *self {
            ResourceOperation::Update { kind, id, language, .. } => (kind, id, language),
            ResourceOperation::Delete { kind, id, language } => (kind, id, language),
        }
    }

    fn apply(self, directory: &mut ResourceDirectory) -> Result<(), ResourceError> {
        match self {
            ResourceOperation::Update { kind, id, language, data } => {
                directory.set_data(kind, id, language, ResourceData::new(data))?;
            }
            ResourceOperation::Delete { kind, id, language } => {
                if directory.remove_data(kind, id, language).is_none() {
                    debug!("resource {}/{}/{} not present, nothing deleted", kind, id, language);
                }
            }
        }
        Ok(())
    }
}

/// Exclusive resource editing session on an executable file.
///
/// Opening a session takes a lock file next to the target. The lock is released on commit, on discard,
/// after a rejected update and when the session is dropped.
#[derive(Debug)]
pub struct ResourceTransaction {
    target:     PathBuf,
    lock:       PathBuf,
    image:      Image<'static>,
    operations: Vec<ResourceOperation>,
    finished:   bool,
}
impl ResourceTransaction {
    /// Open an editing session on the executable at the given path.
    ///
    /// # Returns
    /// Returns an error if the target does not exist, is locked by another session, or is not a valid portable executable image.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TransactionError> {
        let target = path.as_ref().to_path_buf();
        let cannot_open = |reason: String| TransactionError::CannotOpenTarget(target.clone(), reason);

        if !target.is_file() {
            return Err(cannot_open("no such file".into()));
        }

        let lock = lock_path(&target);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock)
            .map_err(|e| cannot_open(format!("cannot lock {:?}: {}", lock, e)))?;
        debug!("locked {:?}", target);

        let image = match Image::parse_file(&target) {
            Ok(image) => image,
            Err(e) => {
                release(&lock);
                return Err(cannot_open(e.to_string()));
            }
        };

        Ok(Self {
            target,
            lock,
            image,
            operations: Vec::new(),
            finished: false,
        })
    }

    /// Schedule setting the data of the resource with the given type, id and language.
    /// An empty payload schedules a deletion instead.
    ///
    /// # Returns
    /// Returns an error if the session is no longer open, the type or id is 0, or the payload does not fit a 32 bit size.
    /// A rejected update discards the session.
    pub fn update(
        &mut self, kind: WORD, id: WORD, language: LANGID, data: &[u8],
    ) -> Result<(), TransactionError> {
        if data.is_empty() {
            return self.delete(kind, id, language);
        }
        self.check(kind, id, data.len())?;
        debug!("scheduled update {}/{}/{} ({} bytes)", kind, id, language, data.len());
        self.operations.push(ResourceOperation::Update {
            kind,
            id,
            language,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Schedule removing the resource with the given type, id and language.
    ///
    /// # Returns
    /// Returns an error if the session is no longer open or the type or id is 0.
    /// A rejected deletion discards the session.
    pub fn delete(&mut self, kind: WORD, id: WORD, language: LANGID) -> Result<(), TransactionError> {
        self.check(kind, id, 0)?;
        debug!("scheduled delete {}/{}/{}", kind, id, language);
        self.operations.push(ResourceOperation::Delete { kind, id, language });
        Ok(())
    }

    fn check(&mut self, kind: WORD, id: WORD, size: usize) -> Result<(), TransactionError> {
        let reason = if self.finished {
            "session already discarded".to_string()
        } else if kind == 0 || id == 0 {
            format!("invalid resource {}/{}", kind, id)
        } else if size > u32::MAX as usize {
            format!("resource {}/{} too large: {} bytes", kind, id, size)
        } else {
            return Ok(());
        };
        warn!("{}, discarding session on {:?}", reason, self.target);
        self.finish();
        Err(TransactionError::UpdateRejected(reason))
    }

    /// Returns the scheduled operations in issue order.
    pub fn operations(&self) -> &[ResourceOperation] { &self.operations }

    /// Returns the path of the target executable.
    pub fn target(&self) -> &Path { &self.target }

    /// Apply all scheduled operations to the target and release the lock.
    /// The target is left untouched if no operation was scheduled.
    ///
    /// # Returns
    /// Returns an error if the session was discarded or the updated image could not be built or written.
    /// After a failed commit the state of the target is unspecified.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        if self.finished {
            return Err(TransactionError::CommitFailed("session already discarded".into()));
        }
        let result = self.apply();
        self.finish();
        if result.is_ok() {
            info!("committed {} resource operations to {:?}", self.operations.len(), self.target);
        }
        result
    }

    fn apply(&mut self) -> Result<(), TransactionError> {
        if self.operations.is_empty() {
            debug!("no resource operations, {:?} left untouched", self.target);
            return Ok(());
        }
        let failed = |e: String| TransactionError::CommitFailed(e);

        let mut directory = self.image.resource_directory().cloned().unwrap_or_default();
        for operation in self.operations.iter().cloned() {
            operation.apply(&mut directory).map_err(|e| failed(e.to_string()))?;
        }
        self.image
            .set_resource_directory(directory)
            .map_err(|e| failed(e.to_string()))?;

        let temporary = sibling_path(&self.target, ".rsrcpatch.tmp");
        if let Err(e) = self.image.write_file(&temporary) {
            release(&temporary);
            return Err(failed(format!("cannot write {:?}: {}", temporary, e)));
        }
        if let Err(e) = fs::rename(&temporary, &self.target) {
            release(&temporary);
            return Err(failed(format!("cannot replace {:?}: {}", self.target, e)));
        }
        Ok(())
    }

    /// Drop all scheduled operations and release the lock. The target keeps its content.
    pub fn discard(mut self) {
        debug!("discarding {} resource operations on {:?}", self.operations.len(), self.target);
        self.finish();
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            release(&self.lock);
        }
    }
}
impl Drop for ResourceTransaction {
    fn drop(&mut self) { self.finish(); }
}

/// Returns the path of the lock file guarding the target.
pub fn lock_path(target: &Path) -> PathBuf { sibling_path(target, ".lock") }

fn sibling_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn release(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("failed to remove {:?}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_missing_resource_is_noop() {
        let mut directory = ResourceDirectory::default();
        directory
            .set_data(RT_ICON, 1, LANGUAGE_ID_EN_US, ResourceData::new(vec![1]))
            .unwrap();
        let before = directory.clone();
        ResourceOperation::Delete { kind: RT_ICON, id: 2, language: LANGUAGE_ID_EN_US }
            .apply(&mut directory)
            .unwrap();
        assert_eq!(directory, before);
    }

    #[test]
    fn operations_apply_in_order() {
        let mut directory = ResourceDirectory::default();
        let operations = [
            ResourceOperation::Update { kind: RT_RCDATA, id: 7, language: 0, data: vec![1, 2] },
            ResourceOperation::Delete { kind: RT_RCDATA, id: 7, language: 0 },
            ResourceOperation::Update { kind: RT_RCDATA, id: 7, language: 0, data: vec![3] },
        ];
        for operation in operations {
            operation.apply(&mut directory).unwrap();
        }
        assert_eq!(directory.get_data(RT_RCDATA, 7, 0).unwrap().data(), &[3]);
    }

    #[test]
    fn operation_key() {
        let operation = ResourceOperation::Update { kind: RT_ICON, id: 3, language: 9, data: vec![] };
        assert_eq!(operation.key(), (RT_ICON, 3, 9));
    }

    #[test]
    fn open_missing_target_fails() {
        let directory = tempfile::tempdir().unwrap();
        let target = directory.path().join("missing.exe");
        let result = ResourceTransaction::open(&target);
        assert!(matches!(result, Err(TransactionError::CannotOpenTarget(..))));
        assert!(!lock_path(&target).exists());
    }

    #[test]
    fn open_invalid_image_releases_lock() {
        let directory = tempfile::tempdir().unwrap();
        let target = directory.path().join("invalid.exe");
        fs::write(&target, b"not an executable").unwrap();
        let result = ResourceTransaction::open(&target);
        assert!(matches!(result, Err(TransactionError::CannotOpenTarget(..))));
        assert!(!lock_path(&target).exists());
    }

    #[test]
    fn lock_path_is_sibling() {
        let target = Path::new("/tmp/dir/app.exe");
        assert_eq!(lock_path(target), Path::new("/tmp/dir/app.exe.lock"));
    }
}
