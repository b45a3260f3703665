//! All-or-nothing file rewrites.
//!
//! Every modification of a tracked file goes to a temporary sibling
//! (`<file>.<pid>-<n>.tmp`) instead of the file itself. Reads made through the
//! same [`AtomicFile`] see the staged content. Nothing reaches the real path
//! until [`AtomicWriteRegistry::finalize_all`] syncs each staged file and
//! renames it over its target, so no reader ever sees a partial write.
//!
//! The registry is an explicit value created by the process entry point and
//! shared (cheaply cloned) with the database, the journal and the rules. If
//! any staged write fails, the registry refuses to finalize anything and the
//! temporary files are left on disk for inspection.
//!
//! ```rust,no_run
//! use tempo::libs::atomic_file::{AtomicFile, AtomicWriteRegistry};
//!
//! let registry = AtomicWriteRegistry::new();
//! AtomicFile::write(&registry, "/tmp/example.data", "inc 20200601T010000Z\n")?;
//! registry.finalize_all()?;
//! # Ok::<(), tempo::libs::error::AppError>(())
//! ```

use crate::libs::error::{AppError, AppResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Nothing staged; reads go to the real file.
    Inactive,
    /// The temporary file holds the complete new content.
    Written,
    /// The real file is to be deleted.
    Removed,
}

#[derive(Debug)]
struct Staged {
    real: PathBuf,
    temp: PathBuf,
    status: Status,
}

#[derive(Debug)]
struct RegistryState {
    files: Vec<Staged>,
    allow_atomics: bool,
    counter: u32,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            allow_atomics: true,
            counter: 0,
        }
    }
}

impl RegistryState {
    fn entry(&mut self, real: &Path) -> &mut Staged {
        let index = match self.files.iter().position(|f| f.real == real) {
            Some(index) => index,
            None => {
                self.counter += 1;
                let mut temp = real.as_os_str().to_owned();
                temp.push(format!(".{}-{}.tmp", std::process::id(), self.counter));
                self.files.push(Staged {
                    real: real.to_path_buf(),
                    temp: PathBuf::from(temp),
                    status: Status::Inactive,
                });
                self.files.len() - 1
            }
        };
        &mut self.files[index]
    }
}

/// Process-wide set of files with staged, not yet finalized changes.
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl AtomicWriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files with staged changes.
    pub fn pending(&self) -> usize {
        self.state.lock().files.iter().filter(|f| f.status != Status::Inactive).count()
    }

    pub fn is_healthy(&self) -> bool {
        self.state.lock().allow_atomics
    }

    /// Moves every staged file over its target and empties the registry.
    pub fn finalize_all(&self) -> AppResult<()> {
        let mut state = self.state.lock();
        if !state.allow_atomics {
            return Err(AppError::AtomicsDisabled);
        }

        // Flush everything first so a failure leaves every target untouched.
        for file in state.files.iter().filter(|f| f.status == Status::Written) {
            if let Err(e) = File::open(&file.temp).and_then(|f| f.sync_all()) {
                state.allow_atomics = false;
                return Err(e.into());
            }
        }

        for file in state.files.drain(..) {
            match file.status {
                Status::Written => {
                    debug!("Moving '{}' -> '{}'", file.temp.display(), file.real.display());
                    fs::rename(&file.temp, &file.real)?;
                }
                Status::Removed => {
                    debug!("Removing '{}'", file.real.display());
                    if file.real.exists() {
                        fs::remove_file(&file.real)?;
                    }
                }
                Status::Inactive => {}
            }
        }

        Ok(())
    }

    /// Discards every staged change.
    ///
    /// Temporary files are deleted unless a write failed, in which case they
    /// stay on disk for inspection.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let keep_temps = !state.allow_atomics;
        for file in state.files.drain(..) {
            if !keep_temps && file.temp.exists() {
                let _ = fs::remove_file(&file.temp);
            }
        }
        state.allow_atomics = true;
    }

    fn with_entry<T>(&self, path: &Path, f: impl FnOnce(&mut Staged) -> std::io::Result<T>) -> AppResult<T> {
        let mut state = self.state.lock();
        let result = f(state.entry(path));
        if result.is_err() {
            state.allow_atomics = false;
        }
        result.map_err(AppError::from)
    }
}

/// A handle on one path whose writes are staged in `registry`.
#[derive(Debug, Clone)]
pub struct AtomicFile {
    registry: AtomicWriteRegistry,
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(registry: &AtomicWriteRegistry, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
            _ => path.to_path_buf(),
        };
        Self {
            registry: registry.clone(),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Whether the real file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size of the content as currently seen through this handle.
    pub fn size(&self) -> AppResult<u64> {
        let mut state = self.registry.state.lock();
        let entry = state.entry(&self.path);
        let size = match entry.status {
            Status::Written => fs::metadata(&entry.temp)?.len(),
            Status::Removed => 0,
            Status::Inactive => fs::metadata(&entry.real)?.len(),
        };
        Ok(size)
    }

    pub fn read_string(&self) -> AppResult<String> {
        let mut state = self.registry.state.lock();
        let entry = state.entry(&self.path);
        let source = match entry.status {
            Status::Written => &entry.temp,
            Status::Removed => return Ok(String::new()),
            Status::Inactive => &entry.real,
        };
        match fs::read_to_string(source) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_lines(&self) -> AppResult<Vec<String>> {
        Ok(self.read_string()?.lines().map(str::to_string).collect())
    }

    /// Stages an empty file.
    pub fn truncate(&self) -> AppResult<()> {
        self.registry.with_entry(&self.path, |entry| {
            File::create(&entry.temp)?;
            entry.status = Status::Written;
            Ok(())
        })
    }

    /// Stages the current content followed by `content`.
    pub fn append(&self, content: &str) -> AppResult<()> {
        self.registry.with_entry(&self.path, |entry| {
            if entry.status != Status::Written {
                if entry.status == Status::Inactive && entry.real.exists() {
                    fs::copy(&entry.real, &entry.temp)?;
                } else {
                    File::create(&entry.temp)?;
                }
                entry.status = Status::Written;
            }
            let mut file = OpenOptions::new().append(true).open(&entry.temp)?;
            file.write_all(content.as_bytes())
        })
    }

    /// Writes `content` to the staged file without copying the real file first.
    pub fn write_raw(&self, content: &str) -> AppResult<()> {
        self.registry.with_entry(&self.path, |entry| {
            if entry.status != Status::Written {
                File::create(&entry.temp)?;
                entry.status = Status::Written;
            }
            let mut file = OpenOptions::new().append(true).open(&entry.temp)?;
            file.write_all(content.as_bytes())
        })
    }

    /// Stages deletion of the real file.
    pub fn remove(&self) -> AppResult<()> {
        self.registry.with_entry(&self.path, |entry| {
            if entry.temp.exists() {
                fs::remove_file(&entry.temp)?;
            }
            entry.status = Status::Removed;
            Ok(())
        })
    }

    /// Flushes the staged content to disk.
    pub fn close(&self) -> AppResult<()> {
        self.registry.with_entry(&self.path, |entry| {
            if entry.status == Status::Written {
                File::open(&entry.temp)?.sync_all()?;
            }
            Ok(())
        })
    }

    /// Stages `content` as the complete new content of `path`.
    pub fn write(registry: &AtomicWriteRegistry, path: impl AsRef<Path>, content: &str) -> AppResult<()> {
        let file = AtomicFile::new(registry, path);
        file.truncate()?;
        file.write_raw(content)
    }

    /// Stages `lines`, each terminated by a newline, as the new content of `path`.
    pub fn write_lines(registry: &AtomicWriteRegistry, path: impl AsRef<Path>, lines: &[String]) -> AppResult<()> {
        let mut content = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        Self::write(registry, path, &content)
    }

    /// Stages `content` at the end of `path`, on top of anything already
    /// staged for it in this registry.
    pub fn append_to(registry: &AtomicWriteRegistry, path: impl AsRef<Path>, content: &str) -> AppResult<()> {
        AtomicFile::new(registry, path).append(content)
    }

    pub fn read(registry: &AtomicWriteRegistry, path: impl AsRef<Path>) -> AppResult<String> {
        AtomicFile::new(registry, path).read_string()
    }

    pub fn read_all_lines(registry: &AtomicWriteRegistry, path: impl AsRef<Path>) -> AppResult<Vec<String>> {
        AtomicFile::new(registry, path).read_lines()
    }
}
