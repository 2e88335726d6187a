use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared state between the run and the interrupt handler. Exactly one
/// archive is in flight per run: its path is tracked from the moment the
/// destination is known until verification confirms it, and the handler's
/// only contract is to delete that path before terminating.
#[derive(Clone, Default)]
pub struct CleanupContext {
    interrupt_flag: Arc<AtomicBool>,
    current_archive: Arc<Mutex<Option<PathBuf>>>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an interrupt has been requested
    pub fn is_interrupted(&self) -> bool {
        self.interrupt_flag.load(Ordering::SeqCst)
    }

    /// Set interrupt state (used by the signal handler and tests)
    pub fn set_interrupted(&self, interrupted: bool) {
        self.interrupt_flag.store(interrupted, Ordering::SeqCst);
    }

    /// Start tracking an in-progress archive for cleanup
    pub fn track(&self, archive: &Path) {
        if let Ok(mut current) = self.current_archive.lock() {
            *current = Some(archive.to_path_buf());
        }
    }

    /// Stop tracking: the archive is confirmed valid and must be kept
    pub fn finish(&self) {
        if let Ok(mut current) = self.current_archive.lock() {
            *current = None;
        }
    }

    /// The currently tracked archive path, if any
    pub fn current(&self) -> Option<PathBuf> {
        self.current_archive
            .lock()
            .ok()
            .and_then(|current| current.clone())
    }

    /// Delete the tracked archive if it exists, then clear tracking.
    /// Returns the removed path so callers can report it.
    pub fn remove_current(&self) -> Option<PathBuf> {
        let path = self.current()?;
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                eprintln!(
                    "Warning: could not remove incomplete archive {}: {e}",
                    path.display()
                );
            }
        }
        self.finish();
        Some(path)
    }
}
