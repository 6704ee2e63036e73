use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Receives the overlay label. Fire-and-forget: no acknowledgment.
pub trait OverlaySink: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Emits the label to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOverlaySink;

impl OverlaySink for LogOverlaySink {
    fn set_text(&self, text: &str) {
        info!(label = text, "Overlay updated");
    }
}

/// Mirrors the label into a text file, for overlay sources that read from disk
#[derive(Debug, Clone)]
pub struct FileOverlaySink {
    path: PathBuf,
}

impl FileOverlaySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, text: &str) -> Result<(), String> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .map_err(|e| format!("Failed to create overlay directory: {}", e))?;
            }
        }

        // Write then rename so readers never see a half-written label
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text).map_err(|e| format!("Failed to write overlay file: {}", e))?;
        fs::rename(&tmp, &self.path).map_err(|e| format!("Failed to replace overlay file: {}", e))?;

        Ok(())
    }
}

impl OverlaySink for FileOverlaySink {
    fn set_text(&self, text: &str) {
        match self.write(text) {
            Ok(()) => info!(label = text, path = %self.path.display(), "Overlay updated"),
            Err(e) => warn!(path = %self.path.display(), "{}", e),
        }
    }
}
