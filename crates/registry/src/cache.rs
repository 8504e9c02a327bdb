//! Local persistence for the per-client user code.
//!
//! The cache is a port so process-wide state stays injectable: the
//! default backing is one file under the platform config directory,
//! tests use an in-memory fake.

use std::path::PathBuf;

/// Errors from the user-code cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config directory not available")]
    NoConfigDir,
}

/// Storage port for the cached user code.
pub trait CodeCache {
    /// The cached code, if one was ever stored.
    fn load(&self) -> Result<Option<String>, CacheError>;

    /// Persists `code` for later sessions.
    fn store(&self, code: &str) -> Result<(), CacheError>;
}

/// File-backed cache under the platform config directory.
pub struct DiskCache {
    path: PathBuf,
}

impl DiskCache {
    /// Default location: `<config>/dropcode/user_code`.
    pub fn new() -> Result<Self, CacheError> {
        let dir = config_dir().ok_or(CacheError::NoConfigDir)?;
        Ok(Self {
            path: dir.join("dropcode").join("user_code"),
        })
    }

    /// Cache backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CodeCache for DiskCache {
    fn load(&self) -> Result<Option<String>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let code = std::fs::read_to_string(&self.path)?;
        let code = code.trim();
        if code.is_empty() {
            Ok(None)
        } else {
            Ok(Some(code.to_string()))
        }
    }

    fn store(&self, code: &str) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, code)?;
        Ok(())
    }
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
