//! Process-wide engine handle registry.
//!
//! Resolving the engine binary and verifying its language inventory costs a
//! subprocess round-trip; doing it once per extraction would be wasted work
//! for batch callers. The registry keeps a single shared handle with the
//! lifecycle `uninitialized -> initializing -> ready -> disposed`:
//! [`acquire`] performs initialization exactly once and hands out clones of
//! the ready handle, [`dispose`] resets the slot so the next `acquire`
//! starts over. A failed initialization leaves the slot uninitialized.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::backend::EngineError;

/// A resolved, verified recognition engine installation.
#[derive(Debug)]
pub struct EngineHandle {
    binary: PathBuf,
    languages: Vec<String>,
}

impl EngineHandle {
    /// Resolve the engine binary and read its installed language profiles.
    async fn initialize() -> Result<Self, EngineError> {
        let binary = which::which("tesseract").map_err(|_| {
            EngineError::Unavailable("tesseract not found (install tesseract-ocr)".to_string())
        })?;

        let output = tokio::process::Command::new(&binary)
            .arg("--list-langs")
            .output()
            .await?;

        if !output.status.success() {
            return Err(EngineError::InitFailed(format!(
                "tesseract --list-langs failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // The first line is a banner ("List of available languages (N):").
        let languages: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.ends_with(':'))
            .map(String::from)
            .collect();

        tracing::debug!(binary = %binary.display(), languages = languages.len(), "engine handle ready");
        Ok(Self { binary, languages })
    }

    /// Path of the resolved engine binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Installed language profiles.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Whether a language profile is installed.
    pub fn has_language(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }
}

/// One mutex-guarded handle slot. The lock is held for the whole
/// initialization, so concurrent first callers wait on a single
/// initialization instead of racing their own.
struct Slot {
    inner: Mutex<Option<Arc<EngineHandle>>>,
}

impl Slot {
    const fn new() -> Self {
        Self {
            inner: Mutex::const_new(None),
        }
    }

    async fn acquire_with<F, Fut>(&self, init: F) -> Result<Arc<EngineHandle>, EngineError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<EngineHandle, EngineError>>,
    {
        let mut slot = self.inner.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(init().await?);
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    async fn dispose(&self) -> bool {
        self.inner.lock().await.take().is_some()
    }
}

static ENGINE: Slot = Slot::new();

/// Get the shared engine handle, initializing it on first use.
pub async fn acquire() -> Result<Arc<EngineHandle>, EngineError> {
    ENGINE.acquire_with(EngineHandle::initialize).await
}

/// Drop the shared engine handle. Returns whether a handle was held; the
/// next [`acquire`] re-initializes from scratch.
pub async fn dispose() -> bool {
    ENGINE.dispose().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn fake_handle() -> EngineHandle {
        EngineHandle {
            binary: PathBuf::from("/usr/bin/true"),
            languages: vec!["eng".to_string(), "deu".to_string()],
        }
    }

    #[tokio::test]
    async fn test_acquire_initializes_once() {
        let slot = Slot::new();
        let inits = AtomicUsize::new(0);

        let a = slot
            .acquire_with(|| async {
                inits.fetch_add(1, Ordering::SeqCst);
                Ok(fake_handle())
            })
            .await
            .unwrap();
        let b = slot
            .acquire_with(|| async {
                inits.fetch_add(1, Ordering::SeqCst);
                Ok(fake_handle())
            })
            .await
            .unwrap();

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_dispose_resets_slot() {
        let slot = Slot::new();
        let inits = AtomicUsize::new(0);

        assert!(!slot.dispose().await);

        let _ = slot
            .acquire_with(|| async {
                inits.fetch_add(1, Ordering::SeqCst);
                Ok(fake_handle())
            })
            .await
            .unwrap();
        assert!(slot.dispose().await);

        let _ = slot
            .acquire_with(|| async {
                inits.fetch_add(1, Ordering::SeqCst);
                Ok(fake_handle())
            })
            .await
            .unwrap();
        assert_eq!(inits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_init_leaves_slot_empty() {
        let slot = Slot::new();

        let first = slot
            .acquire_with(|| async { Err(EngineError::Unavailable("missing".to_string())) })
            .await;
        assert!(first.is_err());

        // A later acquire retries initialization rather than caching the failure.
        let second = slot.acquire_with(|| async { Ok(fake_handle()) }).await;
        assert!(second.is_ok());
    }

    #[test]
    fn test_handle_language_lookup() {
        let handle = fake_handle();
        assert!(handle.has_language("eng"));
        assert!(!handle.has_language("fra"));
    }
}
