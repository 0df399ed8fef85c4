//! # Write-Once Lazy Cell
//!
//! [`Lazy`] is the single primitive behind every derived aggregate in the
//! model (flag containers, model containers, constraint sets). It wraps
//! `std::sync::OnceLock<Result<T, E>>`:
//!
//! - at most one initializer runs, even under concurrent first access;
//! - success and failure are both memoized;
//! - a memoized failure is cloned out on every access.
//!
//! The initializer must not access the same cell. Container builders only
//! consult phase-1 registries, never their own cell, so this holds for
//! every use in the workspace.

use std::fmt;
use std::sync::OnceLock;

/// A write-once cell holding the outcome of a fallible computation.
pub struct Lazy<T, E> {
    cell: OnceLock<Result<T, E>>,
}

impl<T, E> Lazy<T, E> {
    /// An uninitialized cell.
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns `true` once an initializer has completed.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T, E: Clone> Lazy<T, E> {
    /// Return the memoized value, running `init` on first access.
    pub fn get_or_try_init<F>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match self.cell.get_or_init(init) {
            Ok(value) => Ok(value),
            Err(e) => Err(e.clone()),
        }
    }

    /// The memoized outcome, without triggering initialization.
    pub fn get(&self) -> Option<Result<&T, E>> {
        self.cell.get().map(|r| r.as_ref().map_err(Clone::clone))
    }
}

impl<T, E> Default for Lazy<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Lazy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(Ok(v)) => f.debug_tuple("Lazy").field(v).finish(),
            Some(Err(e)) => f.debug_tuple("Lazy::Failed").field(e).finish(),
            None => f.write_str("Lazy(<uninit>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_success_is_memoized() {
        let calls = AtomicUsize::new(0);
        let lazy: Lazy<u32, String> = Lazy::new();
        assert!(!lazy.is_initialized());
        for _ in 0..3 {
            let v = lazy
                .get_or_try_init(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lazy.is_initialized());
    }

    #[test]
    fn test_failure_is_memoized_and_cloned() {
        let calls = AtomicUsize::new(0);
        let lazy: Lazy<u32, String> = Lazy::new();
        let init = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("boom".to_string())
        };
        let first = lazy.get_or_try_init(init).unwrap_err();
        let second = lazy.get_or_try_init(|| Ok(1)).unwrap_err();
        assert_eq!(first, "boom");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_does_not_initialize() {
        let lazy: Lazy<u32, String> = Lazy::default();
        assert!(lazy.get().is_none());
        lazy.get_or_try_init(|| Ok(3)).unwrap();
        assert_eq!(lazy.get(), Some(Ok(&3)));
    }

    #[test]
    fn test_concurrent_first_access_runs_one_initializer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lazy: Arc<Lazy<usize, String>> = Arc::new(Lazy::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let calls = Arc::clone(&calls);
                let lazy = Arc::clone(&lazy);
                std::thread::spawn(move || {
                    *lazy
                        .get_or_try_init(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(i)
                        })
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_debug_reports_state() {
        let lazy: Lazy<u32, String> = Lazy::new();
        assert_eq!(format!("{lazy:?}"), "Lazy(<uninit>)");
        let _ = lazy.get_or_try_init(|| Err("x".into()));
        assert!(format!("{lazy:?}").contains("Failed"));
    }
}
