//! Tracks metadata for a loading session.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::log;

/// Metadata for a loading session.
///
/// When the calling program first uses one of the API entry points, like
/// [`Loader::new()`](crate::Loader::new), there is no context yet where the
/// library may start to track things.  This struct provides that context.
///
/// A `Session` is cheap to clone; clones share the same warning counter, so a
/// caller can keep one around and look at [`Session::warnings`] after loading.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    log_enabled: bool,
    warnings: AtomicUsize,
}

impl Session {
    /// Creates a session whose logging is controlled by the `SVGDRAW_LOG` environment variable.
    pub fn new() -> Self {
        Self::new_with_logging(log::log_enabled())
    }

    /// Creates a session with logging explicitly turned on or off.
    pub fn new_with_logging(log_enabled: bool) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                log_enabled,
                warnings: AtomicUsize::new(0),
            }),
        }
    }

    #[cfg(test)]
    pub fn new_for_test_suite() -> Self {
        Self::new_with_logging(false)
    }

    pub fn log_enabled(&self) -> bool {
        self.inner.log_enabled
    }

    /// Number of non-fatal problems reported while loading.
    pub fn warnings(&self) -> usize {
        self.inner.warnings.load(Ordering::Relaxed)
    }

    /// Records a non-fatal problem and logs it if logging is enabled.
    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        self.inner.warnings.fetch_add(1, Ordering::Relaxed);
        svgdraw_log!(self, "{}", args);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("log_enabled", &self.log_enabled())
            .field("warnings", &self.warnings())
            .finish()
    }
}
