//! Debug-only reentrancy guard.
//!
//! Map operations call into the user's relation while cache and store
//! borrows are live. A relation that calls back into the same map would
//! observe (or corrupt) half-updated state, so every public entry point
//! enters this guard with the name of the operation. In debug builds a
//! nested entry panics and names both operations. In release builds the
//! guard is a zero-sized no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-instance tracker. Embed it in a map and guard entry points with
/// `let _g = self.reentrancy.enter("resolve");`.
#[derive(Debug)]
pub struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded by construction, like the maps that embed it.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the returned guard drops.
    ///
    /// Panics in debug builds if another operation on the same instance is
    /// still running.
    #[inline]
    pub fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!(
                    "reentrant call to `{}` while `{}` is running; \
                     the containment relation must not call back into the map",
                    op, outer
                );
            }
            self.active.set(Some(op));
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return ReentrancyGuard { _z: PhantomData };
        }
    }

    /// Name of the operation currently inside the guard.
    #[cfg(all(test, debug_assertions))]
    pub fn active(&self) -> Option<&'static str> {
        self.active.get()
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`DebugReentrancy::enter`].
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let prev = self.owner.active.take();
            debug_assert!(prev.is_some());
        }
    }
}
