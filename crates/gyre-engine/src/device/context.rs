use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Process-unique identity of a GPU context.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpu-context#{}", self.0)
    }
}

/// Owner-side liveness token for one GPU context.
///
/// Held by whatever owns the logical device (`Gpu` for windows, `HeadlessGpu` for
/// offscreen work). The context is "current" until one of:
/// - the owner calls [`invalidate`](Self::invalidate)
/// - the token is dropped together with its owner
/// - wgpu reports the device as lost (see [`watch_device`](Self::watch_device))
///
/// Objects created under the context capture a [`ContextHandle`] and must not issue
/// release calls once the context is gone.
#[derive(Debug)]
pub struct ContextToken {
    id: ContextId,
    live: Arc<AtomicBool>,
}

impl ContextToken {
    pub fn new() -> Self {
        Self {
            id: ContextId::next(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Returns a handle that observes this context's liveness.
    pub fn handle(&self) -> ContextHandle {
        ContextHandle {
            id: self.id,
            live: Arc::clone(&self.live),
        }
    }

    #[inline]
    pub fn is_current(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Marks the context as torn down. Idempotent.
    pub fn invalidate(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            log::debug!("{} invalidated", self.id);
        }
    }

    /// Invalidates this context when wgpu reports `device` as lost.
    pub fn watch_device(&self, device: &wgpu::Device) {
        let id = self.id;
        let live = Arc::clone(&self.live);
        device.set_device_lost_callback(move |reason, message| {
            live.store(false, Ordering::Release);
            match reason {
                wgpu::DeviceLostReason::Destroyed => log::debug!("{id} destroyed"),
                _ => log::warn!("{id} lost ({reason:?}): {message}"),
            }
        });
    }
}

impl Default for ContextToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ContextToken {
    fn drop(&mut self) {
        self.invalidate();
    }
}

/// Observer of a [`ContextToken`], captured by GPU objects at construction.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    id: ContextId,
    live: Arc<AtomicBool>,
}

impl ContextHandle {
    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// True while the originating context has not been torn down or lost.
    #[inline]
    pub fn is_current(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_current() {
        let token = ContextToken::new();
        assert!(token.is_current());
        assert!(token.handle().is_current());
    }

    #[test]
    fn ids_are_unique() {
        let a = ContextToken::new();
        let b = ContextToken::new();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.handle().id(), a.id());
    }

    #[test]
    fn invalidate_is_observed_by_handles() {
        let token = ContextToken::new();
        let handle = token.handle();
        token.invalidate();
        assert!(!handle.is_current());
        // Second call is a no-op.
        token.invalidate();
        assert!(!token.is_current());
    }

    #[test]
    fn dropping_token_invalidates_handles() {
        let handle = {
            let token = ContextToken::new();
            token.handle()
        };
        assert!(!handle.is_current());
    }

    #[test]
    fn display_includes_numeric_id() {
        let token = ContextToken::new();
        assert_eq!(token.id().to_string(), format!("gpu-context#{}", token.id().get()));
    }
}
