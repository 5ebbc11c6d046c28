//! Create-once analysis session guard.
//!
//! Analysis state is one instance per loaded binary. The first query
//! from any worker thread builds the instance; concurrent first-time
//! queries race, a single creator wins, and the others block until the
//! instance is ready and then share it. Steady-state queries go through
//! [`PacketAnalysis`] directly and never take this guard.

use std::sync::{Arc, OnceLock};

use crate::cache::PacketAnalysis;

/// Holds at most one [`PacketAnalysis`] for a binary's lifetime.
#[derive(Debug)]
pub struct AnalysisSession<S> {
    slot: OnceLock<Arc<PacketAnalysis<S>>>,
}

impl<S> AnalysisSession<S> {
    /// Creates an empty session.
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Returns the shared analysis instance, building it with `create`
    /// if this is the first query. Exactly one caller's `create` runs;
    /// everyone else blocks until it finishes and receives the same
    /// instance.
    pub fn get_or_create(&self, create: impl FnOnce() -> PacketAnalysis<S>) -> Arc<PacketAnalysis<S>> {
        Arc::clone(self.slot.get_or_init(|| Arc::new(create())))
    }

    /// The instance, if one has been built.
    pub fn get(&self) -> Option<Arc<PacketAnalysis<S>>> {
        self.slot.get().map(Arc::clone)
    }

    /// Returns true once the instance has been built.
    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<S> Default for AnalysisSession<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StreamSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_create_once_under_contention() {
        let session = Arc::new(AnalysisSession::<StreamSource>::new());
        let creations = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                let creations = Arc::clone(&creations);
                std::thread::spawn(move || {
                    session.get_or_create(|| {
                        creations.fetch_add(1, Ordering::SeqCst);
                        PacketAnalysis::new(StreamSource::new())
                    })
                })
            })
            .collect();

        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(creations.load(Ordering::SeqCst), 1);
        for pair in instances.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[test]
    fn test_get_before_create() {
        let session = AnalysisSession::<StreamSource>::new();
        assert!(!session.is_initialized());
        assert!(session.get().is_none());
        session.get_or_create(|| PacketAnalysis::new(StreamSource::new()));
        assert!(session.is_initialized());
        assert!(session.get().is_some());
    }
}
