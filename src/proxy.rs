use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::Bridge;

/// A capability that marshals calls back onto the thread that owns a
/// [`crate::Connection`], for use by code running on another thread that
/// holds a cloned [`crate::Binding`] or similar shared handle.
///
/// If the calling thread is already the owning thread, the job runs inline;
/// otherwise it is handed to the [`Bridge`] to be run later.
#[derive(Clone)]
pub struct ProxyCallbacks {
    bridge: Arc<dyn Bridge>,
    owner: ThreadId,
}

impl ProxyCallbacks {
    /// Construct a [`ProxyCallbacks`] whose owning thread is the thread this
    /// is called from, i.e. the thread that owns the [`crate::Connection`].
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self {
            bridge,
            owner: thread::current().id(),
        }
    }

    /// Test whether the calling thread is the connection's owning thread.
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Run `job` on the owning thread, inline if already there, otherwise
    /// posted through the [`Bridge`].
    pub fn call<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_owner_thread() {
            job();
        } else {
            self.bridge.post(Box::new(job));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    struct ChannelBridge(mpsc::Sender<Box<dyn FnOnce() + Send + 'static>>);

    impl Bridge for ChannelBridge {
        fn post(&self, job: Box<dyn FnOnce() + Send + 'static>) {
            let _ = self.0.send(job);
        }
    }

    #[test]
    fn runs_inline_on_owner_thread() {
        let (tx, _rx) = mpsc::channel();
        let callbacks = ProxyCallbacks::new(Arc::new(ChannelBridge(tx)));
        let ran = AtomicBool::new(false);
        callbacks.call(move || ran.store(true, Ordering::SeqCst));
    }

    #[test]
    fn posts_through_bridge_from_another_thread() {
        let (tx, rx) = mpsc::channel();
        let callbacks = ProxyCallbacks::new(Arc::new(ChannelBridge(tx)));

        let handle = thread::spawn(move || {
            callbacks.call(|| {});
        });
        handle.join().unwrap();

        assert!(rx.recv().is_ok());
    }
}
