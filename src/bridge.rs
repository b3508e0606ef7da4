/// A host-supplied capability to post a job onto the thread that owns a
/// [`crate::Connection`].
///
/// A [`Connection`] is not thread-safe: it is driven synchronously by a
/// single owning thread through [`Connection::feed`] and the various
/// `Connection` methods. [`Bridge`] is how [`crate::ProxyCallbacks`] gets
/// work from another thread onto that owning thread, typically by pushing
/// onto a queue the owning thread's event loop already drains.
///
/// [`Connection`]: crate::Connection
/// [`Connection::feed`]: crate::Connection::feed
pub trait Bridge: Send + Sync {
    /// Schedule `job` to run on the thread that owns the connection.
    ///
    /// Implementations must not run `job` inline from within `post` itself
    /// unless `post` is already known to execute on the owning thread;
    /// doing otherwise reintroduces the cross-thread access `Bridge` exists
    /// to prevent.
    fn post(&self, job: Box<dyn FnOnce() + Send + 'static>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct ChannelBridge(mpsc::Sender<Box<dyn FnOnce() + Send + 'static>>);

    impl Bridge for ChannelBridge {
        fn post(&self, job: Box<dyn FnOnce() + Send + 'static>) {
            let _ = self.0.send(job);
        }
    }

    #[test]
    fn posted_job_is_observed_by_the_owner() {
        let (tx, rx) = mpsc::channel();
        let bridge = ChannelBridge(tx);
        bridge.post(Box::new(|| {}));
        assert!(rx.recv().is_ok());
    }
}
