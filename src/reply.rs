use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::Message;

/// A callback invoked with the `MethodReturn` or `Error` message that
/// completes a pending method call.
///
/// The message borrows from the receive buffer that is currently being
/// parsed, so the callback must not attempt to retain it; use
/// [`Message::to_owned`] if the reply needs to outlive the call.
pub(crate) type ReplyCallback = Box<dyn for<'a> FnOnce(Message<'a>) + Send>;

/// A handle to a method call awaiting a reply.
///
/// Dropping a [`ReplySlot`] does not cancel the call; use
/// [`crate::Connection::cancel_reply`] to stop waiting for a reply that is
/// no longer needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplySlot {
    serial: NonZeroU32,
}

impl ReplySlot {
    pub(crate) fn new(serial: NonZeroU32) -> Self {
        Self { serial }
    }

    /// The serial of the method call this slot is waiting on a reply for.
    pub fn serial(&self) -> NonZeroU32 {
        self.serial
    }
}

/// The set of method calls a [`crate::Connection`] is currently waiting on
/// replies for, keyed by the serial of the originating call.
#[derive(Default)]
pub(crate) struct ReplyTable {
    slots: HashMap<NonZeroU32, ReplyCallback>,
}

impl ReplyTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    pub(crate) fn register(&mut self, serial: NonZeroU32, callback: ReplyCallback) -> ReplySlot {
        self.slots.insert(serial, callback);
        ReplySlot::new(serial)
    }

    pub(crate) fn cancel(&mut self, slot: &ReplySlot) -> bool {
        self.slots.remove(&slot.serial).is_some()
    }

    pub(crate) fn take(&mut self, reply_serial: NonZeroU32) -> Option<ReplyCallback> {
        self.slots.remove(&reply_serial)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn register_then_take_invokes_once() {
        let serial = NonZeroU32::new(7).unwrap();
        let seen = Rc::new(RefCell::new(false));
        let seen_clone = seen.clone();

        let mut table = ReplyTable::new();
        let slot = table.register(
            serial,
            Box::new(move |_message| {
                *seen_clone.borrow_mut() = true;
            }),
        );
        assert_eq!(slot.serial(), serial);
        assert_eq!(table.len(), 1);

        let callback = table.take(serial).expect("registered callback");
        let owned = crate::Message::method_call("/", "m", serial).to_owned();
        callback(owned.borrow());
        assert!(*seen.borrow());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn cancel_removes_pending_slot() {
        let serial = NonZeroU32::new(3).unwrap();
        let mut table = ReplyTable::new();
        let slot = table.register(serial, Box::new(|_| {}));
        assert!(table.cancel(&slot));
        assert!(table.take(serial).is_none());
    }
}
