use crate::connection::Connection;
use crate::{Binding, ReplySlot};

/// Groups a set of [`Binding`], signal-match, and pending-reply
/// registrations made together, so they can be torn down as a single unit
/// with [`State::close`].
///
/// A [`State`] does not unregister anything on [`Drop`]; registrations made
/// through it remain active on the owning [`Connection`] until `close` is
/// called explicitly. This mirrors the rest of this crate's host-driven,
/// explicit-lifecycle design rather than relying on RAII across a boundary
/// the connection itself doesn't own.
#[derive(Default)]
pub struct State {
    bindings: Vec<Binding>,
    matches: Vec<u64>,
    replies: Vec<ReplySlot>,
}

impl State {
    /// Construct an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a binding so it is removed by [`State::close`].
    pub fn track_binding(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    /// Track a match-rule subscription id so it is removed by
    /// [`State::close`].
    pub fn track_match(&mut self, id: u64) {
        self.matches.push(id);
    }

    /// Track a pending reply so it is cancelled by [`State::close`], in case
    /// the group is torn down before the reply arrives.
    pub fn track_reply(&mut self, slot: ReplySlot) {
        self.replies.push(slot);
    }

    /// The bindings currently tracked by this group.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// The match-rule subscription ids currently tracked by this group.
    pub fn matches(&self) -> &[u64] {
        &self.matches
    }

    /// The pending-reply slots currently tracked by this group.
    pub fn replies(&self) -> &[ReplySlot] {
        &self.replies
    }

    /// Remove every binding, match-rule subscription, and pending reply
    /// tracked by this group from `connection`, in the reverse of the order
    /// they were registered.
    pub fn close(self, connection: &mut Connection) {
        for slot in self.replies.into_iter().rev() {
            connection.cancel_reply(&slot);
        }

        for id in self.matches.into_iter().rev() {
            connection.remove_match(id);
        }

        for binding in self.bindings.into_iter().rev() {
            connection.remove_binding(binding.path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_bindings_and_matches() {
        let mut state = State::new();
        let binding = Binding::new(crate::ObjectPath::new(b"/org/example").unwrap().to_owned());
        state.track_binding(binding);
        state.track_match(7);

        assert_eq!(state.bindings().len(), 1);
        assert_eq!(state.matches(), &[7]);
    }

    #[test]
    fn close_cancels_tracked_replies() {
        let mut connection = Connection::new(crate::sasl::Auth::new(1000), |_bytes| Ok(()));
        let marshaller = crate::Marshaller::method_call("/org/example", "Ping");
        let slot = marshaller.send_with_reply(&mut connection, |_reply| {}).unwrap();

        let mut state = State::new();
        state.track_reply(slot);
        assert_eq!(state.replies(), &[slot]);

        state.close(&mut connection);
        assert!(!connection.cancel_reply(&slot));
    }
}
