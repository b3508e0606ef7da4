use crate::{Message, MessageKind};

/// A filter describing which signals a subscriber is interested in,
/// mirroring the arguments accepted by `org.freedesktop.DBus.AddMatch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRule {
    sender: Option<Box<str>>,
    interface: Option<Box<str>>,
    member: Option<Box<str>>,
    path: Option<Box<str>>,
}

impl MatchRule {
    /// Construct a match rule with no filters set; it matches every signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match signals sent by `sender`.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<Box<str>>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Only match signals on `interface`.
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<Box<str>>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Only match signals named `member`.
    #[must_use]
    pub fn with_member(mut self, member: impl Into<Box<str>>) -> Self {
        self.member = Some(member.into());
        self
    }

    /// Only match signals emitted from `path`.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<Box<str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Test whether `message` satisfies every filter this rule carries that
    /// the message model is able to answer.
    pub fn matches(&self, message: &Message<'_>) -> bool {
        let MessageKind::Signal { path, member } = message.kind() else {
            return false;
        };

        if let Some(want) = &self.member {
            if member != &**want {
                return false;
            }
        }

        if let Some(want) = &self.interface {
            if message.interface() != Some(want) {
                return false;
            }
        }

        if let Some(want) = &self.sender {
            if message.sender() != Some(want) {
                return false;
            }
        }

        if let Some(want) = &self.path {
            if path != &**want {
                return false;
            }
        }

        true
    }

    /// Render this rule as a `org.freedesktop.DBus.AddMatch` rule string.
    pub fn to_rule_string(&self) -> String {
        let mut rule = String::from("type='signal'");

        if let Some(sender) = &self.sender {
            rule.push_str(",sender='");
            rule.push_str(sender);
            rule.push('\'');
        }

        if let Some(interface) = &self.interface {
            rule.push_str(",interface='");
            rule.push_str(interface);
            rule.push('\'');
        }

        if let Some(member) = &self.member {
            rule.push_str(",member='");
            rule.push_str(member);
            rule.push('\'');
        }

        if let Some(path) = &self.path {
            rule.push_str(",path='");
            rule.push_str(path);
            rule.push('\'');
        }

        rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    #[test]
    fn matches_on_member_and_interface() {
        let serial = NonZeroU32::new(1).unwrap();
        let message = Message::signal("/org/freedesktop/DBus", "NameOwnerChanged", serial)
            .with_interface("org.freedesktop.DBus")
            .with_sender("org.freedesktop.DBus");

        let rule = MatchRule::new()
            .with_member("NameOwnerChanged")
            .with_interface("org.freedesktop.DBus");
        assert!(rule.matches(&message));

        let rule = MatchRule::new().with_member("NameLost");
        assert!(!rule.matches(&message));
    }

    #[test]
    fn path_filter_rejects_signals_from_other_paths() {
        let serial = NonZeroU32::new(1).unwrap();
        let message = Message::signal("/org/example/Other", "Status", serial);

        let rule = MatchRule::new().with_path("/org/example/Thing");
        assert!(!rule.matches(&message));

        let rule = MatchRule::new().with_path("/org/example/Other");
        assert!(rule.matches(&message));
    }

    #[test]
    fn rejects_non_signal_messages() {
        let serial = NonZeroU32::new(1).unwrap();
        let message = Message::method_call("/", "m", serial);
        assert!(!MatchRule::new().matches(&message));
    }

    #[test]
    fn rule_string_contains_every_filter() {
        let rule = MatchRule::new()
            .with_sender("org.freedesktop.DBus")
            .with_interface("org.freedesktop.DBus")
            .with_member("NameOwnerChanged")
            .with_path("/org/freedesktop/DBus");

        let s = rule.to_rule_string();
        assert!(s.contains("type='signal'"));
        assert!(s.contains("sender='org.freedesktop.DBus'"));
        assert!(s.contains("member='NameOwnerChanged'"));
        assert!(s.contains("path='/org/freedesktop/DBus'"));
    }
}
