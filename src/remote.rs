use std::num::NonZeroU32;

use crate::buf::Buffer;
use crate::error::{Error, ErrorKind, Result};
use crate::marshal::Marshaller;
use crate::org_freedesktop_dbus::properties;
use crate::protocol::Flags;
use crate::{Connection, MatchRule, Message, OwnedObjectPath, ReplySlot, Signature};

/// A client-side helper bound to a single remote object: a
/// (service, path, interface) triple used to build method calls, property
/// access, and signal subscriptions against it.
///
/// A [`Proxy`] holds no reference to a [`Connection`]; every operation that
/// actually touches the wire takes one explicitly, matching the rest of
/// this crate's host-driven design (the caller decides which connection,
/// and on which thread, a given message is sent through).
#[derive(Debug, Clone)]
pub struct Proxy {
    destination: Box<str>,
    path: OwnedObjectPath,
    interface: Option<Box<str>>,
}

impl Proxy {
    /// Construct a proxy for the remote object at `path` on `destination`.
    pub fn new(destination: impl Into<Box<str>>, path: OwnedObjectPath) -> Self {
        Self {
            destination: destination.into(),
            path,
            interface: None,
        }
    }

    /// Pin this proxy to a specific interface, used to qualify
    /// [`Proxy::get_property`]/[`Proxy::set_property`] and as the default
    /// `INTERFACE` header field for [`Proxy::method`].
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<Box<str>>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// The destination (service) name this proxy targets.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The object path this proxy targets.
    pub fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    /// The interface this proxy is pinned to, if any.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Build a method call to `member` on this proxy's object, with
    /// destination, path, and (if set) interface already filled in.
    ///
    /// Append arguments through [`Call::body_mut`] before calling
    /// [`Call::send`] or [`Call::send_with_reply`].
    pub fn method(&self, member: impl Into<Box<str>>) -> Call {
        let mut marshaller =
            Marshaller::method_call(self.path.to_string(), member).with_destination(self.destination.clone());

        if let Some(interface) = &self.interface {
            marshaller = marshaller.with_interface(interface.clone());
        }

        Call::new(marshaller)
    }

    /// Build a call to `org.freedesktop.DBus.Properties.Get` for the
    /// property `name` on this proxy's interface.
    ///
    /// Fails with [`ErrorKind::MissingInterface`] if this proxy was not
    /// constructed with [`Proxy::with_interface`].
    pub fn get_property(&self, name: impl Into<Box<str>>) -> Result<Call> {
        let interface = self
            .interface
            .as_deref()
            .ok_or_else(|| Error::new(ErrorKind::MissingInterface))?;

        let mut marshaller = Marshaller::method_call(self.path.to_string(), properties::GET)
            .with_destination(self.destination.clone())
            .with_interface(properties::INTERFACE);

        marshaller.body_mut().append_string(interface)?;
        marshaller.body_mut().append_string(&name.into())?;
        Ok(Call::new(marshaller))
    }

    /// Build a call to `org.freedesktop.DBus.Properties.Set` for the
    /// property `name`, opening a variant of `value_signature` for the
    /// caller to append the new value into through [`Call::body_mut`].
    ///
    /// The variant is closed automatically when the [`Call`] is sent.
    ///
    /// Fails with [`ErrorKind::MissingInterface`] if this proxy was not
    /// constructed with [`Proxy::with_interface`].
    pub fn set_property(&self, name: impl Into<Box<str>>, value_signature: &Signature) -> Result<Call> {
        let interface = self
            .interface
            .as_deref()
            .ok_or_else(|| Error::new(ErrorKind::MissingInterface))?;

        let mut marshaller = Marshaller::method_call(self.path.to_string(), properties::SET)
            .with_destination(self.destination.clone())
            .with_interface(properties::INTERFACE);

        marshaller.body_mut().append_string(interface)?;
        marshaller.body_mut().append_string(&name.into())?;
        marshaller.body_mut().begin_variant(value_signature)?;
        Ok(Call::with_open_variant(marshaller))
    }

    /// Build a match rule subscribing to `member` signals emitted from this
    /// proxy's path (and interface, if pinned).
    ///
    /// Register the returned rule with [`Connection::subscribe`]; the
    /// sender is deliberately left unfiltered, since for a proxy targeting
    /// a well-known name the signal's actual `sender` header is the
    /// emitter's unique name, not `destination`.
    pub fn signal(&self, member: impl Into<Box<str>>) -> MatchRule {
        let mut rule = MatchRule::new().with_member(member).with_path(self.path.to_string());

        if let Some(interface) = &self.interface {
            rule = rule.with_interface(interface.clone());
        }

        rule
    }
}

/// An in-progress method call built by [`Proxy::method`],
/// [`Proxy::get_property`], or [`Proxy::set_property`].
pub struct Call {
    marshaller: Marshaller,
    open_variant: bool,
}

impl Call {
    fn new(marshaller: Marshaller) -> Self {
        Self {
            marshaller,
            open_variant: false,
        }
    }

    fn with_open_variant(marshaller: Marshaller) -> Self {
        Self {
            marshaller,
            open_variant: true,
        }
    }

    /// Borrow the call's body to append arguments.
    pub fn body_mut(&mut self) -> &mut Buffer {
        self.marshaller.body_mut()
    }

    fn finish(&mut self) -> Result<()> {
        if self.open_variant {
            self.marshaller.body_mut().end_variant()?;
            self.open_variant = false;
        }

        Ok(())
    }

    /// Send this call without waiting for a reply, setting
    /// [`Flags::NO_REPLY_EXPECTED`] since nothing is registered to receive
    /// one.
    pub fn send(mut self, connection: &mut Connection) -> Result<NonZeroU32> {
        self.finish()?;
        self.marshaller.with_flags(Flags::NO_REPLY_EXPECTED).send(connection)
    }

    /// Send this call and register `on_reply` to be invoked with the
    /// matching `MethodReturn` or `Error`.
    pub fn send_with_reply<F>(mut self, connection: &mut Connection, on_reply: F) -> Result<ReplySlot>
    where
        F: for<'a> FnOnce(Message<'a>) + Send + 'static,
    {
        self.finish()?;
        self.marshaller.send_with_reply(connection, on_reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectPath;

    fn path() -> OwnedObjectPath {
        ObjectPath::new(b"/org/example/Thing").unwrap().to_owned()
    }

    #[test]
    fn method_fills_destination_path_and_interface() {
        let proxy = Proxy::new("org.example.Service", path()).with_interface("org.example.Thing");
        let mut call = proxy.method("Echo");
        call.body_mut().append_string("hi").unwrap();

        let mut connection = Connection::new(crate::sasl::Auth::new(1000), |_bytes| Ok(()));
        let serial = call.send(&mut connection).unwrap();
        assert_eq!(serial.get(), 1);
    }

    #[test]
    fn get_property_requires_an_interface() {
        let proxy = Proxy::new("org.example.Service", path());
        assert!(proxy.get_property("Enabled").is_err());
    }

    #[test]
    fn set_property_opens_and_closes_a_variant() {
        let proxy = Proxy::new("org.example.Service", path()).with_interface("org.example.Thing");
        let mut call = proxy.set_property("Enabled", Signature::BOOLEAN).unwrap();
        call.body_mut().append_bool(true).unwrap();

        let mut connection = Connection::new(crate::sasl::Auth::new(1000), |_bytes| Ok(()));
        assert!(call.send(&mut connection).is_ok());
    }

    #[test]
    fn signal_carries_path_and_interface_but_not_sender() {
        let proxy = Proxy::new("org.example.Service", path()).with_interface("org.example.Thing");
        let rule = proxy.signal("Status");
        assert_eq!(rule.path(), Some("/org/example/Thing"));
        assert_eq!(rule.interface(), Some("org.example.Thing"));
        assert_eq!(rule.sender(), None);
    }
}
