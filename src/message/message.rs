use std::num::NonZeroU32;

use crate::buf::{Buffer, Iter};
use crate::protocol::{Flags, MessageType};
use crate::{MessageKind, OwnedMessage, Signature};

pub(crate) const DEFAULT_SERIAL: NonZeroU32 = match NonZeroU32::new(1) {
    Some(serial) => serial,
    None => unreachable!(),
};

/// A borrowed D-Bus message.
///
/// This is the borrowed variant of [`OwnedMessage`], to convert to an
/// [`OwnedMessage`], use [`Message::to_owned`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a> {
    /// The type of the message.
    pub(crate) kind: MessageKind<'a>,
    /// Serial of the message.
    pub(crate) serial: NonZeroU32,
    /// Flags in the message.
    pub(crate) flags: Flags,
    /// The interface of the message.
    pub(crate) interface: Option<&'a str>,
    /// The destination of the message.
    pub(crate) destination: Option<&'a str>,
    /// The sender of the message.
    pub(crate) sender: Option<&'a str>,
    /// The signature of the body.
    pub(crate) signature: &'a Signature,
    /// The raw, still-encoded body of the message.
    pub(crate) body: &'a [u8],
    /// The endianness the body was encoded with.
    pub(crate) endianness: crate::protocol::Endianness,
}

impl<'a> Message<'a> {
    /// Construct a method call [`Message`].
    pub fn method_call(path: &'a str, member: &'a str, serial: NonZeroU32) -> Self {
        Self {
            kind: MessageKind::MethodCall { path, member },
            serial,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: Signature::EMPTY,
            body: &[],
            endianness: crate::protocol::Endianness::NATIVE,
        }
    }

    /// Convert this message into a [`MessageKind::MethodReturn`] message with
    /// an empty body where the reply serial matches that of the current
    /// message.
    pub fn method_return(&self, serial: NonZeroU32) -> Self {
        Self {
            kind: MessageKind::MethodReturn {
                reply_serial: self.serial,
            },
            serial,
            flags: Flags::EMPTY,
            interface: None,
            destination: self.sender,
            sender: self.destination,
            signature: Signature::EMPTY,
            body: &[],
            endianness: self.endianness,
        }
    }

    /// Construct a signal [`Message`].
    #[must_use]
    pub fn signal(path: &'a str, member: &'a str, serial: NonZeroU32) -> Self {
        Self {
            kind: MessageKind::Signal { path, member },
            serial,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: Signature::EMPTY,
            body: &[],
            endianness: crate::protocol::Endianness::NATIVE,
        }
    }

    /// Convert this message into a [`MessageKind::Error`] message with
    /// an empty body where the reply serial matches that of the current
    /// message.
    #[must_use]
    pub fn error(&self, error_name: &'a str, serial: NonZeroU32) -> Self {
        Self {
            kind: MessageKind::Error {
                error_name,
                reply_serial: self.serial,
            },
            serial,
            flags: Flags::EMPTY,
            interface: None,
            destination: self.sender,
            sender: self.destination,
            signature: Signature::EMPTY,
            body: &[],
            endianness: self.endianness,
        }
    }

    /// Convert into an owned [`OwnedMessage`].
    #[inline]
    pub fn to_owned(&self) -> OwnedMessage {
        OwnedMessage {
            kind: self.kind.to_owned(),
            serial: self.serial,
            flags: self.flags,
            interface: self.interface.map(Box::from),
            destination: self.destination.map(Box::from),
            sender: self.sender.map(Box::from),
            signature: self.signature.to_owned(),
            body: self.body.into(),
            endianness: self.endianness,
        }
    }

    /// Get the kind of the message.
    #[must_use]
    pub fn kind(&self) -> MessageKind<'a> {
        self.kind
    }

    /// Get the object path of the message, for message kinds that carry one.
    #[must_use]
    pub fn path(&self) -> Option<&'a str> {
        match self.kind {
            MessageKind::MethodCall { path, .. } => Some(path),
            MessageKind::Signal { path, .. } => Some(path),
            MessageKind::MethodReturn { .. } | MessageKind::Error { .. } => None,
        }
    }

    /// Modify the body and signature of the message to match that of the
    /// provided body buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU32;
    ///
    /// use dbus_client::buf::Buffer;
    /// use dbus_client::{Endianness, Message, MessageKind, Signature};
    ///
    /// let mut body = Buffer::new(Endianness::NATIVE);
    /// body.append_string("Hello World!")?;
    ///
    /// let serial = NonZeroU32::new(1).unwrap();
    /// let m = Message::method_call("/org/freedesktop/DBus", "Hello", serial).with_body(&body);
    ///
    /// assert!(matches!(m.kind(), MessageKind::MethodCall { .. }));
    /// assert_eq!(m.signature(), Signature::STRING);
    /// # Ok::<_, dbus_client::Error>(())
    /// ```
    #[must_use]
    pub fn with_body(self, body: &'a Buffer) -> Self {
        Self {
            signature: body.signature(),
            body: body.as_bytes(),
            endianness: body.endianness(),
            ..self
        }
    }

    /// Get an iterator over the body of the message.
    #[must_use]
    pub fn body(&self) -> Iter<'a> {
        Iter::new(self.body, self.endianness)
    }

    /// Get the raw, still-encoded body of the message.
    #[must_use]
    pub fn body_bytes(&self) -> &'a [u8] {
        self.body
    }

    /// Get the serial of the message.
    #[must_use]
    pub fn serial(&self) -> NonZeroU32 {
        self.serial
    }

    /// Modify the serial of the message.
    #[must_use]
    pub fn with_serial(self, serial: NonZeroU32) -> Self {
        Self { serial, ..self }
    }

    /// Get the flags of the message.
    #[must_use]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Modify the flags of the message.
    #[must_use]
    pub fn with_flags(self, flags: Flags) -> Self {
        Self { flags, ..self }
    }

    /// Get the interface of the message.
    #[must_use]
    pub fn interface(&self) -> Option<&'a str> {
        self.interface
    }

    /// Modify the interface of the message.
    #[must_use]
    pub fn with_interface(self, interface: &'a str) -> Self {
        Self {
            interface: Some(interface),
            ..self
        }
    }

    /// Get the destination of the message.
    #[must_use]
    pub fn destination(&self) -> Option<&'a str> {
        self.destination
    }

    /// Modify the destination of the message.
    #[must_use]
    pub fn with_destination(self, destination: &'a str) -> Self {
        Self {
            destination: Some(destination),
            ..self
        }
    }

    /// Get the sender of the message.
    #[must_use]
    pub fn sender(&self) -> Option<&'a str> {
        self.sender
    }

    /// Modify the sender of the message.
    #[must_use]
    pub fn with_sender(self, sender: &'a str) -> Self {
        Self {
            sender: Some(sender),
            ..self
        }
    }

    /// Get the signature of the message body.
    #[must_use]
    pub fn signature(&self) -> &'a Signature {
        self.signature
    }

    pub(crate) fn message_type(&self) -> MessageType {
        match self.kind {
            MessageKind::MethodCall { .. } => MessageType::METHOD_CALL,
            MessageKind::MethodReturn { .. } => MessageType::METHOD_RETURN,
            MessageKind::Error { .. } => MessageType::ERROR,
            MessageKind::Signal { .. } => MessageType::SIGNAL,
        }
    }
}

impl PartialEq<OwnedMessage> for Message<'_> {
    #[inline]
    fn eq(&self, other: &OwnedMessage) -> bool {
        self.kind == other.kind
            && self.serial == other.serial
            && self.flags == other.flags
            && self.interface == other.interface.as_deref()
            && self.destination == other.destination.as_deref()
            && self.sender == other.sender.as_deref()
            && self.signature == &*other.signature
            && self.body == &*other.body
    }
}
