use std::num::NonZeroU32;

use crate::message::OwnedMessageKind;
use crate::protocol::{Endianness, Flags};
use crate::{Message, MessageKind, OwnedSignature};

/// An owned D-Bus message.
///
/// This is the owned variant of a [`Message`], to convert to a [`Message`],
/// use [`OwnedMessage::borrow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedMessage {
    /// The type of the message.
    pub(super) kind: OwnedMessageKind,
    /// Serial of the message.
    pub(super) serial: NonZeroU32,
    /// Flags in the message.
    pub(super) flags: Flags,
    /// The interface of the message.
    pub(super) interface: Option<Box<str>>,
    /// The destination of the message.
    pub(super) destination: Option<Box<str>>,
    /// The sender of the message.
    pub(super) sender: Option<Box<str>>,
    /// The signature of the body.
    pub(super) signature: OwnedSignature,
    /// The body associated with the message.
    pub(super) body: Box<[u8]>,
    /// The endianness the body was encoded with.
    pub(super) endianness: Endianness,
}

impl OwnedMessage {
    /// Construct a method call.
    pub fn method_call(path: Box<str>, member: Box<str>, serial: NonZeroU32) -> Self {
        Self {
            kind: OwnedMessageKind::MethodCall { path, member },
            serial,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: OwnedSignature::new(),
            body: Box::from([]),
            endianness: Endianness::NATIVE,
        }
    }

    /// Convert this message into a [`MessageKind::MethodReturn`] message with
    /// an empty body where the reply serial matches that of the current
    /// message.
    pub fn method_return(self, serial: NonZeroU32) -> Self {
        Self {
            kind: OwnedMessageKind::MethodReturn {
                reply_serial: self.serial,
            },
            serial,
            flags: Flags::EMPTY,
            signature: OwnedSignature::new(),
            interface: None,
            destination: self.sender,
            sender: self.destination,
            body: Box::from([]),
            endianness: self.endianness,
        }
    }

    /// Construct a signal [`OwnedMessage`].
    pub fn signal(path: Box<str>, member: Box<str>, serial: NonZeroU32) -> Self {
        Self {
            kind: OwnedMessageKind::Signal { path, member },
            serial,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: OwnedSignature::new(),
            body: Box::from([]),
            endianness: Endianness::NATIVE,
        }
    }

    /// Convert this message into a [`MessageKind::Error`] message with
    /// an empty body where the reply serial matches that of the current
    /// message.
    pub fn error(self, error_name: Box<str>, serial: NonZeroU32) -> Self {
        Self {
            kind: OwnedMessageKind::Error {
                error_name,
                reply_serial: self.serial,
            },
            serial,
            flags: Flags::EMPTY,
            signature: OwnedSignature::new(),
            interface: None,
            destination: self.sender,
            sender: self.destination,
            body: Box::from([]),
            endianness: self.endianness,
        }
    }

    /// Borrow into a [`Message`].
    pub fn borrow(&self) -> Message<'_> {
        Message {
            kind: self.kind.borrow(),
            serial: self.serial,
            flags: self.flags,
            interface: self.interface.as_deref(),
            destination: self.destination.as_deref(),
            sender: self.sender.as_deref(),
            signature: &self.signature,
            body: &self.body,
            endianness: self.endianness,
        }
    }

    /// Get the kind of the message.
    pub fn kind(&self) -> MessageKind<'_> {
        self.kind.borrow()
    }

    /// Get the object path of the message, for message kinds that carry one.
    pub fn path(&self) -> Option<&str> {
        match &self.kind {
            OwnedMessageKind::MethodCall { path, .. } => Some(path),
            OwnedMessageKind::Signal { path, .. } => Some(path),
            OwnedMessageKind::MethodReturn { .. } | OwnedMessageKind::Error { .. } => None,
        }
    }

    /// Modify the body and signature of the message to match that of the
    /// provided body buffer.
    pub fn with_body_buf(self, body: &crate::buf::Buffer) -> Self {
        self.with_signature(body.signature().to_owned())
            .with_body(body.as_bytes().into())
    }

    /// Get an iterator over the body of the message.
    pub fn body(&self) -> crate::buf::Iter<'_> {
        crate::buf::Iter::new(&self.body, self.endianness)
    }

    /// Get the raw, still-encoded body of the message.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Modify the body of the message.
    pub fn with_body(self, body: Box<[u8]>) -> Self {
        Self { body, ..self }
    }

    /// Modify the signature associated with the body of the message.
    pub fn with_signature(self, signature: OwnedSignature) -> Self {
        Self { signature, ..self }
    }

    /// Get the serial of the message.
    pub fn serial(&self) -> NonZeroU32 {
        self.serial
    }

    /// Modify the serial of the message.
    pub fn with_serial(self, serial: NonZeroU32) -> Self {
        Self { serial, ..self }
    }

    /// Get the flags of the message.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Modify the flags of the message.
    pub fn with_flags(self, flags: Flags) -> Self {
        Self { flags, ..self }
    }

    /// Get the interface of the message.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Modify the interface of the message.
    pub fn with_interface(self, interface: Box<str>) -> Self {
        Self {
            interface: Some(interface),
            ..self
        }
    }

    /// Get the destination of the message.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Modify the destination of the message.
    pub fn with_destination(self, destination: Box<str>) -> Self {
        Self {
            destination: Some(destination),
            ..self
        }
    }

    /// Get the sender of the message.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Modify the sender of the message.
    pub fn with_sender(self, sender: Box<str>) -> Self {
        Self {
            sender: Some(sender),
            ..self
        }
    }

    /// Get the signature of the message body.
    pub fn signature(&self) -> &crate::Signature {
        &self.signature
    }
}

impl PartialEq<Message<'_>> for OwnedMessage {
    #[inline]
    fn eq(&self, other: &Message<'_>) -> bool {
        other == self
    }
}
