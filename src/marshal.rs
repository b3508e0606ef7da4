use std::num::NonZeroU32;

use crate::buf::{padding_to, Buffer};
use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};
use crate::protocol::{Endianness, Flags, MessageType, Variant as HeaderField};
use crate::reply::ReplyCallback;
use crate::{ObjectPath, ReplySlot, Signature};

enum MarshalKind {
    MethodCall {
        path: Box<str>,
        member: Box<str>,
    },
    MethodReturn {
        reply_serial: NonZeroU32,
    },
    Error {
        error_name: Box<str>,
        reply_serial: NonZeroU32,
    },
    Signal {
        path: Box<str>,
        member: Box<str>,
    },
}

impl MarshalKind {
    fn message_type(&self) -> MessageType {
        match self {
            MarshalKind::MethodCall { .. } => MessageType::METHOD_CALL,
            MarshalKind::MethodReturn { .. } => MessageType::METHOD_RETURN,
            MarshalKind::Error { .. } => MessageType::ERROR,
            MarshalKind::Signal { .. } => MessageType::SIGNAL,
        }
    }
}

/// Builds a single outbound message, header and body together, ready to be
/// handed to a host transport through [`Connection::send_bytes`].
///
/// Unlike [`crate::Message`], which is a passive view over an already
/// encoded message, a [`Marshaller`] owns the [`Buffer`] its body is written
/// into and assembles the header fields required by the message kind when
/// [`Marshaller::encode`] is called.
pub struct Marshaller {
    kind: MarshalKind,
    flags: Flags,
    interface: Option<Box<str>>,
    destination: Option<Box<str>>,
    sender: Option<Box<str>>,
    endianness: Endianness,
    body: Buffer,
}

impl Marshaller {
    fn new(kind: MarshalKind) -> Self {
        Self {
            kind,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            endianness: Endianness::NATIVE,
            body: Buffer::new(Endianness::NATIVE),
        }
    }

    /// Build a method call to `member` on `path`.
    pub fn method_call(path: impl Into<Box<str>>, member: impl Into<Box<str>>) -> Self {
        Self::new(MarshalKind::MethodCall {
            path: path.into(),
            member: member.into(),
        })
    }

    /// Build a method return in reply to `reply_serial`.
    pub fn method_return(reply_serial: NonZeroU32) -> Self {
        Self::new(MarshalKind::MethodReturn { reply_serial })
    }

    /// Build an error reply named `error_name` in reply to `reply_serial`.
    pub fn error(error_name: impl Into<Box<str>>, reply_serial: NonZeroU32) -> Self {
        Self::new(MarshalKind::Error {
            error_name: error_name.into(),
            reply_serial,
        })
    }

    /// Build a signal emission of `member` from `path` on `interface`.
    pub fn signal(
        path: impl Into<Box<str>>,
        interface: impl Into<Box<str>>,
        member: impl Into<Box<str>>,
    ) -> Self {
        let mut m = Self::new(MarshalKind::Signal {
            path: path.into(),
            member: member.into(),
        });
        m.interface = Some(interface.into());
        m
    }

    /// Set the `INTERFACE` header field.
    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<Box<str>>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Set the `DESTINATION` header field.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<Box<str>>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Set the `SENDER` header field.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<Box<str>>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Set the message flags.
    #[must_use]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the byte order the message is encoded with.
    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self.body = Buffer::new(endianness);
        self
    }

    /// Borrow the body buffer to append arguments to.
    pub fn body_mut(&mut self) -> &mut Buffer {
        &mut self.body
    }

    fn validate(&self) -> Result<()> {
        match &self.kind {
            MarshalKind::MethodCall { path, member } => {
                if path.is_empty() {
                    return Err(Error::new(ErrorKind::MissingPath));
                }

                if member.is_empty() {
                    return Err(Error::new(ErrorKind::MissingMember));
                }
            }
            MarshalKind::MethodReturn { reply_serial } => {
                if reply_serial.get() == 0 {
                    return Err(Error::new(ErrorKind::ZeroReplySerial));
                }
            }
            MarshalKind::Error {
                error_name,
                reply_serial,
            } => {
                if error_name.is_empty() {
                    return Err(Error::new(ErrorKind::MissingErrorName));
                }

                if reply_serial.get() == 0 {
                    return Err(Error::new(ErrorKind::ZeroReplySerial));
                }
            }
            MarshalKind::Signal { path, member } => {
                if path.is_empty() {
                    return Err(Error::new(ErrorKind::MissingPath));
                }

                if member.is_empty() {
                    return Err(Error::new(ErrorKind::MissingMember));
                }

                if self.interface.as_deref().unwrap_or_default().is_empty() {
                    return Err(Error::new(ErrorKind::InvalidInterfaceName));
                }
            }
        }

        Ok(())
    }

    /// True unless this is something other than a method call that expects
    /// a reply, or [`Flags::NO_REPLY_EXPECTED`] was set.
    fn expects_reply(&self) -> bool {
        matches!(self.kind, MarshalKind::MethodCall { .. })
            && !(self.flags & Flags::NO_REPLY_EXPECTED)
    }

    fn encode_header_field(
        header: &mut Buffer,
        code: u8,
        value_signature: &Signature,
        encode_value: impl FnOnce(&mut Buffer) -> Result<()>,
    ) -> Result<()> {
        header.array_entry()?;
        header.begin_struct()?;
        header.append_byte(code)?;
        header.begin_variant(value_signature)?;
        encode_value(header)?;
        header.end_variant()?;
        header.end_struct()?;
        Ok(())
    }

    /// Assemble the complete wire representation of this message, assigning
    /// it `serial`.
    pub fn encode(&self, serial: NonZeroU32) -> Result<Vec<u8>> {
        self.validate()?;
        self.body.check_body_length()?;

        let mut header = Buffer::new(self.endianness);
        header.append_byte(self.endianness.0)?;
        header.append_byte(self.kind.message_type().0)?;
        header.append_byte(self.flags.0)?;
        header.append_byte(1)?;
        header.append_uint32(self.body.as_bytes().len() as u32)?;
        header.append_uint32(serial.get())?;

        header.begin_array(Signature::new_const(b"(yv)"))?;

        match &self.kind {
            MarshalKind::MethodCall { path, member } => {
                let path = ObjectPath::new(path.as_bytes())?;
                Self::encode_header_field(&mut header, HeaderField::PATH.0, Signature::OBJECT_PATH, |h| {
                    h.append_object_path(path)
                })?;
                Self::encode_header_field(&mut header, HeaderField::MEMBER.0, Signature::STRING, |h| {
                    h.append_string(member)
                })?;
            }
            MarshalKind::MethodReturn { reply_serial } => {
                Self::encode_header_field(
                    &mut header,
                    HeaderField::REPLY_SERIAL.0,
                    Signature::UINT32,
                    |h| h.append_uint32(reply_serial.get()),
                )?;
            }
            MarshalKind::Error {
                error_name,
                reply_serial,
            } => {
                Self::encode_header_field(&mut header, HeaderField::ERROR_NAME.0, Signature::STRING, |h| {
                    h.append_string(error_name)
                })?;
                Self::encode_header_field(
                    &mut header,
                    HeaderField::REPLY_SERIAL.0,
                    Signature::UINT32,
                    |h| h.append_uint32(reply_serial.get()),
                )?;
            }
            MarshalKind::Signal { path, member } => {
                let path = ObjectPath::new(path.as_bytes())?;
                Self::encode_header_field(&mut header, HeaderField::PATH.0, Signature::OBJECT_PATH, |h| {
                    h.append_object_path(path)
                })?;
                Self::encode_header_field(&mut header, HeaderField::MEMBER.0, Signature::STRING, |h| {
                    h.append_string(member)
                })?;
            }
        }

        if let Some(interface) = &self.interface {
            Self::encode_header_field(&mut header, HeaderField::INTERFACE.0, Signature::STRING, |h| {
                h.append_string(interface)
            })?;
        }

        if let Some(destination) = &self.destination {
            Self::encode_header_field(&mut header, HeaderField::DESTINATION.0, Signature::STRING, |h| {
                h.append_string(destination)
            })?;
        }

        if let Some(sender) = &self.sender {
            Self::encode_header_field(&mut header, HeaderField::SENDER.0, Signature::STRING, |h| {
                h.append_string(sender)
            })?;
        }

        if !self.body.signature().is_empty() {
            let signature = self.body.signature();
            Self::encode_header_field(&mut header, HeaderField::SIGNATURE.0, Signature::SIGNATURE, |h| {
                h.append_signature(signature)
            })?;
        }

        header.end_array()?;

        for _ in 0..padding_to(8, header.len()) {
            header.append_byte(0)?;
        }

        debug_assert_eq!(header.len() % 8, 0);

        let mut bytes = Vec::with_capacity(header.len() + self.body.as_bytes().len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(self.body.as_bytes());
        Ok(bytes)
    }

    /// Encode and hand this message to `connection`, without registering
    /// interest in a reply.
    pub fn send(self, connection: &mut Connection) -> Result<NonZeroU32> {
        let serial = connection.next_serial();
        let bytes = self.encode(serial)?;
        connection.send_bytes(&bytes)?;
        Ok(serial)
    }

    /// Encode and hand this message to `connection`, registering `on_reply`
    /// to be invoked once a matching `MethodReturn` or `Error` arrives.
    ///
    /// Only meaningful for method calls that do not carry
    /// [`Flags::NO_REPLY_EXPECTED`]; for any other message `on_reply` is
    /// still registered so the returned [`ReplySlot`] is always valid to
    /// cancel, but it will never be invoked since no reply can arrive.
    pub fn send_with_reply<F>(self, connection: &mut Connection, on_reply: F) -> Result<ReplySlot>
    where
        F: for<'a> FnOnce(crate::Message<'a>) + Send + 'static,
    {
        let serial = connection.next_serial();
        let bytes = self.encode(serial)?;
        connection.send_bytes(&bytes)?;
        let callback: ReplyCallback = Box::new(on_reply);
        Ok(connection.register_reply(serial, callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_call_encodes_path_and_member() -> Result<()> {
        let mut m = Marshaller::method_call("/org/freedesktop/DBus", "Hello")
            .with_destination("org.freedesktop.DBus")
            .with_interface("org.freedesktop.DBus");
        m.body_mut().append_string("hello")?;

        let serial = NonZeroU32::new(1).unwrap();
        let bytes = m.encode(serial)?;

        assert_eq!(bytes[0], Endianness::NATIVE.0);
        assert_eq!(bytes[1], MessageType::METHOD_CALL.0);
        assert_eq!(bytes[3], 1, "protocol version");
        Ok(())
    }

    #[test]
    fn method_call_requires_path_and_member() {
        let m = Marshaller::method_call("", "Hello");
        assert!(m.validate().is_err());

        let m = Marshaller::method_call("/org/freedesktop/DBus", "");
        assert!(m.validate().is_err());
    }

    #[test]
    fn signal_requires_interface() {
        let m = Marshaller::method_call("/org/freedesktop/DBus", "NameOwnerChanged");
        assert!(m.validate().is_ok());

        let mut m = Marshaller::signal("/org/freedesktop/DBus", "org.freedesktop.DBus", "x");
        m.interface = None;
        assert!(m.validate().is_err());
    }

    #[test]
    fn method_return_requires_nonzero_reply_serial() -> Result<()> {
        let serial = NonZeroU32::new(1).unwrap();
        let m = Marshaller::method_return(serial);
        m.validate()?;
        Ok(())
    }
}
