use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

use crate::buf::Iter;
use crate::error::{Error, ErrorKind, Result};
use crate::interface::MethodError;
use crate::marshal::Marshaller;
use crate::match_rule::MatchRule;
use crate::message::DEFAULT_SERIAL;
use crate::org_freedesktop_dbus;
use crate::protocol::{Flags, MessageType, Variant as HeaderField};
use crate::reply::{ReplyCallback, ReplyTable};
use crate::sasl::Auth;
use crate::{Binding, Message, MessageKind, ObjectPath, OwnedObjectPath, ReplySlot, Signature};

/// The high level state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, nothing has been sent or received yet.
    Created,
    /// The SASL handshake is in progress.
    ParsingAuth,
    /// The SASL handshake completed; the `Hello` call has not been sent yet.
    Authed,
    /// `Hello` has been sent and a unique name is awaited.
    HelloSent,
    /// Authenticated, named, and ready to exchange arbitrary messages.
    Connected,
    /// The connection has been closed and must not be used further.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Created => "created",
            ConnectionState::ParsingAuth => "parsing-auth",
            ConnectionState::Authed => "authed",
            ConnectionState::HelloSent => "hello-sent",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        })
    }
}

type SignalCallback = Box<dyn for<'a> FnMut(Message<'a>) + Send>;
type SendMessage = Box<dyn FnMut(&[u8]) -> std::io::Result<()> + Send>;

/// A host-driven, transport-agnostic D-Bus client.
///
/// A [`Connection`] never owns a socket. Bytes read off the wire are handed
/// in through [`Connection::feed`]; bytes to write are handed out through
/// the `send_message` callback supplied to [`Connection::new`]. This keeps
/// the connection usable from any I/O model the host happens to run --
/// blocking, an external poll loop, or an async runtime wrapped around
/// [`Connection::feed`] -- rather than tying it to one.
pub struct Connection {
    state: ConnectionState,
    auth: Auth,
    recv: Vec<u8>,
    next_serial: u32,
    hello_serial: Option<NonZeroU32>,
    unique_name: Option<Box<str>>,
    bindings: HashMap<OwnedObjectPath, Binding>,
    reply_table: ReplyTable,
    matches: HashMap<u64, (MatchRule, SignalCallback)>,
    next_match_id: u64,
    send_message: SendMessage,
}

impl Connection {
    /// Construct a new connection that authenticates as `auth` and writes
    /// outbound bytes through `send_message`.
    pub fn new<F>(auth: Auth, send_message: F) -> Self
    where
        F: FnMut(&[u8]) -> std::io::Result<()> + Send + 'static,
    {
        Self {
            state: ConnectionState::Created,
            auth,
            recv: Vec::new(),
            next_serial: 1,
            hello_serial: None,
            unique_name: None,
            bindings: HashMap::new(),
            reply_table: ReplyTable::new(),
            matches: HashMap::new(),
            next_match_id: 0,
            send_message: Box::new(send_message),
        }
    }

    /// The current high level state of the connection.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The unique name assigned by the bus, once [`ConnectionState::Connected`].
    pub fn unique_name(&self) -> Option<&str> {
        self.unique_name.as_deref()
    }

    /// Begin the SASL handshake, writing the initial `AUTH` line through the
    /// `send_message` callback.
    pub fn start(&mut self) -> Result<()> {
        if self.state != ConnectionState::Created {
            return Err(Error::new(ErrorKind::InvalidState(self.state)));
        }

        let bytes = self.auth.start()?;
        self.write_bytes(&bytes)?;
        self.state = ConnectionState::ParsingAuth;
        Ok(())
    }

    pub(crate) fn next_serial(&mut self) -> NonZeroU32 {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1).max(1);
        NonZeroU32::new(serial).unwrap_or(DEFAULT_SERIAL)
    }

    pub(crate) fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(Error::new(ErrorKind::ConnectionClosed));
        }

        self.write_bytes(bytes)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (self.send_message)(bytes).map_err(Error::from)
    }

    pub(crate) fn register_reply(&mut self, serial: NonZeroU32, callback: ReplyCallback) -> ReplySlot {
        self.reply_table.register(serial, callback)
    }

    /// Cancel a pending reply registered through
    /// [`crate::Marshaller::send_with_reply`]; the callback will not be
    /// invoked even if a matching reply later arrives.
    pub fn cancel_reply(&mut self, slot: &ReplySlot) -> bool {
        self.reply_table.cancel(slot)
    }

    /// Register a new [`Binding`] at `path`, replacing and returning any
    /// previous binding registered there.
    pub fn bind(&mut self, path: &ObjectPath) -> Binding {
        let binding = Binding::new(path.to_owned());
        self.bindings.insert(path.to_owned(), binding.clone());
        binding
    }

    /// Look up the binding registered at `path`, if any.
    pub fn binding(&self, path: &ObjectPath) -> Option<Binding> {
        self.bindings.get(path).cloned()
    }

    pub(crate) fn remove_binding(&mut self, path: &ObjectPath) -> bool {
        self.bindings.remove(path).is_some()
    }

    /// Subscribe `callback` to every signal matching `rule`, returning an id
    /// that can be passed to [`Connection::remove_match`].
    pub fn subscribe<F>(&mut self, rule: MatchRule, callback: F) -> u64
    where
        F: for<'a> FnMut(Message<'a>) + Send + 'static,
    {
        let id = self.next_match_id;
        self.next_match_id += 1;
        self.matches.insert(id, (rule, Box::new(callback)));
        id
    }

    pub(crate) fn remove_match(&mut self, id: u64) -> bool {
        self.matches.remove(&id).is_some()
    }

    /// Feed `bytes` received from the transport into the connection,
    /// advancing the SASL handshake or dispatching complete messages as
    /// appropriate.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(Error::new(ErrorKind::ConnectionClosed));
        }

        self.recv.extend_from_slice(bytes);

        if self.state == ConnectionState::ParsingAuth {
            self.drive_auth()?;
        }

        if self.state != ConnectionState::ParsingAuth && self.state != ConnectionState::Created {
            self.drive_messages()?;
        }

        Ok(())
    }

    /// Close the connection; no further bytes will be written or accepted.
    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }

    fn drive_auth(&mut self) -> Result<()> {
        while let Some(pos) = find_crlf(&self.recv) {
            let line: Vec<u8> = self.recv.drain(..pos + 2).take(pos).collect();

            if let Some(reply) = self.auth.receive_line(&line)? {
                let is_begin = reply == b"BEGIN\r\n";
                self.write_bytes(&reply)?;

                if is_begin {
                    self.auth.finish_begin();
                }
            }

            if self.auth.is_done() {
                self.state = ConnectionState::Authed;
                self.send_hello()?;
                break;
            }
        }

        Ok(())
    }

    fn send_hello(&mut self) -> Result<()> {
        let marshaller = Marshaller::method_call(org_freedesktop_dbus::PATH, "Hello")
            .with_interface(org_freedesktop_dbus::INTERFACE)
            .with_destination(org_freedesktop_dbus::DESTINATION)
            .with_flags(Flags::EMPTY);

        let serial = self.next_serial();
        let bytes = marshaller.encode(serial)?;
        self.write_bytes(&bytes)?;
        self.hello_serial = Some(serial);
        self.state = ConnectionState::HelloSent;
        Ok(())
    }

    fn drive_messages(&mut self) -> Result<()> {
        while let Some(len) = frame_len(&self.recv) {
            if self.recv.len() < len {
                break;
            }

            let frame: Vec<u8> = self.recv.drain(..len).collect();
            self.dispatch_frame(&frame)?;
        }

        Ok(())
    }

    fn dispatch_frame(&mut self, frame: &[u8]) -> Result<()> {
        let decoded = decode_message(frame)?;
        let message = decoded.borrow();

        if self.state == ConnectionState::HelloSent {
            if let MessageKind::MethodReturn { reply_serial } = message.kind() {
                if Some(reply_serial) == self.hello_serial {
                    let name = message.body().next_string()?;
                    self.unique_name = Some(Box::from(name));
                    self.state = ConnectionState::Connected;
                    return Ok(());
                }
            }
        }

        match message.kind() {
            MessageKind::MethodReturn { reply_serial } | MessageKind::Error { reply_serial, .. } => {
                if let Some(callback) = self.reply_table.take(reply_serial) {
                    callback(message);
                }
            }
            MessageKind::Signal { .. } => {
                for (rule, callback) in self.matches.values_mut() {
                    if rule.matches(&message) {
                        callback(message);
                    }
                }
            }
            MessageKind::MethodCall { path, member } => {
                self.dispatch_method_call(path, member, &message)?;
            }
        }

        Ok(())
    }

    fn dispatch_method_call(&mut self, path: &str, member: &str, message: &Message<'_>) -> Result<()> {
        let object_path = ObjectPath::new(path.as_bytes())?;

        let Some(binding) = self.bindings.get(object_path) else {
            return self.reply_error(message, "org.freedesktop.DBus.Error.UnknownObject", "No such object path");
        };

        if message.interface() == Some(org_freedesktop_dbus::properties::INTERFACE) {
            let binding = binding.clone();
            return self.dispatch_property_call(&binding, member, message);
        }

        let resolved = match message.interface() {
            Some(interface) => binding
                .interface(interface)
                .map(|interface| (interface, ()))
                .ok_or_else(|| Error::new(ErrorKind::UnknownMethod)),
            None => binding.resolve_method(member),
        };

        let interface = match resolved {
            Ok((interface, ())) => interface,
            Err(_) => {
                return self.reply_error(message, "org.freedesktop.DBus.Error.UnknownMethod", "Unknown method");
            }
        };

        let Some(method) = interface.method(member) else {
            return self.reply_error(message, "org.freedesktop.DBus.Error.UnknownMethod", "Unknown method");
        };

        match method.call(message) {
            Ok(body) => {
                if message.flags() & Flags::NO_REPLY_EXPECTED {
                    return Ok(());
                }

                let mut marshaller = Marshaller::method_return(message.serial());

                if let Some(sender) = message.sender() {
                    marshaller = marshaller.with_destination(sender);
                }

                *marshaller.body_mut() = body;
                marshaller.send(self)?;
                Ok(())
            }
            Err(err) => self.reply_error(message, err.name(), err.message()),
        }
    }

    /// Dispatch a call targeting `org.freedesktop.DBus.Properties` against
    /// the interfaces registered on `binding`.
    fn dispatch_property_call(&mut self, binding: &Binding, member: &str, message: &Message<'_>) -> Result<()> {
        match member {
            org_freedesktop_dbus::properties::GET => {
                let mut body = message.body();
                let interface_name = body.next_string()?;
                let property_name = body.next_string()?;

                let Some(interface) = binding.interface(interface_name) else {
                    return self.reply_error(
                        message,
                        "org.freedesktop.DBus.Error.UnknownInterface",
                        "No such interface",
                    );
                };

                let Some(property) = interface.property(property_name) else {
                    return self.reply_error(
                        message,
                        "org.freedesktop.DBus.Error.UnknownProperty",
                        "No such property",
                    );
                };

                if !property.is_readable() {
                    return self.reply_error(
                        message,
                        "org.freedesktop.DBus.Error.PropertyWriteOnly",
                        "Property is write-only",
                    );
                }

                if message.flags() & Flags::NO_REPLY_EXPECTED {
                    return Ok(());
                }

                let mut marshaller = Marshaller::method_return(message.serial());

                if let Some(sender) = message.sender() {
                    marshaller = marshaller.with_destination(sender);
                }

                marshaller.body_mut().begin_variant(property.signature())?;
                let result = property.get(marshaller.body_mut()).expect("checked readable above");
                marshaller.body_mut().end_variant()?;

                match result {
                    Ok(()) => {
                        marshaller.send(self)?;
                        Ok(())
                    }
                    Err(_) => self.reply_error(
                        message,
                        "org.freedesktop.DBus.Error.Failed",
                        "Failed to read property value",
                    ),
                }
            }
            org_freedesktop_dbus::properties::SET => {
                let mut body = message.body();
                let interface_name = body.next_string()?;
                let property_name = body.next_string()?;
                let variant = body.next_variant()?;
                let mut value = variant.iter();

                let Some(interface) = binding.interface(interface_name) else {
                    return self.reply_error(
                        message,
                        "org.freedesktop.DBus.Error.UnknownInterface",
                        "No such interface",
                    );
                };

                let Some(property) = interface.property(property_name) else {
                    return self.reply_error(
                        message,
                        "org.freedesktop.DBus.Error.UnknownProperty",
                        "No such property",
                    );
                };

                match property.set(&mut value) {
                    Ok(()) => {
                        if message.flags() & Flags::NO_REPLY_EXPECTED {
                            return Ok(());
                        }

                        let mut marshaller = Marshaller::method_return(message.serial());

                        if let Some(sender) = message.sender() {
                            marshaller = marshaller.with_destination(sender);
                        }

                        marshaller.send(self)?;
                        Ok(())
                    }
                    Err(err) => self.reply_error(message, err.name(), err.message()),
                }
            }
            _ => self.reply_error(message, "org.freedesktop.DBus.Error.UnknownMethod", "Unknown method"),
        }
    }

    fn reply_error(&mut self, message: &Message<'_>, name: &str, description: &str) -> Result<()> {
        if message.flags() & Flags::NO_REPLY_EXPECTED {
            return Ok(());
        }

        let mut marshaller = Marshaller::error(name, message.serial());

        if let Some(sender) = message.sender() {
            marshaller = marshaller.with_destination(sender);
        }

        marshaller.body_mut().append_string(description)?;
        marshaller.send(self)?;
        Ok(())
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|window| window == b"\r\n")
}

fn frame_len(data: &[u8]) -> Option<usize> {
    if data.len() < 16 {
        return None;
    }

    let endianness = crate::protocol::Endianness(data[0]);
    let array_len = u32_from(endianness, &data[12..16]) as usize;
    let header_end = 16 + array_len;
    let padded = header_end + crate::buf::padding_to(8, header_end);
    let body_len = u32_from(endianness, &data[4..8]) as usize;
    Some(padded + body_len)
}

fn u32_from(endianness: crate::protocol::Endianness, bytes: &[u8]) -> u32 {
    let array: [u8; 4] = bytes.try_into().expect("4 bytes");

    if endianness.0 == crate::protocol::Endianness::BIG.0 {
        u32::from_be_bytes(array)
    } else {
        u32::from_le_bytes(array)
    }
}

struct DecodedMessage {
    kind: DecodedKind,
    serial: NonZeroU32,
    flags: Flags,
    interface: Option<Box<str>>,
    destination: Option<Box<str>>,
    sender: Option<Box<str>>,
    signature: crate::OwnedSignature,
    body: Box<[u8]>,
    endianness: crate::protocol::Endianness,
}

enum DecodedKind {
    MethodCall { path: Box<str>, member: Box<str> },
    MethodReturn { reply_serial: NonZeroU32 },
    Error { error_name: Box<str>, reply_serial: NonZeroU32 },
    Signal { path: Box<str>, member: Box<str> },
}

impl DecodedMessage {
    fn borrow(&self) -> Message<'_> {
        let kind = match &self.kind {
            DecodedKind::MethodCall { path, member } => MessageKind::MethodCall { path, member },
            DecodedKind::MethodReturn { reply_serial } => MessageKind::MethodReturn {
                reply_serial: *reply_serial,
            },
            DecodedKind::Error { error_name, reply_serial } => MessageKind::Error {
                error_name,
                reply_serial: *reply_serial,
            },
            DecodedKind::Signal { path, member } => MessageKind::Signal { path, member },
        };

        Message {
            kind,
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
}

fn decode_message(frame: &[u8]) -> Result<DecodedMessage> {
    let endianness = crate::protocol::Endianness(frame[0]);
    let mut it = Iter::new(frame, endianness);

    let _endianness = it.next_byte()?;
    let message_type = it.next_byte()?;
    let flags = Flags(it.next_byte()?);
    let _protocol_version = it.next_byte()?;
    let _body_length = it.next_uint32()?;
    let serial = NonZeroU32::new(it.next_uint32()?).ok_or_else(|| Error::new(ErrorKind::ZeroSerial))?;

    let mut path: Option<Box<str>> = None;
    let mut interface: Option<Box<str>> = None;
    let mut member: Option<Box<str>> = None;
    let mut error_name: Option<Box<str>> = None;
    let mut reply_serial: Option<NonZeroU32> = None;
    let mut destination: Option<Box<str>> = None;
    let mut sender: Option<Box<str>> = None;
    let mut signature = crate::OwnedSignature::new();

    it.begin_array(Signature::new_const(b"(yv)"))?;

    while it.array_has_next()? {
        it.begin_struct()?;
        let code = it.next_byte()?;
        let variant = it.next_variant()?;
        let mut value = variant.iter();

        match code {
            c if c == HeaderField::PATH.0 => {
                let object_path = value.next_object_path()?;
                let bytes: &[u8] = object_path.as_ref();
                path = Some(Box::from(std::str::from_utf8(bytes)?));
            }
            c if c == HeaderField::INTERFACE.0 => {
                interface = Some(Box::from(value.next_string()?));
            }
            c if c == HeaderField::MEMBER.0 => {
                member = Some(Box::from(value.next_string()?));
            }
            c if c == HeaderField::ERROR_NAME.0 => {
                error_name = Some(Box::from(value.next_string()?));
            }
            c if c == HeaderField::REPLY_SERIAL.0 => {
                reply_serial = Some(
                    NonZeroU32::new(value.next_uint32()?).ok_or_else(|| Error::new(ErrorKind::ZeroReplySerial))?,
                );
            }
            c if c == HeaderField::DESTINATION.0 => {
                destination = Some(Box::from(value.next_string()?));
            }
            c if c == HeaderField::SENDER.0 => {
                sender = Some(Box::from(value.next_string()?));
            }
            c if c == HeaderField::SIGNATURE.0 => {
                signature.extend_from_signature(value.next_signature()?);
            }
            _ => {}
        }

        it.end_struct()?;
    }

    it.end_array()?;

    let body = it.remaining();
    let body: Box<[u8]> = frame[frame.len() - body..].into();

    let kind = match MessageType(message_type) {
        MessageType::METHOD_CALL => DecodedKind::MethodCall {
            path: path.ok_or_else(|| Error::new(ErrorKind::MissingPath))?,
            member: member.ok_or_else(|| Error::new(ErrorKind::MissingMember))?,
        },
        MessageType::METHOD_RETURN => DecodedKind::MethodReturn {
            reply_serial: reply_serial.ok_or_else(|| Error::new(ErrorKind::MissingReplySerial))?,
        },
        MessageType::ERROR => DecodedKind::Error {
            error_name: error_name.ok_or_else(|| Error::new(ErrorKind::MissingErrorName))?,
            reply_serial: reply_serial.ok_or_else(|| Error::new(ErrorKind::MissingReplySerial))?,
        },
        MessageType::SIGNAL => DecodedKind::Signal {
            path: path.ok_or_else(|| Error::new(ErrorKind::MissingPath))?,
            member: member.ok_or_else(|| Error::new(ErrorKind::MissingMember))?,
        },
        _ => return Err(Error::new(ErrorKind::InvalidProtocol)),
    };

    Ok(DecodedMessage {
        kind,
        serial,
        flags,
        interface,
        destination,
        sender,
        signature,
        body,
        endianness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_connection() -> Connection {
        Connection::new(Auth::new(1000), |_bytes| Ok(()))
    }

    #[test]
    fn starts_in_created_state() {
        let c = new_connection();
        assert_eq!(c.state(), ConnectionState::Created);
    }

    #[test]
    fn start_moves_to_parsing_auth() {
        let mut c = new_connection();
        c.start().unwrap();
        assert_eq!(c.state(), ConnectionState::ParsingAuth);
    }

    #[test]
    fn serials_are_monotonic_and_nonzero() {
        let mut c = new_connection();
        let a = c.next_serial();
        let b = c.next_serial();
        assert!(b.get() > a.get());
    }

    #[test]
    fn full_auth_and_hello_handshake_reaches_connected() {
        let mut c = new_connection();
        c.start().unwrap();

        c.feed(b"OK 0123456789abcdef0123456789abcdef\r\n").unwrap();
        assert_eq!(c.state(), ConnectionState::HelloSent);

        let serial = c.hello_serial.unwrap();
        let mut body = crate::buf::Buffer::new(crate::Endianness::NATIVE);
        body.append_string(":1.42").unwrap();
        let reply = Marshaller::method_return(serial);
        let mut reply = reply;
        *reply.body_mut() = body;
        let bytes = reply.encode(NonZeroU32::new(99).unwrap()).unwrap();

        c.feed(&bytes).unwrap();
        assert_eq!(c.state(), ConnectionState::Connected);
        assert_eq!(c.unique_name(), Some(":1.42"));
    }

    #[test]
    fn find_crlf_locates_terminator() {
        assert_eq!(find_crlf(b"OK abc\r\nextra"), Some(6));
        assert_eq!(find_crlf(b"no terminator"), None);
    }

    fn connected_connection() -> (Connection, std::rc::Rc<std::cell::RefCell<Vec<Vec<u8>>>>) {
        let outbound: std::rc::Rc<std::cell::RefCell<Vec<Vec<u8>>>> = Default::default();
        let capture = outbound.clone();

        let mut c = Connection::new(Auth::new(1000), move |bytes| {
            capture.borrow_mut().push(bytes.to_vec());
            Ok(())
        });

        c.start().unwrap();
        c.feed(b"OK 0123456789abcdef0123456789abcdef\r\n").unwrap();

        let serial = c.hello_serial.unwrap();
        let mut body = crate::buf::Buffer::new(crate::Endianness::NATIVE);
        body.append_string(":1.1").unwrap();
        let mut reply = Marshaller::method_return(serial);
        *reply.body_mut() = body;
        let bytes = reply.encode(NonZeroU32::new(200).unwrap()).unwrap();
        c.feed(&bytes).unwrap();
        assert_eq!(c.state(), ConnectionState::Connected);

        outbound.borrow_mut().clear();
        (c, outbound)
    }

    #[test]
    fn dispatches_properties_get_against_a_bound_interface() {
        let (mut c, outbound) = connected_connection();

        let path = ObjectPath::new(b"/org/example/Thing").unwrap();
        let binding = c.bind(path);
        binding
            .add_interface(
                crate::Interface::new("org.example.Thing")
                    .unwrap()
                    .with_property(crate::Property::read_only("Enabled", Signature::BOOLEAN, |buffer| {
                        buffer.append_bool(true)
                    })),
            )
            .unwrap();

        let mut call = Marshaller::method_call("/org/example/Thing", "Get")
            .with_interface(org_freedesktop_dbus::properties::INTERFACE)
            .with_sender(":1.2");
        call.body_mut().append_string("org.example.Thing").unwrap();
        call.body_mut().append_string("Enabled").unwrap();
        let call_bytes = call.encode(NonZeroU32::new(42).unwrap()).unwrap();

        c.feed(&call_bytes).unwrap();

        let sent = outbound.borrow();
        assert_eq!(sent.len(), 1);
        let decoded = decode_message(&sent[0]).unwrap();
        let reply = decoded.borrow();
        assert!(matches!(reply.kind(), MessageKind::MethodReturn { reply_serial } if reply_serial.get() == 42));

        let mut body = reply.body();
        body.begin_variant().unwrap();
        assert!(body.next_bool().unwrap());
    }

    #[test]
    fn dispatches_properties_get_for_an_unknown_property() {
        let (mut c, outbound) = connected_connection();

        let path = ObjectPath::new(b"/org/example/Thing").unwrap();
        let binding = c.bind(path);
        binding.add_interface(crate::Interface::new("org.example.Thing").unwrap()).unwrap();

        let mut call = Marshaller::method_call("/org/example/Thing", "Get")
            .with_interface(org_freedesktop_dbus::properties::INTERFACE)
            .with_sender(":1.2");
        call.body_mut().append_string("org.example.Thing").unwrap();
        call.body_mut().append_string("Missing").unwrap();
        let call_bytes = call.encode(NonZeroU32::new(43).unwrap()).unwrap();

        c.feed(&call_bytes).unwrap();

        let sent = outbound.borrow();
        let decoded = decode_message(&sent[0]).unwrap();
        let reply = decoded.borrow();
        assert!(
            matches!(reply.kind(), MessageKind::Error { error_name, .. } if error_name == "org.freedesktop.DBus.Error.UnknownProperty")
        );
    }

    #[test]
    fn dispatches_properties_set_against_a_bound_interface() {
        let (mut c, outbound) = connected_connection();

        let path = ObjectPath::new(b"/org/example/Thing").unwrap();
        let binding = c.bind(path);
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let write_seen = seen.clone();
        binding
            .add_interface(
                crate::Interface::new("org.example.Thing")
                    .unwrap()
                    .with_property(crate::Property::read_write(
                        "Enabled",
                        Signature::BOOLEAN,
                        |buffer| buffer.append_bool(false),
                        move |value| {
                            write_seen.store(value.next_bool().unwrap_or(false), std::sync::atomic::Ordering::SeqCst);
                            Ok(())
                        },
                    )),
            )
            .unwrap();

        let mut call = Marshaller::method_call("/org/example/Thing", "Set")
            .with_interface(org_freedesktop_dbus::properties::INTERFACE)
            .with_sender(":1.2");
        call.body_mut().append_string("org.example.Thing").unwrap();
        call.body_mut().append_string("Enabled").unwrap();
        call.body_mut().begin_variant(Signature::BOOLEAN).unwrap();
        call.body_mut().append_bool(true).unwrap();
        call.body_mut().end_variant().unwrap();
        let call_bytes = call.encode(NonZeroU32::new(44).unwrap()).unwrap();

        c.feed(&call_bytes).unwrap();

        assert!(seen.load(std::sync::atomic::Ordering::SeqCst));
        let sent = outbound.borrow();
        let decoded = decode_message(&sent[0]).unwrap();
        let reply = decoded.borrow();
        assert!(matches!(reply.kind(), MessageKind::MethodReturn { reply_serial } if reply_serial.get() == 44));
    }
}
