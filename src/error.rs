use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;

use crate::connection::ConnectionState;
use crate::protocol::Variant;
use crate::{ObjectPathError, SignatureError};

/// Result alias using an [`Error`] as the error type by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised by this crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Self { kind }
    }

    /// Test if the error indicates that the operation would block.
    #[inline]
    pub(crate) fn would_block(&self) -> bool {
        matches!(self.kind, ErrorKind::WouldBlock)
    }
}

impl From<SignatureError> for Error {
    #[inline]
    fn from(error: SignatureError) -> Self {
        Self::new(ErrorKind::Signature(error))
    }
}

impl From<ObjectPathError> for Error {
    #[inline]
    fn from(error: ObjectPathError) -> Self {
        Self::new(ErrorKind::ObjectPath(error))
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::WouldBlock => Self::new(ErrorKind::WouldBlock),
            _ => Self::new(ErrorKind::Io(error)),
        }
    }
}

impl From<Utf8Error> for Error {
    #[inline]
    fn from(error: Utf8Error) -> Self {
        Self::new(ErrorKind::Utf8Error(error))
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(error) => error.fmt(f),
            ErrorKind::Signature(error) => error.fmt(f),
            ErrorKind::ObjectPath(error) => error.fmt(f),
            ErrorKind::Utf8Error(error) => error.fmt(f),
            ErrorKind::WouldBlock => write!(f, "Would block"),
            ErrorKind::BufferUnderflow => write!(f, "Buffer underflow"),
            ErrorKind::MissingBus => write!(f, "Missing session bus"),
            ErrorKind::InvalidAddress => write!(f, "Invalid d-bus address"),
            ErrorKind::InvalidSasl => write!(f, "Invalid SASL message"),
            ErrorKind::InvalidSaslResponse => write!(f, "Invalid SASL command"),
            ErrorKind::InvalidState(state) => write!(f, "Invalid connection state `{state}`"),
            ErrorKind::InvalidProtocol => write!(f, "Invalid protocol"),
            ErrorKind::MissingPath => write!(f, "Missing required PATH header"),
            ErrorKind::MissingMember => write!(f, "Missing required MEMBER header"),
            ErrorKind::MissingReplySerial => write!(f, "Missing required REPLY_SERIAL header"),
            ErrorKind::ZeroSerial => write!(f, "Zero in header serial"),
            ErrorKind::ZeroReplySerial => write!(f, "Zero REPLY_SERIAL header"),
            ErrorKind::MissingErrorName => write!(f, "Missing required ERROR_NAME header"),
            ErrorKind::InvalidHeaderVariant(variant) => {
                write!(f, "Unsupported header variant {:?}", variant)
            }
            ErrorKind::NotNullTerminated => {
                write!(f, "String is not null terminated")
            }
            ErrorKind::ArrayTooLong(length) => {
                write!(f, "Array of length {length} is too long (max is 67108864)")
            }
            ErrorKind::BodyTooLong(length) => {
                write!(f, "Body of length {length} is too long (max is 134217728)")
            }
            ErrorKind::MessageTooLong => {
                writeln!(f, "Message is too long")
            }
            ErrorKind::UnknownMethod => {
                write!(f, "org.freedesktop.DBus.Error.UnknownMethod")
            }
            ErrorKind::InvalidArgs => {
                write!(f, "org.freedesktop.DBus.Error.InvalidArgs")
            }
            ErrorKind::HandlerFailed(name) => {
                write!(f, "Handler failed with error `{name}`")
            }
            ErrorKind::SendFailed => write!(f, "Failed to send message to host transport"),
            ErrorKind::Timeout => write!(f, "Blocking call timed out"),
            ErrorKind::AuthRejected => write!(f, "SASL authentication was rejected"),
            ErrorKind::AuthTimedOut => write!(f, "SASL authentication timed out"),
            ErrorKind::ConnectionClosed => write!(f, "Connection is closed"),
            ErrorKind::NoReply => write!(f, "No reply was received for the given serial"),
            ErrorKind::MissingHome => write!(f, "Missing HOME environment variable"),
            ErrorKind::CookieNotFound => write!(f, "No matching DBUS_COOKIE_SHA1 cookie found"),
            ErrorKind::DuplicateBinding => {
                write!(f, "A binding already exists for this path and interface")
            }
            ErrorKind::InvalidInterfaceName => write!(f, "Invalid D-Bus interface name"),
            ErrorKind::MissingInterface => {
                write!(f, "Proxy has no interface set; property access requires one")
            }
            ErrorKind::AmbiguousMethod => {
                write!(f, "Multiple interfaces provide the called method")
            }
            ErrorKind::ResponseError(name, message) => {
                write!(f, "{name}: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(error) => Some(error),
            ErrorKind::Signature(error) => Some(error),
            ErrorKind::ObjectPath(error) => Some(error),
            ErrorKind::Utf8Error(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ErrorKind {
    Io(io::Error),
    Signature(SignatureError),
    ObjectPath(ObjectPathError),
    Utf8Error(Utf8Error),
    WouldBlock,
    BufferUnderflow,
    MissingBus,
    InvalidAddress,
    InvalidSasl,
    InvalidSaslResponse,
    InvalidState(ConnectionState),
    InvalidProtocol,
    MissingPath,
    MissingMember,
    MissingReplySerial,
    ZeroSerial,
    ZeroReplySerial,
    MissingErrorName,
    InvalidHeaderVariant(Variant),
    NotNullTerminated,
    BodyTooLong(u32),
    ArrayTooLong(u32),
    MessageTooLong,
    /// Callee has no handler registered for the called method.
    UnknownMethod,
    /// Arguments did not match the signature expected by the handler.
    InvalidArgs,
    /// A registered handler reported failure with the given D-Bus error name.
    HandlerFailed(Box<str>),
    /// The host transport reported a negative write result.
    SendFailed,
    /// A blocking call exceeded its deadline.
    Timeout,
    /// The peer rejected every offered SASL mechanism.
    AuthRejected,
    /// The SASL handshake did not complete before the deadline.
    AuthTimedOut,
    /// The connection has already transitioned to CLOSED.
    ConnectionClosed,
    /// No reply handler was registered for an incoming reply.
    NoReply,
    /// `$HOME` is unset, so `DBUS_COOKIE_SHA1` cannot locate its keyring.
    MissingHome,
    /// No cookie with a matching id was found in the keyring file.
    CookieNotFound,
    /// A binding already exists for a given (path, interface) pair.
    DuplicateBinding,
    /// An interface name did not follow the dotted-name grammar.
    InvalidInterfaceName,
    /// A [`crate::Proxy`] with no interface set was asked to get or set a
    /// property, which requires one to target
    /// `org.freedesktop.DBus.Properties.Get`/`Set` at.
    MissingInterface,
    /// A method call without an interface matched members on more than one
    /// bound interface at the same path.
    AmbiguousMethod,
    /// A method call or bus request returned a D-Bus error reply.
    ResponseError(Box<str>, Box<str>),
}
