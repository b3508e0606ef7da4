//! A client-side implementation of the D-Bus wire protocol.
//!
//! This crate implements message framing, the SASL authentication
//! handshake, and a dispatch layer for building D-Bus clients on top of a
//! host-provided transport. It does not own a socket: the host feeds bytes
//! in through [`Connection::feed`] and drives I/O through a small set of
//! callbacks.
//!
//! [`Connection::feed`]: crate::Connection::feed

pub use self::error::{Error, Result};
mod error;

#[doc(inline)]
pub use self::protocol::{Endianness, Flags};
#[macro_use]
pub mod protocol;

pub use self::org_freedesktop_dbus as org_freedesktop;
mod org_freedesktop_dbus;

mod frame;

#[doc(inline)]
pub use self::signature::{OwnedSignature, Signature, SignatureError};
mod signature;

#[doc(inline)]
pub use self::object_path::{ObjectPath, ObjectPathError, OwnedObjectPath};
mod object_path;

pub use self::variant::Variant;
mod variant;

pub mod buf;

pub mod sasl;

pub use self::message::{Message, MessageKind};
mod message;

pub use self::marshal::Marshaller;
mod marshal;

pub use self::interface::{Annotations, Interface, Method, Property, Signal};
mod interface;

pub use self::binding::Binding;
mod binding;

pub use self::match_rule::MatchRule;
mod match_rule;

pub use self::reply::ReplySlot;
mod reply;

pub use self::state::State;
mod state;

pub use self::proxy::ProxyCallbacks;
mod proxy;

pub use self::remote::{Call, Proxy};
mod remote;

pub use self::bridge::Bridge;
mod bridge;

pub use self::block::block_call;
mod block;

pub use self::connection::{Connection, ConnectionBuilder, ConnectionState};
mod connection;

pub use self::address::Address;
mod address;

mod lossy_str;
mod utils;
