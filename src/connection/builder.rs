use crate::address::Address;
use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};
use crate::sasl::{Auth, Mechanism};

enum Bus {
    Session,
    System,
    Starter,
    Address(Address),
}

enum Uid {
    #[cfg_attr(feature = "libc", allow(unused))]
    Explicit(u32),
    #[cfg(feature = "libc")]
    Current,
}

/// Builds a [`Connection`] from explicit configuration and the environment
/// variables D-Bus addresses are conventionally resolved from.
///
/// A [`ConnectionBuilder`] never opens a socket itself -- per this crate's
/// host-driven design, the caller supplies the `send_message` callback and
/// is responsible for actually connecting to the resolved [`Address`] (the
/// `tokio` feature's transport module does this for `tokio::net` streams).
pub struct ConnectionBuilder {
    bus: Bus,
    uid: Uid,
    mechanisms: Option<Vec<Mechanism>>,
}

impl ConnectionBuilder {
    /// Construct a builder that, by default, connects to the session bus
    /// and authenticates as the current Unix user (when the `libc` feature
    /// is enabled; otherwise a uid must be supplied with
    /// [`ConnectionBuilder::with_uid`]).
    pub fn new() -> Self {
        Self {
            bus: Bus::Session,
            uid: Self::default_uid(),
            mechanisms: None,
        }
    }

    #[cfg(feature = "libc")]
    fn default_uid() -> Uid {
        Uid::Current
    }

    #[cfg(not(feature = "libc"))]
    fn default_uid() -> Uid {
        Uid::Explicit(0)
    }

    /// Connect to the session bus (the default).
    #[must_use]
    pub fn session_bus(mut self) -> Self {
        self.bus = Bus::Session;
        self
    }

    /// Connect to the system bus.
    #[must_use]
    pub fn system_bus(mut self) -> Self {
        self.bus = Bus::System;
        self
    }

    /// Connect to whichever bus this process was D-Bus-activated on, per
    /// `DBUS_STARTER_ADDRESS`/`DBUS_STARTER_BUS_TYPE`.
    #[must_use]
    pub fn starter_bus(mut self) -> Self {
        self.bus = Bus::Starter;
        self
    }

    /// Connect to an explicit address instead of resolving one of the
    /// well-known buses from the environment.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.bus = Bus::Address(address);
        self
    }

    /// Authenticate as `uid` instead of the current process's Unix user id.
    #[must_use]
    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Uid::Explicit(uid);
        self
    }

    /// Restrict (and order) the SASL mechanisms attempted during the
    /// handshake. Defaults to EXTERNAL, DBUS_COOKIE_SHA1, ANONYMOUS in that
    /// order.
    #[must_use]
    pub fn with_mechanisms(mut self, mechanisms: impl IntoIterator<Item = Mechanism>) -> Self {
        self.mechanisms = Some(mechanisms.into_iter().collect());
        self
    }

    /// Resolve the address this builder would connect to, without
    /// constructing a [`Connection`].
    pub fn resolve_address(&self) -> Result<Address> {
        match &self.bus {
            Bus::Session => Address::session(),
            Bus::System => Address::system(),
            Bus::Starter => Address::starter(),
            Bus::Address(address) => Ok(address.clone()),
        }
    }

    fn auth(&self) -> Result<Auth> {
        let uid = match self.uid {
            Uid::Explicit(uid) => uid,
            #[cfg(feature = "libc")]
            Uid::Current => return Ok(self.auth_with_uid(current_uid())),
        };

        Ok(self.auth_with_uid(uid))
    }

    fn auth_with_uid(&self, uid: u32) -> Auth {
        match &self.mechanisms {
            Some(mechanisms) => Auth::with_mechanisms(uid, mechanisms.iter().copied()),
            None => Auth::new(uid),
        }
    }

    /// Resolve the target address and construct a [`Connection`] ready to
    /// have [`Connection::start`] called on it, writing outbound bytes
    /// through `send_message`.
    ///
    /// Returns the resolved [`Address`] alongside the connection so the
    /// caller can open the actual socket; see the `tokio` feature's
    /// transport module for a ready-made implementation of that step.
    pub fn build<F>(self, send_message: F) -> Result<(Connection, Address)>
    where
        F: FnMut(&[u8]) -> std::io::Result<()> + Send + 'static,
    {
        let address = self.resolve_address()?;
        let auth = self.auth()?;
        Ok((Connection::new(auth, send_message), address))
    }
}

impl Default for ConnectionBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "libc")]
fn current_uid() -> u32 {
    unsafe { libc::getuid() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_explicit_address_without_touching_the_environment() {
        let builder = ConnectionBuilder::new().with_address(Address::Unix {
            path: "/tmp/dbus-test".into(),
        });
        assert_eq!(
            builder.resolve_address().unwrap(),
            Address::Unix {
                path: "/tmp/dbus-test".into()
            }
        );
    }

    #[test]
    fn build_produces_a_fresh_connection_in_created_state() {
        let builder = ConnectionBuilder::new()
            .with_uid(1000)
            .with_address(Address::Unix {
                path: "/tmp/dbus-test".into(),
            });
        let (connection, address) = builder.build(|_bytes| Ok(())).unwrap();
        assert_eq!(connection.state(), crate::ConnectionState::Created);
        assert_eq!(
            address,
            Address::Unix {
                path: "/tmp/dbus-test".into()
            }
        );
    }

    #[test]
    fn with_mechanisms_is_honored() {
        let builder = ConnectionBuilder::new()
            .with_uid(1000)
            .with_mechanisms([Mechanism::Anonymous])
            .with_address(Address::Unix {
                path: "/tmp/dbus-test".into(),
            });
        let (mut connection, _) = builder.build(|_bytes| Ok(())).unwrap();
        connection.start().unwrap();
        assert_eq!(connection.state(), crate::ConnectionState::ParsingAuth);
    }
}
