//! Parsing of D-Bus server addresses and resolution of the well-known
//! buses from the environment, per the `tcp:host=H,port=P` /
//! `unix:path=P` / `unix:abstract=P` syntax the protocol defines.

use std::env;
use std::ffi::OsStr;

use crate::error::{Error, ErrorKind, Result};

const ENV_SESSION_BUS: &str = "DBUS_SESSION_BUS_ADDRESS";
const ENV_SYSTEM_BUS: &str = "DBUS_SYSTEM_BUS_ADDRESS";
const ENV_STARTER_ADDRESS: &str = "DBUS_STARTER_ADDRESS";
const ENV_STARTER_BUS_TYPE: &str = "DBUS_STARTER_BUS_TYPE";
const ENV_XDG_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";
const DEFAULT_SYSTEM_BUS: &str = "unix:path=/var/run/dbus/system_bus_socket";

/// A parsed D-Bus server address: the `transport:key=value,...` form used
/// by `DBUS_SESSION_BUS_ADDRESS` and friends.
///
/// Only the transports the core core connects over are represented;
/// unknown transports are rejected at parse time rather than carried
/// around as an opaque variant, since nothing in this crate can act on
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// `unix:path=/run/dbus/system_bus_socket`
    Unix {
        /// Filesystem path of the socket.
        path: Box<str>,
    },
    /// `unix:abstract=/tmp/dbus-x`, a Linux abstract-namespace socket
    /// (connected to by prefixing the name with a leading NUL byte).
    UnixAbstract {
        /// Abstract socket name, without the leading NUL.
        name: Box<str>,
    },
    /// `tcp:host=127.0.0.1,port=1234`
    Tcp {
        /// Hostname or address to connect to.
        host: Box<str>,
        /// TCP port.
        port: u16,
        /// Whether `TCP_NODELAY` was requested via `tcp_nodelay=1`.
        nodelay: bool,
    },
}

impl Address {
    /// Parse a single address of the form `transport:key=value,key=value`.
    ///
    /// D-Bus addresses may list several `;`-separated alternatives; this
    /// parses only the first, as the core has no fallback/retry policy of
    /// its own -- callers that want fallback can split on `;` themselves
    /// and try each in turn.
    pub fn parse(address: &str) -> Result<Self> {
        let first = address.split(';').next().unwrap_or(address);

        let (transport, rest) = first
            .split_once(':')
            .ok_or_else(|| Error::new(ErrorKind::InvalidAddress))?;

        let params = parse_params(rest)?;

        match transport {
            "unix" => {
                if let Some(path) = params.get("path") {
                    return Ok(Address::Unix {
                        path: (*path).into(),
                    });
                }

                if let Some(name) = params.get("abstract") {
                    return Ok(Address::UnixAbstract {
                        name: (*name).into(),
                    });
                }

                Err(Error::new(ErrorKind::InvalidAddress))
            }
            "tcp" => {
                let host = params
                    .get("host")
                    .ok_or_else(|| Error::new(ErrorKind::InvalidAddress))?;
                let port = params
                    .get("port")
                    .ok_or_else(|| Error::new(ErrorKind::InvalidAddress))?
                    .parse::<u16>()
                    .map_err(|_| Error::new(ErrorKind::InvalidAddress))?;
                let nodelay = matches!(params.get("tcp_nodelay").copied(), Some("1" | "true"));

                Ok(Address::Tcp {
                    host: (*host).into(),
                    port,
                    nodelay,
                })
            }
            _ => Err(Error::new(ErrorKind::InvalidAddress)),
        }
    }

    /// Resolve the session bus address from `DBUS_SESSION_BUS_ADDRESS`,
    /// falling back to `$XDG_RUNTIME_DIR/bus` per the usual systemd-user
    /// convention, since the session bus has no other well-known default.
    pub fn session() -> Result<Self> {
        if let Some(address) = env_string(ENV_SESSION_BUS) {
            return Self::parse(&address);
        }

        if let Some(dir) = env_string(ENV_XDG_RUNTIME_DIR) {
            return Ok(Address::Unix {
                path: format!("{dir}/bus").into(),
            });
        }

        Err(Error::new(ErrorKind::MissingBus))
    }

    /// Resolve the system bus address from `DBUS_SYSTEM_BUS_ADDRESS`,
    /// falling back to the well-known path
    /// `unix:path=/var/run/dbus/system_bus_socket`.
    pub fn system() -> Result<Self> {
        match env_string(ENV_SYSTEM_BUS) {
            Some(address) => Self::parse(&address),
            None => Self::parse(DEFAULT_SYSTEM_BUS),
        }
    }

    /// Resolve the address a D-Bus-activated process was started with,
    /// from `DBUS_STARTER_ADDRESS`, falling back to whichever of
    /// [`Address::session`]/[`Address::system`] matches
    /// `DBUS_STARTER_BUS_TYPE` (`session` or `system`).
    pub fn starter() -> Result<Self> {
        if let Some(address) = env_string(ENV_STARTER_ADDRESS) {
            return Self::parse(&address);
        }

        match env_string(ENV_STARTER_BUS_TYPE).as_deref() {
            Some("system") => Self::system(),
            _ => Self::session(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    let value = env::var_os(key)?;
    OsStr::to_str(&value).map(str::to_owned)
}

fn parse_params(rest: &str) -> Result<std::collections::HashMap<&str, &str>> {
    let mut params = std::collections::HashMap::new();

    if rest.is_empty() {
        return Ok(params);
    }

    for entry in rest.split(',') {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| Error::new(ErrorKind::InvalidAddress))?;
        params.insert(key, value);
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unix_path() {
        let address = Address::parse("unix:path=/run/dbus/system_bus_socket").unwrap();
        assert_eq!(
            address,
            Address::Unix {
                path: "/run/dbus/system_bus_socket".into()
            }
        );
    }

    #[test]
    fn parses_unix_abstract() {
        let address = Address::parse("unix:abstract=/tmp/dbus-xyz").unwrap();
        assert_eq!(
            address,
            Address::UnixAbstract {
                name: "/tmp/dbus-xyz".into()
            }
        );
    }

    #[test]
    fn parses_tcp_with_nodelay() {
        let address = Address::parse("tcp:host=127.0.0.1,port=55342,tcp_nodelay=1").unwrap();
        assert_eq!(
            address,
            Address::Tcp {
                host: "127.0.0.1".into(),
                port: 55342,
                nodelay: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_transport() {
        assert!(Address::parse("quic:host=h").is_err());
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(Address::parse("unix").is_err());
        assert!(Address::parse("tcp:host=h").is_err());
    }

    #[test]
    fn takes_first_alternative_in_a_list() {
        let address = Address::parse("unix:path=/a;unix:path=/b").unwrap();
        assert_eq!(address, Address::Unix { path: "/a".into() });
    }
}
