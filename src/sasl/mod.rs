//! The client-side SASL handshake used to authenticate a [`Connection`]
//! before any D-Bus messages may be exchanged.
//!
//! [`Connection`]: crate::Connection
//!
//! States: `Init -> AuthSent -> (DataExchange)* -> BeginSent -> Done`, with
//! `Failed` as a terminal error state. Three mechanisms are attempted in
//! order unless the caller pins one: [`Mechanism::External`],
//! [`Mechanism::CookieSha1`], [`Mechanism::Anonymous`].

mod cookie;

#[cfg(test)]
mod tests;

use core::fmt;
use std::collections::VecDeque;

use crate::error::{Error, ErrorKind, Result};
use crate::lossy_str::LossyStr;
use crate::utils::{split_once, trim_end};

/// A GUID sent over SASL as part of the server's `OK` reply.
#[derive(Clone, PartialEq, Eq)]
pub struct Guid(Box<[u8]>);

impl Guid {
    fn new(guid: &[u8]) -> Self {
        Self(guid.to_vec().into_boxed_slice())
    }

    /// The raw bytes of the GUID.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Guid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guid").field(&LossyStr::new(&self.0)).finish()
    }
}

/// A SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// Authenticate as the local Unix user, trusting kernel-level peer
    /// credentials. Requires no shared secret.
    External,
    /// Authenticate with a cookie shared over the filesystem, as described
    /// in `$HOME/.dbus-keyrings/`.
    CookieSha1,
    /// Authenticate as nobody in particular. Accepted only by permissive
    /// servers.
    Anonymous,
}

impl Mechanism {
    fn name(self) -> &'static str {
        match self {
            Mechanism::External => "EXTERNAL",
            Mechanism::CookieSha1 => "DBUS_COOKIE_SHA1",
            Mechanism::Anonymous => "ANONYMOUS",
        }
    }

    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"EXTERNAL" => Some(Mechanism::External),
            b"DBUS_COOKIE_SHA1" => Some(Mechanism::CookieSha1),
            b"ANONYMOUS" => Some(Mechanism::Anonymous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    Init,
    AuthSent(Mechanism),
    DataExchange(Mechanism),
    BeginSent,
    Done,
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Init => write!(f, "init"),
            AuthState::AuthSent(m) => write!(f, "auth-sent({})", m.name()),
            AuthState::DataExchange(m) => write!(f, "data-exchange({})", m.name()),
            AuthState::BeginSent => write!(f, "begin-sent"),
            AuthState::Done => write!(f, "done"),
            AuthState::Failed => write!(f, "failed"),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);

    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }

    out
}

fn hex_decode(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() % 2 != 0 {
        return Err(Error::new(ErrorKind::InvalidSasl));
    }

    let mut out = Vec::with_capacity(bytes.len() / 2);

    for chunk in bytes.chunks_exact(2) {
        let hi = (chunk[0] as char)
            .to_digit(16)
            .ok_or_else(|| Error::new(ErrorKind::InvalidSasl))?;
        let lo = (chunk[1] as char)
            .to_digit(16)
            .ok_or_else(|| Error::new(ErrorKind::InvalidSasl))?;
        out.push(((hi << 4) | lo) as u8);
    }

    Ok(out)
}

/// The client-side SASL authentication state machine.
///
/// The owner drives this incrementally: [`Auth::start`] returns the first
/// bytes to write, then every complete `\r\n`-terminated line the server
/// sends back is fed to [`Auth::receive_line`], which returns the next
/// bytes to write, if any. Authentication is complete once [`Auth::is_done`]
/// returns `true`; the caller must have already written the `BEGIN` bytes
/// returned from the `receive_line` call that completed the `OK` exchange.
pub struct Auth {
    state: AuthState,
    mechanisms: VecDeque<Mechanism>,
    uid: u32,
    guid: Option<Guid>,
    client_challenge: Option<String>,
}

impl Auth {
    /// Construct a new handshake for the given Unix user id, attempting
    /// mechanisms in the default order: EXTERNAL, DBUS_COOKIE_SHA1,
    /// ANONYMOUS.
    pub fn new(uid: u32) -> Self {
        Self::with_mechanisms(
            uid,
            [Mechanism::External, Mechanism::CookieSha1, Mechanism::Anonymous],
        )
    }

    /// Construct a new handshake for the given Unix user id, restricted to
    /// (and ordered by) `mechanisms`.
    pub fn with_mechanisms<I>(uid: u32, mechanisms: I) -> Self
    where
        I: IntoIterator<Item = Mechanism>,
    {
        Self {
            state: AuthState::Init,
            mechanisms: mechanisms.into_iter().collect(),
            uid,
            guid: None,
            client_challenge: None,
        }
    }

    /// Construct the handshake using the uid of the current process.
    #[cfg(all(unix, feature = "libc"))]
    pub fn from_current_uid() -> Self {
        let uid = unsafe { libc::getuid() };
        Self::new(uid)
    }

    /// Test whether the handshake has completed successfully.
    pub fn is_done(&self) -> bool {
        matches!(self.state, AuthState::Done)
    }

    /// Test whether the handshake has failed terminally.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, AuthState::Failed)
    }

    /// The GUID reported by the server's `OK` reply, once authenticated.
    pub fn guid(&self) -> Option<&Guid> {
        self.guid.as_ref()
    }

    /// Produce the initial bytes to send: a single NUL byte followed by the
    /// first `AUTH <MECH> <initial-response>` line.
    pub fn start(&mut self) -> Result<Vec<u8>> {
        debug_assert!(matches!(self.state, AuthState::Init));
        let mut out = vec![0u8];
        out.extend(self.begin_next_mechanism()?);
        Ok(out)
    }

    fn begin_next_mechanism(&mut self) -> Result<Vec<u8>> {
        let mechanism = self
            .mechanisms
            .pop_front()
            .ok_or_else(|| Error::new(ErrorKind::AuthRejected))?;

        let initial_response = match mechanism {
            Mechanism::External => hex_encode(self.uid.to_string().as_bytes()),
            Mechanism::CookieSha1 => hex_encode(self.uid.to_string().as_bytes()),
            Mechanism::Anonymous => hex_encode(b"dbus-client"),
        };

        self.state = AuthState::AuthSent(mechanism);
        Ok(format!("AUTH {} {}\r\n", mechanism.name(), initial_response).into_bytes())
    }

    /// Feed one complete line received from the server, without its
    /// trailing `\r\n`. Returns the next bytes to write, if any.
    pub fn receive_line(&mut self, line: &[u8]) -> Result<Option<Vec<u8>>> {
        let line = trim_end(line);
        let (command, rest) = split_once(line, b' ').unwrap_or((line, b""));

        match command {
            b"OK" => self.on_ok(rest),
            b"REJECTED" => self.on_rejected(rest),
            b"DATA" => self.on_data(rest),
            b"ERROR" => {
                self.state = AuthState::Failed;
                Err(Error::new(ErrorKind::AuthRejected))
            }
            b"AGREE_UNIX_FD" => Ok(None),
            _ => {
                self.state = AuthState::Failed;
                Err(Error::new(ErrorKind::InvalidSasl))
            }
        }
    }

    fn on_ok(&mut self, guid_hex: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.state {
            AuthState::AuthSent(_) | AuthState::DataExchange(_) => {
                self.guid = Some(Guid::new(guid_hex));
                self.state = AuthState::BeginSent;
                Ok(Some(b"BEGIN\r\n".to_vec()))
            }
            _ => {
                self.state = AuthState::Failed;
                Err(Error::new(ErrorKind::InvalidSaslResponse))
            }
        }
    }

    fn on_rejected(&mut self, mechs: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.state {
            AuthState::AuthSent(_) | AuthState::DataExchange(_) => {}
            _ => {
                self.state = AuthState::Failed;
                return Err(Error::new(ErrorKind::InvalidSaslResponse));
            }
        }

        // Restrict remaining attempts to mechanisms the server just offered,
        // preserving our own preferred order.
        let offered: Vec<Mechanism> = mechs
            .split(|&b| b == b' ')
            .filter(|s| !s.is_empty())
            .filter_map(Mechanism::from_name)
            .collect();

        if !offered.is_empty() {
            self.mechanisms.retain(|m| offered.contains(m));
        }

        self.begin_next_mechanism().map(Some)
    }

    fn on_data(&mut self, payload_hex: &[u8]) -> Result<Option<Vec<u8>>> {
        let mechanism = match self.state {
            AuthState::AuthSent(m) | AuthState::DataExchange(m) => m,
            _ => {
                self.state = AuthState::Failed;
                return Err(Error::new(ErrorKind::InvalidSaslResponse));
            }
        };

        match mechanism {
            Mechanism::CookieSha1 => {
                let payload = hex_decode(payload_hex)?;
                let mut parts = payload.splitn(3, |&b| b == b' ');

                let (Some(context), Some(id), Some(server_challenge)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    self.state = AuthState::Failed;
                    return Err(Error::new(ErrorKind::InvalidSasl));
                };

                let cookie = cookie::read_cookie(context, id)?;
                let client_challenge = self
                    .client_challenge
                    .get_or_insert_with(cookie::client_challenge)
                    .clone();

                let response =
                    cookie::compute_response(server_challenge, client_challenge.as_bytes(), &cookie);

                let reply = format!("{client_challenge} {response}");
                self.state = AuthState::DataExchange(mechanism);
                Ok(Some(format!("DATA {}\r\n", hex_encode(reply.as_bytes())).into_bytes()))
            }
            _ => {
                self.state = AuthState::Failed;
                Err(Error::new(ErrorKind::InvalidSaslResponse))
            }
        }
    }

    /// Called once the `BEGIN` bytes returned for an `OK` reply have
    /// actually been written to the transport. Completes the handshake.
    pub fn finish_begin(&mut self) {
        debug_assert!(matches!(self.state, AuthState::BeginSent));
        self.state = AuthState::Done;
    }
}
