use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use sha1::{Digest, Sha1};

use crate::error::{Error, ErrorKind, Result};
use crate::utils::split_once;

/// Read the cookie identified by `id` from `$HOME/.dbus-keyrings/<context>`.
///
/// Cookie files hold one entry per line: `<id> <time> <cookie>`, space
/// separated. The cookie itself is taken verbatim (it is already an ASCII
/// token chosen by the keyring owner, not hex-decoded).
pub(super) fn read_cookie(context: &[u8], id: &[u8]) -> Result<Vec<u8>> {
    let home = env::var_os("HOME").ok_or_else(|| Error::new(ErrorKind::MissingHome))?;

    let mut path = PathBuf::from(home);
    path.push(".dbus-keyrings");
    path.push(String::from_utf8_lossy(context).as_ref());

    let contents = fs::read(&path).map_err(|_| Error::new(ErrorKind::CookieNotFound))?;

    for line in contents.split(|&b| b == b'\n') {
        let line = crate::utils::trim_end(line);

        if line.is_empty() {
            continue;
        }

        let Some((line_id, rest)) = split_once(line, b' ') else {
            continue;
        };

        if line_id != id {
            continue;
        }

        let Some((_time, cookie)) = split_once(rest, b' ') else {
            continue;
        };

        return Ok(cookie.to_vec());
    }

    Err(Error::new(ErrorKind::CookieNotFound))
}

/// Compute `SHA1(server_challenge + ":" + client_challenge + ":" + cookie)`,
/// returning the digest hex-encoded as the wire format expects.
pub(super) fn compute_response(
    server_challenge: &[u8],
    client_challenge: &[u8],
    cookie: &[u8],
) -> String {
    let mut hasher = Sha1::new();
    hasher.update(server_challenge);
    hasher.update(b":");
    hasher.update(client_challenge);
    hasher.update(b":");
    hasher.update(cookie);
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);

    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }

    out
}

/// Generate a fresh client challenge, a random-looking hex token unique to
/// this process and point in time.
///
/// This is a nonce for replay protection, not a secret; it needs no
/// cryptographic RNG, only uniqueness, so it is derived from the clock and
/// process id rather than pulling in a dependency on `rand`.
pub(super) fn client_challenge() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let pid = std::process::id() as u128;
    let mixed = nanos ^ (pid << 64) ^ 0x9E3779B97F4A7C15;
    format!("{mixed:032x}")
}
