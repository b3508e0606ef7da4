use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::{Connection, Marshaller, Message, MessageKind};

/// The result of a [`block_call`], distinguishing every way a blocking
/// method call can conclude.
///
/// A single sentinel integer shared between "the call timed out" and
/// "sending the request failed" would make the two indistinguishable at the
/// call site; each failure mode gets its own variant instead.
#[derive(Debug)]
pub enum BlockOutcome<T> {
    /// A reply was received and decoded.
    Completed(T),
    /// The callee returned a D-Bus error reply.
    Error(crate::Error),
    /// The request could not be encoded or handed to the host transport.
    SendFailed,
    /// No reply arrived before the deadline.
    Timeout,
    /// [`Blocker::block`] reported a failure driving the underlying
    /// transport.
    BlockerFailed,
}

/// A host-supplied driver that pumps I/O into a [`Connection`] while
/// [`block_call`] waits synchronously for a reply.
///
/// Implementations typically poll the underlying socket for readability
/// (bounded by `timeout`, or indefinitely if `None`), read available bytes,
/// and feed them to [`Connection::feed`].
pub trait Blocker {
    /// Drive the transport for up to `timeout`, returning `Ok(())` once some
    /// progress has been made (bytes were fed to the connection) or the
    /// bound was reached, and `Err` if the transport itself failed.
    fn block(&mut self, connection: &mut Connection, timeout: Option<Duration>) -> crate::Result<()>;
}

struct Outcome<T> {
    value: Option<T>,
    error: Option<crate::Error>,
}

/// Send `call` and block the calling thread, driving `blocker`, until a
/// reply arrives, the deadline given by `timeout` passes, or the transport
/// fails.
///
/// `decode` converts the successful reply into `T`; it is not invoked for
/// error replies, which are surfaced as [`BlockOutcome::Error`].
pub fn block_call<T, F>(
    connection: &mut Connection,
    blocker: &mut dyn Blocker,
    call: Marshaller,
    timeout: Option<Duration>,
    decode: F,
) -> BlockOutcome<T>
where
    T: Send + 'static,
    F: for<'a> FnOnce(Message<'a>) -> T + Send + 'static,
{
    let outcome = Arc::new(Mutex::new(Outcome {
        value: None,
        error: None,
    }));
    let outcome_handle = outcome.clone();

    let slot = match call.send_with_reply(connection, move |message| {
        let mut outcome = outcome_handle.lock().unwrap();

        match message.kind() {
            MessageKind::Error { error_name, .. } => {
                let body = message
                    .body()
                    .next_string()
                    .unwrap_or("")
                    .to_string();
                outcome.error = Some(crate::Error::from(crate::error::ErrorKind::HandlerFailed(
                    format!("{error_name}: {body}").into(),
                )));
            }
            _ => outcome.value = Some(decode(message)),
        }
    }) {
        Ok(slot) => slot,
        Err(_) => return BlockOutcome::SendFailed,
    };

    let deadline = timeout.map(|timeout| Instant::now() + timeout);

    loop {
        {
            let mut guard = outcome.lock().unwrap();

            if let Some(value) = guard.value.take() {
                return BlockOutcome::Completed(value);
            }

            if let Some(error) = guard.error.take() {
                return BlockOutcome::Error(error);
            }
        }

        let remaining = match deadline {
            Some(deadline) => {
                let now = Instant::now();

                if now >= deadline {
                    return BlockOutcome::Timeout;
                }

                Some(deadline - now)
            }
            None => None,
        };

        if blocker.block(connection, remaining).is_err() {
            connection.cancel_reply(&slot);
            return BlockOutcome::BlockerFailed;
        }
    }
}
