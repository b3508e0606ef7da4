use super::{Auth, Mechanism};

#[test]
fn external_handshake() {
    let mut auth = Auth::with_mechanisms(1000, [Mechanism::External]);
    let start = auth.start().unwrap();
    assert_eq!(start, b"\0AUTH EXTERNAL 31303030\r\n");

    let next = auth.receive_line(b"OK 0123456789abcdef").unwrap();
    assert_eq!(next, Some(b"BEGIN\r\n".to_vec()));
    assert!(!auth.is_done());

    auth.finish_begin();
    assert!(auth.is_done());
    assert_eq!(auth.guid().unwrap().as_bytes(), b"0123456789abcdef");
}

#[test]
fn rejected_falls_back_to_next_mechanism() {
    let mut auth = Auth::with_mechanisms(1000, [Mechanism::External, Mechanism::Anonymous]);
    auth.start().unwrap();

    let next = auth
        .receive_line(b"REJECTED ANONYMOUS")
        .unwrap()
        .expect("a retry with ANONYMOUS");
    assert!(next.starts_with(b"AUTH ANONYMOUS "));

    let next = auth.receive_line(b"OK deadbeef").unwrap();
    assert_eq!(next, Some(b"BEGIN\r\n".to_vec()));
}

#[test]
fn rejected_with_no_mechanisms_left_fails() {
    let mut auth = Auth::with_mechanisms(1000, [Mechanism::External]);
    auth.start().unwrap();
    assert!(auth.receive_line(b"REJECTED ANONYMOUS").is_err());
}

#[test]
fn error_line_is_fatal() {
    let mut auth = Auth::with_mechanisms(1000, [Mechanism::External]);
    auth.start().unwrap();
    assert!(auth.receive_line(b"ERROR unsupported").is_err());
    assert!(auth.is_failed());
}
