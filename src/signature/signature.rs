use std::fmt;
use std::str::from_utf8_unchecked;

use crate::error::Result;
use crate::OwnedSignature;

use super::{validate, SignatureError};

/// A validated D-Bus signature.
///
/// # Examples
///
/// ```
/// use dbus_client::Signature;
///
/// const SIG: &Signature = Signature::new_const(b"aaaai");
///
/// assert!(Signature::new(b"aai").is_ok());
/// assert!(Signature::new(b"(").is_err());
/// ```
#[derive(Hash, PartialEq, Eq)]
#[repr(transparent)]
pub struct Signature([u8]);

impl Signature {
    /// The empty signature.
    pub const EMPTY: &'static Signature = Signature::new_const(b"");
    /// A signature value (`g`).
    pub const SIGNATURE: &'static Signature = Signature::new_const(b"g");
    /// An object path value (`o`).
    pub const OBJECT_PATH: &'static Signature = Signature::new_const(b"o");
    /// A string value (`s`).
    pub const STRING: &'static Signature = Signature::new_const(b"s");
    /// A single byte (`y`).
    pub const BYTE: &'static Signature = Signature::new_const(b"y");
    /// A boolean (`b`).
    pub const BOOLEAN: &'static Signature = Signature::new_const(b"b");
    /// Signed 16-bit integer (`n`).
    pub const INT16: &'static Signature = Signature::new_const(b"n");
    /// Unsigned 16-bit integer (`q`).
    pub const UINT16: &'static Signature = Signature::new_const(b"q");
    /// Signed 32-bit integer (`i`).
    pub const INT32: &'static Signature = Signature::new_const(b"i");
    /// Unsigned 32-bit integer (`u`).
    pub const UINT32: &'static Signature = Signature::new_const(b"u");
    /// Signed 64-bit integer (`x`).
    pub const INT64: &'static Signature = Signature::new_const(b"x");
    /// Unsigned 64-bit integer (`t`).
    pub const UINT64: &'static Signature = Signature::new_const(b"t");
    /// IEEE-754 double precision float (`d`).
    pub const DOUBLE: &'static Signature = Signature::new_const(b"d");
    /// A variant value (`v`).
    pub const VARIANT: &'static Signature = Signature::new_const(b"v");
    /// A Unix file descriptor index (`h`).
    pub const UNIX_FD: &'static Signature = Signature::new_const(b"h");

    /// Construct a new empty signature.
    pub const fn empty() -> &'static Self {
        unsafe { Self::new_unchecked(&[]) }
    }

    /// Test if the signature is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of bytes in the signature.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Construct a new signature, panicking if it is invalid.
    ///
    /// # Panics
    ///
    /// Panics if `signature` is not a valid D-Bus signature.
    ///
    /// ```compile_fail
    /// use dbus_client::Signature;
    ///
    /// const BAD: &Signature = Signature::new_const(b"(a)");
    /// ```
    #[inline]
    #[track_caller]
    pub const fn new_const(signature: &[u8]) -> &Signature {
        if validate(signature).is_err() {
            panic!("invalid D-Bus signature")
        }

        // SAFETY: the byte slice is repr(transparent) over this type, and we
        // just validated it.
        unsafe { Self::new_unchecked(signature) }
    }

    /// Try to construct a new signature, validating it.
    #[inline]
    pub const fn new(signature: &[u8]) -> Result<&Signature, SignatureError> {
        if let Err(error) = validate(signature) {
            return Err(error);
        }

        // SAFETY: just validated above.
        unsafe { Ok(Self::new_unchecked(signature)) }
    }

    /// Construct a new signature without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `signature` is a valid D-Bus signature.
    #[inline]
    pub(crate) const unsafe fn new_unchecked(signature: &[u8]) -> &Self {
        &*(signature as *const [u8] as *const Signature)
    }

    /// Get the signature as a string.
    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: validation indirectly ensures that the signature is valid UTF-8.
        unsafe { from_utf8_unchecked(&self.0) }
    }

    /// Get the signature as a byte slice.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Iterate over the top-level type codes of this signature, without
    /// descending into containers.
    pub(crate) fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.0.iter()
    }
}

impl fmt::Debug for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<Signature> for Signature {
    #[inline]
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl AsRef<[u8]> for Signature {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ToOwned for Signature {
    type Owned = OwnedSignature;

    #[inline]
    fn to_owned(&self) -> Self::Owned {
        // SAFETY: `self` is already a validated signature.
        unsafe { OwnedSignature::from_vec_unchecked(self.0.to_vec()) }
    }
}

impl PartialEq<OwnedSignature> for Signature {
    #[inline]
    fn eq(&self, other: &OwnedSignature) -> bool {
        self.0 == *other.as_bytes()
    }
}

impl PartialEq<[u8]> for Signature {
    #[inline]
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == *other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for Signature {
    #[inline]
    fn eq(&self, other: &[u8; N]) -> bool {
        self.0 == other[..]
    }
}
