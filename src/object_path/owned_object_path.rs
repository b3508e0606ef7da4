use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use crate::ObjectPath;

/// An owned D-Bus object path.
///
/// Dereferences to [`ObjectPath`].
#[derive(Clone, PartialEq, Eq)]
pub struct OwnedObjectPath(Vec<u8>);

impl OwnedObjectPath {
    /// Construct directly from a vector.
    ///
    /// # Safety
    ///
    /// Caller must ensure that this is a valid object path.
    pub(crate) unsafe fn from_raw_vec(path: Vec<u8>) -> Self {
        Self(path)
    }
}

impl fmt::Debug for OwnedObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl fmt::Display for OwnedObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl Deref for OwnedObjectPath {
    type Target = ObjectPath;

    fn deref(&self) -> &Self::Target {
        // SAFETY: construction of `OwnedObjectPath` only ever happens through
        // validated bytes.
        unsafe { ObjectPath::new_unchecked(&self.0) }
    }
}

impl Borrow<ObjectPath> for OwnedObjectPath {
    #[inline]
    fn borrow(&self) -> &ObjectPath {
        self
    }
}

impl AsRef<ObjectPath> for OwnedObjectPath {
    #[inline]
    fn as_ref(&self) -> &ObjectPath {
        self
    }
}

impl From<&ObjectPath> for OwnedObjectPath {
    #[inline]
    fn from(path: &ObjectPath) -> Self {
        path.to_owned()
    }
}

impl PartialEq<ObjectPath> for OwnedObjectPath {
    #[inline]
    fn eq(&self, other: &ObjectPath) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&ObjectPath> for OwnedObjectPath {
    #[inline]
    fn eq(&self, other: &&ObjectPath) -> bool {
        self.0 == other.as_bytes()
    }
}
