use crate::buf::Iter;
use crate::protocol::Endianness;
use crate::Signature;

/// A D-Bus variant (`v`): a self-describing value carrying its own
/// signature alongside the encoded payload.
///
/// A [`Variant`] is a zero-copy capture of an embedded value, not a decoded
/// one. Call [`Variant::iter`] to obtain an [`Iter`] over its payload and
/// decode it according to [`Variant::signature`].
#[derive(Clone, Copy)]
pub struct Variant<'de> {
    signature: &'de Signature,
    data: &'de [u8],
    endianness: Endianness,
}

impl<'de> Variant<'de> {
    #[inline]
    pub(crate) fn new(signature: &'de Signature, data: &'de [u8], endianness: Endianness) -> Self {
        Self {
            signature,
            data,
            endianness,
        }
    }

    /// The signature of the value this variant contains.
    pub fn signature(&self) -> &'de Signature {
        self.signature
    }

    /// The raw, still-encoded bytes of the contained value.
    pub fn data(&self) -> &'de [u8] {
        self.data
    }

    /// Construct an iterator over the contained value.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_client::Endianness;
    /// use dbus_client::buf::Buffer;
    ///
    /// let mut buf = Buffer::new(Endianness::LITTLE);
    /// buf.begin_variant(dbus_client::Signature::UINT32)?;
    /// buf.append_uint32(7)?;
    /// buf.end_variant()?;
    ///
    /// let mut it = dbus_client::buf::Iter::new(buf.as_bytes(), Endianness::LITTLE);
    /// let variant = it.next_variant()?;
    /// assert_eq!(variant.iter().next_uint32()?, 7);
    /// # Ok::<_, dbus_client::Error>(())
    /// ```
    pub fn iter(&self) -> Iter<'de> {
        Iter::new(self.data, self.endianness)
    }
}

impl std::fmt::Debug for Variant<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variant")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
