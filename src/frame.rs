use crate::protocol::Endianness;

/// A fixed-size primitive that can be marshalled to and from the D-Bus wire
/// format in either byte order.
///
/// Implementors must have a natural D-Bus alignment of at most `8`.
pub(crate) trait Frame: Sized + Copy {
    /// The marshalled size of this type, in bytes.
    const SIZE: usize;
    /// The D-Bus alignment boundary for this type.
    const ALIGN: usize;

    /// Encode `self` into `out` using the given byte order.
    ///
    /// `out` must be exactly [`Frame::SIZE`] bytes long.
    fn write_bytes(self, endianness: Endianness, out: &mut [u8]);

    /// Decode a value of this type from `bytes` using the given byte order.
    ///
    /// `bytes` must be exactly [`Frame::SIZE`] bytes long.
    fn read_bytes(endianness: Endianness, bytes: &[u8]) -> Self;
}

impl Frame for u8 {
    const SIZE: usize = 1;
    const ALIGN: usize = 1;

    #[inline]
    fn write_bytes(self, _: Endianness, out: &mut [u8]) {
        out[0] = self;
    }

    #[inline]
    fn read_bytes(_: Endianness, bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Frame for i8 {
    const SIZE: usize = 1;
    const ALIGN: usize = 1;

    #[inline]
    fn write_bytes(self, _: Endianness, out: &mut [u8]) {
        out[0] = self as u8;
    }

    #[inline]
    fn read_bytes(_: Endianness, bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

macro_rules! impl_number {
    ($($ty:ty, $align:expr),* $(,)?) => {
        $(
            impl Frame for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();
                const ALIGN: usize = $align;

                #[inline]
                fn write_bytes(self, endianness: Endianness, out: &mut [u8]) {
                    let bytes = match endianness {
                        Endianness::LITTLE => self.to_le_bytes(),
                        _ => self.to_be_bytes(),
                    };
                    out[..Self::SIZE].copy_from_slice(&bytes);
                }

                #[inline]
                fn read_bytes(endianness: Endianness, bytes: &[u8]) -> Self {
                    let mut buf = [0u8; Self::SIZE];
                    buf.copy_from_slice(&bytes[..Self::SIZE]);

                    match endianness {
                        Endianness::LITTLE => <$ty>::from_le_bytes(buf),
                        _ => <$ty>::from_be_bytes(buf),
                    }
                }
            }
        )*
    }
}

impl_number!(u16, 2, u32, 4, u64, 8);
impl_number!(i16, 2, i32, 4, i64, 8);

impl Frame for f64 {
    const SIZE: usize = 8;
    const ALIGN: usize = 8;

    #[inline]
    fn write_bytes(self, endianness: Endianness, out: &mut [u8]) {
        self.to_bits().write_bytes(endianness, out);
    }

    #[inline]
    fn read_bytes(endianness: Endianness, bytes: &[u8]) -> Self {
        f64::from_bits(u64::read_bytes(endianness, bytes))
    }
}
