use std::fmt;

/// Formats a byte slice as a lossily-decoded UTF-8 string in `Debug` output.
///
/// Used for diagnostics over wire bytes (such as raw SASL lines) that are
/// not guaranteed to be valid UTF-8.
pub(crate) struct LossyStr<'a>(&'a [u8]);

impl<'a> LossyStr<'a> {
    #[inline]
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for LossyStr<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.0), f)
    }
}

impl fmt::Display for LossyStr<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.0), f)
    }
}
