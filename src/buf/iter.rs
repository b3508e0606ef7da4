use crate::error::{Error, ErrorKind, Result};
use crate::frame::Frame;
use crate::protocol::Endianness;
use crate::{ObjectPath, Signature};

use super::{padding_to, type_align, MAX_ARRAY_LENGTH, MAX_DEPTH};

#[derive(Clone, Copy)]
enum Container {
    Array { end: usize, element_align: usize },
    Struct,
    DictEntry,
}

/// A cursor over a marshalled D-Bus message body.
///
/// # Examples
///
/// ```
/// use dbus_client::Endianness;
/// use dbus_client::buf::Buffer;
///
/// let mut buf = Buffer::new(Endianness::LITTLE);
/// buf.append_uint32(42)?;
/// buf.append_string("hello")?;
///
/// let mut it = buf.as_bytes().iter();
/// let mut reader = dbus_client::buf::Iter::new(buf.as_bytes(), Endianness::LITTLE);
/// assert_eq!(reader.next_uint32()?, 42);
/// assert_eq!(reader.next_string()?, "hello");
/// # let _ = &mut it;
/// # Ok::<_, dbus_client::Error>(())
/// ```
pub struct Iter<'de> {
    data: &'de [u8],
    endianness: Endianness,
    pos: usize,
    stack: Vec<Container>,
}

impl<'de> Iter<'de> {
    /// Construct a new reader over `data` encoded with `endianness`.
    pub fn new(data: &'de [u8], endianness: Endianness) -> Self {
        Self {
            data,
            endianness,
            pos: 0,
            stack: Vec::new(),
        }
    }

    /// The number of bytes remaining to be consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Test if every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn align_to(&mut self, align: usize) -> Result<()> {
        let pad = padding_to(align, self.pos);

        if self.pos + pad > self.data.len() {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        }

        for b in &self.data[self.pos..self.pos + pad] {
            if *b != 0 {
                return Err(Error::new(ErrorKind::InvalidProtocol));
            }
        }

        self.pos += pad;
        Ok(())
    }

    fn read<T: Frame>(&mut self) -> Result<T> {
        self.align_to(T::ALIGN)?;

        if self.pos + T::SIZE > self.data.len() {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        }

        let value = T::read_bytes(self.endianness, &self.data[self.pos..self.pos + T::SIZE]);
        self.pos += T::SIZE;
        Ok(value)
    }

    /// Read a single byte (`y`).
    pub fn next_byte(&mut self) -> Result<u8> {
        self.read()
    }

    /// Read a boolean (`b`).
    pub fn next_bool(&mut self) -> Result<bool> {
        let value: u32 = self.read()?;
        Ok(value != 0)
    }

    /// Read a signed 16-bit integer (`n`).
    pub fn next_int16(&mut self) -> Result<i16> {
        self.read()
    }

    /// Read an unsigned 16-bit integer (`q`).
    pub fn next_uint16(&mut self) -> Result<u16> {
        self.read()
    }

    /// Read a signed 32-bit integer (`i`).
    pub fn next_int32(&mut self) -> Result<i32> {
        self.read()
    }

    /// Read an unsigned 32-bit integer (`u`).
    pub fn next_uint32(&mut self) -> Result<u32> {
        self.read()
    }

    /// Read a signed 64-bit integer (`x`).
    pub fn next_int64(&mut self) -> Result<i64> {
        self.read()
    }

    /// Read an unsigned 64-bit integer (`t`).
    pub fn next_uint64(&mut self) -> Result<u64> {
        self.read()
    }

    /// Read an IEEE-754 double (`d`).
    pub fn next_double(&mut self) -> Result<f64> {
        self.read()
    }

    /// Read a Unix file descriptor index (`h`).
    pub fn next_unix_fd(&mut self) -> Result<u32> {
        self.read()
    }

    fn take(&mut self, len: usize) -> Result<&'de [u8]> {
        if self.pos + len > self.data.len() {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        }

        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_nul(&mut self, len: usize) -> Result<&'de [u8]> {
        let bytes = self.take(len)?;

        match self.take(1)? {
            [0] => Ok(bytes),
            _ => Err(Error::new(ErrorKind::NotNullTerminated)),
        }
    }

    /// Read a UTF-8 string (`s`).
    pub fn next_string(&mut self) -> Result<&'de str> {
        let len = self.next_uint32()? as usize;
        let bytes = self.take_nul(len)?;
        Ok(std::str::from_utf8(bytes)?)
    }

    /// Read an object path (`o`).
    pub fn next_object_path(&mut self) -> Result<&'de ObjectPath> {
        let len = self.next_uint32()? as usize;
        let bytes = self.take_nul(len)?;
        Ok(ObjectPath::new(bytes)?)
    }

    /// Read a signature value (`g`).
    pub fn next_signature(&mut self) -> Result<&'de Signature> {
        let len = self.next_byte()? as usize;
        let bytes = self.take_nul(len)?;
        Ok(Signature::new(bytes)?)
    }

    fn push_container(&mut self, container: Container) -> Result<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(Error::new(ErrorKind::MessageTooLong));
        }

        self.stack.push(container);
        Ok(())
    }

    /// Begin reading an array, returning its element signature's natural
    /// alignment and the byte offset at which it ends.
    pub fn begin_array(&mut self, element: &Signature) -> Result<()> {
        let len = self.next_uint32()?;

        if len > MAX_ARRAY_LENGTH {
            return Err(Error::new(ErrorKind::ArrayTooLong(len)));
        }

        let element_align = element
            .as_bytes()
            .first()
            .map(|b| type_align(*b))
            .unwrap_or(1);

        self.align_to(element_align)?;
        let end = self.pos + len as usize;

        if end > self.data.len() {
            return Err(Error::new(ErrorKind::BufferUnderflow));
        }

        self.push_container(Container::Array { end, element_align })
    }

    /// Test whether the array started by the most recent
    /// [`Iter::begin_array`] has another element to read.
    pub fn array_has_next(&mut self) -> Result<bool> {
        match self.stack.last() {
            Some(Container::Array { end, element_align }) => {
                let element_align = *element_align;

                if self.pos >= *end {
                    return Ok(false);
                }

                self.align_to(element_align)?;
                Ok(self.pos < *end)
            }
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// End the array started by the most recent [`Iter::begin_array`].
    pub fn end_array(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Array { end, .. }) => {
                self.pos = end;
                Ok(())
            }
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// Begin reading a struct.
    pub fn begin_struct(&mut self) -> Result<()> {
        self.align_to(8)?;
        self.push_container(Container::Struct)
    }

    /// End the struct started by the most recent [`Iter::begin_struct`].
    pub fn end_struct(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Struct) => Ok(()),
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// Begin reading a dict entry.
    pub fn begin_dict_entry(&mut self) -> Result<()> {
        self.align_to(8)?;
        self.push_container(Container::DictEntry)
    }

    /// End the dict entry started by the most recent
    /// [`Iter::begin_dict_entry`].
    pub fn end_dict_entry(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::DictEntry) => Ok(()),
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// Begin reading a variant, returning the signature of its contained
    /// value.
    pub fn begin_variant(&mut self) -> Result<&'de Signature> {
        self.next_signature()
    }

    /// End the variant started by the most recent [`Iter::begin_variant`].
    ///
    /// This is a no-op: variants carry no closing marker on the wire. It
    /// exists for symmetry with [`crate::buf::Buffer::end_variant`].
    pub fn end_variant(&mut self) -> Result<()> {
        Ok(())
    }

    /// Capture the raw bytes of the single complete value described by
    /// `signature`, starting at its naturally-aligned offset, without
    /// interpreting it.
    ///
    /// This is how [`crate::Variant`] captures an embedded value without
    /// fully decoding it: the returned slice is valid D-Bus wire data that
    /// can be re-parsed later with an [`Iter`] constructed over it.
    pub fn value(&mut self, signature: &Signature) -> Result<&'de [u8]> {
        let align = signature
            .as_bytes()
            .first()
            .map(|b| type_align(*b))
            .unwrap_or(1);
        self.align_to(align)?;
        let start = self.pos;
        self.skip_value(signature)?;
        Ok(&self.data[start..self.pos])
    }

    /// Read a variant (`v`): its embedded signature plus the raw bytes of
    /// its value, without fully decoding the value.
    pub fn next_variant(&mut self) -> Result<crate::Variant<'de>> {
        let signature = self.begin_variant()?;
        let data = self.value(signature)?;
        self.end_variant()?;
        Ok(crate::Variant::new(signature, data, self.endianness))
    }

    /// Skip over every value described by `signature` without interpreting
    /// them.
    pub fn skip_value(&mut self, signature: &Signature) -> Result<()> {
        let bytes = signature.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            pos = self.skip_one(bytes, pos)?;
        }

        Ok(())
    }

    /// Skip a single complete type starting at `bytes[pos]`, returning the
    /// position in `bytes` immediately following it.
    fn skip_one(&mut self, bytes: &[u8], pos: usize) -> Result<usize> {
        match bytes[pos] {
            b'y' => {
                self.next_byte()?;
            }
            b'b' => {
                self.next_bool()?;
            }
            b'n' => {
                self.next_int16()?;
            }
            b'q' => {
                self.next_uint16()?;
            }
            b'i' => {
                self.next_int32()?;
            }
            b'u' | b'h' => {
                self.next_uint32()?;
            }
            b'x' => {
                self.next_int64()?;
            }
            b't' => {
                self.next_uint64()?;
            }
            b'd' => {
                self.next_double()?;
            }
            b's' => {
                self.next_string()?;
            }
            b'o' => {
                self.next_object_path()?;
            }
            b'g' => {
                self.next_signature()?;
            }
            b'v' => {
                let sig = self.begin_variant()?.to_owned();
                self.skip_value(&sig)?;
            }
            b'a' => {
                let (element_end, next) = Self::element_span(bytes, pos + 1)?;
                let element = Signature::new(&bytes[pos + 1..element_end])?;
                self.begin_array(element)?;

                while self.array_has_next()? {
                    self.skip_one(bytes, pos + 1)?;
                }

                self.end_array()?;
                return Ok(next);
            }
            b'(' => {
                self.begin_struct()?;
                let mut inner = pos + 1;

                while bytes[inner] != b')' {
                    inner = self.skip_one(bytes, inner)?;
                }

                self.end_struct()?;
                return Ok(inner + 1);
            }
            b'{' => {
                self.begin_dict_entry()?;
                let mut inner = pos + 1;

                while bytes[inner] != b'}' {
                    inner = self.skip_one(bytes, inner)?;
                }

                self.end_dict_entry()?;
                return Ok(inner + 1);
            }
            _ => return Err(Error::new(ErrorKind::InvalidProtocol)),
        }

        Ok(pos + 1)
    }

    /// Find the end of the single complete type starting at `pos`, returning
    /// `(end, end)` since array element signatures are always exactly one
    /// complete type.
    fn element_span(bytes: &[u8], pos: usize) -> Result<(usize, usize)> {
        let end = match bytes.get(pos) {
            Some(b'a') => Self::element_span(bytes, pos + 1)?.0,
            Some(b'(') => {
                let mut inner = pos + 1;

                while bytes.get(inner) != Some(&b')') {
                    inner = Self::element_span(bytes, inner)?.0;
                }

                inner + 1
            }
            Some(b'{') => {
                let mut inner = pos + 1;

                while bytes.get(inner) != Some(&b'}') {
                    inner = Self::element_span(bytes, inner)?.0;
                }

                inner + 1
            }
            Some(_) => pos + 1,
            None => return Err(Error::new(ErrorKind::InvalidProtocol)),
        };

        Ok((end, end))
    }
}
