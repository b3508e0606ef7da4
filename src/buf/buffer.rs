use crate::error::{Error, ErrorKind, Result};
use crate::frame::Frame;
use crate::protocol::Endianness;
use crate::{ObjectPath, OwnedSignature, Signature};

use super::{padding_to, type_align, MAX_ARRAY_LENGTH, MAX_BODY_LENGTH, MAX_DEPTH};

#[derive(Clone, Copy)]
enum Container {
    Array { length_offset: usize, start: usize, element_align: usize },
    Struct,
    DictEntry,
    Variant,
}

/// A growable buffer used to marshal a D-Bus message body, and to stage raw
/// bytes received from a host transport before they are framed into
/// messages.
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
/// assert_eq!(buf.signature().to_string(), "us");
/// # Ok::<_, dbus_client::Error>(())
/// ```
pub struct Buffer {
    endianness: Endianness,
    data: Vec<u8>,
    signature: OwnedSignature,
    stack: Vec<Container>,
    suppress_signature: usize,
}

impl Buffer {
    /// Construct a new empty buffer using the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        Self {
            endianness,
            data: Vec::new(),
            signature: OwnedSignature::new(),
            stack: Vec::new(),
            suppress_signature: 0,
        }
    }

    /// The byte order this buffer encodes values with.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The bytes written to the buffer so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The number of bytes written to the buffer so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Test if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The signature accumulated from values appended so far.
    ///
    /// This is only a complete, well-formed signature once every container
    /// opened with a `begin_*` call has been matched by its `end_*` call.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Clear the buffer and reset it for reuse.
    pub fn reset(&mut self) {
        self.data.clear();
        self.signature.clear();
        self.stack.clear();
        self.suppress_signature = 0;
    }

    /// Discard whatever signature has been inferred so far and replace it
    /// with an explicit one.
    ///
    /// This is used when the caller already knows the exact signature a body
    /// must carry, such as when mirroring a signature taken from an incoming
    /// message header.
    pub fn set_signature_explicit(&mut self, signature: &Signature) {
        self.signature.clear();
        self.signature.extend_from_signature(signature);
    }

    /// Borrow a writable slice of at least `len` bytes for the host transport
    /// to fill with bytes read from the wire.
    ///
    /// Call [`Buffer::commit_recv`] with the number of bytes actually
    /// written once the read completes.
    pub fn recv_slot(&mut self, len: usize) -> &mut [u8] {
        let start = self.data.len();
        self.data.resize(start + len, 0);
        &mut self.data[start..]
    }

    /// Commit `len` bytes previously written into the slot returned by
    /// [`Buffer::recv_slot`], discarding the rest of the reserved capacity.
    pub fn commit_recv(&mut self, reserved: usize, len: usize) {
        let current = self.data.len();
        debug_assert!(reserved <= current);
        self.data.truncate(current - reserved + len);
    }

    fn align_to(&mut self, align: usize) {
        let pad = padding_to(align, self.data.len());
        self.data.resize(self.data.len() + pad, 0);
    }

    fn push_signature_char(&mut self, code: u8) {
        if self.suppress_signature == 0 {
            self.signature.push(code);
        }
    }

    fn push_signature_bytes(&mut self, signature: &Signature) {
        if self.suppress_signature == 0 {
            self.signature.extend_from_signature(signature);
        }
    }

    fn write<T: Frame>(&mut self, value: T) {
        self.align_to(T::ALIGN);
        let start = self.data.len();
        self.data.resize(start + T::SIZE, 0);
        value.write_bytes(self.endianness, &mut self.data[start..start + T::SIZE]);
    }

    /// Append a single byte (`y`).
    pub fn append_byte(&mut self, value: u8) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'y');
        Ok(())
    }

    /// Append a boolean (`b`), encoded as a 32-bit integer that is either 0
    /// or 1.
    pub fn append_bool(&mut self, value: bool) -> Result<()> {
        self.write(value as u32);
        self.push_signature_char(b'b');
        Ok(())
    }

    /// Append a signed 16-bit integer (`n`).
    pub fn append_int16(&mut self, value: i16) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'n');
        Ok(())
    }

    /// Append an unsigned 16-bit integer (`q`).
    pub fn append_uint16(&mut self, value: u16) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'q');
        Ok(())
    }

    /// Append a signed 32-bit integer (`i`).
    pub fn append_int32(&mut self, value: i32) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'i');
        Ok(())
    }

    /// Append an unsigned 32-bit integer (`u`).
    pub fn append_uint32(&mut self, value: u32) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'u');
        Ok(())
    }

    /// Append a signed 64-bit integer (`x`).
    pub fn append_int64(&mut self, value: i64) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'x');
        Ok(())
    }

    /// Append an unsigned 64-bit integer (`t`).
    pub fn append_uint64(&mut self, value: u64) -> Result<()> {
        self.write(value);
        self.push_signature_char(b't');
        Ok(())
    }

    /// Append an IEEE-754 double (`d`).
    pub fn append_double(&mut self, value: f64) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'd');
        Ok(())
    }

    /// Append a Unix file descriptor index (`h`).
    pub fn append_unix_fd(&mut self, value: u32) -> Result<()> {
        self.write(value);
        self.push_signature_char(b'h');
        Ok(())
    }

    fn append_len32_prefixed(&mut self, bytes: &[u8]) {
        self.write(bytes.len() as u32);
        self.data.extend_from_slice(bytes);
        self.data.push(0);
    }

    /// Append a UTF-8 string (`s`).
    pub fn append_string(&mut self, value: &str) -> Result<()> {
        self.append_len32_prefixed(value.as_bytes());
        self.push_signature_char(b's');
        Ok(())
    }

    /// Append an object path (`o`).
    pub fn append_object_path(&mut self, value: &ObjectPath) -> Result<()> {
        self.append_len32_prefixed(value.as_bytes());
        self.push_signature_char(b'o');
        Ok(())
    }

    /// Append a signature value (`g`).
    ///
    /// Unlike strings, a signature is length-prefixed by a single byte
    /// rather than a 32-bit integer, and is not 4-byte aligned.
    pub fn append_signature(&mut self, value: &Signature) -> Result<()> {
        self.write_signature_bytes(value);
        self.push_signature_char(b'g');
        Ok(())
    }

    fn write_signature_bytes(&mut self, value: &Signature) {
        self.write(value.len() as u8);
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
    }

    fn push_container(&mut self, container: Container) -> Result<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(Error::new(ErrorKind::MessageTooLong));
        }

        self.stack.push(container);
        Ok(())
    }

    /// Begin an array whose elements have the given signature.
    pub fn begin_array(&mut self, element: &Signature) -> Result<()> {
        self.align_to(4);
        let length_offset = self.data.len();
        self.data.extend_from_slice(&[0u8; 4]);

        self.push_signature_char(b'a');
        self.push_signature_bytes(element);

        let element_align = element
            .as_bytes()
            .first()
            .map(|b| type_align(*b))
            .unwrap_or(1);

        self.align_to(element_align);
        let start = self.data.len();

        self.push_container(Container::Array {
            length_offset,
            start,
            element_align,
        })
    }

    /// Realign before writing the next array element.
    ///
    /// This must be called before every element after the first; it is a
    /// no-op for elements whose alignment is already satisfied.
    pub fn array_entry(&mut self) -> Result<()> {
        if let Some(Container::Array { element_align, .. }) = self.stack.last() {
            let align = *element_align;
            self.align_to(align);
        }

        Ok(())
    }

    /// End the array started by the most recent [`Buffer::begin_array`].
    pub fn end_array(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Array { length_offset, start, .. }) => {
                let len = self.data.len() - start;

                if len as u64 > MAX_ARRAY_LENGTH as u64 {
                    return Err(Error::new(ErrorKind::ArrayTooLong(len as u32)));
                }

                let len = len as u32;
                len.write_bytes(
                    self.endianness,
                    &mut self.data[length_offset..length_offset + 4],
                );

                Ok(())
            }
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// Begin a struct.
    pub fn begin_struct(&mut self) -> Result<()> {
        self.align_to(8);
        self.push_signature_char(b'(');
        self.push_container(Container::Struct)
    }

    /// End the struct started by the most recent [`Buffer::begin_struct`].
    pub fn end_struct(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Struct) => {
                self.push_signature_char(b')');
                Ok(())
            }
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// Begin a dict entry. Must be called directly inside an array whose
    /// element signature begins with `{`.
    pub fn begin_dict_entry(&mut self) -> Result<()> {
        self.align_to(8);
        self.push_signature_char(b'{');
        self.push_container(Container::DictEntry)
    }

    /// End the dict entry started by the most recent
    /// [`Buffer::begin_dict_entry`].
    pub fn end_dict_entry(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::DictEntry) => {
                self.push_signature_char(b'}');
                Ok(())
            }
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// Begin a variant holding a value of the given signature.
    pub fn begin_variant(&mut self, value_signature: &Signature) -> Result<()> {
        self.write_signature_bytes(value_signature);
        self.push_signature_char(b'v');
        self.suppress_signature += 1;
        self.push_container(Container::Variant)
    }

    /// End the variant started by the most recent [`Buffer::begin_variant`].
    pub fn end_variant(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Container::Variant) => {
                self.suppress_signature -= 1;
                Ok(())
            }
            _ => Err(Error::new(ErrorKind::InvalidProtocol)),
        }
    }

    /// Validate that the accumulated body does not exceed the maximum
    /// message body length.
    pub(crate) fn check_body_length(&self) -> Result<()> {
        if self.data.len() as u64 > MAX_BODY_LENGTH as u64 {
            return Err(Error::new(ErrorKind::BodyTooLong(self.data.len() as u32)));
        }

        Ok(())
    }
}
