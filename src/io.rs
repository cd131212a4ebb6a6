//! Low-level byte cursors shared by every tag codec.
//!
//! A [`DecodeStream`] reads typed values from a borrowed slice; an [`EncodeStream`] appends
//! them to a growable buffer. Both report failures to a [`StreamContext`] instead of returning
//! errors from every call: the first failure is captured, and from then on every read on every
//! stream sharing the context is a no-op returning a default value. Callers check the context
//! at the points where it matters (after a tag header, after a tag sequence, at entry points).
//!
//! All fixed-width values are little-endian.

use std::cell::{Cell, RefCell};

use crate::error::{CodecError, Result};

const END_OF_FILE: &str = "End of file was encountered";

/// Failure state shared by all streams of one decode or encode call.
#[derive(Debug)]
pub struct StreamContext {
    abort_flag: Cell<bool>,
    error_capture: RefCell<Option<CodecError>>,
    tag_level: Cell<u16>,
}

impl StreamContext {
    /// Creates a context with no failure recorded.
    pub fn new() -> Self {
        Self {
            abort_flag: Cell::new(false),
            error_capture: RefCell::new(None),
            tag_level: Cell::new(1),
        }
    }

    /// Records `err` unless an earlier failure was already captured.
    pub fn signal_error(&self, err: CodecError) {
        let mut guard = self.error_capture.borrow_mut();
        if guard.is_none() {
            *guard = Some(err);
            self.abort_flag.set(true);
        }
    }

    /// Returns true once any failure has been recorded.
    pub fn has_failed(&self) -> bool {
        self.abort_flag.get()
    }

    /// Returns the first captured failure, if any.
    pub fn error(&self) -> Option<CodecError> {
        self.error_capture.borrow().clone()
    }

    /// Converts the failure state into a `Result`.
    pub fn check(&self) -> Result<()> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The highest tag code seen so far (at least 1).
    pub fn tag_level(&self) -> u16 {
        self.tag_level.get()
    }

    pub(crate) fn raise_tag_level(&self, code: u16) {
        if code > self.tag_level.get() {
            self.tag_level.set(code);
        }
    }
}

impl Default for StreamContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A read cursor over a borrowed byte range.
#[derive(Debug, Clone)]
pub struct DecodeStream<'a> {
    context: &'a StreamContext,
    bytes: &'a [u8],
    position: usize,
}

impl<'a> DecodeStream<'a> {
    /// Creates a cursor at the start of `bytes`.
    pub fn new(context: &'a StreamContext, bytes: &'a [u8]) -> Self {
        Self {
            context,
            bytes,
            position: 0,
        }
    }

    /// The context this stream reports to.
    pub fn context(&self) -> &'a StreamContext {
        self.context
    }

    /// Total length of the range.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current read offset within the range.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes.
    pub fn bytes_available(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Returns the whole range this stream covers.
    pub fn data(&self) -> &'a [u8] {
        self.bytes
    }

    /// Converts the shared failure state into a `Result`.
    pub fn check(&self) -> Result<()> {
        self.context.check()
    }

    fn take(&mut self, count: usize) -> Option<&'a [u8]> {
        if self.context.has_failed() {
            return None;
        }
        let slice = self
            .position
            .checked_add(count)
            .and_then(|end| self.bytes.get(self.position..end));
        match slice {
            Some(slice) => {
                self.position += count;
                Some(slice)
            }
            None => {
                self.context
                    .signal_error(CodecError::Truncation(END_OF_FILE.into()));
                None
            }
        }
    }

    fn read_array<const N: usize>(&mut self) -> [u8; N] {
        let mut buf = [0u8; N];
        if let Some(slice) = self.take(N) {
            buf.copy_from_slice(slice);
        }
        buf
    }

    /// Takes the next `length` bytes as a child stream sharing this context.
    ///
    /// On failure the child is empty and the context is marked failed.
    pub fn read_bytes(&mut self, length: usize) -> DecodeStream<'a> {
        let bytes = self.take(length).unwrap_or_default();
        DecodeStream::new(self.context, bytes)
    }

    /// Advances past `length` bytes.
    pub fn skip(&mut self, length: usize) {
        let _ = self.take(length);
    }

    /// Reads a boolean stored as one byte.
    pub fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    /// Reads an unsigned byte.
    pub fn read_u8(&mut self) -> u8 {
        u8::from_le_bytes(self.read_array())
    }

    /// Reads a signed byte.
    pub fn read_i8(&mut self) -> i8 {
        i8::from_le_bytes(self.read_array())
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> u16 {
        u16::from_le_bytes(self.read_array())
    }

    /// Reads a little-endian `i16`.
    pub fn read_i16(&mut self) -> i16 {
        i16::from_le_bytes(self.read_array())
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.read_array())
    }

    /// Reads a little-endian `i32`.
    pub fn read_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.read_array())
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self) -> u64 {
        u64::from_le_bytes(self.read_array())
    }

    /// Reads a little-endian `i64`.
    pub fn read_i64(&mut self) -> i64 {
        i64::from_le_bytes(self.read_array())
    }

    /// Reads a little-endian IEEE-754 `f32`.
    pub fn read_f32(&mut self) -> f32 {
        f32::from_le_bytes(self.read_array())
    }

    /// Reads a variable-length `u32` (7 bits per byte, high bit = continuation).
    pub fn read_encoded_u32(&mut self) -> u32 {
        let mut value = 0u32;
        let mut shift = 0;
        while shift < 32 {
            let byte = self.read_u8();
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        value
    }

    /// Reads a variable-length `u64`.
    pub fn read_encoded_u64(&mut self) -> u64 {
        let mut value = 0u64;
        let mut shift = 0;
        while shift < 64 {
            let byte = self.read_u8();
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        value
    }

    /// Reads a variable-length `i32`. The low bit carries the sign.
    pub fn read_encoded_i32(&mut self) -> i32 {
        let data = self.read_encoded_u32();
        let magnitude = (data >> 1) as i32;
        if data & 1 != 0 { -magnitude } else { magnitude }
    }

    /// Reads a variable-length `i64`. The low bit carries the sign.
    pub fn read_encoded_i64(&mut self) -> i64 {
        let data = self.read_encoded_u64();
        let magnitude = (data >> 1) as i64;
        if data & 1 != 0 { -magnitude } else { magnitude }
    }

    /// Reads a NUL-terminated UTF-8 string.
    ///
    /// A missing terminator takes the rest of the range. Invalid UTF-8 is replaced lossily.
    pub fn read_string(&mut self) -> String {
        if self.context.has_failed() {
            return String::new();
        }
        if self.position >= self.bytes.len() {
            self.context
                .signal_error(CodecError::Truncation(END_OF_FILE.into()));
            return String::new();
        }
        let rest = &self.bytes[self.position..];
        match rest.iter().position(|b| *b == 0) {
            Some(end) => {
                self.position += end + 1;
                String::from_utf8_lossy(&rest[..end]).into_owned()
            }
            None => {
                self.position = self.bytes.len();
                String::from_utf8_lossy(rest).into_owned()
            }
        }
    }

    /// Reads an encoded length followed by that many bytes.
    pub fn read_byte_data(&mut self) -> Vec<u8> {
        let length = self.read_encoded_u32() as usize;
        self.take(length).map(<[u8]>::to_vec).unwrap_or_default()
    }
}

/// An append-only cursor producing an owned buffer.
#[derive(Debug)]
pub struct EncodeStream<'a> {
    context: &'a StreamContext,
    bytes: Vec<u8>,
}

impl<'a> EncodeStream<'a> {
    /// Creates an empty stream.
    pub fn new(context: &'a StreamContext) -> Self {
        Self {
            context,
            bytes: Vec::new(),
        }
    }

    /// The context this stream reports to.
    pub fn context(&self) -> &'a StreamContext {
        self.context
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Releases the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Writes a boolean as one byte.
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Writes an unsigned byte.
    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Writes a signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a little-endian `i16`.
    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a little-endian `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a little-endian IEEE-754 `f32`.
    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Writes a variable-length `u32`.
    pub fn write_encoded_u32(&mut self, value: u32) {
        self.write_encoded_u64(u64::from(value));
    }

    /// Writes a variable-length `u64`.
    pub fn write_encoded_u64(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.write_u8(byte);
                break;
            }
            self.write_u8(byte | 0x80);
        }
    }

    /// Writes a variable-length `i32`. The low bit carries the sign.
    ///
    /// `i32::MIN` has no encoding and signals a `Format` error.
    pub fn write_encoded_i32(&mut self, value: i32) {
        if value == i32::MIN {
            self.signal_unencodable(value.into());
            return;
        }
        let flag = u32::from(value < 0);
        self.write_encoded_u32((value.unsigned_abs() << 1) | flag);
    }

    /// Writes a variable-length `i64`. The low bit carries the sign.
    ///
    /// `i64::MIN` has no encoding and signals a `Format` error.
    pub fn write_encoded_i64(&mut self, value: i64) {
        if value == i64::MIN {
            self.signal_unencodable(value);
            return;
        }
        let flag = u64::from(value < 0);
        self.write_encoded_u64((value.unsigned_abs() << 1) | flag);
    }

    fn signal_unencodable(&self, value: i64) {
        self.context.signal_error(CodecError::Format(format!(
            "Value {value} cannot be stored as an encoded integer"
        )));
    }

    /// Writes a NUL-terminated UTF-8 string.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
        self.write_u8(0);
    }

    /// Writes an encoded length followed by the bytes.
    pub fn write_byte_data(&mut self, data: &[u8]) {
        match u32::try_from(data.len()) {
            Ok(length) => {
                self.write_encoded_u32(length);
                self.write_bytes(data);
            }
            Err(_) => self.context.signal_error(CodecError::Format(format!(
                "Byte data of {} bytes exceeds the format limit",
                data.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_integers_survive_the_wire() {
        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        out.write_encoded_u32(0);
        out.write_encoded_u32(300);
        out.write_encoded_u32(u32::MAX);
        out.write_encoded_i32(-5);
        out.write_encoded_i32(i32::MIN + 1);
        out.write_encoded_i64(-1_234_567_890_123);
        out.write_encoded_i64(i64::MIN + 1);
        out.write_encoded_u64(u64::MAX >> 1);
        let bytes = out.into_bytes();

        let mut input = DecodeStream::new(&context, &bytes);
        assert_eq!(input.read_encoded_u32(), 0);
        assert_eq!(input.read_encoded_u32(), 300);
        assert_eq!(input.read_encoded_u32(), u32::MAX);
        assert_eq!(input.read_encoded_i32(), -5);
        assert_eq!(input.read_encoded_i32(), i32::MIN + 1);
        assert_eq!(input.read_encoded_i64(), -1_234_567_890_123);
        assert_eq!(input.read_encoded_i64(), i64::MIN + 1);
        assert_eq!(input.read_encoded_u64(), u64::MAX >> 1);
        assert_eq!(input.bytes_available(), 0);
        assert!(input.check().is_ok());
    }

    #[test]
    fn signed_minimums_are_refused() {
        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        out.write_encoded_i32(i32::MIN);
        assert!(matches!(context.error(), Some(CodecError::Format(_))));
        assert!(out.is_empty());

        let context = StreamContext::new();
        let mut out = EncodeStream::new(&context);
        out.write_encoded_i64(i64::MIN);
        assert!(matches!(context.error(), Some(CodecError::Format(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn read_past_end_is_sticky_and_returns_defaults() {
        let context = StreamContext::new();
        let bytes = [0x01, 0x02, 0x03];
        let mut input = DecodeStream::new(&context, &bytes);

        assert_eq!(input.read_u32(), 0);
        assert!(context.has_failed());
        // Bytes that are physically available are no longer read either.
        assert_eq!(input.read_u8(), 0);
        assert_eq!(input.position(), 0);
        assert!(matches!(context.error(), Some(CodecError::Truncation(_))));
    }

    #[test]
    fn failure_in_a_child_stream_poisons_the_parent() {
        let context = StreamContext::new();
        let bytes = [0xAA, 0xBB, 0xCC, 0xDD];
        let mut parent = DecodeStream::new(&context, &bytes);
        let mut child = parent.read_bytes(2);

        assert_eq!(child.read_u16(), 0xBBAA);
        let _ = child.read_u8();
        assert!(context.has_failed());
        assert_eq!(parent.read_u8(), 0);
    }

    #[test]
    fn strings_stop_at_terminator_or_range_end() {
        let context = StreamContext::new();
        let bytes = b"layer\0tail";
        let mut input = DecodeStream::new(&context, bytes);

        assert_eq!(input.read_string(), "layer");
        assert_eq!(input.read_string(), "tail");
        assert!(input.check().is_ok());
        assert_eq!(input.read_string(), "");
        assert!(context.has_failed());
    }
}
