//! Bounds-checked binary reading for replay buffers.
//!
//! [`ByteCursor`] wraps an immutable byte slice with a read position. Every
//! read either returns the requested value and advances, or fails with
//! [`ParserError::OutOfBounds`] and leaves the position untouched. Nothing is
//! clamped or wrapped.
//!
//! # Endianness
//!
//! All multi-byte integers in the replay format are little-endian.
//!
//! # Example
//!
//! ```
//! use bw_replay::binary::ByteCursor;
//!
//! let data = [0x26, 0x89, 0x01, 0x00, b'H', b'i', 0x00, 0x00];
//! let mut cursor = ByteCursor::new(&data);
//!
//! assert_eq!(cursor.read_u32_le().unwrap(), 100_646);
//! assert_eq!(cursor.read_fixed_string(4).unwrap(), "Hi");
//! assert_eq!(cursor.remaining(), 0);
//! assert!(cursor.read_u8().is_err());
//! ```

use crate::error::{ParserError, Result};

/// A read position over an immutable byte buffer.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at position 0.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Creates a cursor at the given position.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `pos` is past the end of `data`.
    pub fn at(data: &'a [u8], pos: usize) -> Result<Self> {
        let mut cursor = Self::new(data);
        cursor.seek(pos)?;
        Ok(cursor)
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns whether `n` more bytes can be read.
    #[must_use]
    pub fn can_read(&self, n: usize) -> bool {
        n <= self.remaining()
    }

    /// Moves the cursor to an absolute position.
    ///
    /// Seeking to exactly the end of the buffer is allowed.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `pos` is past the end of the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(ParserError::out_of_bounds(
                pos.saturating_sub(self.pos),
                self.pos,
                self.data.len(),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    /// Advances the cursor by `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Returns the next byte without advancing.
    #[must_use]
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` at the end of the buffer.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a little-endian u16.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than 2 bytes remain.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    /// Reads a little-endian u32.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than 4 bytes remain.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads `n` bytes as a borrowed slice.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if !self.can_read(n) {
            return Err(ParserError::out_of_bounds(n, self.pos, self.data.len()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a fixed-size field and returns the bytes before the first NUL.
    ///
    /// The cursor always advances by the full `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain.
    pub fn read_fixed_field(&mut self, n: usize) -> Result<&'a [u8]> {
        let field = self.read_bytes(n)?;
        let end = field.iter().position(|&b| b == 0).unwrap_or(n);
        Ok(&field[..end])
    }

    /// Reads a fixed-size, NUL-padded string.
    ///
    /// Bytes are decoded as UTF-8 with invalid sequences replaced; use
    /// [`read_fixed_field`](Self::read_fixed_field) together with
    /// [`crate::text`] when the charset matters.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        let field = self.read_fixed_field(n)?;
        Ok(String::from_utf8_lossy(field).into_owned())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}
