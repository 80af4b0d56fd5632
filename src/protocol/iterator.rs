//! Bounds-checked sequential reader over datagram bytes

use bytes::Bytes;
use tracing::debug;

use super::metrics::Metrics;
use super::{Channel, DgSize, DoId, Envelope, Error, Result, SIZE_TAG_LEN, Zone};

/// Cursor over a datagram.
///
/// Works over anything that derefs to bytes: a borrowed slice, a frozen
/// [`Bytes`] handed over by a transport, or an owned `Vec<u8>`. Every read
/// either returns the decoded value and advances by its exact width, or fails
/// with [`Error::Underrun`] and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct DatagramIterator<T = Bytes> {
    data: T,
    offset: usize,
    end: usize,
}

impl<T: AsRef<[u8]>> DatagramIterator<T> {
    /// Read `data` from its first byte to its last.
    pub fn new(data: T) -> Self {
        let end = data.as_ref().len();
        Self {
            data,
            offset: 0,
            end,
        }
    }

    /// Read `data[offset..end]`.
    pub fn with_range(data: T, offset: usize, end: usize) -> Result<Self> {
        let len = data.as_ref().len();
        if offset > end || end > len {
            return Err(Error::Underrun {
                needed: end.max(offset),
                remaining: len,
            });
        }
        Ok(Self { data, offset, end })
    }

    /// Absolute offset of the cursor.
    #[must_use]
    pub fn tell(&self) -> usize {
        self.offset
    }

    /// Absolute end of the readable range.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Bytes left between the cursor and the end of the range.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.end - self.offset
    }

    /// Check whether the cursor has reached the end of the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset == self.end
    }

    /// Give back the underlying storage.
    pub fn into_inner(self) -> T {
        self.data
    }

    pub(crate) fn rewind(&mut self, offset: usize) {
        debug_assert!(offset <= self.end);
        self.offset = offset;
    }

    fn check_remaining(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            debug!(offset = self.offset, needed, remaining, "datagram underrun");
            let err = Error::Underrun { needed, remaining };
            Metrics::record_error(err.kind());
            return Err(err);
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.check_remaining(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data.as_ref()[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }

    /// Read a boolean byte; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read an unsigned 8-bit integer.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.take()?))
    }

    /// Read a signed 8-bit integer.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.take()?))
    }

    /// Read an unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Read a signed 16-bit integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    /// Read an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Read an unsigned 64-bit integer.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    /// Read a signed 64-bit integer.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    /// Read an IEEE-754 single-precision float.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Read an IEEE-754 double-precision float.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Read a size tag.
    pub fn read_size(&mut self) -> Result<usize> {
        let tag = DgSize::from_le_bytes(self.take::<SIZE_TAG_LEN>()?);
        Ok(tag as usize)
    }

    /// Read a channel id.
    pub fn read_channel(&mut self) -> Result<Channel> {
        self.read_u64()
    }

    /// Read a distributed object id.
    pub fn read_doid(&mut self) -> Result<DoId> {
        self.read_u32()
    }

    /// Read a zone id.
    pub fn read_zone(&mut self) -> Result<Zone> {
        self.read_u32()
    }

    /// Read a location as `(parent, zone)`.
    pub fn read_location(&mut self) -> Result<(DoId, Zone)> {
        self.check_remaining(8)?;
        let parent = self.read_doid()?;
        let zone = self.read_zone()?;
        Ok((parent, zone))
    }

    /// Read `len` raw bytes.
    pub fn read_data(&mut self, len: usize) -> Result<&[u8]> {
        self.check_remaining(len)?;
        let start = self.offset;
        self.offset += len;
        Ok(&self.data.as_ref()[start..start + len])
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.check_remaining(len)?;
        self.offset += len;
        Ok(())
    }

    /// Read a length-prefixed blob.
    ///
    /// Fails without moving the cursor if either the size tag or the body is
    /// truncated.
    pub fn read_blob(&mut self) -> Result<&[u8]> {
        let start = self.offset;
        let len = self.read_size()?;
        if let Err(err) = self.check_remaining(len) {
            self.offset = start;
            return Err(err);
        }
        self.read_data(len)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<&str> {
        let start = self.offset;
        let len = self.read_size()?;
        if let Err(err) = self.check_remaining(len) {
            self.offset = start;
            return Err(err);
        }
        let body = &self.data.as_ref()[self.offset..self.offset + len];
        match std::str::from_utf8(body) {
            Ok(s) => {
                self.offset += len;
                Ok(s)
            }
            Err(_) => {
                self.offset = start;
                Err(Error::InvalidUtf8 { offset: start })
            }
        }
    }

    /// Split off the next `len` bytes as an independent, bounded reader and
    /// advance past them.
    pub fn read_sub(&mut self, len: usize) -> Result<DatagramIterator<&[u8]>> {
        self.read_data(len).map(DatagramIterator::new)
    }

    /// Everything from the cursor to the end of the range. Consumes it.
    pub fn read_remainder(&mut self) -> &[u8] {
        let start = self.offset;
        self.offset = self.end;
        &self.data.as_ref()[start..self.end]
    }

    /// Read an envelope header.
    pub fn read_envelope(&mut self) -> Result<Envelope> {
        Envelope::read(self)
    }
}

impl<'a> From<&'a [u8]> for DatagramIterator<&'a [u8]> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for DatagramIterator<Bytes> {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Datagram;

    #[test]
    fn test_reads_mirror_writes() {
        let mut dg = Datagram::new();
        dg.add_bool(true).unwrap();
        dg.add_i8(-3).unwrap();
        dg.add_u16(0xABCD).unwrap();
        dg.add_i64(i64::MIN).unwrap();
        dg.add_f32(1.5).unwrap();
        dg.add_location(77, 3).unwrap();
        dg.add_string("hello").unwrap();
        dg.add_blob(&[9, 8, 7]).unwrap();

        let mut it = DatagramIterator::new(dg.freeze());
        assert!(it.read_bool().unwrap());
        assert_eq!(it.read_i8().unwrap(), -3);
        assert_eq!(it.read_u16().unwrap(), 0xABCD);
        assert_eq!(it.read_i64().unwrap(), i64::MIN);
        assert_eq!(it.read_f32().unwrap(), 1.5);
        assert_eq!(it.read_location().unwrap(), (77, 3));
        assert_eq!(it.read_string().unwrap(), "hello");
        assert_eq!(it.read_blob().unwrap(), &[9, 8, 7]);
        assert!(it.is_empty());
    }

    #[test]
    fn test_underrun_keeps_cursor() {
        let bytes = [1u8, 2, 3];
        let mut it = DatagramIterator::new(&bytes[..]);
        assert_eq!(it.read_u8().unwrap(), 1);

        let err = it.read_u32().unwrap_err();
        assert_eq!(
            err,
            Error::Underrun {
                needed: 4,
                remaining: 2
            }
        );
        assert_eq!(it.tell(), 1);
        assert_eq!(it.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn test_exact_fit_reads_final_byte() {
        let bytes = 0x0102_0304u32.to_le_bytes();
        let mut it = DatagramIterator::new(&bytes[..]);
        assert_eq!(it.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(it.remaining(), 0);
    }

    #[test]
    fn test_truncated_blob_keeps_cursor() {
        let mut dg = Datagram::new();
        dg.add_size(10).unwrap();
        dg.add_data(&[1, 2, 3]).unwrap();

        let mut it = dg.iter();
        assert!(it.read_blob().unwrap_err().is_underrun());
        assert_eq!(it.tell(), 0);
    }

    #[test]
    fn test_invalid_utf8_string() {
        let mut dg = Datagram::new();
        dg.add_blob(&[0xFF, 0xFE]).unwrap();

        let mut it = dg.iter();
        assert_eq!(it.read_string(), Err(Error::InvalidUtf8 { offset: 0 }));
        assert_eq!(it.tell(), 0);
        assert_eq!(it.read_blob().unwrap(), &[0xFF, 0xFE]);
    }

    #[test]
    fn test_with_range_bounds() {
        let bytes = [0u8, 1, 2, 3, 4];
        let mut it = DatagramIterator::with_range(&bytes[..], 1, 3).unwrap();
        assert_eq!(it.remaining(), 2);
        assert_eq!(it.read_u8().unwrap(), 1);
        assert_eq!(it.read_u8().unwrap(), 2);
        assert!(it.read_u8().is_err());

        assert!(DatagramIterator::with_range(&bytes[..], 4, 2).is_err());
        assert!(DatagramIterator::with_range(&bytes[..], 0, 6).is_err());
    }

    #[test]
    fn test_read_sub_is_bounded() {
        let bytes = [1u8, 2, 3, 4];
        let mut it = DatagramIterator::new(&bytes[..]);
        {
            let mut sub = it.read_sub(2).unwrap();
            assert_eq!(sub.read_u8().unwrap(), 1);
            assert!(sub.read_u16().unwrap_err().is_underrun());
        }
        assert_eq!(it.tell(), 2);
        assert_eq!(it.read_remainder(), &[3, 4]);
    }
}
