use std::ops::Range;

use super::error::PositionError;

/// Bounds-checked big-endian access to a position-report buffer.
///
/// Ranges are relative to the reader's base, so a reader obtained through
/// [`PositionReader::at`] addresses section fields with layout constants.
#[derive(Clone, Copy)]
pub struct PositionReader<'a> {
    payload: &'a [u8],
}

impl<'a> PositionReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn require_len(&self, needed: usize) -> Result<(), PositionError> {
        if self.payload.len() < needed {
            return Err(PositionError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    /// Reader over the bytes starting at `offset`.
    pub fn at(&self, offset: usize) -> Result<PositionReader<'a>, PositionError> {
        let rest = self.payload.get(offset..).ok_or(PositionError::TooShort {
            needed: offset,
            actual: self.payload.len(),
        })?;
        Ok(PositionReader::new(rest))
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], PositionError> {
        self.payload.get(range.clone()).ok_or(PositionError::TooShort {
            needed: range.end,
            actual: self.payload.len(),
        })
    }

    pub fn read_u16_be(&self, range: Range<usize>) -> Result<u16, PositionError> {
        let bytes: [u8; 2] = self.read_array(range)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32_be(&self, range: Range<usize>) -> Result<u32, PositionError> {
        let bytes: [u8; 4] = self.read_array(range)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_f32_be(&self, range: Range<usize>) -> Result<f32, PositionError> {
        let bytes: [u8; 4] = self.read_array(range)?;
        Ok(f32::from_be_bytes(bytes))
    }

    fn read_array<const N: usize>(&self, range: Range<usize>) -> Result<[u8; N], PositionError> {
        let bytes = self.read_slice(range)?;
        bytes.try_into().map_err(|_| PositionError::TooShort {
            needed: N,
            actual: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PositionReader;
    use crate::protocols::position::error::PositionError;

    #[test]
    fn reads_big_endian_fields() {
        let mut payload = vec![0x12, 0x34, 0xde, 0xad, 0xbe, 0xef];
        payload.extend_from_slice(&1.5f32.to_be_bytes());
        let reader = PositionReader::new(&payload);
        assert_eq!(reader.read_u16_be(0..2).unwrap(), 0x1234);
        assert_eq!(reader.read_u32_be(2..6).unwrap(), 0xdead_beef);
        assert_eq!(reader.read_f32_be(6..10).unwrap(), 1.5);
    }

    #[test]
    fn sub_reader_is_relative() {
        let payload = [0u8, 0, 0, 7];
        let reader = PositionReader::new(&payload).at(2).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.read_u16_be(0..2).unwrap(), 7);
    }

    #[test]
    fn out_of_bounds_reports_needed_len() {
        let payload = [0u8; 3];
        let reader = PositionReader::new(&payload);
        let err = reader.read_u32_be(0..4).unwrap_err();
        assert_eq!(
            err,
            PositionError::TooShort {
                needed: 4,
                actual: 3
            }
        );
        assert!(reader.at(4).is_err());
    }
}
