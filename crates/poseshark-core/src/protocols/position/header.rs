use super::error::PositionError;
use super::flags::FlagSet;
use super::layout;
use super::reader::PositionReader;

/// Fixed message header.
///
/// `size` is carried verbatim; whether it bounds the message depends on the
/// decoder's framing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u16,
    pub size: u16,
    pub index: u32,
    pub clock: u32,
    pub type_flags: FlagSet,
}

/// Read only the version field of the message starting at `offset`.
pub fn peek_version(buf: &[u8], offset: usize) -> Result<u16, PositionError> {
    PositionReader::new(buf)
        .at(offset)?
        .read_u16_be(layout::VERSION_RANGE)
}

/// Extract the header fields at `offset`. Consumes [`layout::HEADER_LEN`] bytes.
///
/// No validation beyond field extraction happens here.
pub fn decode_header(buf: &[u8], offset: usize) -> Result<MessageHeader, PositionError> {
    let reader = PositionReader::new(buf).at(offset)?;
    reader.require_len(layout::HEADER_LEN)?;

    Ok(MessageHeader {
        version: reader.read_u16_be(layout::VERSION_RANGE)?,
        size: reader.read_u16_be(layout::SIZE_RANGE)?,
        index: reader.read_u32_be(layout::INDEX_RANGE)?,
        clock: reader.read_u32_be(layout::CLOCK_RANGE)?,
        type_flags: FlagSet::from_raw(reader.read_u16_be(layout::TYPE_FLAGS_RANGE)?),
    })
}
