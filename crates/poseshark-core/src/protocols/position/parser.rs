use tracing::{debug, trace};

use super::config::{DecoderConfig, FramingMode};
use super::error::PositionError;
use super::filter::PacketOrigin;
use super::header::{MessageHeader, decode_header, peek_version};
use super::layout;
use super::reader::PositionReader;
use super::sections::{Section, decode_section};

/// One decoded message. `trailing` holds every byte after the decoded sections,
/// including an undecoded Variables section.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<'a> {
    pub header: MessageHeader,
    pub sections: Vec<Section>,
    pub trailing: &'a [u8],
    /// Start of the message in the decoded buffer.
    pub offset: usize,
    pub length: usize,
}

/// Per-message digest handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub flags: String,
    pub motion_group: Option<u16>,
    pub index: u32,
    pub length: usize,
}

impl Message<'_> {
    /// Motion group of the first decoded section, in canonical order.
    pub fn motion_group(&self) -> Option<u16> {
        self.sections.first().map(Section::group)
    }

    pub fn summary(&self) -> MessageSummary {
        MessageSummary {
            flags: self.header.type_flags.to_string(),
            motion_group: self.motion_group(),
            index: self.header.index,
            length: self.length,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome<'a> {
    /// Every byte from the resume offset was consumed.
    Complete(Vec<Message<'a>>),
    /// The message at `resume_offset` extends past the buffer. `messages` are the
    /// ones completed before it; re-invoke at `resume_offset` once at least
    /// `additional_bytes_required` more bytes are appended.
    NeedMoreBytes {
        messages: Vec<Message<'a>>,
        resume_offset: usize,
        additional_bytes_required: usize,
    },
    /// The source filter rejected the buffer's origin.
    NotThisProtocol,
}

/// Stateless position-report decoder. Safe to share across threads; the only
/// state crossing calls is the resume offset the caller passes back in.
///
/// # Examples
/// ```
/// use poseshark_core::{DecodeOutcome, DecoderConfig, PositionDecoder};
///
/// let mut buf = vec![0u8; 48];
/// buf[2..4].copy_from_slice(&48u16.to_be_bytes());
///
/// let decoder = PositionDecoder::new(DecoderConfig::default());
/// match decoder.decode(&buf, 0, None)? {
///     DecodeOutcome::Complete(messages) => {
///         assert_eq!(messages.len(), 1);
///         assert!(messages[0].sections.is_empty());
///     }
///     other => panic!("unexpected outcome: {other:?}"),
/// }
/// # Ok::<(), poseshark_core::PositionError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PositionDecoder {
    config: DecoderConfig,
}

impl PositionDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode every message from `resume_offset` to the end of `buf`.
    ///
    /// Failures are fatal for the whole buffer: no partial message list is
    /// returned alongside an error.
    pub fn decode<'a>(
        &self,
        buf: &'a [u8],
        resume_offset: usize,
        origin: Option<&PacketOrigin>,
    ) -> Result<DecodeOutcome<'a>, PositionError> {
        if buf.len() < layout::MIN_BUFFER_LEN {
            return Err(PositionError::TooShort {
                needed: layout::MIN_BUFFER_LEN,
                actual: buf.len(),
            });
        }

        if let Some(filter) = &self.config.source_filter {
            if !origin.is_some_and(|origin| filter.accepts(origin)) {
                trace!(?origin, "source filter rejected buffer");
                return Ok(DecodeOutcome::NotThisProtocol);
            }
        }

        let reader = PositionReader::new(buf);
        let mut messages = Vec::new();
        let mut offset = resume_offset;

        loop {
            let remaining = buf.len().saturating_sub(offset);
            let pkt_len = match self.config.framing {
                FramingMode::Remainder => remaining,
                FramingMode::DeclaredSize if remaining == 0 => 0,
                FramingMode::DeclaredSize if remaining < layout::SIZE_PREFIX_LEN => {
                    return Ok(DecodeOutcome::NeedMoreBytes {
                        messages,
                        resume_offset: offset,
                        additional_bytes_required: layout::SIZE_PREFIX_LEN - remaining,
                    });
                }
                FramingMode::DeclaredSize => {
                    usize::from(reader.at(offset)?.read_u16_be(layout::SIZE_RANGE)?)
                }
            };

            if pkt_len == 0 {
                return Err(PositionError::ZeroLength { offset });
            }

            let version = peek_version(buf, offset)?;
            if version != layout::SUPPORTED_VERSION {
                return Err(PositionError::UnsupportedVersion { version });
            }

            if pkt_len < layout::HEADER_LEN {
                return Err(match self.config.framing {
                    FramingMode::DeclaredSize => PositionError::SizeBelowHeader {
                        size: pkt_len as u16,
                    },
                    FramingMode::Remainder => PositionError::TooShort {
                        needed: layout::HEADER_LEN,
                        actual: pkt_len,
                    },
                });
            }

            let end = offset + pkt_len;
            if end > buf.len() {
                debug!(
                    offset,
                    missing = end - buf.len(),
                    "message extends past buffer"
                );
                return Ok(DecodeOutcome::NeedMoreBytes {
                    messages,
                    resume_offset: offset,
                    additional_bytes_required: end - buf.len(),
                });
            }

            let frame = reader.read_slice(offset..end)?;
            let message = decode_message(frame, offset)?;
            debug!(
                offset,
                length = message.length,
                index = message.header.index,
                flags = %message.header.type_flags,
                "decoded position message"
            );
            messages.push(message);

            offset = end;
            if offset == buf.len() {
                return Ok(DecodeOutcome::Complete(messages));
            }
        }
    }
}

/// Decode one framed message: header, then each flagged section in canonical
/// order with no padding, then the opaque remainder.
fn decode_message(frame: &[u8], offset: usize) -> Result<Message<'_>, PositionError> {
    let header = decode_header(frame, 0)?;
    let mut cursor = layout::HEADER_LEN;
    let mut sections = Vec::new();

    for kind in header.type_flags.iter() {
        let Some(needed) = kind.wire_len() else {
            continue;
        };
        let available = frame.len() - cursor;
        if available < needed {
            return Err(PositionError::SectionOverrun {
                section: kind,
                needed,
                available,
            });
        }
        if let Some(section) = decode_section(kind, frame, cursor)? {
            sections.push(section);
        }
        cursor += needed;
    }

    let trailing = PositionReader::new(frame).read_slice(cursor..frame.len())?;
    Ok(Message {
        header,
        sections,
        trailing,
        offset,
        length: frame.len(),
    })
}
