//! Robot position-report protocol decoding.
//!
//! A datagram carries one or more messages. Each message is a fixed header
//! (version, size, sequence index, controller clock, type mask) followed by
//! the sections selected by the type mask, always in the order
//! actual TCP, commanded TCP, actual joints, commanded joints. A set
//! Variables bit is reported but its bytes stay in the opaque trailing region.
//!
//! The framing loop in `parser` validates the version, drives the section
//! codecs and signals incomplete messages with a resume offset so callers can
//! reassemble across datagrams. By default the rest of the buffer is one
//! message and the header `size` field is not used for framing;
//! [`FramingMode::DeclaredSize`] opts into size-bounded messages.
//!
//! Offsets live in `layout`, bounds-checked reads in `reader`.

pub mod config;
pub mod error;
pub mod filter;
pub mod flags;
pub mod header;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod sections;
pub mod writer;

pub use config::{DecoderConfig, FramingMode};
pub use error::{AllowEntryError, PositionError};
pub use filter::{AllowList, MacAddr, PacketOrigin, SourceFilter};
pub use flags::{FlagSet, SectionKind};
pub use header::{MessageHeader, decode_header, peek_version};
pub use parser::{DecodeOutcome, Message, MessageSummary, PositionDecoder};
pub use sections::{JointSection, PoseSection, Section, decode_joints, decode_pose};
