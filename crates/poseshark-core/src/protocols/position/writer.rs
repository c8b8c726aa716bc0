use super::flags::FlagSet;
use super::header::MessageHeader;
use super::layout;
use super::parser::Message;
use super::sections::{JointSection, PoseSection, Section};

/// Header for a message carrying `sections` and `trailing_len` opaque bytes,
/// with `size` set to the total encoded length.
///
/// `extra_flags` is OR-ed into the mask, e.g. to mark a Variables region.
///
/// `size` is a `u16` on the wire. Messages longer than `u16::MAX` bytes get
/// `size = u16::MAX`, so they only decode whole under
/// [`FramingMode::Remainder`](super::FramingMode::Remainder).
pub fn header_for(
    index: u32,
    clock: u32,
    sections: &[Section],
    trailing_len: usize,
    extra_flags: u16,
) -> MessageHeader {
    let flags: FlagSet = sections.iter().map(Section::kind).collect();
    let body: usize = sections.iter().map(Section::wire_len).sum();
    let total = layout::HEADER_LEN + body + trailing_len;
    MessageHeader {
        version: layout::SUPPORTED_VERSION,
        size: u16::try_from(total).unwrap_or(u16::MAX),
        index,
        clock,
        type_flags: FlagSet::from_raw(flags.raw() | extra_flags),
    }
}

/// Encode a message with the same layout the decoder reads. Header fields are
/// written verbatim and sections in the order given.
///
/// # Examples
/// ```
/// use poseshark_core::{DecodeOutcome, PositionDecoder, Section, PoseSection};
/// use poseshark_core::protocols::position::writer::{encode_message, header_for};
///
/// let sections = [Section::ActualTcp(PoseSection { group: 1, x: 10.0, ..Default::default() })];
/// let header = header_for(1, 250, &sections, 0, 0);
/// let bytes = encode_message(&header, &sections, &[]);
///
/// let outcome = PositionDecoder::default().decode(&bytes, 0, None)?;
/// let DecodeOutcome::Complete(messages) = outcome else { unreachable!() };
/// assert_eq!(messages[0].sections, sections);
/// # Ok::<(), poseshark_core::PositionError>(())
/// ```
pub fn encode_message(header: &MessageHeader, sections: &[Section], trailing: &[u8]) -> Vec<u8> {
    let body: usize = sections.iter().map(Section::wire_len).sum();
    let mut out = Vec::with_capacity(layout::HEADER_LEN + body + trailing.len());

    out.extend_from_slice(&header.version.to_be_bytes());
    out.extend_from_slice(&header.size.to_be_bytes());
    out.extend_from_slice(&header.index.to_be_bytes());
    out.extend_from_slice(&header.clock.to_be_bytes());
    out.extend_from_slice(&header.type_flags.raw().to_be_bytes());

    for section in sections {
        match section {
            Section::ActualTcp(pose) | Section::CommandedTcp(pose) => write_pose(&mut out, pose),
            Section::ActualJoint(joints) | Section::CommandedJoint(joints) => {
                write_joints(&mut out, joints)
            }
        }
    }
    out.extend_from_slice(trailing);
    out
}

impl Message<'_> {
    pub fn encode(&self) -> Vec<u8> {
        encode_message(&self.header, &self.sections, self.trailing)
    }
}

fn write_pose(out: &mut Vec<u8>, pose: &PoseSection) {
    out.extend_from_slice(&pose.group.to_be_bytes());
    for value in pose.values() {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&pose.status.to_be_bytes());
    out.extend_from_slice(&pose.io.to_be_bytes());
}

fn write_joints(out: &mut Vec<u8>, joints: &JointSection) {
    out.extend_from_slice(&joints.group.to_be_bytes());
    for value in joints.joints {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&joints.status.to_be_bytes());
    out.extend_from_slice(&joints.io.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::{encode_message, header_for};
    use crate::protocols::position::parser::{DecodeOutcome, PositionDecoder};
    use crate::protocols::position::flags::SectionKind;
    use crate::protocols::position::layout;
    use crate::protocols::position::sections::{JointSection, PoseSection, Section};

    #[test]
    fn header_for_sets_flags_and_size() {
        let sections = [
            Section::CommandedTcp(PoseSection::default()),
            Section::ActualJoint(JointSection::default()),
        ];
        let header = header_for(3, 40, &sections, 6, SectionKind::Variables.mask());
        assert_eq!(
            header.size as usize,
            layout::HEADER_LEN + layout::POSE_LEN + layout::JOINT_LEN + 6
        );
        assert_eq!(header.type_flags.raw(), 0b1_0110);
    }

    #[test]
    fn oversized_message_saturates_size_field() {
        let sections = [Section::ActualTcp(PoseSection::default())];
        let trailing = vec![0u8; 70_000];
        let header = header_for(9, 0, &sections, trailing.len(), 0);
        assert_eq!(header.size, u16::MAX);

        let bytes = encode_message(&header, &sections, &trailing);
        let total = layout::HEADER_LEN + layout::POSE_LEN + trailing.len();
        assert_eq!(bytes.len(), total);

        let outcome = PositionDecoder::default().decode(&bytes, 0, None).unwrap();
        let DecodeOutcome::Complete(messages) = outcome else {
            panic!("expected complete outcome");
        };
        assert_eq!(messages[0].length, total);
        assert_eq!(messages[0].encode(), bytes);
    }

    #[test]
    fn encoded_length_matches_layout() {
        let sections = [Section::ActualJoint(JointSection {
            group: 2,
            joints: [0.5; layout::JOINT_SLOTS],
            status: 1,
            io: 2,
        })];
        let header = header_for(1, 0, &sections, 2, 0);
        let bytes = encode_message(&header, &sections, &[0xee, 0xff]);
        assert_eq!(bytes.len(), header.size as usize);
        assert_eq!(&bytes[layout::HEADER_LEN..layout::HEADER_LEN + 2], &[0, 2]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xee, 0xff]);
    }
}
