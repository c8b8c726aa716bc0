use std::sync::Arc;
use std::thread;

use poseshark_core::protocols::position::writer::{encode_message, header_for};
use poseshark_core::{
    DecodeOutcome, DecoderConfig, FramingMode, JointSection, Message, PacketOrigin, PoseSection,
    PositionDecoder, PositionError, Section, SectionKind,
};

fn pose(group: u16, x: f32) -> PoseSection {
    PoseSection {
        group,
        x,
        y: -1.5,
        z: 250.0,
        w: 180.0,
        p: 0.25,
        r: -90.0,
        status: 0x0102_0304,
        io: 7,
    }
}

fn joint(group: u16, base: f32) -> JointSection {
    let mut joints = [0f32; 9];
    for (slot, value) in joints.iter_mut().enumerate() {
        *value = base + slot as f32;
    }
    JointSection {
        group,
        joints,
        status: 3,
        io: 0xffff_0000,
    }
}

fn encode(index: u32, clock: u32, sections: &[Section], trailing: &[u8]) -> Vec<u8> {
    let header = header_for(index, clock, sections, trailing.len(), 0);
    encode_message(&header, sections, trailing)
}

fn complete<'a>(outcome: DecodeOutcome<'a>) -> Vec<Message<'a>> {
    match outcome {
        DecodeOutcome::Complete(messages) => messages,
        other => panic!("expected complete outcome, got {other:?}"),
    }
}

fn declared() -> PositionDecoder {
    PositionDecoder::new(DecoderConfig::default().with_framing(FramingMode::DeclaredSize))
}

#[test]
fn every_buffer_below_minimum_is_too_short() {
    let decoder = PositionDecoder::default();
    for len in 0..48 {
        let buf = vec![0u8; len];
        assert_eq!(
            decoder.decode(&buf, 0, None),
            Err(PositionError::TooShort {
                needed: 48,
                actual: len
            })
        );
    }
}

#[test]
fn empty_mask_leaves_everything_after_header_trailing() {
    let mut buf = vec![0u8; 64];
    buf[14..].fill(0x5a);
    let messages = complete(PositionDecoder::default().decode(&buf, 0, None).unwrap());

    assert_eq!(messages.len(), 1);
    assert!(messages[0].sections.is_empty());
    assert_eq!(messages[0].trailing, &buf[14..]);
    assert_eq!(messages[0].length, 64);
    assert_eq!(messages[0].summary().flags, "None");
    assert_eq!(messages[0].summary().motion_group, None);
}

#[test]
fn sections_follow_canonical_order() {
    let sections = [
        Section::ActualTcp(pose(2, 1.0)),
        Section::CommandedJoint(joint(2, 10.0)),
    ];
    let bytes = encode(5, 40, &sections, &[]);
    assert_eq!(u16::from_be_bytes([bytes[12], bytes[13]]), 0b1001);

    let messages = complete(PositionDecoder::default().decode(&bytes, 0, None).unwrap());
    let kinds: Vec<SectionKind> = messages[0].sections.iter().map(Section::kind).collect();
    assert_eq!(kinds, [SectionKind::ActualTcp, SectionKind::CommandedJoint]);
    assert_eq!(messages[0].sections, sections);
    assert_eq!(messages[0].summary().flags, "Actual TCP, Commanded Joint");
}

#[test]
fn encoded_message_round_trips() {
    let sections = [
        Section::ActualTcp(pose(1, 12.5)),
        Section::CommandedTcp(pose(1, 13.5)),
        Section::ActualJoint(joint(1, 0.5)),
        Section::CommandedJoint(joint(1, 1.5)),
    ];
    let trailing = [1u8, 2, 3, 4, 5];
    let header = header_for(
        77,
        1_000,
        &sections,
        trailing.len(),
        SectionKind::Variables.mask(),
    );
    let bytes = encode_message(&header, &sections, &trailing);

    let messages = complete(PositionDecoder::default().decode(&bytes, 0, None).unwrap());
    let message = &messages[0];
    assert_eq!(message.header, header);
    assert_eq!(message.sections, sections);
    assert_eq!(message.trailing, trailing);
    assert_eq!(message.encode(), bytes);
}

#[test]
fn float_bit_patterns_survive_round_trip() {
    let patterns = [
        f32::from_bits(0x7fc0_0001),
        f32::from_bits(0xffff_ffff),
        f32::from_bits(0x7f80_0001),
        -0.0,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::from_bits(0x0000_0001),
    ];
    let mut joints = [0f32; 9];
    joints[..patterns.len()].copy_from_slice(&patterns);
    let sections = [
        Section::CommandedTcp(PoseSection {
            x: patterns[0],
            y: patterns[1],
            z: patterns[2],
            w: patterns[3],
            p: patterns[4],
            r: patterns[5],
            ..pose(2, 0.0)
        }),
        Section::ActualJoint(JointSection {
            joints,
            ..joint(2, 0.0)
        }),
    ];
    let bytes = encode(5, 40, &sections, &[]);

    let messages = complete(PositionDecoder::default().decode(&bytes, 0, None).unwrap());
    let bits = |sections: &[Section]| -> Vec<u32> {
        sections
            .iter()
            .flat_map(Section::values)
            .map(f32::to_bits)
            .collect()
    };
    assert_eq!(bits(&messages[0].sections), bits(&sections));
    assert_eq!(messages[0].encode(), bytes);
}

#[test]
fn concatenated_messages_decode_in_order() {
    let first = encode(10, 100, &[Section::ActualTcp(pose(1, 1.0))], &[]);
    let second = encode(
        11,
        999,
        &[Section::ActualJoint(joint(3, 5.0))],
        &[0xee; 2],
    );
    let mut buf = first.clone();
    buf.extend_from_slice(&second);

    let messages = complete(declared().decode(&buf, 0, None).unwrap());
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].header.index, 10);
    assert_eq!(messages[1].header.index, 11);
    assert_eq!(messages[1].header.clock, 999);
    assert_eq!(messages[1].offset, first.len());
    assert_eq!(messages[1].length, second.len());
    assert_eq!(messages[1].motion_group(), Some(3));
}

#[test]
fn remainder_framing_treats_concatenation_as_one_message() {
    let first = encode(10, 100, &[Section::ActualTcp(pose(1, 1.0))], &[]);
    let mut buf = first.clone();
    buf.extend_from_slice(&first);

    let messages = complete(PositionDecoder::default().decode(&buf, 0, None).unwrap());
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].trailing.len(), first.len());
}

#[test]
fn truncated_message_resumes_once_extended() {
    let first = encode(1, 8, &[Section::ActualTcp(pose(1, 1.0))], &[]);
    let second = encode(2, 16, &[Section::ActualJoint(joint(1, 0.0))], &[]);
    let mut stream = first.clone();
    stream.extend_from_slice(&second);

    let cut = first.len() + 20;
    let decoder = declared();
    let (resume_offset, shortfall) = match decoder.decode(&stream[..cut], 0, None).unwrap() {
        DecodeOutcome::NeedMoreBytes {
            messages,
            resume_offset,
            additional_bytes_required,
        } => {
            assert_eq!(messages.len(), 1);
            (resume_offset, additional_bytes_required)
        }
        other => panic!("expected need-more outcome, got {other:?}"),
    };
    assert_eq!(resume_offset, first.len());
    assert_eq!(shortfall, stream.len() - cut);

    let extended = &stream[..cut + shortfall];
    let messages = complete(decoder.decode(extended, resume_offset, None).unwrap());
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].header.index, 2);
}

#[test]
fn unsupported_version_discards_earlier_messages() {
    let good = encode(1, 8, &[Section::ActualTcp(pose(1, 1.0))], &[]);
    let mut bad = encode(2, 16, &[Section::ActualTcp(pose(1, 2.0))], &[]);
    bad[0..2].copy_from_slice(&1u16.to_be_bytes());
    let mut buf = good.clone();
    buf.extend_from_slice(&bad);
    buf.extend_from_slice(&good);

    assert_eq!(
        declared().decode(&buf, 0, None),
        Err(PositionError::UnsupportedVersion { version: 1 })
    );
}

#[test]
fn variables_alone_decodes_no_sections() {
    let body = [0x42u8; 40];
    let header = header_for(9, 72, &[], body.len(), SectionKind::Variables.mask());
    let bytes = encode_message(&header, &[], &body);

    let messages = complete(PositionDecoder::default().decode(&bytes, 0, None).unwrap());
    assert!(messages[0].sections.is_empty());
    assert!(messages[0].header.type_flags.contains(SectionKind::Variables));
    assert_eq!(messages[0].trailing, body);
    assert_eq!(messages[0].summary().flags, "Variables");
}

#[test]
fn closure_filter_rejects_other_sources() {
    let origin = PacketOrigin {
        src_ip: "192.168.1.20".parse().unwrap(),
        src_port: 60015,
        dst_ip: "192.168.1.1".parse().unwrap(),
        dst_port: 60015,
        src_mac: None,
    };
    let decoder = PositionDecoder::new(
        DecoderConfig::default()
            .with_source_filter(|origin: &PacketOrigin| origin.src_port == 60015),
    );
    let bytes = encode(1, 8, &[Section::ActualTcp(pose(1, 1.0))], &[]);
    assert_eq!(complete(decoder.decode(&bytes, 0, Some(&origin)).unwrap()).len(), 1);

    let other = PacketOrigin {
        src_port: 5000,
        ..origin
    };
    assert_eq!(
        decoder.decode(&bytes, 0, Some(&other)),
        Ok(DecodeOutcome::NotThisProtocol)
    );
}

#[test]
fn decoder_is_shared_across_threads() {
    let decoder = Arc::new(PositionDecoder::default());
    let handles: Vec<_> = (0..4u32)
        .map(|index| {
            let decoder = Arc::clone(&decoder);
            thread::spawn(move || {
                let bytes = encode(index, index, &[Section::ActualTcp(pose(1, 0.0))], &[]);
                let messages = complete(decoder.decode(&bytes, 0, None).unwrap());
                messages[0].header.index
            })
        })
        .collect();

    let mut indices: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    indices.sort_unstable();
    assert_eq!(indices, [0, 1, 2, 3]);
}
