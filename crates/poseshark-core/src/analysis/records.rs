use crate::protocols::position::{Message, Section};
use crate::{MessageRecord, SectionRecord};

use super::streams::FlowKey;

/// Flatten a decoded message for the report. Joint sections keep only the
/// first `axes` values.
pub(crate) fn message_record(
    message: &Message<'_>,
    key: &FlowKey,
    ts: Option<f64>,
    axes: usize,
) -> MessageRecord {
    MessageRecord {
        ts: super::ts_to_rfc3339(ts),
        src: key.src(),
        dst: key.dst(),
        index: message.header.index,
        clock: message.header.clock,
        flags: message.header.type_flags.to_string(),
        raw_flags: message.header.type_flags.raw(),
        motion_group: message.motion_group(),
        length: message.length,
        trailing_bytes: message.trailing.len(),
        sections: message
            .sections
            .iter()
            .map(|section| section_record(section, axes))
            .collect(),
    }
}

fn section_record(section: &Section, axes: usize) -> SectionRecord {
    let mut values = section.values();
    if matches!(section, Section::ActualJoint(_) | Section::CommandedJoint(_)) {
        values.truncate(axes);
    }
    SectionRecord {
        kind: section.kind().name().to_string(),
        group: section.group(),
        values,
        status: section.status(),
        io: section.io(),
    }
}

#[cfg(test)]
mod tests {
    use super::message_record;
    use crate::analysis::streams::FlowKey;
    use crate::protocols::position::writer::{encode_message, header_for};
    use crate::protocols::position::{
        DecodeOutcome, JointSection, PoseSection, PositionDecoder, Section,
    };

    #[test]
    fn record_truncates_joint_values_only() {
        let sections = [
            Section::CommandedTcp(PoseSection {
                group: 2,
                x: 1.0,
                y: 2.0,
                z: 3.0,
                w: 4.0,
                p: 5.0,
                r: 6.0,
                status: 7,
                io: 8,
            }),
            Section::ActualJoint(JointSection {
                group: 2,
                joints: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
                status: 0,
                io: 0,
            }),
        ];
        let header = header_for(3, 24, &sections, 2, 0);
        let bytes = encode_message(&header, &sections, &[0xaa, 0xbb]);
        let DecodeOutcome::Complete(messages) =
            PositionDecoder::default().decode(&bytes, 0, None).unwrap()
        else {
            panic!("expected complete outcome");
        };

        let key = FlowKey {
            src_ip: "::1".parse().unwrap(),
            src_port: 60015,
            dst_ip: "::2".parse().unwrap(),
            dst_port: 60015,
        };
        let record = message_record(&messages[0], &key, Some(3.0), 6);
        assert_eq!(record.src, "[::1]:60015");
        assert_eq!(record.ts.as_deref(), Some("1970-01-01T00:00:03Z"));
        assert_eq!(record.flags, "Commanded TCP, Actual Joint");
        assert_eq!(record.raw_flags, 0b110);
        assert_eq!(record.motion_group, Some(2));
        assert_eq!(record.length, 14 + 34 + 46 + 2);
        assert_eq!(record.trailing_bytes, 2);
        assert_eq!(record.sections.len(), 2);
        assert_eq!(record.sections[0].kind, "Commanded TCP");
        assert_eq!(record.sections[0].values, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(record.sections[0].status, 7);
        assert_eq!(record.sections[1].values, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
