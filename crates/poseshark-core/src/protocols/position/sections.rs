use super::error::PositionError;
use super::flags::SectionKind;
use super::layout;
use super::reader::PositionReader;

/// Tool-center-point pose: millimeters for `x/y/z`, degrees for `w/p/r`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseSection {
    pub group: u16,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub p: f32,
    pub r: f32,
    pub status: u32,
    pub io: u32,
}

impl PoseSection {
    pub fn values(&self) -> [f32; layout::POSE_VALUES] {
        [self.x, self.y, self.z, self.w, self.p, self.r]
    }
}

/// Joint angles in radians. All nine slots are always on the wire, whatever
/// the robot's real axis count.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointSection {
    pub group: u16,
    pub joints: [f32; layout::JOINT_SLOTS],
    pub status: u32,
    pub io: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section {
    ActualTcp(PoseSection),
    CommandedTcp(PoseSection),
    ActualJoint(JointSection),
    CommandedJoint(JointSection),
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::ActualTcp(_) => SectionKind::ActualTcp,
            Section::CommandedTcp(_) => SectionKind::CommandedTcp,
            Section::ActualJoint(_) => SectionKind::ActualJoint,
            Section::CommandedJoint(_) => SectionKind::CommandedJoint,
        }
    }

    pub fn group(&self) -> u16 {
        match self {
            Section::ActualTcp(pose) | Section::CommandedTcp(pose) => pose.group,
            Section::ActualJoint(joints) | Section::CommandedJoint(joints) => joints.group,
        }
    }

    pub fn status(&self) -> u32 {
        match self {
            Section::ActualTcp(pose) | Section::CommandedTcp(pose) => pose.status,
            Section::ActualJoint(joints) | Section::CommandedJoint(joints) => joints.status,
        }
    }

    pub fn io(&self) -> u32 {
        match self {
            Section::ActualTcp(pose) | Section::CommandedTcp(pose) => pose.io,
            Section::ActualJoint(joints) | Section::CommandedJoint(joints) => joints.io,
        }
    }

    /// Float payload in wire order.
    pub fn values(&self) -> Vec<f32> {
        match self {
            Section::ActualTcp(pose) | Section::CommandedTcp(pose) => pose.values().to_vec(),
            Section::ActualJoint(joints) | Section::CommandedJoint(joints) => {
                joints.joints.to_vec()
            }
        }
    }

    pub fn wire_len(&self) -> usize {
        match self {
            Section::ActualTcp(_) | Section::CommandedTcp(_) => layout::POSE_LEN,
            Section::ActualJoint(_) | Section::CommandedJoint(_) => layout::JOINT_LEN,
        }
    }
}

/// Decode a pose section at `offset`. Consumes [`layout::POSE_LEN`] bytes.
pub fn decode_pose(buf: &[u8], offset: usize) -> Result<PoseSection, PositionError> {
    let reader = PositionReader::new(buf).at(offset)?;
    reader.require_len(layout::POSE_LEN)?;

    let mut values = [0f32; layout::POSE_VALUES];
    read_values(&reader, &mut values)?;
    let [x, y, z, w, p, r] = values;

    Ok(PoseSection {
        group: reader.read_u16_be(layout::GROUP_RANGE)?,
        x,
        y,
        z,
        w,
        p,
        r,
        status: reader.read_u32_be(layout::POSE_STATUS_RANGE)?,
        io: reader.read_u32_be(layout::POSE_IO_RANGE)?,
    })
}

/// Decode a joint section at `offset`. Consumes [`layout::JOINT_LEN`] bytes.
pub fn decode_joints(buf: &[u8], offset: usize) -> Result<JointSection, PositionError> {
    let reader = PositionReader::new(buf).at(offset)?;
    reader.require_len(layout::JOINT_LEN)?;

    let mut joints = [0f32; layout::JOINT_SLOTS];
    read_values(&reader, &mut joints)?;

    Ok(JointSection {
        group: reader.read_u16_be(layout::GROUP_RANGE)?,
        joints,
        status: reader.read_u32_be(layout::JOINT_STATUS_RANGE)?,
        io: reader.read_u32_be(layout::JOINT_IO_RANGE)?,
    })
}

/// Dispatch on `kind`; `Variables` has no decoder and yields `None`.
pub(crate) fn decode_section(
    kind: SectionKind,
    buf: &[u8],
    offset: usize,
) -> Result<Option<Section>, PositionError> {
    let section = match kind {
        SectionKind::ActualTcp => Section::ActualTcp(decode_pose(buf, offset)?),
        SectionKind::CommandedTcp => Section::CommandedTcp(decode_pose(buf, offset)?),
        SectionKind::ActualJoint => Section::ActualJoint(decode_joints(buf, offset)?),
        SectionKind::CommandedJoint => Section::CommandedJoint(decode_joints(buf, offset)?),
        SectionKind::Variables => return Ok(None),
    };
    Ok(Some(section))
}

fn read_values(reader: &PositionReader<'_>, out: &mut [f32]) -> Result<(), PositionError> {
    for (slot, value) in out.iter_mut().enumerate() {
        *value = reader.read_f32_be(layout::value_range(slot))?;
    }
    Ok(())
}
