use std::ops::Range;

pub const SUPPORTED_VERSION: u16 = 0;

pub const VERSION_RANGE: Range<usize> = 0..2;
pub const SIZE_RANGE: Range<usize> = 2..4;
pub const INDEX_RANGE: Range<usize> = 4..8;
pub const CLOCK_RANGE: Range<usize> = 8..12;
pub const TYPE_FLAGS_RANGE: Range<usize> = 12..14;
pub const HEADER_LEN: usize = 14;

/// Bytes needed at a message start to read `version` and `size`.
pub const SIZE_PREFIX_LEN: usize = SIZE_RANGE.end;

/// Whole-buffer gate applied once per decode call, not per embedded message.
pub const MIN_BUFFER_LEN: usize = 48;

// Section-relative offsets. Both section kinds start with the motion group and
// end with status + io; only the float count differs.
pub const GROUP_RANGE: Range<usize> = 0..2;
pub const VALUES_OFFSET: usize = 2;
pub const VALUE_LEN: usize = 4;

pub const POSE_VALUES: usize = 6;
pub const POSE_STATUS_RANGE: Range<usize> = 26..30;
pub const POSE_IO_RANGE: Range<usize> = 30..34;
pub const POSE_LEN: usize = 34;

pub const JOINT_SLOTS: usize = 9;
pub const JOINT_STATUS_RANGE: Range<usize> = 38..42;
pub const JOINT_IO_RANGE: Range<usize> = 42..46;
pub const JOINT_LEN: usize = 46;

pub const fn value_range(slot: usize) -> Range<usize> {
    let start = VALUES_OFFSET + slot * VALUE_LEN;
    start..start + VALUE_LEN
}
