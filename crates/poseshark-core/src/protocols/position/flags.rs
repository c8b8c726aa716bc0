use std::fmt;

use super::layout;

/// One of the five defined bits of the message type mask.
///
/// Variant order is the canonical order: it drives both section decoding and
/// the order in which active names are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    ActualTcp,
    CommandedTcp,
    ActualJoint,
    CommandedJoint,
    Variables,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::ActualTcp,
        SectionKind::CommandedTcp,
        SectionKind::ActualJoint,
        SectionKind::CommandedJoint,
        SectionKind::Variables,
    ];

    pub const fn bit(self) -> u16 {
        match self {
            SectionKind::ActualTcp => 0,
            SectionKind::CommandedTcp => 1,
            SectionKind::ActualJoint => 2,
            SectionKind::CommandedJoint => 3,
            SectionKind::Variables => 4,
        }
    }

    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }

    pub const fn name(self) -> &'static str {
        match self {
            SectionKind::ActualTcp => "Actual TCP",
            SectionKind::CommandedTcp => "Commanded TCP",
            SectionKind::ActualJoint => "Actual Joint",
            SectionKind::CommandedJoint => "Commanded Joint",
            SectionKind::Variables => "Variables",
        }
    }

    /// Fixed wire size of the section, `None` for kinds that are never decoded.
    pub const fn wire_len(self) -> Option<usize> {
        match self {
            SectionKind::ActualTcp | SectionKind::CommandedTcp => Some(layout::POSE_LEN),
            SectionKind::ActualJoint | SectionKind::CommandedJoint => Some(layout::JOINT_LEN),
            SectionKind::Variables => None,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw 16-bit type mask. Bits 5..=15 are kept in [`FlagSet::raw`] but never
/// produce a [`SectionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlagSet(u16);

impl FlagSet {
    pub const DEFINED_MASK: u16 = 0x001f;

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn with(self, kind: SectionKind) -> Self {
        Self(self.0 | kind.mask())
    }

    pub const fn contains(self, kind: SectionKind) -> bool {
        self.0 & kind.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 & Self::DEFINED_MASK == 0
    }

    pub const fn undefined_bits(self) -> u16 {
        self.0 & !Self::DEFINED_MASK
    }

    pub fn iter(self) -> impl Iterator<Item = SectionKind> {
        SectionKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }

    pub fn active_names(self) -> Vec<&'static str> {
        self.iter().map(SectionKind::name).collect()
    }
}

impl FromIterator<SectionKind> for FlagSet {
    fn from_iter<I: IntoIterator<Item = SectionKind>>(iter: I) -> Self {
        iter.into_iter().fold(FlagSet::default(), FlagSet::with)
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.active_names();
        if names.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FlagSet, SectionKind};

    #[test]
    fn iterates_in_canonical_order() {
        let flags = FlagSet::from_raw(0b1001);
        let kinds: Vec<_> = flags.iter().collect();
        assert_eq!(kinds, [SectionKind::ActualTcp, SectionKind::CommandedJoint]);
        assert_eq!(flags.to_string(), "Actual TCP, Commanded Joint");
    }

    #[test]
    fn high_bits_are_preserved_but_never_named() {
        let flags = FlagSet::from_raw(0xff00 | SectionKind::Variables.mask());
        assert_eq!(flags.raw(), 0xff10);
        assert_eq!(flags.undefined_bits(), 0xff00);
        assert_eq!(flags.active_names(), ["Variables"]);
    }

    #[test]
    fn empty_mask_displays_none() {
        let flags = FlagSet::from_raw(0x8000);
        assert!(flags.is_empty());
        assert_eq!(flags.iter().count(), 0);
        assert_eq!(flags.to_string(), "None");
    }

    #[test]
    fn collects_from_kinds() {
        let flags: FlagSet = [SectionKind::ActualJoint, SectionKind::ActualTcp]
            .into_iter()
            .collect();
        assert_eq!(flags.raw(), 0b0101);
    }
}
