use std::io::{Read, Seek, SeekFrom};

use super::error::PcapSourceError;
use super::layout;
use pcap_parser::Linktype;

/// Link type and timestamp resolution of one PCAPNG interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceInfo {
    pub linktype: Linktype,
    pub ticks_per_second: f64,
}

impl InterfaceInfo {
    pub fn new(linktype: Linktype, if_tsresol: u8) -> Self {
        Self {
            linktype,
            ticks_per_second: ticks_per_second(if_tsresol),
        }
    }
}

/// Read the magic bytes and rewind the reader to the start.
///
/// # Errors
/// Returns `PcapSourceError` when the reader cannot be read or rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Interface for a PCAPNG interface id. Unknown ids fall back to Ethernet
/// with microsecond timestamps.
pub fn interface_for(interfaces: &[InterfaceInfo], if_id: u32) -> InterfaceInfo {
    interfaces
        .get(if_id as usize)
        .copied()
        .unwrap_or(InterfaceInfo {
            linktype: Linktype::ETHERNET,
            ticks_per_second: layout::MICROS_PER_SECOND,
        })
}

/// Decode the `if_tsresol` option: MSB clear is a power of ten, MSB set a
/// power of two. Zero (option absent) means microseconds.
pub fn ticks_per_second(if_tsresol: u8) -> f64 {
    let exponent = i32::from(if_tsresol & 0x7f);
    match if_tsresol {
        0 => layout::MICROS_PER_SECOND,
        v if v & 0x80 != 0 => 2f64.powi(exponent),
        _ => 10f64.powi(exponent),
    }
}

/// Convert PCAPNG high/low timestamp ticks to seconds.
pub fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32, ticks_per_second: f64) -> f64 {
    let ticks = ((ts_high as u64) << 32) | (ts_low as u64);
    ticks as f64 / ticks_per_second
}

/// Convert a legacy PCAP record timestamp to seconds.
pub fn legacy_ts_to_seconds(ts_sec: u32, ts_frac: u32, nanosecond: bool) -> f64 {
    let scale = if nanosecond {
        layout::NANOS_PER_SECOND
    } else {
        layout::MICROS_PER_SECOND
    };
    ts_sec as f64 + ts_frac as f64 / scale
}

#[cfg(test)]
mod tests {
    use super::{
        InterfaceInfo, interface_for, is_pcapng_magic, legacy_ts_to_seconds,
        pcapng_ts_to_seconds, read_magic_and_rewind, ticks_per_second,
    };
    use crate::source::pcap::error::PcapSourceError;
    use pcap_parser::Linktype;
    use std::io::Cursor;
    use std::io::Read;

    #[test]
    fn detect_pcapng_magic() {
        let data = super::layout::PCAPNG_MAGIC;
        assert!(is_pcapng_magic(&data));
        assert!(!is_pcapng_magic(&[0xd4, 0xc3, 0xb2, 0xa1]));
    }

    #[test]
    fn read_magic_rewinds() {
        let bytes = [0x0a, 0x0d, 0x0d, 0x0a, 0x01];
        let mut cursor = Cursor::new(bytes);
        let magic = read_magic_and_rewind(&mut cursor).unwrap();
        assert_eq!(magic, [0x0a, 0x0d, 0x0d, 0x0a]);
        let mut buf = [0u8; 1];
        cursor.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], 0x0a);
    }

    #[test]
    fn read_magic_too_short() {
        let bytes = [0x0a, 0x0d, 0x0d];
        let mut cursor = Cursor::new(bytes);
        let err = read_magic_and_rewind(&mut cursor).unwrap_err();
        assert!(matches!(err, PcapSourceError::Io(_)));
    }

    #[test]
    fn unknown_interface_defaults_to_ethernet_micros() {
        let interfaces = [InterfaceInfo::new(Linktype::RAW, 9)];
        assert_eq!(interface_for(&interfaces, 0).linktype, Linktype::RAW);
        let fallback = interface_for(&interfaces, 1);
        assert_eq!(fallback.linktype, Linktype::ETHERNET);
        assert_eq!(fallback.ticks_per_second, 1e6);
    }

    #[test]
    fn tsresol_decodes_both_bases() {
        assert_eq!(ticks_per_second(0), 1e6);
        assert_eq!(ticks_per_second(6), 1e6);
        assert_eq!(ticks_per_second(9), 1e9);
        assert_eq!(ticks_per_second(0x80 | 10), 1024.0);
    }

    #[test]
    fn timestamps_convert_to_seconds() {
        let seconds = pcapng_ts_to_seconds(0, 1_500_000, 1e6);
        assert!((seconds - 1.5).abs() < f64::EPSILON);
        let seconds = legacy_ts_to_seconds(2, 250_000_000, true);
        assert!((seconds - 2.25).abs() < f64::EPSILON);
        let seconds = legacy_ts_to_seconds(2, 250_000, false);
        assert!((seconds - 2.25).abs() < f64::EPSILON);
    }
}
