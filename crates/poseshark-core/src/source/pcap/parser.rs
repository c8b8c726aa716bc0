use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};
use tracing::{debug, trace};

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{
    InterfaceInfo, interface_for, is_pcapng_magic, legacy_ts_to_seconds, pcapng_ts_to_seconds,
    read_magic_and_rewind,
};

pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Linktype,
        nanosecond: bool,
    },
    Ng {
        reader: PcapNGReader<File>,
        interfaces: Vec<InterfaceInfo>,
    },
}

/// What a single block contributed: nothing yet, or a frame.
enum Step {
    Continue,
    Packet(PacketEvent),
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let inner = create_reader(file)?;
        debug!(path = %path.display(), "opened capture");
        Ok(Self { inner })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        next_packet(&mut self.inner).map_err(SourceError::from)
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut file)?;

    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcapng reader init", e))?;
        Ok(PcapReader::Ng {
            reader,
            interfaces: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::pcap("pcap reader init", e))?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: Linktype::ETHERNET,
            nanosecond: false,
        })
    }
}

fn next_packet(reader: &mut PcapReader) -> Result<Option<PacketEvent>, PcapSourceError> {
    loop {
        let step = match reader {
            PcapReader::Legacy {
                reader,
                linktype,
                nanosecond,
            } => match reader.next() {
                Ok((offset, block)) => {
                    let step = legacy_step(block, linktype, nanosecond);
                    reader.consume(offset);
                    step
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader
                        .refill()
                        .map_err(|e| PcapSourceError::pcap("pcap reader refill", e))?;
                    Step::Continue
                }
                Err(e) => return Err(PcapSourceError::pcap("pcap reader next", e)),
            },
            PcapReader::Ng { reader, interfaces } => match reader.next() {
                Ok((offset, block)) => {
                    let step = ng_step(block, interfaces);
                    reader.consume(offset);
                    step
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    reader
                        .refill()
                        .map_err(|e| PcapSourceError::pcap("pcapng reader refill", e))?;
                    Step::Continue
                }
                Err(e) => return Err(PcapSourceError::pcap("pcapng reader next", e)),
            },
        };

        if let Step::Packet(event) = step {
            return Ok(Some(event));
        }
    }
}

fn legacy_step(block: PcapBlockOwned<'_>, linktype: &mut Linktype, nanosecond: &mut bool) -> Step {
    match block {
        PcapBlockOwned::LegacyHeader(header) => {
            *linktype = header.network;
            *nanosecond = header.is_nanosecond_precision();
            trace!(linktype = ?header.network, nanosecond = *nanosecond, "pcap header");
            Step::Continue
        }
        PcapBlockOwned::Legacy(packet) => Step::Packet(PacketEvent {
            ts: Some(legacy_ts_to_seconds(packet.ts_sec, packet.ts_usec, *nanosecond)),
            linktype: *linktype,
            data: packet.data.to_vec(),
        }),
        _ => Step::Continue,
    }
}

fn ng_step(block: PcapBlockOwned<'_>, interfaces: &mut Vec<InterfaceInfo>) -> Step {
    match block {
        PcapBlockOwned::NG(Block::SectionHeader(_)) => {
            interfaces.clear();
            Step::Continue
        }
        PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
            let info = InterfaceInfo::new(intf.linktype, intf.if_tsresol);
            trace!(if_id = interfaces.len(), linktype = ?info.linktype, "pcapng interface");
            interfaces.push(info);
            Step::Continue
        }
        PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
            let interface = interface_for(interfaces, packet.if_id);
            Step::Packet(PacketEvent {
                ts: Some(pcapng_ts_to_seconds(
                    packet.ts_high,
                    packet.ts_low,
                    interface.ticks_per_second,
                )),
                linktype: interface.linktype,
                data: packet.data.to_vec(),
            })
        }
        _ => Step::Continue,
    }
}
