use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::net::IpAddr;

use thiserror::Error;

use crate::StreamSummary;
use crate::protocols::position::{
    DecodeOutcome, Message, PacketOrigin, PositionDecoder, PositionError, SectionKind, layout,
};

/// Forward index jumps at or above this are treated as a controller restart
/// rather than lost messages.
const MAX_FORWARD_GAP: u64 = 1024;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct FlowKey {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
}

impl FlowKey {
    pub(crate) fn src(&self) -> String {
        format_endpoint(self.src_ip, self.src_port)
    }

    pub(crate) fn dst(&self) -> String {
        format_endpoint(self.dst_ip, self.dst_port)
    }
}

impl From<&PacketOrigin> for FlowKey {
    fn from(origin: &PacketOrigin) -> Self {
        Self {
            src_ip: origin.src_ip,
            src_port: origin.src_port,
            dst_ip: origin.dst_ip,
            dst_port: origin.dst_port,
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src(), self.dst())
    }
}

/// Result of feeding one datagram to its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Decoded(usize),
    Buffered { decoded: usize, missing: usize },
    Filtered,
}

#[derive(Debug, Error)]
pub(crate) enum StreamFault {
    #[error(transparent)]
    Decode(#[from] PositionError),
    #[error("pending reassembly data of {buffered} bytes exceeds the {limit} byte limit")]
    Overflow { buffered: usize, limit: usize },
}

impl StreamFault {
    pub(crate) fn issue_id(&self) -> &'static str {
        match self {
            StreamFault::Decode(err) => err.issue_id(),
            StreamFault::Overflow { .. } => super::issues::REASSEMBLY_OVERFLOW,
        }
    }
}

struct Pending {
    buffer: Vec<u8>,
    resume_offset: usize,
    missing: usize,
    ts: Option<f64>,
}

/// Data still buffered for a flow when the capture ended.
#[derive(Debug)]
pub(crate) struct PendingTail {
    pub key: FlowKey,
    pub buffered: usize,
    pub missing: usize,
    pub ts: Option<f64>,
}

/// Holds the `(buffer, resume_offset)` pair of every flow with an incomplete
/// message, and re-invokes the decoder once the next datagram arrives.
pub(crate) struct StreamAssembler {
    pending: HashMap<FlowKey, Pending>,
    max_bytes: usize,
}

impl StreamAssembler {
    pub(crate) fn new(max_bytes: usize) -> Self {
        Self {
            pending: HashMap::new(),
            max_bytes,
        }
    }

    pub(crate) fn push<F>(
        &mut self,
        decoder: &PositionDecoder,
        key: &FlowKey,
        payload: &[u8],
        origin: &PacketOrigin,
        ts: Option<f64>,
        mut on_message: F,
    ) -> Result<Delivery, StreamFault>
    where
        F: FnMut(&Message<'_>),
    {
        let (buffer, resume_offset) = match self.pending.remove(key) {
            Some(pending) => {
                let mut buffer = pending.buffer;
                buffer.extend_from_slice(payload);
                (Cow::Owned(buffer), pending.resume_offset)
            }
            None => (Cow::Borrowed(payload), 0),
        };

        let (resume_offset, missing, decoded) =
            match decoder.decode(&buffer, resume_offset, Some(origin))? {
                DecodeOutcome::Complete(messages) => {
                    messages.iter().for_each(&mut on_message);
                    return Ok(Delivery::Decoded(messages.len()));
                }
                DecodeOutcome::NotThisProtocol => return Ok(Delivery::Filtered),
                DecodeOutcome::NeedMoreBytes {
                    messages,
                    resume_offset,
                    additional_bytes_required,
                } => {
                    messages.iter().for_each(&mut on_message);
                    (resume_offset, additional_bytes_required, messages.len())
                }
            };

        let buffered = buffer.len() - resume_offset;
        if buffered > self.max_bytes {
            return Err(StreamFault::Overflow {
                buffered,
                limit: self.max_bytes,
            });
        }

        // Drop decoded bytes, keeping enough of the buffer that the next call
        // still clears the decoder's minimum length gate.
        let consumed = resume_offset.min(buffer.len().saturating_sub(layout::MIN_BUFFER_LEN));
        let mut buffer = buffer.into_owned();
        buffer.drain(..consumed);
        self.pending.insert(
            key.clone(),
            Pending {
                buffer,
                resume_offset: resume_offset - consumed,
                missing,
                ts,
            },
        );
        Ok(Delivery::Buffered { decoded, missing })
    }

    /// Flows left with buffered data, in key order.
    pub(crate) fn drain_pending(&mut self) -> Vec<PendingTail> {
        let mut tails: Vec<PendingTail> = self
            .pending
            .drain()
            .map(|(key, pending)| PendingTail {
                key,
                buffered: pending.buffer.len() - pending.resume_offset,
                missing: pending.missing,
                ts: pending.ts,
            })
            .collect();
        tails.sort_by(|a, b| a.key.cmp(&b.key));
        tails
    }
}

#[derive(Debug, Default)]
pub(crate) struct StreamStats {
    pub messages: u64,
    pub bytes: u64,
    pub first_index: Option<u32>,
    pub last_index: Option<u32>,
    pub missing: u64,
    pub out_of_order: u64,
    pub first_clock: Option<u32>,
    pub last_clock: Option<u32>,
    pub groups: BTreeSet<u16>,
    pub kinds: BTreeSet<SectionKind>,
    pub first_ts: Option<f64>,
    pub last_ts: Option<f64>,
}

impl StreamStats {
    pub(crate) fn record(&mut self, message: &Message<'_>, ts: Option<f64>) {
        self.messages += 1;
        self.bytes += message.length as u64;
        self.groups.extend(message.sections.iter().map(|s| s.group()));
        self.kinds.extend(message.header.type_flags.iter());
        super::update_ts_bounds(&mut self.first_ts, &mut self.last_ts, ts);

        let clock = message.header.clock;
        self.first_clock.get_or_insert(clock);
        self.last_clock = Some(clock);

        let index = message.header.index;
        match self.last_index {
            None => {
                self.first_index = Some(index);
                self.last_index = Some(index);
            }
            Some(last) if index > last => {
                let gap = u64::from(index - last - 1);
                if gap < MAX_FORWARD_GAP {
                    self.missing += gap;
                }
                self.last_index = Some(index);
            }
            Some(_) => self.out_of_order += 1,
        }
    }
}

pub(crate) fn build_stream_summaries(stats: HashMap<FlowKey, StreamStats>) -> Vec<StreamSummary> {
    let mut streams: Vec<StreamSummary> = stats
        .into_iter()
        .map(|(key, stats)| {
            let mps = match (stats.first_ts, stats.last_ts) {
                (Some(start), Some(end)) if end > start => {
                    Some(stats.messages as f64 / (end - start))
                }
                _ => None,
            };
            StreamSummary {
                src: key.src(),
                dst: key.dst(),
                messages: stats.messages,
                bytes: stats.bytes,
                first_index: stats.first_index.unwrap_or_default(),
                last_index: stats.last_index.unwrap_or_default(),
                missing_messages: stats.missing,
                out_of_order: stats.out_of_order,
                first_clock: stats.first_clock.unwrap_or_default(),
                last_clock: stats.last_clock.unwrap_or_default(),
                motion_groups: stats.groups.into_iter().collect(),
                sections: stats.kinds.iter().map(|k| k.name().to_string()).collect(),
                mps,
            }
        })
        .collect();

    streams.sort_by(|a, b| a.src.cmp(&b.src).then_with(|| a.dst.cmp(&b.dst)));
    streams
}

fn format_endpoint(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(addr) => format!("{}:{}", addr, port),
        IpAddr::V6(addr) => format!("[{}]:{}", addr, port),
    }
}
