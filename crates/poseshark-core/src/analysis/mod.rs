use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, trace, warn};

use crate::protocols::position::{Message, PositionDecoder};
use crate::source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, InputInfo, Report, make_stub_report};

mod config;
pub(crate) mod issues;
mod records;
pub(crate) mod streams;
mod udp;

pub use config::{AnalysisConfig, DEFAULT_MAX_REASSEMBLY_BYTES};
pub use issues::{CATALOG as ISSUE_CATALOG, IssueDescriptor};

use issues::IssueLog;
use records::message_record;
use streams::{Delivery, FlowKey, StreamAssembler, StreamStats, build_stream_summaries};
use udp::parse_udp_packet;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

pub fn analyze_pcap_file(path: &Path, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    let input = InputInfo {
        path: path.display().to_string(),
        bytes: path.metadata()?.len(),
    };
    analyze_source(input, source, config)
}

#[derive(Debug, Default)]
struct Counters {
    packets_total: u64,
    udp_packets: u64,
    filtered_packets: u64,
    messages_total: u64,
}

pub fn analyze_source<S: PacketSource>(
    input: InputInfo,
    mut source: S,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    info!(input = %input.path, framing = ?config.decoder.framing, "analysis started");

    let decoder = PositionDecoder::new(config.decoder.clone());
    let axes = config.decoder.display_axes();
    let mut assembler = StreamAssembler::new(config.max_reassembly_bytes);
    let mut stream_stats: HashMap<FlowKey, StreamStats> = HashMap::new();
    let mut issues = IssueLog::default();
    let mut messages = Vec::new();
    let mut counters = Counters::default();
    let mut first_ts = None;
    let mut last_ts = None;

    while let Some(PacketEvent { ts, linktype, data }) = source.next_packet()? {
        counters.packets_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);

        let udp = match parse_udp_packet(linktype, &data) {
            Ok(Some(udp)) => udp,
            Ok(None) => continue,
            Err(err) => {
                trace!(%err, "skipping undecodable frame");
                continue;
            }
        };
        counters.udp_packets += 1;
        if !config.routes(udp.src_port, udp.dst_port) {
            continue;
        }

        let origin = udp.origin();
        let key = FlowKey::from(&origin);
        let delivered = assembler.push(
            &decoder,
            &key,
            udp.payload,
            &origin,
            ts,
            |message: &Message<'_>| {
                counters.messages_total += 1;
                stream_stats.entry(key.clone()).or_default().record(message, ts);
                if config.include_messages {
                    messages.push(message_record(message, &key, ts, axes));
                }
            },
        );

        match delivered {
            Ok(Delivery::Decoded(_)) => {}
            Ok(Delivery::Buffered { decoded, missing }) => {
                debug!(flow = %key, decoded, missing, "buffering incomplete message");
            }
            Ok(Delivery::Filtered) => counters.filtered_packets += 1,
            Err(fault) => {
                warn!(flow = %key, error = %fault, "position decode failed");
                issues.record(fault.issue_id(), &key, ts);
            }
        }
    }

    for tail in assembler.drain_pending() {
        warn!(
            flow = %tail.key,
            buffered = tail.buffered,
            missing = tail.missing,
            "capture ended inside an incomplete message"
        );
        issues.record(issues::INCOMPLETE, &tail.key, tail.ts);
    }

    let mut report = make_stub_report(&input.path, input.bytes);
    report.capture_summary = Some(CaptureSummary {
        packets_total: counters.packets_total,
        udp_packets: counters.udp_packets,
        filtered_packets: counters.filtered_packets,
        messages_total: counters.messages_total,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.streams = build_stream_summaries(stream_stats);
    report.messages = messages;
    report.issues = issues.into_summaries();

    info!(
        packets = counters.packets_total,
        messages = counters.messages_total,
        streams = report.streams.len(),
        issues = report.issues.len(),
        "analysis finished"
    );
    Ok(report)
}

pub(crate) fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let ts = match ts {
        Some(ts) => ts,
        None => return,
    };
    match first {
        None => *first = Some(ts),
        Some(existing) => {
            if ts < *existing {
                *first = Some(ts);
            }
        }
    }
    match last {
        None => *last = Some(ts),
        Some(existing) => {
            if ts > *existing {
                *last = Some(ts);
            }
        }
    }
}

pub(crate) fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
