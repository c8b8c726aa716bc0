//! poseshark core library: robot position-report decoding and offline
//! capture analysis.
//!
//! The decoder in [`protocols::position`] turns byte buffers into structured
//! messages (header, pose and joint sections, opaque trailing bytes) and is
//! usable on its own. The analysis pipeline feeds it from packet sources:
//! capture files are read in `source`, UDP datagrams are extracted and routed
//! per flow, partial messages are reassembled, and the results are
//! aggregated into a deterministic [`Report`].
//!
//! Invariants:
//! - Report outputs are deterministic and stable across runs.
//! - Decoding is side-effect free; all I/O is isolated in `source`.
//! - The only state carried between decode calls is the caller-held
//!   `(buffer, resume_offset)` pair of each flow.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use poseshark_core::{AnalysisConfig, analyze_pcap_file};
//!
//! let config = AnalysisConfig::default().with_ports([60015]);
//! let report = analyze_pcap_file(Path::new("capture.pcapng"), &config)?;
//! for stream in &report.streams {
//!     println!("{} -> {}: {} messages", stream.src, stream.dst, stream.messages);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
pub mod protocols;
mod source;

pub use analysis::{
    AnalysisConfig, AnalysisError, DEFAULT_MAX_REASSEMBLY_BYTES, ISSUE_CATALOG, IssueDescriptor,
    analyze_pcap_file, analyze_source,
};
pub use protocols::position::{
    AllowEntryError, AllowList, DecodeOutcome, DecoderConfig, FlagSet, FramingMode, JointSection,
    MacAddr, Message, MessageHeader, MessageSummary, PacketOrigin, PoseSection, PositionDecoder,
    PositionError, Section, SectionKind, SourceFilter,
};
pub use source::{MemorySource, PacketEvent, PacketSource, PcapFileSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Aggregated analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use poseshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.report_version, poseshark_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,

    /// Optional capture summary (may be empty when unavailable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Per-flow summaries sorted by source then destination.
    pub streams: Vec<StreamSummary>,
    /// Decoded messages in capture order, only when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MessageRecord>,
    /// Issues sorted by severity and ID.
    pub issues: Vec<IssueSummary>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use poseshark_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "poseshark".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "poseshark");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "poseshark").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Capture-wide counters (timestamps may be absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total packet count observed in the capture.
    pub packets_total: u64,
    /// Packets that carried a UDP datagram.
    pub udp_packets: u64,
    /// Datagrams rejected by the source filter.
    pub filtered_packets: u64,
    /// Position messages decoded across all flows.
    pub messages_total: u64,
    /// RFC3339 timestamp of the first packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Summary of one controller-to-client flow.
///
/// # Examples
/// ```
/// use poseshark_core::StreamSummary;
///
/// let stream = StreamSummary {
///     src: "10.0.0.10:60015".to_string(),
///     dst: "10.0.0.2:60015".to_string(),
///     messages: 2,
///     bytes: 96,
///     first_index: 7,
///     last_index: 8,
///     missing_messages: 0,
///     out_of_order: 0,
///     first_clock: 56,
///     last_clock: 64,
///     motion_groups: vec![1],
///     sections: vec!["Actual TCP".to_string()],
///     mps: None,
/// };
/// assert_eq!(stream.messages, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Source endpoint in `ip:port` form.
    pub src: String,
    /// Destination endpoint in `ip:port` form.
    pub dst: String,
    /// Decoded message count.
    pub messages: u64,
    /// Sum of decoded message lengths.
    pub bytes: u64,
    pub first_index: u32,
    pub last_index: u32,
    /// Indices skipped by forward gaps below 1024.
    pub missing_messages: u64,
    /// Messages whose index did not advance past the previous one.
    pub out_of_order: u64,
    pub first_clock: u32,
    pub last_clock: u32,
    /// Motion groups seen, ascending.
    pub motion_groups: Vec<u16>,
    /// Section kinds flagged, in canonical order.
    pub sections: Vec<String>,
    /// Messages per second over the flow's active interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mps: Option<f64>,
}

/// One decoded message as rendered in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// RFC3339 capture timestamp of the datagram that completed the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    pub src: String,
    pub dst: String,
    pub index: u32,
    pub clock: u32,
    /// Active section names joined with `", "`, or `"None"`.
    pub flags: String,
    /// Type mask as sent, undefined bits included.
    pub raw_flags: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_group: Option<u16>,
    pub length: usize,
    pub trailing_bytes: usize,
    pub sections: Vec<SectionRecord>,
}

/// Decoded section values: x, y, z, w, p, r for poses, leading joint angles
/// for joint sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRecord {
    pub kind: String,
    pub group: u16,
    pub values: Vec<f32>,
    pub status: u32,
    pub io: u32,
}

/// Aggregated issue record.
///
/// # Examples
/// ```
/// use poseshark_core::IssueSummary;
///
/// let issue = IssueSummary {
///     id: "PS-TOO-SHORT".to_string(),
///     severity: "error".to_string(),
///     message: "Datagram too short".to_string(),
///     count: 1,
///     examples: vec!["source 10.0.0.10:60015 @ 1970-01-01T00:00:00Z".to_string()],
/// };
/// assert_eq!(issue.count, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummary {
    /// Stable issue identifier (e.g., `PS-SECTION-OVERRUN`).
    pub id: String,
    /// Severity label (`error` or `warning`).
    pub severity: String,
    /// Human-readable message explaining the issue.
    pub message: String,
    /// Number of occurrences aggregated into this issue.
    pub count: u64,
    /// At most three example contexts, formatted as `source ip:port @ ts`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use poseshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.report_version, poseshark_core::REPORT_VERSION);
/// assert!(report.streams.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "poseshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        streams: vec![],
        messages: vec![],
        issues: vec![],
    }
}
