use std::collections::HashMap;

use crate::IssueSummary;

use super::streams::FlowKey;

pub(crate) const INCOMPLETE: &str = "PS-INCOMPLETE";
pub(crate) const REASSEMBLY_OVERFLOW: &str = "PS-REASSEMBLY-OVERFLOW";

const MAX_EXAMPLES: usize = 3;

/// Stable description of one issue the analyzer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueDescriptor {
    pub id: &'static str,
    /// `error` or `warning`.
    pub severity: &'static str,
    pub message: &'static str,
}

/// Every issue the analyzer can emit.
pub const CATALOG: &[IssueDescriptor] = &[
    IssueDescriptor {
        id: "PS-TOO-SHORT",
        severity: "error",
        message: "Datagram is shorter than the 48-byte minimum or the 14-byte header",
    },
    IssueDescriptor {
        id: "PS-ZERO-LENGTH",
        severity: "error",
        message: "Derived message length is zero",
    },
    IssueDescriptor {
        id: "PS-UNSUPPORTED-VERSION",
        severity: "error",
        message: "Message version is not 0",
    },
    IssueDescriptor {
        id: "PS-SECTION-OVERRUN",
        severity: "error",
        message: "Type flags require more section bytes than the message holds",
    },
    IssueDescriptor {
        id: "PS-SIZE-BELOW-HEADER",
        severity: "error",
        message: "Declared message size is smaller than the header",
    },
    IssueDescriptor {
        id: REASSEMBLY_OVERFLOW,
        severity: "warning",
        message: "Buffered partial message exceeded the reassembly limit and was dropped",
    },
    IssueDescriptor {
        id: INCOMPLETE,
        severity: "warning",
        message: "Capture ended inside an incomplete message",
    },
];

#[derive(Debug, Default)]
struct IssueEntry {
    count: u64,
    examples: Vec<String>,
}

/// Aggregates issue occurrences by id, keeping the first few contexts.
#[derive(Debug, Default)]
pub(crate) struct IssueLog {
    entries: HashMap<&'static str, IssueEntry>,
}

impl IssueLog {
    pub(crate) fn record(&mut self, id: &'static str, key: &FlowKey, ts: Option<f64>) {
        let entry = self.entries.entry(id).or_default();
        entry.count += 1;
        if entry.examples.len() < MAX_EXAMPLES {
            let at = super::ts_to_rfc3339(ts).unwrap_or_else(|| "unknown".to_string());
            entry.examples.push(format!("source {} @ {}", key.src(), at));
        }
    }

    pub(crate) fn into_summaries(self) -> Vec<IssueSummary> {
        let mut issues: Vec<IssueSummary> = self
            .entries
            .into_iter()
            .map(|(id, entry)| {
                let (severity, message) = describe(id);
                IssueSummary {
                    id: id.to_string(),
                    severity: severity.to_string(),
                    message: message.to_string(),
                    count: entry.count,
                    examples: entry.examples,
                }
            })
            .collect();
        issues.sort_by(|a, b| {
            severity_rank(&a.severity)
                .cmp(&severity_rank(&b.severity))
                .then_with(|| a.id.cmp(&b.id))
        });
        issues
    }
}

fn describe(id: &str) -> (&'static str, &'static str) {
    CATALOG
        .iter()
        .find(|issue| issue.id == id)
        .map(|issue| (issue.severity, issue.message))
        .unwrap_or(("error", "Unclassified decode failure"))
}

fn severity_rank(severity: &str) -> u8 {
    match severity {
        "error" => 0,
        "warning" => 1,
        _ => 2,
    }
}
