use std::collections::VecDeque;

use super::{PacketEvent, PacketSource, SourceError};

/// In-memory packet source, mainly for driving the analysis pipeline from
/// frames built in code.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    events: VecDeque<PacketEvent>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PacketEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<PacketEvent>> for MemorySource {
    fn from(events: Vec<PacketEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl PacketSource for MemorySource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        Ok(self.events.pop_front())
    }
}
