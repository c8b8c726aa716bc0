use std::fmt;
use std::sync::Arc;

use super::filter::SourceFilter;
use super::layout;

/// How the decoder derives each message's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// The rest of the buffer is one message; the header `size` field is ignored.
    #[default]
    Remainder,
    /// The header `size` field is the total message length, header included.
    DeclaredSize,
}

/// Read-only inputs of a decode call.
#[derive(Clone)]
pub struct DecoderConfig {
    /// When set, buffers whose origin is rejected (or unknown) are not decoded.
    pub source_filter: Option<Arc<dyn SourceFilter>>,
    /// Joint values shown by presentation layers. Decoding always reads every slot.
    pub axis_display_count: usize,
    pub framing: FramingMode,
}

impl DecoderConfig {
    pub fn with_source_filter(mut self, filter: impl SourceFilter + 'static) -> Self {
        self.source_filter = Some(Arc::new(filter));
        self
    }

    pub fn with_axis_display_count(mut self, count: usize) -> Self {
        self.axis_display_count = count;
        self
    }

    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    /// Display count clamped to `1..=9`.
    pub fn display_axes(&self) -> usize {
        self.axis_display_count.clamp(1, layout::JOINT_SLOTS)
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            source_filter: None,
            axis_display_count: layout::JOINT_SLOTS,
            framing: FramingMode::default(),
        }
    }
}

impl fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("source_filter", &self.source_filter.is_some())
            .field("axis_display_count", &self.axis_display_count)
            .field("framing", &self.framing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{DecoderConfig, FramingMode};

    #[test]
    fn defaults_show_every_axis() {
        let config = DecoderConfig::default();
        assert_eq!(config.display_axes(), 9);
        assert_eq!(config.framing, FramingMode::Remainder);
        assert!(config.source_filter.is_none());
    }

    #[test]
    fn display_axes_is_clamped() {
        assert_eq!(DecoderConfig::default().with_axis_display_count(0).display_axes(), 1);
        assert_eq!(DecoderConfig::default().with_axis_display_count(6).display_axes(), 6);
        assert_eq!(DecoderConfig::default().with_axis_display_count(20).display_axes(), 9);
    }
}
