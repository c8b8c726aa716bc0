use crate::protocols::position::DecoderConfig;

/// Default cap on buffered partial-message bytes per flow.
pub const DEFAULT_MAX_REASSEMBLY_BYTES: usize = 65_536;

/// Options for one analysis run.
///
/// # Examples
/// ```
/// use poseshark_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default().with_ports([60015]);
/// assert_eq!(config.ports, vec![60015]);
/// assert!(!config.include_messages);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub decoder: DecoderConfig,
    /// UDP ports routed to the decoder; empty routes every datagram.
    pub ports: Vec<u16>,
    /// Emit one record per decoded message in the report.
    pub include_messages: bool,
    pub max_reassembly_bytes: usize,
}

impl AnalysisConfig {
    pub fn with_decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    pub fn with_messages(mut self, include: bool) -> Self {
        self.include_messages = include;
        self
    }

    pub fn with_max_reassembly_bytes(mut self, max: usize) -> Self {
        self.max_reassembly_bytes = max;
        self
    }

    pub(crate) fn routes(&self, src_port: u16, dst_port: u16) -> bool {
        self.ports.is_empty() || self.ports.iter().any(|p| *p == src_port || *p == dst_port)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            ports: Vec::new(),
            include_messages: false,
            max_reassembly_bytes: DEFAULT_MAX_REASSEMBLY_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisConfig;

    #[test]
    fn empty_port_list_routes_everything() {
        let config = AnalysisConfig::default();
        assert!(config.routes(1, 2));
    }

    #[test]
    fn listed_port_matches_either_side() {
        let config = AnalysisConfig::default().with_ports([60015]);
        assert!(config.routes(60015, 5000));
        assert!(config.routes(5000, 60015));
        assert!(!config.routes(5000, 5001));
    }
}
