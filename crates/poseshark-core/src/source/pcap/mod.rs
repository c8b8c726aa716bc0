//! PCAP/PCAPNG source implementation.
//!
//! Provides a `PacketSource` backed by PCAP or PCAPNG files. File format
//! detection, block iteration and timestamp conversion stay here so the
//! analysis pipeline only sees raw link-layer frames.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
