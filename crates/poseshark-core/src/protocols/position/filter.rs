use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use super::error::AllowEntryError;

/// Transport metadata of the datagram a buffer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketOrigin {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    /// Link-layer source address, when the capture has an Ethernet header.
    pub src_mac: Option<MacAddr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddr {
    type Err = AllowEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AllowEntryError {
            input: s.to_string(),
        };
        let mut octets = [0u8; 6];
        let mut parts = s.split([':', '-']);
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(err)?;
            if part.len() != 2 {
                return Err(err());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(MacAddr(octets))
    }
}

/// Decides whether a buffer's origin belongs to a known device.
///
/// A rejected origin makes the decoder report
/// [`DecodeOutcome::NotThisProtocol`](super::parser::DecodeOutcome::NotThisProtocol)
/// without touching the payload.
pub trait SourceFilter: Send + Sync {
    fn accepts(&self, origin: &PacketOrigin) -> bool;
}

impl<F> SourceFilter for F
where
    F: Fn(&PacketOrigin) -> bool + Send + Sync,
{
    fn accepts(&self, origin: &PacketOrigin) -> bool {
        self(origin)
    }
}

/// Allow-list over source IP and source MAC addresses. An origin is accepted
/// when either its IP or its MAC is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    ips: BTreeSet<IpAddr>,
    macs: BTreeSet<MacAddr>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_ip(&mut self, ip: IpAddr) -> &mut Self {
        self.ips.insert(ip);
        self
    }

    pub fn allow_mac(&mut self, mac: MacAddr) -> &mut Self {
        self.macs.insert(mac);
        self
    }

    /// Add an entry written as an IP address or a MAC address.
    pub fn allow_str(&mut self, entry: &str) -> Result<&mut Self, AllowEntryError> {
        let entry = entry.trim();
        if let Ok(ip) = entry.parse::<IpAddr>() {
            return Ok(self.allow_ip(ip));
        }
        let mac = entry.parse::<MacAddr>()?;
        Ok(self.allow_mac(mac))
    }

    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.macs.is_empty()
    }
}

impl SourceFilter for AllowList {
    fn accepts(&self, origin: &PacketOrigin) -> bool {
        self.ips.contains(&origin.src_ip)
            || origin
                .src_mac
                .is_some_and(|mac| self.macs.contains(&mac))
    }
}

#[cfg(test)]
mod tests {
    use super::{AllowList, MacAddr, PacketOrigin, SourceFilter};
    use std::net::IpAddr;

    fn origin(ip: &str, mac: Option<[u8; 6]>) -> PacketOrigin {
        let ip: IpAddr = ip.parse().unwrap();
        PacketOrigin {
            src_ip: ip,
            src_port: 60015,
            dst_ip: "10.0.0.2".parse().unwrap(),
            dst_port: 60015,
            src_mac: mac.map(MacAddr),
        }
    }

    #[test]
    fn mac_parses_both_separators() {
        let colon: MacAddr = "00:1A:2b:3c:4d:5e".parse().unwrap();
        let dash: MacAddr = "00-1a-2b-3c-4d-5e".parse().unwrap();
        assert_eq!(colon, dash);
        assert_eq!(colon.to_string(), "00:1a:2b:3c:4d:5e");
    }

    #[test]
    fn mac_rejects_malformed_input() {
        assert!("00:1a:2b:3c:4d".parse::<MacAddr>().is_err());
        assert!("00:1a:2b:3c:4d:5e:6f".parse::<MacAddr>().is_err());
        assert!("00:1a:2b:3c:4d:zz".parse::<MacAddr>().is_err());
    }

    #[test]
    fn allow_list_matches_ip_or_mac() {
        let mut allow = AllowList::new();
        allow.allow_str("10.0.0.10").unwrap();
        allow.allow_str("02:00:00:00:00:01").unwrap();

        assert!(allow.accepts(&origin("10.0.0.10", None)));
        assert!(allow.accepts(&origin("10.0.0.99", Some([2, 0, 0, 0, 0, 1]))));
        assert!(!allow.accepts(&origin("10.0.0.99", Some([2, 0, 0, 0, 0, 2]))));
        assert!(!allow.accepts(&origin("10.0.0.99", None)));
    }

    #[test]
    fn allow_list_rejects_garbage_entry() {
        let mut allow = AllowList::new();
        let err = allow.allow_str("robot-1").unwrap_err();
        assert!(err.to_string().contains("robot-1"));
        assert!(allow.is_empty());
    }

    #[test]
    fn closures_are_filters() {
        let only_port = |origin: &PacketOrigin| origin.src_port == 60015;
        assert!(only_port.accepts(&origin("10.0.0.1", None)));
    }
}
