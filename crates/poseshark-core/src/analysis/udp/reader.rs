use super::error::UdpError;
use super::layout;

pub struct UdpReader<'a> {
    datagram: &'a [u8],
}

impl<'a> UdpReader<'a> {
    pub fn new(datagram: &'a [u8]) -> Self {
        Self { datagram }
    }

    /// Application payload after the fixed UDP header.
    pub fn payload(&self) -> Result<&'a [u8], UdpError> {
        self.datagram
            .get(layout::UDP_HEADER_LEN..)
            .ok_or(UdpError::TooShort {
                needed: layout::UDP_HEADER_LEN,
                actual: self.datagram.len(),
            })
    }
}
