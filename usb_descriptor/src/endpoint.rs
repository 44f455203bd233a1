use core::fmt;

#[derive(Clone, Copy, Debug)]
pub struct Endpoint {
    /// The address of the endpoint on the USB device described by this descriptor.
    pub address: EndpointAddress,
    pub attributes: EndpointAttributes,
    pub max_packet_size: MaxPacketSize,
    pub interval: u8,
}

impl Endpoint {
    pub fn from_raw(buf: &[u8]) -> Result<Endpoint, InvalidEndpoint> {
        if let &[a, b, c, d, e] = buf {
            Ok(Endpoint {
                address: EndpointAddress::from_raw(a).ok_or(InvalidEndpoint::InvalidAddress)?,
                attributes: EndpointAttributes::from_raw(b)
                    .ok_or(InvalidEndpoint::InvalidAttributes)?,
                max_packet_size: MaxPacketSize(u16::from_le_bytes([c, d])),
                interval: e,
            })
        } else {
            Err(InvalidEndpoint::UnexpectedLength)
        }
    }
}

#[derive(Clone, Copy)]
pub struct EndpointAddress(u8);

impl EndpointAddress {
    pub fn direction(&self) -> Direction {
        if self.0 & 1 << 7 == 0 {
            Direction::Out
        } else {
            Direction::In
        }
    }

    pub fn number(&self) -> u8 {
        self.0 & 0xf
    }

    fn from_raw(n: u8) -> Option<Self> {
        (1..=15).contains(&(n & 0xf)).then(|| Self(n))
    }
}

impl fmt::Debug for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(stringify!(EndpointAddress))
            .field("direction", &self.direction())
            .field("number", &self.number())
            .finish()
    }
}

#[derive(Clone, Copy)]
pub struct EndpointAttributes(u8);

impl EndpointAttributes {
    pub fn usage(&self) -> EndpointUsage {
        match self.0 >> 4 & 0x3 {
            0 => EndpointUsage::Data,
            1 => EndpointUsage::Feedback,
            2 => EndpointUsage::Implicit,
            _ => unreachable!(),
        }
    }

    pub fn sync(&self) -> EndpointSync {
        match self.0 >> 2 & 0x3 {
            0 => EndpointSync::None,
            1 => EndpointSync::Async,
            2 => EndpointSync::Adapt,
            3 => EndpointSync::Sync,
            _ => unreachable!(),
        }
    }

    pub fn transfer(&self) -> EndpointTransfer {
        match self.0 & 0x3 {
            0 => EndpointTransfer::Control,
            1 => EndpointTransfer::Isoch,
            2 => EndpointTransfer::Bulk,
            3 => EndpointTransfer::Interrupt,
            _ => unreachable!(),
        }
    }

    /// Periodic endpoints (isochronous/interrupt) may claim extra
    /// transactions per microframe at high speed.
    pub fn is_periodic(&self) -> bool {
        matches!(
            self.transfer(),
            EndpointTransfer::Isoch | EndpointTransfer::Interrupt
        )
    }

    fn from_raw(n: u8) -> Option<Self> {
        matches!(n >> 4 & 0x3, 0 | 1 | 2).then(|| Self(n))
    }
}

impl fmt::Debug for EndpointAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(stringify!(EndpointAttributes))
            .field("usage", &self.usage())
            .field("sync", &self.sync())
            .field("transfer", &self.transfer())
            .finish()
    }
}

/// The raw `wMaxPacketSize` field.
///
/// Bits 10..0 carry the base packet size; for high-speed periodic endpoints
/// bits 12..11 carry the number of additional transaction opportunities per
/// microframe (USB 2.0: 9.6.6).
#[derive(Clone, Copy)]
pub struct MaxPacketSize(pub u16);

impl MaxPacketSize {
    pub fn base(&self) -> u16 {
        self.0 & 0x7ff
    }

    pub fn additional_transactions(&self) -> u8 {
        (self.0 >> 11 & 0x3) as u8
    }

    /// Effective bytes per microframe: `base * (1 + additional)`.
    ///
    /// Full/low-speed endpoints carry zero in bits 12..11, so the factor
    /// degenerates to 1 there.
    pub fn per_microframe(&self) -> u32 {
        u32::from(self.base()) * (1 + u32::from(self.additional_transactions()))
    }
}

impl fmt::Debug for MaxPacketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(stringify!(MaxPacketSize))
            .field("base", &self.base())
            .field("additional_transactions", &self.additional_transactions())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointUsage {
    Data,
    Feedback,
    Implicit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointSync {
    None,
    Async,
    Adapt,
    Sync,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointTransfer {
    Control,
    Isoch,
    Bulk,
    Interrupt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug)]
pub enum InvalidEndpoint {
    UnexpectedLength,
    InvalidAddress,
    InvalidAttributes,
}
