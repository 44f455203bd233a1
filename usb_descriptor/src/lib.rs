#![cfg_attr(not(test), no_std)]

mod configuration;
mod endpoint;
mod interface;

pub use configuration::*;
pub use endpoint::*;
pub use interface::*;

// Standard descriptor types (USB 2.0: 9.4, Table 9-5)
pub const DEVICE: u8 = 0x1;
pub const CONFIGURATION: u8 = 0x2;
pub const STRING: u8 = 0x3;
pub const INTERFACE: u8 = 0x4;
pub const ENDPOINT: u8 = 0x5;
pub const DEVICE_QUALIFIER: u8 = 0x6;
pub const OTHER_SPEED_CONFIGURATION: u8 = 0x7;
pub const INTERFACE_ASSOCIATION: u8 = 0xb;

// Class-specific descriptor types (USB CDC/UVC/UAC: functional descriptors)
pub const CS_INTERFACE: u8 = 0x24;
pub const CS_ENDPOINT: u8 = 0x25;

/// Borrowed view of a single raw descriptor record.
///
/// A record is a 2-byte header (`bLength`, `bDescriptorType`) followed by
/// `bLength - 2` payload bytes. `data` covers only the payload.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    offset: usize,
    ty: u8,
    data: &'a [u8],
}

impl<'a> Record<'a> {
    /// Offset of this record's header within the buffer it was read from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn ty(&self) -> u8 {
        self.ty
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Total length of the record, header included (`bLength`).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.data.len() + 2
    }

    /// Scan cursor for the record following this one.
    pub fn next_offset(&self) -> usize {
        self.offset + self.len()
    }
}

/// Returns the record starting at `offset`, or `None` if no well-formed
/// record fits before the end of `buf`.
///
/// A record whose declared length is below 2 or extends past the buffer end
/// terminates the walk; the bytes from `offset` onward are never read past
/// `buf.len()`.
pub fn next_record(buf: &[u8], offset: usize) -> Option<Record<'_>> {
    let rem = buf.get(offset..)?;
    let &[l, ty, ..] = rem else { return None };
    let l = usize::from(l);
    if l < 2 || l > rem.len() {
        return None;
    }
    Some(Record {
        offset,
        ty,
        data: &rem[2..l],
    })
}

/// Like [`next_record`], but skips records whose type byte differs from `ty`.
pub fn next_record_of_type(buf: &[u8], mut offset: usize, ty: u8) -> Option<Record<'_>> {
    loop {
        let r = next_record(buf, offset)?;
        if r.ty() == ty {
            return Some(r);
        }
        offset = r.next_offset();
    }
}

pub fn records(buf: &[u8]) -> Records<'_> {
    Records { buf, offset: 0 }
}

/// Iterator over every record in a configuration descriptor buffer, in
/// ascending offset order. Stops at the first malformed record.
#[derive(Clone, Debug)]
pub struct Records<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let r = next_record(self.buf, self.offset)?;
        self.offset = r.next_offset();
        Some(r)
    }
}

#[derive(Debug)]
pub enum Descriptor<'a> {
    Configuration(Configuration),
    Interface(Interface),
    Endpoint(Endpoint),
    /// A class-specific record (`CS_INTERFACE`/`CS_ENDPOINT`); interpreting
    /// the payload is left to the class layer.
    ClassSpecific(Record<'a>),
    Unknown { ty: u8, data: &'a [u8] },
}

macro_rules! into {
    ($v:ident $f:ident $t:ty) => {
        pub fn $f(self) -> Option<$t> {
            match self {
                Self::$v(v) => Some(v),
                _ => None,
            }
        }
    };
}

impl<'a> Descriptor<'a> {
    into!(Configuration into_configuration Configuration);
    into!(Interface into_interface Interface);
    into!(Endpoint into_endpoint Endpoint);
}

pub fn decode(buf: &[u8]) -> Iter<'_> {
    Iter {
        inner: records(buf),
    }
}

/// Iterator of typed descriptor views over a configuration buffer.
pub struct Iter<'a> {
    inner: Records<'a>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<Descriptor<'a>, InvalidDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(classify)
    }
}

fn classify(r: Record<'_>) -> Result<Descriptor<'_>, InvalidDescriptor> {
    let b = r.data();
    Ok(match r.ty() {
        CONFIGURATION => Descriptor::Configuration(
            Configuration::from_raw(b).map_err(InvalidDescriptor::Configuration)?,
        ),
        INTERFACE => {
            Descriptor::Interface(Interface::from_raw(b).map_err(InvalidDescriptor::Interface)?)
        }
        ENDPOINT => Descriptor::Endpoint(Endpoint::from_raw(b).map_err(InvalidDescriptor::Endpoint)?),
        CS_INTERFACE | CS_ENDPOINT => Descriptor::ClassSpecific(r),
        ty => Descriptor::Unknown { ty, data: b },
    })
}

#[derive(Debug)]
pub enum InvalidDescriptor {
    Configuration(InvalidConfiguration),
    Interface(InvalidInterface),
    Endpoint(InvalidEndpoint),
}

#[cfg(test)]
mod test {
    use super::*;

    // 9-byte interface, 7-byte endpoint, one vendor-defined record
    const WELL_FORMED: &[u8] = &[
        0x09, 0x04, 0x00, 0x00, 0x01, 0xff, 0x00, 0x00, 0x00, // interface
        0x07, 0x05, 0x81, 0x02, 0x00, 0x02, 0x00, // endpoint
        0x04, 0x44, 0xaa, 0xbb, // vendor
    ];

    #[test]
    fn visits_every_record_once() {
        let offsets: Vec<_> = records(WELL_FORMED).map(|r| r.offset()).collect();
        assert_eq!(offsets, [0, 9, 16]);
        let total: usize = records(WELL_FORMED).map(|r| r.len()).sum();
        assert_eq!(total, WELL_FORMED.len());
    }

    #[test]
    fn overrunning_record_stops_walk() {
        // second record claims 0x20 bytes but only 4 remain
        let buf = &[
            0x09, 0x04, 0x00, 0x00, 0x01, 0xff, 0x00, 0x00, 0x00, //
            0x20, 0x05, 0x81, 0x02,
        ];
        let visited: Vec<_> = records(buf).map(|r| r.offset()).collect();
        assert_eq!(visited, [0]);
    }

    #[test]
    fn zero_length_record_stops_walk() {
        let buf = &[0x00, 0x04, 0x00];
        assert!(next_record(buf, 0).is_none());
    }

    #[test]
    fn filtered_walk_skips_other_types() {
        let r = next_record_of_type(WELL_FORMED, 0, ENDPOINT).unwrap();
        assert_eq!(r.offset(), 9);
        assert!(next_record_of_type(WELL_FORMED, r.next_offset(), ENDPOINT).is_none());
    }

    #[test]
    fn cursor_resumes_without_rescanning() {
        let first = next_record(WELL_FORMED, 0).unwrap();
        let second = next_record(WELL_FORMED, first.next_offset()).unwrap();
        assert_eq!(second.offset(), 9);
        assert_eq!(second.ty(), ENDPOINT);
    }

    #[test]
    fn decode_classifies_records() {
        let mut it = decode(WELL_FORMED);
        assert!(matches!(it.next(), Some(Ok(Descriptor::Interface(_)))));
        assert!(matches!(it.next(), Some(Ok(Descriptor::Endpoint(_)))));
        assert!(matches!(
            it.next(),
            Some(Ok(Descriptor::Unknown { ty: 0x44, .. }))
        ));
        assert!(it.next().is_none());
    }
}
