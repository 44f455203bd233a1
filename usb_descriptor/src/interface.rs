#[derive(Clone, Copy, Debug)]
pub struct Interface {
    pub number: u8,
    /// Alternate settings sharing `number` are mutually exclusive on the
    /// device; setting 0 is the default selected after configuration.
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub index: u8,
}

impl Interface {
    pub fn from_raw(buf: &[u8]) -> Result<Self, InvalidInterface> {
        if let &[a, b, c, d, e, f, g] = buf {
            Ok(Interface {
                number: a,
                alternate_setting: b,
                num_endpoints: c,
                class: d,
                subclass: e,
                protocol: f,
                index: g,
            })
        } else {
            Err(InvalidInterface::UnexpectedLength)
        }
    }
}

#[derive(Debug)]
pub enum InvalidInterface {
    UnexpectedLength,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn from_raw_video_streaming() {
        // bInterfaceNumber 1, alternate 2, one endpoint, CC_VIDEO/VIDEOSTREAMING
        let i = Interface::from_raw(&[0x01, 0x02, 0x01, 0x0e, 0x02, 0x00, 0x00]).unwrap();
        assert_eq!(i.number, 1);
        assert_eq!(i.alternate_setting, 2);
        assert_eq!(i.class, 0x0e);
        assert_eq!(i.subclass, 0x02);
    }

    #[test]
    fn from_raw_rejects_short_payload() {
        assert!(matches!(
            Interface::from_raw(&[0x01, 0x02]),
            Err(InvalidInterface::UnexpectedLength)
        ));
    }
}
