use log::trace;

use usb_descriptor::{
    next_record, next_record_of_type, Direction, Endpoint, EndpointTransfer, Interface,
    ENDPOINT, INTERFACE,
};

use crate::Error;

/// Picks the alternate setting of streaming interface `interface_num` whose
/// data endpoint best fits `max_payload` (the caller's receive-buffer size,
/// in bytes per microframe).
///
/// Every alternate setting is walked; those whose endpoint would deliver
/// more than `max_payload` per microframe are discarded. Of the rest the one
/// with the fewest additional transactions per microframe wins, ties going
/// to the larger base packet size. Alternate setting 0 carries no data
/// endpoint and is never returned.
pub fn streaming_interface_and_endpoint(
    buf: &[u8],
    interface_num: u8,
    max_payload: u32,
) -> Result<(Interface, Endpoint), Error> {
    if buf.is_empty() {
        return Err(Error::InvalidArgument);
    }

    let mut best: Option<(Interface, Endpoint)> = None;
    let mut offset = 0;
    while let Some(r) = next_record_of_type(buf, offset, INTERFACE) {
        offset = r.next_offset();
        let Ok(intf) = Interface::from_raw(r.data()) else {
            continue;
        };
        if intf.number != interface_num || intf.alternate_setting == 0 {
            continue;
        }
        let Some(ep) = data_in_endpoint(buf, offset) else {
            continue;
        };
        // bits 12..11 of wMaxPacketSize are reserved on bulk endpoints,
        // so the multiplier only applies to periodic ones
        let capacity = if ep.attributes.is_periodic() {
            ep.max_packet_size.per_microframe()
        } else {
            u32::from(ep.max_packet_size.base())
        };
        trace!(
            "alt {}: {} bytes/microframe ({} + {} extra)",
            intf.alternate_setting,
            capacity,
            ep.max_packet_size.base(),
            ep.max_packet_size.additional_transactions(),
        );
        if capacity > max_payload {
            continue;
        }
        best = Some(match best {
            Some(cur) if !better(&ep, &cur.1) => cur,
            _ => (intf, ep),
        });
    }
    best.ok_or(Error::NotFound)
}

/// Fewer extra transactions first; among equals, more payload per
/// transaction wastes less of the permitted capacity.
fn better(a: &Endpoint, b: &Endpoint) -> bool {
    let (ta, tb) = (
        a.max_packet_size.additional_transactions(),
        b.max_packet_size.additional_transactions(),
    );
    ta < tb || (ta == tb && a.max_packet_size.base() > b.max_packet_size.base())
}

/// The isochronous/bulk IN endpoint of the alternate setting starting at
/// `offset`, scanning up to the next interface record.
fn data_in_endpoint(buf: &[u8], mut offset: usize) -> Option<Endpoint> {
    while let Some(r) = next_record(buf, offset) {
        offset = r.next_offset();
        match r.ty() {
            INTERFACE => return None,
            ENDPOINT => {
                if let Ok(ep) = Endpoint::from_raw(r.data()) {
                    if ep.address.direction() == Direction::In
                        && matches!(
                            ep.attributes.transfer(),
                            EndpointTransfer::Isoch | EndpointTransfer::Bulk
                        )
                    {
                        return Some(ep);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    fn interface(num: u8, alt: u8, num_ep: u8) -> [u8; 9] {
        [9, INTERFACE, num, alt, num_ep, 0x0e, 0x02, 0x00, 0x00]
    }

    fn isoch_in(mps: u16) -> [u8; 7] {
        let [lo, hi] = mps.to_le_bytes();
        [7, ENDPOINT, 0x81, 0x05, lo, hi, 0x01]
    }

    /// Streaming interface 1 with a zero-bandwidth default and three
    /// alternates of effective capacity 64, 512 and 1024.
    fn fixture() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&interface(1, 0, 0));
        for (alt, mps) in [(1, 64u16), (2, 512), (3, 1024)] {
            buf.extend_from_slice(&interface(1, alt, 1));
            buf.extend_from_slice(&isoch_in(mps));
        }
        buf
    }

    #[test]
    fn largest_capacity_within_budget() {
        let buf = fixture();
        let (intf, ep) = streaming_interface_and_endpoint(&buf, 1, 600).unwrap();
        assert_eq!(intf.alternate_setting, 2);
        assert_eq!(ep.max_packet_size.per_microframe(), 512);
    }

    #[test]
    fn no_alternate_fits_tiny_budget() {
        let buf = fixture();
        assert!(matches!(
            streaming_interface_and_endpoint(&buf, 1, 50),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn tie_break_prefers_larger_base_packet() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&interface(1, 0, 0));
        for (alt, mps) in [(1, 256u16), (2, 512)] {
            buf.extend_from_slice(&interface(1, alt, 1));
            buf.extend_from_slice(&isoch_in(mps));
        }
        let (intf, ep) = streaming_interface_and_endpoint(&buf, 1, 4096).unwrap();
        assert_eq!(intf.alternate_setting, 2);
        assert_eq!(ep.max_packet_size.base(), 512);
    }

    #[test]
    fn fewer_extra_transactions_beats_raw_capacity() {
        // alt 1: 1024 + 1 extra transaction (2048/uF), alt 2: plain 1024
        let mut buf = Vec::new();
        buf.extend_from_slice(&interface(1, 0, 0));
        buf.extend_from_slice(&interface(1, 1, 1));
        buf.extend_from_slice(&isoch_in(1024 | 1 << 11));
        buf.extend_from_slice(&interface(1, 2, 1));
        buf.extend_from_slice(&isoch_in(1024));
        let (intf, ep) = streaming_interface_and_endpoint(&buf, 1, 4096).unwrap();
        assert_eq!(intf.alternate_setting, 2);
        assert_eq!(ep.max_packet_size.additional_transactions(), 0);
    }

    #[test]
    fn bulk_endpoint_ignores_reserved_transaction_bits() {
        // a non-conformant bulk endpoint with bits 12..11 set still
        // counts at its base size
        let mps = 512u16 | 1 << 11;
        let [lo, hi] = mps.to_le_bytes();
        let mut buf = Vec::new();
        buf.extend_from_slice(&interface(1, 0, 0));
        buf.extend_from_slice(&interface(1, 1, 1));
        buf.extend_from_slice(&[7, ENDPOINT, 0x82, 0x02, lo, hi, 0x00]);
        let (intf, ep) = streaming_interface_and_endpoint(&buf, 1, 600).unwrap();
        assert_eq!(intf.alternate_setting, 1);
        assert_eq!(ep.max_packet_size.base(), 512);
    }

    #[test]
    fn alternate_zero_is_never_selected() {
        // bulk cameras hang the endpoint off alternate 0; the selector
        // still refuses it
        let mut buf = Vec::new();
        buf.extend_from_slice(&interface(1, 0, 1));
        buf.extend_from_slice(&[7, ENDPOINT, 0x82, 0x02, 0x00, 0x02, 0x00]);
        assert!(matches!(
            streaming_interface_and_endpoint(&buf, 1, 4096),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn wrong_interface_number_not_found() {
        let buf = fixture();
        assert!(matches!(
            streaming_interface_and_endpoint(&buf, 3, 600),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn empty_buffer_is_invalid() {
        assert!(matches!(
            streaming_interface_and_endpoint(&[], 1, 600),
            Err(Error::InvalidArgument)
        ));
    }
}
