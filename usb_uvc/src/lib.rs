#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

mod format;
mod select;

pub use format::{
    FormatDescriptor, FrameDescriptor, FrameIntervals, StreamFormat, StreamFormatRequest,
    VsSubtype,
};
pub use select::streaming_interface_and_endpoint;

use log::trace;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use usb_descriptor::{
    decode, next_record_of_type, records, Descriptor, Interface, Record, Records, CS_INTERFACE,
    INTERFACE,
};

/// Video interface class code (UVC 1.5: Table A-1).
pub const CC_VIDEO: u8 = 0x0e;

/// Video interface subclass codes (UVC 1.5: Table A-2).
#[derive(FromPrimitive, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum VideoSubclass {
    Undefined = 0x00,
    VideoControl = 0x01,
    VideoStreaming = 0x02,
    VideoInterfaceCollection = 0x03,
}

/// Video Control interface descriptor subtypes (UVC 1.5: Table A-5).
#[derive(FromPrimitive, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum VcSubtype {
    Undefined = 0x00,
    Header = 0x01,
    InputTerminal = 0x02,
    OutputTerminal = 0x03,
    SelectorUnit = 0x04,
    ProcessingUnit = 0x05,
    ExtensionUnit = 0x06,
    EncodingUnit = 0x07,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A required buffer is empty or an argument is out of range.
    InvalidArgument,
    /// The buffer holds no record satisfying the search. A truncated or
    /// corrupted buffer surfaces here too, since the walk stops at the
    /// first malformed record.
    NotFound,
}

/// Frame rate to UVC frame interval (100 ns units); zero maps to zero.
pub fn fps_to_frame_interval(fps: u32) -> u32 {
    if fps == 0 {
        0
    } else {
        10_000_000 / fps
    }
}

/// UVC frame interval (100 ns units) to frame rate; zero maps to zero.
pub fn frame_interval_to_fps(interval: u32) -> u32 {
    if interval == 0 {
        0
    } else {
        10_000_000 / interval
    }
}

/// Whether the configuration descriptor advertises a Video-Control
/// interface at all.
///
/// This is the cheap capability probe run at enumeration time; it does not
/// verify the rest of the video function (see [`streaming_interface_num`]).
pub fn is_uvc_device(buf: &[u8]) -> bool {
    decode(buf)
        .filter_map(Result::ok)
        .filter_map(Descriptor::into_interface)
        .any(|i| {
            i.class == CC_VIDEO && VideoSubclass::from_u8(i.subclass) == Some(VideoSubclass::VideoControl)
        })
}

/// Finds the Video Streaming interface of the `uvc_index`-th video function
/// that can serve `request`, along with the function's `bcdUVC` protocol
/// version from its Video-Control header.
pub fn streaming_interface_num(
    buf: &[u8],
    uvc_index: u8,
    request: &StreamFormatRequest,
) -> Result<(u8, u16), Error> {
    if buf.is_empty() {
        return Err(Error::InvalidArgument);
    }

    let mut vc_seen = 0u8;
    let mut bcd_uvc = None;
    let mut offset = 0;
    while let Some(r) = next_record_of_type(buf, offset, INTERFACE) {
        offset = r.next_offset();
        let Ok(intf) = Interface::from_raw(r.data()) else {
            continue;
        };
        if intf.class != CC_VIDEO || intf.alternate_setting != 0 {
            continue;
        }
        match VideoSubclass::from_u8(intf.subclass) {
            Some(VideoSubclass::VideoControl) => {
                if bcd_uvc.is_some() {
                    // ran into the next video function without a match
                    break;
                }
                if vc_seen == uvc_index {
                    bcd_uvc = Some(vc_header_bcd_uvc(buf, intf.number).ok_or(Error::NotFound)?);
                }
                vc_seen += 1;
            }
            Some(VideoSubclass::VideoStreaming) => {
                let Some(bcd) = bcd_uvc else {
                    continue;
                };
                if frame_format_by_format(buf, intf.number, request).is_ok() {
                    trace!(
                        "interface {} serves {:?} at bcdUVC {:#06x}",
                        intf.number,
                        request.format,
                        bcd,
                    );
                    return Ok((intf.number, bcd));
                }
            }
            _ => {}
        }
    }
    Err(Error::NotFound)
}

/// Resolves a format/frame descriptor pair on streaming interface
/// `interface_num` by the explicit `bFormatIndex`/`bFrameIndex` pair a
/// PROBE/COMMIT negotiation refers to.
pub fn frame_format_by_index(
    buf: &[u8],
    interface_num: u8,
    format_index: u8,
    frame_index: u8,
) -> Result<(FormatDescriptor<'_>, FrameDescriptor<'_>), Error> {
    if buf.is_empty() {
        return Err(Error::InvalidArgument);
    }
    let mut current: Option<FormatDescriptor> = None;
    for r in class_specific(buf, interface_num) {
        if let Some(f) = FormatDescriptor::from_record(&r) {
            current = Some(f);
        } else if let Some(frame) = FrameDescriptor::from_record(&r) {
            let Some(f) = current else { continue };
            if f.owns(&frame)
                && f.format_index() == format_index
                && frame.frame_index() == frame_index
            {
                return Ok((f, frame));
            }
        }
    }
    Err(Error::NotFound)
}

/// Resolves a format/frame descriptor pair on streaming interface
/// `interface_num` matching the requested format, exact resolution and
/// exact frame rate.
///
/// The requested rate is converted with [`fps_to_frame_interval`] and must
/// be a member of the frame's advertised interval set; no nearest-rate
/// fallback is attempted.
pub fn frame_format_by_format<'a>(
    buf: &'a [u8],
    interface_num: u8,
    request: &StreamFormatRequest,
) -> Result<(FormatDescriptor<'a>, FrameDescriptor<'a>), Error> {
    if buf.is_empty() {
        return Err(Error::InvalidArgument);
    }
    let interval = fps_to_frame_interval(request.fps);
    let mut current: Option<(FormatDescriptor, bool)> = None;
    for r in class_specific(buf, interface_num) {
        if let Some(f) = FormatDescriptor::from_record(&r) {
            current = Some((f, f.stream_format() == Some(request.format)));
        } else if let Some(frame) = FrameDescriptor::from_record(&r) {
            let Some((f, wanted)) = current else { continue };
            if !wanted || !f.owns(&frame) {
                continue;
            }
            if frame.width() == request.width
                && frame.height() == request.height
                && frame.intervals().is_some_and(|i| i.supports(interval))
            {
                return Ok((f, frame));
            }
        }
    }
    Err(Error::NotFound)
}

/// `bcdUVC` from the class-specific VC interface header of control
/// interface `interface_num`.
fn vc_header_bcd_uvc(buf: &[u8], interface_num: u8) -> Option<u16> {
    class_specific(buf, interface_num)
        .find(|r| r.data().first().and_then(|&b| VcSubtype::from_u8(b)) == Some(VcSubtype::Header))
        .and_then(|r| {
            let d = r.data().get(1..3)?;
            Some(u16::from_le_bytes([d[0], d[1]]))
        })
}

fn class_specific(buf: &[u8], interface_num: u8) -> ClassSpecific<'_> {
    ClassSpecific {
        records: records(buf),
        target: interface_num,
        current: None,
    }
}

/// `CS_INTERFACE` records belonging to one interface: those between its
/// interface record(s) and the next interface record with a different
/// number.
struct ClassSpecific<'a> {
    records: Records<'a>,
    target: u8,
    current: Option<u8>,
}

impl<'a> Iterator for ClassSpecific<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for r in self.records.by_ref() {
            match r.ty() {
                INTERFACE => {
                    self.current = Interface::from_raw(r.data()).ok().map(|i| i.number);
                }
                CS_INTERFACE if self.current == Some(self.target) => return Some(r),
                _ => {}
            }
        }
        None
    }
}
