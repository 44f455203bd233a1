use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

use usb_descriptor::{Record, CS_INTERFACE};

/// Video Streaming interface descriptor subtypes (UVC 1.5: Table A-7).
#[derive(FromPrimitive, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum VsSubtype {
    Undefined = 0x00,
    InputHeader = 0x01,
    OutputHeader = 0x02,
    StillImageFrame = 0x03,
    FormatUncompressed = 0x04,
    FrameUncompressed = 0x05,
    FormatMjpeg = 0x06,
    FrameMjpeg = 0x07,
    FormatMpeg2Ts = 0x0a,
    FormatDv = 0x0c,
    ColorFormat = 0x0d,
    FormatFrameBased = 0x10,
    FrameFrameBased = 0x11,
    FormatStreamBased = 0x12,
}

impl VsSubtype {
    pub(crate) fn of(r: &Record<'_>) -> Option<Self> {
        if r.ty() != CS_INTERFACE {
            return None;
        }
        Self::from_u8(*r.data().first()?)
    }
}

/// Pixel formats this driver can stream.
///
/// Which variant a format descriptor maps to is decided by its subtype and,
/// for uncompressed and frame-based formats, its format GUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamFormat {
    Yuy2,
    Mjpeg,
    H264,
    H265,
}

/// Desired stream characteristics, used as a search key against the
/// format/frame descriptors a streaming interface advertises.
#[derive(Clone, Copy, Debug)]
pub struct StreamFormatRequest {
    pub format: StreamFormat,
    pub width: u16,
    pub height: u16,
    pub fps: u32,
}

// Format GUIDs share a common tail after the FourCC (UVC 1.5: 2.9 and the
// USB Device Class Definition for Video Media Transport).
macro_rules! guid {
    ($a:literal $b:literal $c:literal $d:literal) => {
        [
            $a, $b, $c, $d, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
        ]
    };
}

const GUID_YUY2: [u8; 16] = guid!(b'Y' b'U' b'Y' b'2');
const GUID_H264: [u8; 16] = guid!(b'H' b'2' b'6' b'4');
const GUID_H265: [u8; 16] = guid!(b'H' b'2' b'6' b'5');

/// Borrowed view of a VS format descriptor (uncompressed, MJPEG or
/// frame-based).
#[derive(Clone, Copy, Debug)]
pub struct FormatDescriptor<'a> {
    subtype: VsSubtype,
    data: &'a [u8],
}

impl<'a> FormatDescriptor<'a> {
    pub fn from_record(r: &Record<'a>) -> Option<Self> {
        let subtype = VsSubtype::of(r)?;
        match subtype {
            VsSubtype::FormatUncompressed | VsSubtype::FormatMjpeg | VsSubtype::FormatFrameBased => {
            }
            _ => return None,
        }
        (r.data().len() >= 3).then(|| Self {
            subtype,
            data: r.data(),
        })
    }

    pub fn subtype(&self) -> VsSubtype {
        self.subtype
    }

    pub fn format_index(&self) -> u8 {
        self.data[1]
    }

    pub fn num_frame_descriptors(&self) -> u8 {
        self.data[2]
    }

    /// The format GUID; MJPEG formats carry none.
    pub fn guid(&self) -> Option<&'a [u8]> {
        match self.subtype {
            VsSubtype::FormatUncompressed | VsSubtype::FormatFrameBased => self.data.get(3..19),
            _ => None,
        }
    }

    /// Maps this descriptor to the driver-internal format identifier, or
    /// `None` for formats the driver cannot stream.
    pub fn stream_format(&self) -> Option<StreamFormat> {
        match self.subtype {
            VsSubtype::FormatMjpeg => Some(StreamFormat::Mjpeg),
            VsSubtype::FormatUncompressed => match self.guid()? {
                g if g == GUID_YUY2 => Some(StreamFormat::Yuy2),
                _ => None,
            },
            VsSubtype::FormatFrameBased => match self.guid()? {
                g if g == GUID_H264 => Some(StreamFormat::H264),
                g if g == GUID_H265 => Some(StreamFormat::H265),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether `frame` is of the frame subtype belonging to this format.
    pub fn owns(&self, frame: &FrameDescriptor<'_>) -> bool {
        matches!(
            (self.subtype, frame.subtype()),
            (VsSubtype::FormatUncompressed, VsSubtype::FrameUncompressed)
                | (VsSubtype::FormatMjpeg, VsSubtype::FrameMjpeg)
                | (VsSubtype::FormatFrameBased, VsSubtype::FrameFrameBased)
        )
    }
}

/// Borrowed view of a VS frame descriptor.
///
/// Uncompressed and MJPEG frames share one layout; frame-based frames place
/// the default interval and interval type four bytes earlier (no
/// `dwMaxVideoFrameBufferSize`, trailing `dwBytesPerLine` instead). The
/// interval list itself starts at the same payload offset in all three.
#[derive(Clone, Copy, Debug)]
pub struct FrameDescriptor<'a> {
    subtype: VsSubtype,
    data: &'a [u8],
}

impl<'a> FrameDescriptor<'a> {
    pub fn from_record(r: &Record<'a>) -> Option<Self> {
        let subtype = VsSubtype::of(r)?;
        match subtype {
            VsSubtype::FrameUncompressed | VsSubtype::FrameMjpeg | VsSubtype::FrameFrameBased => {}
            _ => return None,
        }
        (r.data().len() >= 24).then(|| Self {
            subtype,
            data: r.data(),
        })
    }

    pub fn subtype(&self) -> VsSubtype {
        self.subtype
    }

    pub fn frame_index(&self) -> u8 {
        self.data[1]
    }

    pub fn width(&self) -> u16 {
        le16(self.data, 3)
    }

    pub fn height(&self) -> u16 {
        le16(self.data, 5)
    }

    pub fn default_frame_interval(&self) -> u32 {
        le32(self.data, self.interval_type_offset() - 4)
    }

    fn interval_type_offset(&self) -> usize {
        match self.subtype {
            VsSubtype::FrameFrameBased => 19,
            _ => 23,
        }
    }

    /// The set of frame intervals (100 ns units) this frame supports, or
    /// `None` if the descriptor is too short for its declared list.
    pub fn intervals(&self) -> Option<FrameIntervals<'a>> {
        let n = self.data[self.interval_type_offset()];
        let tail = self.data.get(24..)?;
        if n == 0 {
            let range = tail.get(..12)?;
            Some(FrameIntervals::Continuous {
                min: le32(range, 0),
                max: le32(range, 4),
                step: le32(range, 8),
            })
        } else {
            let list = tail.get(..usize::from(n) * 4)?;
            Some(FrameIntervals::Discrete(list))
        }
    }
}

/// Frame-interval set advertised by a frame descriptor: either a list of
/// discrete values or a continuous `[min, max]` range walked in `step`
/// increments (`bFrameIntervalType == 0`).
#[derive(Clone, Copy, Debug)]
pub enum FrameIntervals<'a> {
    Discrete(&'a [u8]),
    Continuous { min: u32, max: u32, step: u32 },
}

impl<'a> FrameIntervals<'a> {
    /// Whether `interval` is a member of the advertised set.
    pub fn supports(&self, interval: u32) -> bool {
        if interval == 0 {
            return false;
        }
        match *self {
            Self::Discrete(_) => self.iter().any(|i| i == interval),
            Self::Continuous { min, max, step } => {
                (min..=max).contains(&interval)
                    && (step == 0 || (interval - min) % step == 0)
            }
        }
    }

    /// The discrete interval values; empty for continuous ranges.
    pub fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        let list = match *self {
            Self::Discrete(list) => list,
            Self::Continuous { .. } => &[],
        };
        list.chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
    }
}

fn le16(buf: &[u8], i: usize) -> u16 {
    u16::from_le_bytes([buf[i], buf[i + 1]])
}

fn le32(buf: &[u8], i: usize) -> u32 {
    u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]])
}
