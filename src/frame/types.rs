use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Order of the interleaved chroma bytes in a 4:2:0 semi-planar frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChromaOrder {
    /// NV21: V then U. What Android camera previews deliver.
    #[default]
    Vu,
    /// NV12: U then V.
    Uv,
}

/// A borrowed 4:2:0 semi-planar camera frame whose size has been validated.
///
/// The buffer holds a full-resolution luma plane followed by interleaved
/// chroma rows at half resolution in both axes, `width * height * 3 / 2`
/// bytes in total.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    order: ChromaOrder,
}

impl<'a> RawFrame<'a> {
    /// Validate `data` against the dimensions and wrap it.
    ///
    /// Fails on an empty buffer, zero or odd dimensions, or any length that
    /// differs from the derived frame size. Never truncates.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        order: ChromaOrder,
    ) -> Result<Self, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        let expected = Self::expected_len(width, height)
            .ok_or(DecodeError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(DecodeError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            order,
        })
    }

    /// Byte length of a frame with these dimensions, or `None` when the
    /// dimensions cannot describe a 4:2:0 frame.
    pub fn expected_len(width: u32, height: u32) -> Option<usize> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return None;
        }
        let luma = (width as usize).checked_mul(height as usize)?;
        luma.checked_add(luma / 2)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChromaOrder {
        self.order
    }
}

/// An owned, interleaved 8-bit pixel grid.
///
/// Each pipeline stage consumes one of these and produces a new one. An
/// image with no pixels is "empty" and is the pipeline's no-op input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl CanonicalImage {
    /// RGB image built from a frame whose size was already checked by
    /// [`RawFrame::new`].
    pub(crate) fn from_decoded_rgb(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 3);
        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }

    /// Wrap an interleaved buffer. Returns `None` if the channel count is
    /// outside 1..=4 or the buffer length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Option<Self> {
        if !(1..=4).contains(&channels) {
            return None;
        }
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(channels as usize)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// An empty image with the given channel count.
    pub fn empty(channels: u8) -> Self {
        Self {
            width: 0,
            height: 0,
            channels,
            data: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
