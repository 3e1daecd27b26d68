//! 8-bit interleaved raster shared by fields and merged frames.

use fieldmerge_common::config::ChannelMode;
use fieldmerge_common::error::{FieldMergeError, FieldMergeResult, RasterShape};
use image::{DynamicImage, ImageBuffer};

/// A 2D grid of pixels, each a fixed-length tuple of 8-bit channel values.
///
/// Samples are stored row-major with channels interleaved, so row `y` is the
/// contiguous slice `data[y * stride .. (y + 1) * stride]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

/// One of the two input fields.
pub type Field = Raster;

/// Output of the merge engine; same shape as its inputs.
pub type MergedFrame = Raster;

impl Raster {
    /// Wrap a sample buffer, checking that it matches the declared shape.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> FieldMergeResult<Self> {
        if !(1..=4).contains(&channels) {
            return Err(FieldMergeError::unsupported(format!(
                "Rasters carry 1 to 4 channels, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(FieldMergeError::unsupported(format!(
                "Sample buffer holds {} bytes, {width}x{height}x{channels} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A raster with every sample set to zero.
    pub fn zeroed(shape: RasterShape) -> FieldMergeResult<Self> {
        let len = shape.width as usize * shape.height as usize * shape.channels as usize;
        Self::new(shape.width, shape.height, shape.channels, vec![0; len])
    }

    /// Convert a decoded image into a raster.
    ///
    /// [`ChannelMode::Rgb`] always yields 3 channels. [`ChannelMode::Native`]
    /// keeps the channel count of the source and narrows deeper samples to 8 bits.
    pub fn from_dynamic(image: DynamicImage, mode: ChannelMode) -> Self {
        let (width, height) = (image.width(), image.height());
        let (channels, data) = match mode {
            ChannelMode::Rgb => (3, image.into_rgb8().into_raw()),
            ChannelMode::Native => match image.color().channel_count() {
                1 => (1, image.into_luma8().into_raw()),
                2 => (2, image.into_luma_alpha8().into_raw()),
                3 => (3, image.into_rgb8().into_raw()),
                _ => (4, image.into_rgba8().into_raw()),
            },
        };
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Convert back into an `image` buffer with the matching color type.
    pub fn to_dynamic(&self) -> FieldMergeResult<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let data = self.data.clone();
        let image = match self.channels {
            1 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            2 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
            3 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            4 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        image.ok_or_else(|| {
            FieldMergeError::unsupported(format!("Cannot convert {} raster to image", self.shape()))
        })
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

    pub fn shape(&self) -> RasterShape {
        RasterShape {
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Bytes per row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Samples of row `y`. Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.row_stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Mutable samples of row `y`. Panics if `y >= height`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.row_stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Channel tuple at column `x`, row `y`, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels as usize;
        let start = x as usize * c;
        Some(&self.row(y)[start..start + c])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
