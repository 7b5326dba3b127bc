//! Conversions between `image` crate buffers and [`PixelBuffer`].
//!
//! Available when the `image-io` feature is enabled. Decoding and encoding
//! files is left to the caller.

use crate::image::{ChannelLayout, PixelBuffer, PixelView};
use crate::util::{CarveError, CarveResult};

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> CarveResult<PixelView<'_>> {
    PixelView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize, 1)
}

/// Creates a borrowed view from an RGBA image buffer.
pub fn view_from_rgba_image(img: &image::RgbaImage) -> CarveResult<PixelView<'_>> {
    PixelView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize, 4)
}

/// Converts a dynamic image into a buffer, keeping grey images single channel.
///
/// Images with alpha keep their alpha channel; everything else becomes
/// 8-bit grey or RGB.
pub fn buffer_from_dynamic_image(img: &image::DynamicImage) -> CarveResult<PixelBuffer> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let color = img.color();
    match (color.has_color(), color.has_alpha()) {
        (false, false) => {
            PixelBuffer::new(img.to_luma8().into_raw(), width, height, ChannelLayout::Grey)
        }
        (false, true) => PixelBuffer::new(
            img.to_luma_alpha8().into_raw(),
            width,
            height,
            ChannelLayout::GreyAlpha,
        ),
        (true, false) => {
            PixelBuffer::new(img.to_rgb8().into_raw(), width, height, ChannelLayout::Rgb)
        }
        (true, true) => {
            PixelBuffer::new(img.to_rgba8().into_raw(), width, height, ChannelLayout::Rgba)
        }
    }
}

/// Converts a buffer back into a dynamic image.
///
/// Only the grey, grey+alpha, RGB and RGBA layouts have an `image`
/// counterpart; other layouts are rejected.
pub fn buffer_to_dynamic_image(buffer: &PixelBuffer) -> CarveResult<image::DynamicImage> {
    let width = u32::try_from(buffer.width()).map_err(|_| CarveError::InvalidDimensions {
        width: buffer.width(),
        height: buffer.height(),
    })?;
    let height = u32::try_from(buffer.height()).map_err(|_| CarveError::InvalidDimensions {
        width: buffer.width(),
        height: buffer.height(),
    })?;
    let data = buffer.data().to_vec();
    let len = data.len();
    let mismatch = || CarveError::BufferLength {
        expected: buffer.width() * buffer.height() * buffer.channels(),
        got: len,
    };
    let img = match buffer.layout() {
        ChannelLayout::Grey => image::DynamicImage::ImageLuma8(
            image::GrayImage::from_raw(width, height, data).ok_or_else(mismatch)?,
        ),
        ChannelLayout::GreyAlpha => image::DynamicImage::ImageLumaA8(
            image::GrayAlphaImage::from_raw(width, height, data).ok_or_else(mismatch)?,
        ),
        ChannelLayout::Rgb => image::DynamicImage::ImageRgb8(
            image::RgbImage::from_raw(width, height, data).ok_or_else(mismatch)?,
        ),
        ChannelLayout::Rgba => image::DynamicImage::ImageRgba8(
            image::RgbaImage::from_raw(width, height, data).ok_or_else(mismatch)?,
        ),
        ChannelLayout::Cmyk | ChannelLayout::Cmyka | ChannelLayout::Custom { .. } => {
            return Err(CarveError::InvalidConfig("layout has no image crate equivalent"));
        }
    };
    Ok(img)
}
