//! Channel layouts for interleaved pixel buffers.

use std::ops::Range;

/// Semantics of the interleaved channels of a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// One grey channel.
    Grey,
    /// Grey plus alpha.
    GreyAlpha,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// Cyan, magenta, yellow, black.
    Cmyk,
    /// Cyan, magenta, yellow, black, alpha.
    Cmyka,
    /// `channels` opaque channels with no colour interpretation.
    Custom { channels: usize },
}

impl ChannelLayout {
    /// Picks the conventional layout for a channel count (the liblqr defaults).
    pub fn from_channels(channels: usize) -> Self {
        match channels {
            1 => ChannelLayout::Grey,
            2 => ChannelLayout::GreyAlpha,
            3 => ChannelLayout::Rgb,
            4 => ChannelLayout::Rgba,
            5 => ChannelLayout::Cmyka,
            n => ChannelLayout::Custom { channels: n },
        }
    }

    /// Number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        match self {
            ChannelLayout::Grey => 1,
            ChannelLayout::GreyAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba | ChannelLayout::Cmyk => 4,
            ChannelLayout::Cmyka => 5,
            ChannelLayout::Custom { channels } => *channels,
        }
    }

    /// Index of the alpha channel, if any.
    pub fn alpha_channel(&self) -> Option<usize> {
        match self {
            ChannelLayout::GreyAlpha => Some(1),
            ChannelLayout::Rgba => Some(3),
            ChannelLayout::Cmyka => Some(4),
            _ => None,
        }
    }

    /// Index of the black (K) channel, if any.
    pub fn black_channel(&self) -> Option<usize> {
        match self {
            ChannelLayout::Cmyk | ChannelLayout::Cmyka => Some(3),
            _ => None,
        }
    }

    /// Range of channels carrying colour (excludes alpha and black).
    pub fn color_channels(&self) -> Range<usize> {
        match self {
            ChannelLayout::Grey | ChannelLayout::GreyAlpha => 0..1,
            ChannelLayout::Rgb
            | ChannelLayout::Rgba
            | ChannelLayout::Cmyk
            | ChannelLayout::Cmyka => 0..3,
            ChannelLayout::Custom { channels } => 0..*channels,
        }
    }

    /// True for subtractive (CMY based) layouts.
    pub fn is_subtractive(&self) -> bool {
        matches!(self, ChannelLayout::Cmyk | ChannelLayout::Cmyka)
    }

    /// True when the colour channels are red, green and blue.
    pub fn is_rgb(&self) -> bool {
        matches!(self, ChannelLayout::Rgb | ChannelLayout::Rgba)
    }
}
