use std::fmt;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::info;

use crate::error::ViewerError;

/// Border color sampled outside [0, 1] under [`WrapMode::ClampToBorder`].
pub const BORDER_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// Channel layout of a decoded source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
}

impl PixelLayout {
    /// Maps a decoded channel count onto a supported layout. Anything other
    /// than three or four channels is rejected rather than expanded.
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rgb8 => "RGB8",
            Self::Rgba8 => "RGBA8",
        })
    }
}

/// One level of a texture's mip chain, always RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decoded, flipped and validated image ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub path: PathBuf,
    pub layout: PixelLayout,
    pub levels: Vec<MipLevel>,
}

impl TextureImage {
    /// Decodes the image at `path` and prepares it for upload.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ViewerError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| ViewerError::TextureLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let channels = image.color().channel_count();
        let (width, height) = (image.width(), image.height());
        let pixels = match PixelLayout::from_channels(channels) {
            Some(PixelLayout::Rgb8) => image.into_rgb8().into_raw(),
            Some(PixelLayout::Rgba8) => image.into_rgba8().into_raw(),
            None => {
                return Err(ViewerError::UnsupportedChannelLayout {
                    path: path.to_path_buf(),
                    channels,
                })
            }
        };
        let texture = Self::from_pixels(path, width, height, channels, pixels)?;
        info!(
            "loaded texture {} ({}x{}, {}, {} mip levels)",
            path.display(),
            width,
            height,
            texture.layout,
            texture.levels.len()
        );
        Ok(texture)
    }

    /// Builds a texture from a raw top-down pixel buffer.
    ///
    /// The rows are flipped so the first row is the bottom of the image, RGB
    /// data is padded to RGBA and the full mip chain is generated.
    pub fn from_pixels(
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
        channels: u8,
        mut pixels: Vec<u8>,
    ) -> Result<Self, ViewerError> {
        let path = path.as_ref().to_path_buf();
        let Some(layout) = PixelLayout::from_channels(channels) else {
            return Err(ViewerError::UnsupportedChannelLayout { path, channels });
        };
        let expected = width as usize * height as usize * layout.channels();
        if pixels.len() != expected {
            return Err(ViewerError::PixelBufferSize {
                path,
                expected,
                actual: pixels.len(),
            });
        }

        flip_vertically(&mut pixels, width as usize, height as usize, layout.channels());
        let rgba = match layout {
            PixelLayout::Rgba8 => pixels,
            PixelLayout::Rgb8 => pixels
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
                .collect(),
        };

        let levels = mip_chain(width, height, rgba);
        Ok(Self {
            path,
            layout,
            levels,
        })
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    /// Rejects images whose base level exceeds `max_dimension` on either axis.
    pub fn check_fits(&self, max_dimension: u32) -> Result<(), ViewerError> {
        let (width, height) = (self.width(), self.height());
        if width > max_dimension || height > max_dimension {
            return Err(ViewerError::TextureTooLarge {
                path: self.path.clone(),
                width,
                height,
                max: max_dimension,
            });
        }
        Ok(())
    }
}

/// Reverses the row order of a tightly packed pixel buffer in place.
///
/// Images decode with Y growing downward while texture space grows upward.
/// Flipping twice restores the original; the middle row of an odd height is
/// left untouched.
pub fn flip_vertically(pixels: &mut [u8], width: usize, height: usize, channels: usize) {
    let row = width * channels;
    if row == 0 {
        return;
    }
    for top in 0..height / 2 {
        let bottom = height - 1 - top;
        let (upper, lower) = pixels.split_at_mut(bottom * row);
        upper[top * row..(top + 1) * row].swap_with_slice(&mut lower[..row]);
    }
}

/// Generates every mip level down to 1x1, starting with the base image.
fn mip_chain(width: u32, height: u32, base: Vec<u8>) -> Vec<MipLevel> {
    let mut levels = vec![MipLevel {
        width,
        height,
        pixels: base,
    }];
    let (mut w, mut h) = (width, height);
    while w > 1 || h > 1 {
        let previous = levels.last().map(|level| level.pixels.clone()).unwrap_or_default();
        let Some(source) = RgbaImage::from_raw(w, h, previous) else {
            break;
        };
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        let scaled = imageops::resize(&source, w, h, FilterType::Triangle);
        levels.push(MipLevel {
            width: w,
            height: h,
            pixels: scaled.into_raw(),
        });
    }
    levels
}

/// Texture addressing outside the [0, 1] UV range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Repeat => "REPEAT",
            Self::MirroredRepeat => "MIRRORED REPEAT",
            Self::ClampToEdge => "CLAMP TO EDGE",
            Self::ClampToBorder => "CLAMP TO BORDER",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapAxis {
    S,
    T,
}

/// A single sampler parameter write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerUpdate {
    BorderColor([f32; 4]),
    Wrap(WrapAxis, WrapMode),
}

/// Mirror of a texture's mutable sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerState {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub border_color: Option<[f32; 4]>,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            border_color: None,
        }
    }
}

impl SamplerState {
    /// Parameter writes that switch both axes to `mode`.
    ///
    /// Empty when `mode` is already active. Clamp-to-border sets the border
    /// color ahead of the wrap parameters.
    pub fn wrap_updates(&self, mode: WrapMode) -> Vec<SamplerUpdate> {
        if self.wrap_s == mode && self.wrap_t == mode {
            return Vec::new();
        }
        let mut updates = Vec::with_capacity(3);
        if mode == WrapMode::ClampToBorder {
            updates.push(SamplerUpdate::BorderColor(BORDER_COLOR));
        }
        updates.push(SamplerUpdate::Wrap(WrapAxis::S, mode));
        updates.push(SamplerUpdate::Wrap(WrapAxis::T, mode));
        updates
    }

    pub fn apply(&mut self, update: SamplerUpdate) {
        match update {
            SamplerUpdate::BorderColor(color) => self.border_color = Some(color),
            SamplerUpdate::Wrap(WrapAxis::S, mode) => self.wrap_s = mode,
            SamplerUpdate::Wrap(WrapAxis::T, mode) => self.wrap_t = mode,
        }
    }

    /// Border color in effect, if either axis clamps to the border.
    pub fn active_border(&self) -> Option<[f32; 4]> {
        let clamps = self.wrap_s == WrapMode::ClampToBorder || self.wrap_t == WrapMode::ClampToBorder;
        self.border_color.filter(|_| clamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize, channels: usize) -> Vec<u8> {
        (0..width * height * channels).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn flip_is_an_involution() {
        for &(width, height, channels) in &[(4, 4, 4), (3, 5, 3), (1, 1, 4), (7, 3, 2), (2, 0, 3)] {
            let original = gradient(width, height, channels);
            let mut pixels = original.clone();
            flip_vertically(&mut pixels, width, height, channels);
            flip_vertically(&mut pixels, width, height, channels);
            assert_eq!(pixels, original, "{width}x{height}x{channels}");
        }
    }

    #[test]
    fn flip_swaps_rows_and_keeps_middle_row() {
        let mut pixels = vec![1, 1, 2, 2, 3, 3];
        flip_vertically(&mut pixels, 1, 3, 2);
        assert_eq!(pixels, vec![3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn accepts_rgb_and_rgba() {
        let rgb = TextureImage::from_pixels("rgb.png", 2, 2, 3, gradient(2, 2, 3)).unwrap();
        assert_eq!(rgb.layout, PixelLayout::Rgb8);
        assert_eq!(rgb.levels[0].pixels.len(), 2 * 2 * 4);
        assert!(rgb.levels[0].pixels.chunks_exact(4).all(|px| px[3] == u8::MAX));

        let rgba = TextureImage::from_pixels("rgba.png", 2, 2, 4, gradient(2, 2, 4)).unwrap();
        assert_eq!(rgba.layout, PixelLayout::Rgba8);
    }

    #[test]
    fn rejects_other_channel_counts() {
        for channels in [1u8, 2, 5] {
            let err = TextureImage::from_pixels("gray.png", 2, 2, channels, vec![0; 4 * channels as usize])
                .unwrap_err();
            match err {
                ViewerError::UnsupportedChannelLayout { channels: got, .. } => assert_eq!(got, channels),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_short_pixel_buffer() {
        let err = TextureImage::from_pixels("short.png", 4, 4, 3, vec![0; 3]).unwrap_err();
        match err {
            ViewerError::PixelBufferSize {
                expected, actual, ..
            } => assert_eq!((expected, actual), (48, 3)),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(TextureImage::from_pixels("long.png", 1, 1, 4, vec![0; 8]).is_err());
    }

    #[test]
    fn oversized_texture_is_rejected() {
        let texture = TextureImage::from_pixels("wide.png", 8, 2, 4, vec![0; 64]).unwrap();
        assert!(texture.check_fits(8).is_ok());
        let err = texture.check_fits(4).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::TextureTooLarge { width: 8, height: 2, max: 4, .. }
        ));
        assert!(err.to_string().contains("wide.png is 8x2"));
    }

    #[test]
    fn uploads_rows_bottom_first() {
        // top row red, bottom row blue
        let pixels = vec![255, 0, 0, 0, 0, 255];
        let texture = TextureImage::from_pixels("rows.png", 1, 2, 3, pixels).unwrap();
        assert_eq!(&texture.levels[0].pixels[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn mip_chain_reaches_one_pixel() {
        let texture = TextureImage::from_pixels("mips.png", 8, 2, 4, gradient(8, 2, 4)).unwrap();
        let sizes: Vec<_> = texture.levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        for level in &texture.levels {
            assert_eq!(level.pixels.len() as u32, level.width * level.height * 4);
        }
    }

    #[test]
    fn same_wrap_mode_is_a_no_op() {
        let state = SamplerState::default();
        assert!(state.wrap_updates(WrapMode::Repeat).is_empty());
    }

    #[test]
    fn wrap_change_updates_both_axes_once() {
        let mut state = SamplerState::default();
        let updates = state.wrap_updates(WrapMode::MirroredRepeat);
        assert_eq!(
            updates,
            vec![
                SamplerUpdate::Wrap(WrapAxis::S, WrapMode::MirroredRepeat),
                SamplerUpdate::Wrap(WrapAxis::T, WrapMode::MirroredRepeat),
            ]
        );
        updates.into_iter().for_each(|u| state.apply(u));
        assert!(state.wrap_updates(WrapMode::MirroredRepeat).is_empty());
        assert_eq!(state.active_border(), None);
    }

    #[test]
    fn clamp_to_border_sets_color_first() {
        let mut state = SamplerState::default();
        let updates = state.wrap_updates(WrapMode::ClampToBorder);
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0], SamplerUpdate::BorderColor(BORDER_COLOR));
        updates.into_iter().for_each(|u| state.apply(u));
        assert_eq!(state.active_border(), Some(BORDER_COLOR));

        for update in state.wrap_updates(WrapMode::ClampToEdge) {
            state.apply(update);
        }
        assert_eq!(state.active_border(), None);
    }
}
