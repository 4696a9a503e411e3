/// Decoded texture images and CPU-side sampling.
use std::path::Path;

use image::DynamicImage;

use crate::error::TextureError;

/// Channel layout of a decoded image; selects the device upload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// 8-bit pixels stored bottom row first, so `v = 0` addresses the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl TextureImage {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * format.channels();
        if pixels.len() != expected || expected == 0 {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            format,
        })
    }

    /// Decode an image file, keeping RGB images as RGB and converting
    /// anything other than RGB/RGBA to RGBA.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        log::debug!("Loading texture from {:?}", path);

        let img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        let texture = Self::from_dynamic(img.flipv())?;

        log::info!(
            "Loaded texture {}x{} ({:?}) from {:?}",
            texture.width,
            texture.height,
            texture.format,
            path
        );
        Ok(texture)
    }

    /// Pick the format from the decoded channel count. Layouts with neither
    /// three nor four channels are widened to RGBA. Row order is unchanged.
    fn from_dynamic(img: DynamicImage) -> Result<Self, TextureError> {
        let (width, height) = (img.width(), img.height());
        match PixelFormat::from_channels(img.color().channel_count()) {
            Some(PixelFormat::Rgb) => Self::new(img.to_rgb8().into_raw(), width, height, PixelFormat::Rgb),
            Some(PixelFormat::Rgba) | None => {
                Self::new(img.to_rgba8().into_raw(), width, height, PixelFormat::Rgba)
            }
        }
    }

    /// A single-color texture.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Result<Self, TextureError> {
        let pixels = color.repeat(width as usize * height as usize);
        Self::new(pixels, width, height, PixelFormat::Rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Texel at integer coordinates as normalized RGBA.
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let channels = self.format.channels();
        let start = (y as usize * self.width as usize + x as usize) * channels;
        let px = &self.pixels[start..start + channels];
        let alpha = if channels == 4 { px[3] } else { 255 };
        [px[0], px[1], px[2], alpha].map(|c| f32::from(c) / 255.0)
    }

    /// Nearest-texel lookup with repeat addressing on both axes.
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let wrap = |t: f32, size: u32| -> u32 {
            let t = if t.is_finite() { t.rem_euclid(1.0) } else { 0.0 };
            ((t * size as f32) as u32).min(size - 1)
        };
        self.texel(wrap(u, self.width), wrap(v, self.height))
    }
}
