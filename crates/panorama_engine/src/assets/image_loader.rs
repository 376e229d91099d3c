//! Image loading utilities for texture data
//!
//! Decodes PNG and JPEG files with the `image` crate. Images keep their native
//! channel count; the texture manager decides which layouts it can upload.

use std::path::Path;

use crate::assets::AssetError;

/// Pixel layouts the texture path can upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Three 8-bit channels
    Rgb,
    /// Four 8-bit channels
    Rgba,
}

/// Loaded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    /// Raw pixel data, tightly packed rows
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of 8-bit color channels
    pub channels: u8,
}

impl ImageData {
    /// Load an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        log::debug!("Loading image from: {:?}", path_ref);

        let img = image::open(path_ref).map_err(|e| AssetError::LoadFailed {
            path: path_ref.display().to_string(),
            reason: e.to_string(),
        })?;

        let image = Self::from_dynamic(img);
        log::debug!("Loaded image {}x{} ({} channels) from {:?}", image.width, image.height, image.channels, path_ref);
        Ok(image)
    }

    /// Load image from memory (useful for embedded resources)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes).map_err(|e| AssetError::LoadFailed {
            path: "<memory>".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_dynamic(img))
    }

    fn from_dynamic(img: image::DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let channels = img.color().channel_count();
        let data = match channels {
            1 => img.into_luma8().into_raw(),
            2 => img.into_luma_alpha8().into_raw(),
            3 => img.into_rgb8().into_raw(),
            _ => img.into_rgba8().into_raw(),
        };

        Self {
            data,
            width,
            height,
            channels: channels.min(4),
        }
    }

    /// Create a solid color image (useful for testing and defaults)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);

        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }

        Self {
            data,
            width,
            height,
            channels: 4,
        }
    }

    /// Upload layout for this image, or `UnsupportedFormat`
    pub fn pixel_format(&self, path: &Path) -> Result<PixelFormat, AssetError> {
        match self.channels {
            3 => Ok(PixelFormat::Rgb),
            4 => Ok(PixelFormat::Rgba),
            // TODO: upload single-channel images as greyscale once the shaders sample them
            other => Err(AssetError::UnsupportedFormat {
                path: path.display().to_string(),
                detail: format!("{other} color channels"),
            }),
        }
    }

    /// Get the size of the image data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
