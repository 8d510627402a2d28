//! Image resource classification and loading (§3, §4.5): magic-byte
//! sniffing decides vector (SVG) vs raster (PNG/JPEG/WebP); rasters are
//! handled in `raster.rs`, vectors in `svg.rs`.

pub mod raster;
pub mod svg;

use crate::error::{Error, Result};

pub enum LoadedImage {
    Raster(raster::RasterImage),
    Vector(svg::VectorImage),
}

pub fn load(alias: &str, bytes: &[u8]) -> Result<LoadedImage> {
    if is_svg(bytes) {
        Ok(LoadedImage::Vector(svg::parse(alias, bytes)?))
    } else if is_png(bytes) || is_jpeg(bytes) || is_webp(bytes) {
        Ok(LoadedImage::Raster(raster::decode(alias, bytes)?))
    } else {
        Err(Error::UnknownImageFormat {
            alias: alias.to_string(),
        })
    }
}

fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
}

fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
}

fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

fn is_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start();
    text.starts_with("<?xml") || text.starts_with("<svg") || text.contains("<svg")
}
