//! Raster image decoding and JPEG re-encoding (§4.5).
//!
//! Grounded on the `image` crate's standard decode-to-`DynamicImage`,
//! re-encode pattern, picked up from the wider retrieval pack: the
//! teacher has no raster pipeline at all, so this is pure enrichment.

use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;

use crate::error::{Error, Result};

const JPEG_QUALITY: u8 = 85;

pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub jpeg_bytes: Vec<u8>,
}

pub fn decode(alias: &str, bytes: &[u8]) -> Result<RasterImage> {
    let decoded = image::load_from_memory(bytes).map_err(|err| Error::ImageDecode {
        alias: alias.to_string(),
        message: err.to_string(),
    })?;
    let (width, height) = decoded.dimensions();
    let rgb = decoded.to_rgb8();

    let mut jpeg_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_bytes, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|err| Error::ImageDecode {
            alias: alias.to_string(),
            message: err.to_string(),
        })?;

    Ok(RasterImage {
        width,
        height,
        jpeg_bytes,
    })
}
