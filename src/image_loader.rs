//! # Image Loading and Decoding
//!
//! Templates carry images as data URIs: element images and the page
//! background. This module turns those sources into RGBA bitmaps the
//! rasterizer can composite.
//!
//! Supported `src` formats:
//! - `data:image/...;base64,...` data URI
//! - File path (absolute or `./`, `../` relative)
//! - Raw base64-encoded image data

use std::io::Cursor;

use image::RgbaImage;

use crate::error::PrintError;

/// Load and decode an image from a source string.
pub fn load_image(src: &str) -> Result<RgbaImage, PrintError> {
    let raw_bytes = read_source_bytes(src)?;
    decode_image_bytes(&raw_bytes)
}

/// Resolve the source string to raw image bytes.
fn read_source_bytes(src: &str) -> Result<Vec<u8>, PrintError> {
    let src = src.trim();
    if src.is_empty() {
        return Err(PrintError::Image("Empty image source".to_string()));
    }

    // Data URI: data:image/png;base64,iVBOR...
    if src.starts_with("data:") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| PrintError::Image("Invalid data URI: missing comma".to_string()))?;
        let header = &src[..comma_pos];
        if !header.starts_with("data:image/") {
            return Err(PrintError::Image(format!("Not an image data URI: '{}'", header)));
        }
        if !header.ends_with(";base64") {
            return Err(PrintError::Image("Only base64 image data URIs are supported".to_string()));
        }
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Only explicit path prefixes count as files; base64 text contains '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src)
            .map_err(|e| PrintError::Image(format!("Failed to read image file '{}': {}", src, e)));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, PrintError> {
    use base64::Engine;
    // Data URIs pasted from editors sometimes carry line breaks.
    let cleaned: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| PrintError::Image(format!("Base64 decode error: {}", e)))
}

/// Detect image format from magic bytes and decode to RGBA.
fn decode_image_bytes(data: &[u8]) -> Result<RgbaImage, PrintError> {
    if data.len() < 4 {
        return Err(PrintError::Image("Image data too short".to_string()));
    }
    if !(is_jpeg(data) || is_png(data) || is_webp(data)) {
        return Err(PrintError::Image(
            "Unsupported image format (expected JPEG, PNG or WebP)".to_string(),
        ));
    }

    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| PrintError::Image(format!("Format detection error: {}", e)))?;
    let img = reader
        .decode()
        .map_err(|e| PrintError::Image(format!("Failed to decode image: {}", e)))?;
    Ok(img.to_rgba8())
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// Encode an RGBA bitmap as a PNG data URI.
pub fn to_png_data_uri(img: &RgbaImage) -> Result<String, PrintError> {
    use base64::Engine;
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(encoder, img.as_raw(), img.width(), img.height(), image::ColorType::Rgba8)
        .map_err(|e| PrintError::Image(format!("PNG encode error: {}", e)))?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&buf)
    ))
}
