//! Sketch frame intake: data-URI decoding and normalization

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;
use log::info;

/// Frames larger than this on either side are downscaled before upload
pub const CAPTURE_MAX_DIMENSION: u32 = 1280;

/// JPEG quality for the re-encoded frame
const CAPTURE_JPEG_QUALITY: u8 = 80;

/// Splits a `data:<mime>;base64,<payload>` scalar into mime and raw bytes
fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), String> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| "Capture is not a data URL".to_string())?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| "Capture data URL has no payload".to_string())?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| "Capture data URL is not base64-encoded".to_string())?;
    if !mime.starts_with("image/") {
        return Err(format!("Capture has non-image mime type: {}", mime));
    }
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| format!("Failed to decode capture payload: {}", e))?;
    Ok((mime.to_string(), bytes))
}

/// Decodes a captured frame, bounds its dimensions, and re-encodes it as a
/// JPEG data URL ready to ship as an `image_url` content part. Anything
/// that fails to parse or decode is rejected; the caller logs and keeps
/// the session untouched.
pub fn normalize_sketch(data_url: &str) -> Result<String, String> {
    let (mime, bytes) = decode_data_url(data_url)?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| format!("Failed to decode capture image: {}", e))?;

    // JPEG cannot carry alpha, so flatten before re-encoding
    let frame = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let (width, height) = (frame.width(), frame.height());
    let frame = if width > CAPTURE_MAX_DIMENSION || height > CAPTURE_MAX_DIMENSION {
        frame.thumbnail(CAPTURE_MAX_DIMENSION, CAPTURE_MAX_DIMENSION)
    } else {
        frame
    };

    let mut jpeg = Vec::new();
    frame
        .write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut jpeg,
            CAPTURE_JPEG_QUALITY,
        ))
        .map_err(|e| format!("Failed to encode capture: {}", e))?;

    info!(
        "[capture] normalized {} frame {}x{} -> {}x{} ({} bytes)",
        mime,
        width,
        height,
        frame.width(),
        frame.height(),
        jpeg.len()
    );

    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_data_url(width: u32, height: u32) -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(&buf))
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(normalize_sketch("https://example.com/sketch.png").is_err());
        assert!(normalize_sketch("").is_err());
    }

    #[test]
    fn rejects_unencoded_and_non_image_payloads() {
        assert!(normalize_sketch("data:image/png,plaintext").is_err());
        assert!(normalize_sketch("data:text/plain;base64,aGVsbG8=").is_err());
    }

    #[test]
    fn rejects_undecodable_image_bytes() {
        let bogus = format!("data:image/png;base64,{}", BASE64.encode(b"not a png"));
        assert!(normalize_sketch(&bogus).is_err());
    }

    #[test]
    fn reencodes_frames_as_jpeg_data_urls() {
        let normalized = normalize_sketch(&png_data_url(32, 24)).unwrap();
        assert!(normalized.starts_with("data:image/jpeg;base64,"));

        let payload = normalized.split_once(',').unwrap().1;
        let bytes = BASE64.decode(payload).unwrap();
        let round_tripped = image::load_from_memory(&bytes).unwrap();
        assert_eq!(round_tripped.width(), 32);
        assert_eq!(round_tripped.height(), 24);
    }

    #[test]
    fn bounds_oversized_frames() {
        let normalized = normalize_sketch(&png_data_url(CAPTURE_MAX_DIMENSION * 2, 100)).unwrap();
        let payload = normalized.split_once(',').unwrap().1;
        let bytes = BASE64.decode(payload).unwrap();
        let bounded = image::load_from_memory(&bytes).unwrap();
        assert!(bounded.width() <= CAPTURE_MAX_DIMENSION);
        assert!(bounded.height() <= CAPTURE_MAX_DIMENSION);
    }
}
