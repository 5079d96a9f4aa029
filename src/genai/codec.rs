//! Image decode and vector rasterization helpers.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageOutputFormat};

use crate::genai::content::ImageBlob;
use crate::genai::error::GenAiError;

/// Decodes raster bytes, keeping the original encoding and sniffed MIME
/// type; falls back to rasterizing vector data to PNG.
pub fn decode_or_rasterize(bytes: &[u8]) -> Option<ImageBlob> {
    if let Some(blob) = decode_raster(bytes) {
        return Some(blob);
    }
    rasterize_vector(bytes).map(|png| ImageBlob {
        bytes: png,
        mime_type: "image/png".to_string(),
    })
}

/// Validates that the bytes decode as a raster image and returns them
/// with their sniffed MIME type.
pub fn decode_raster(bytes: &[u8]) -> Option<ImageBlob> {
    let format = image::guess_format(bytes).ok()?;
    image::load_from_memory_with_format(bytes, format).ok()?;
    Some(ImageBlob {
        bytes: bytes.to_vec(),
        mime_type: mime_for_format(format).to_string(),
    })
}

/// Reads a local file and decodes it as a raster image.
pub fn load_image_file(path: &Path) -> Option<ImageBlob> {
    let bytes = std::fs::read(path).ok()?;
    decode_raster(&bytes)
}

/// Renders vector (SVG) bytes to PNG at the document's own size.
pub fn rasterize_vector(bytes: &[u8]) -> Option<Vec<u8>> {
    let options = resvg::usvg::Options::default();
    let tree = resvg::usvg::Tree::from_data(bytes, &options).ok()?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::default(),
        &mut pixmap.as_mut(),
    );
    pixmap.encode_png().ok()
}

/// Re-encodes a decoded image as PNG for the wire.
pub fn encode_png(image: &DynamicImage) -> Result<ImageBlob, GenAiError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)
        .map_err(|err| GenAiError::Decode {
            message: err.to_string(),
        })?;
    Ok(ImageBlob {
        bytes: buffer,
        mime_type: "image/png".to_string(),
    })
}

fn mime_for_format(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}
