use image::RgbaImage;

use crate::resources::LoadFailure;

/// Decodes image file contents (PNG, JPEG) into an RGBA texture image.
///
/// The format is guessed from the bytes, so file extensions are never trusted.
pub fn decode_texture(path: &str, bytes: &[u8]) -> Result<RgbaImage, LoadFailure> {
    let img = image::load_from_memory(bytes).map_err(|e| LoadFailure::malformed(path, e))?;
    Ok(img.to_rgba8())
}
