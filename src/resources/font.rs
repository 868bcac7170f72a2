//! Typeface loading and single-line text rasterisation.

use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};

/// Transparent margin around rasterised text so that linear filtering
/// does not bleed glyph edges into the border of the texture.
const PADDING: u32 = 4;

pub struct Typeface {
    font: Font,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typeface")
            .field("name", &self.font.name())
            .finish()
    }
}

impl Typeface {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        let font = Font::from_bytes(bytes, FontSettings::default())?;
        Ok(Self { font })
    }

    /**
     * Renders `text` on one line at `px` pixels into an image whose alpha channel
     * holds the glyph coverage and whose colour channels are `color`.
     */
    pub fn rasterize(&self, text: &str, px: f32, color: [u8; 3]) -> RgbaImage {
        let (ascent, descent) = self
            .font
            .horizontal_line_metrics(px)
            .map(|line| (line.ascent, line.descent))
            .unwrap_or((px, 0.0));
        let glyphs: Vec<_> = text.chars().map(|c| self.font.rasterize(c, px)).collect();
        let advance: f32 = glyphs.iter().map(|(metrics, _)| metrics.advance_width).sum();

        let width = advance.ceil().max(1.0) as u32 + 2 * PADDING;
        let height = (ascent - descent).ceil().max(1.0) as u32 + 2 * PADDING;
        let mut img = RgbaImage::from_pixel(width, height, Rgba([color[0], color[1], color[2], 0]));

        let baseline = PADDING as f32 + ascent;
        let mut pen_x = PADDING as f32;
        for (metrics, coverage) in glyphs {
            let left = (pen_x + metrics.xmin as f32).round() as i64;
            // fontdue measures ymin upwards from the baseline, image rows grow downwards
            let top = (baseline - metrics.ymin as f32 - metrics.height as f32).round() as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let alpha = coverage[row * metrics.width + col];
                    let x = left + col as i64;
                    let y = top + row as i64;
                    if alpha == 0 || x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                        continue;
                    }
                    let pixel = img.get_pixel_mut(x as u32, y as u32);
                    pixel.0[3] = pixel.0[3].max(alpha);
                }
            }
            pen_x += metrics.advance_width;
        }
        img
    }
}
