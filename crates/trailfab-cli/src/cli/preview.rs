//! PNG preview rendering with resvg.

use anyhow::{Context, anyhow};
use resvg::usvg;
use tiny_skia::Pixmap;

/// Preview resolution.
pub const PREVIEW_DPI: f64 = 150.0;

/// Rasterize an SVG document on a white background.
///
/// The PNG is `width_mm` at [`PREVIEW_DPI`] wide; height follows the
/// document's aspect ratio. Captions are already stroke paths, so no font
/// database is loaded.
pub fn render_preview_png(svg_content: &str, width_mm: f64) -> anyhow::Result<Vec<u8>> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg_content, &options).context("Failed to parse SVG for preview")?;

    let size = tree.size();
    let pixmap_width = (width_mm / 25.4 * PREVIEW_DPI).round() as u32;
    let scale = pixmap_width as f32 / size.width();
    let pixmap_height = (size.height() * scale).round() as u32;

    let mut pixmap = Pixmap::new(pixmap_width, pixmap_height)
        .ok_or_else(|| anyhow!("could not create {}x{} pixmap", pixmap_width, pixmap_height))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap.encode_png().context("Failed to encode preview PNG")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="210mm" height="148mm" viewBox="0 0 793.7 559.37">
  <path d="M10,10 L100,10 L100,100 Z" fill="#000000"/>
</svg>"##;

    #[test]
    fn preview_is_150_dpi_png() {
        let png = render_preview_png(SVG, 210.0).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        // IHDR width and height, big-endian
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        assert_eq!(width, 1240);
        assert!((height as i64 - 874).abs() <= 1, "height {}", height);
    }

    #[test]
    fn invalid_svg_is_an_error() {
        assert!(render_preview_png("not svg", 210.0).is_err());
    }
}
