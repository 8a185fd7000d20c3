use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

use crate::config::StrokeConfig;
use crate::geometry::{Point, Rectangle};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no image loaded")]
    NoImage,

    #[error("selection does not overlap the image")]
    EmptyCrop,

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

// ── Composite ───────────────────────────────────────────────────────────────

/// The image as the user sees it: the source pixels with every rectangle's
/// outline burned in.
pub fn composite(image: &DynamicImage, rects: &[Rectangle], stroke: StrokeConfig) -> RgbaImage {
    let mut img = image.to_rgba8();
    for rect in rects {
        draw_rect_on_image(&mut img, &rect.normalized(), stroke.thickness, stroke.color);
    }
    img
}

pub fn crop_to(img: &RgbaImage, rect: &Rectangle) -> Result<RgbaImage, ExportError> {
    let r = rect.normalized();
    let x0 = r.x.max(0.0).floor() as u32;
    let y0 = r.y.max(0.0).floor() as u32;
    let x1 = ((r.x + r.width).ceil().max(0.0) as u32).min(img.width());
    let y1 = ((r.y + r.height).ceil().max(0.0) as u32).min(img.height());
    if x1 <= x0 || y1 <= y0 {
        return Err(ExportError::EmptyCrop);
    }
    Ok(image::imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image())
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

pub fn to_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

pub fn save_png(img: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    let png = encode_png(img)?;
    std::fs::write(path, png).map_err(|source| ExportError::Write {
        path: path.display().to_string(),
        source,
    })?;
    log::info!("Exported to {}", path.display());
    Ok(())
}

// ── Rasterization ───────────────────────────────────────────────────────────

fn draw_rect_on_image(img: &mut RgbaImage, r: &Rectangle, thickness: f32, color: [u8; 4]) {
    let [p1, p2, p3, p4] = r.corners();
    let pen = Pen::new(thickness, color);
    for (from, to) in [(p1, p2), (p2, p3), (p3, p4), (p4, p1)] {
        pen.segment(img, from, to);
    }
}

/// Square brush `width` pixels wide. Even widths extend right and down.
struct Pen {
    offsets: std::ops::Range<i32>,
    color: image::Rgba<u8>,
}

impl Pen {
    fn new(thickness: f32, color: [u8; 4]) -> Self {
        let width = thickness.round().max(1.0) as i32;
        let lo = -(width - 1) / 2;
        Self {
            offsets: lo..lo + width,
            color: image::Rgba(color),
        }
    }

    fn segment(&self, img: &mut RgbaImage, from: Point, to: Point) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let cx = (from.x + dx * t).floor() as i32;
            let cy = (from.y + dy * t).floor() as i32;
            self.stamp(img, cx, cy);
        }
    }

    fn stamp(&self, img: &mut RgbaImage, cx: i32, cy: i32) {
        for oy in self.offsets.clone() {
            for ox in self.offsets.clone() {
                let (Ok(px), Ok(py)) = (u32::try_from(cx + ox), u32::try_from(cy + oy)) else {
                    continue;
                };
                if px < img.width() && py < img.height() {
                    img.put_pixel(px, py, self.color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn blank(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 255])))
    }

    fn thin() -> StrokeConfig {
        StrokeConfig {
            color: RED,
            thickness: 1.0,
        }
    }

    #[test]
    fn composite_draws_outline_only() {
        let img = composite(&blank(40, 40), &[Rectangle::new(10.0, 10.0, 20.0, 20.0)], thin());
        assert_eq!(img.get_pixel(10, 10).0, RED);
        assert_eq!(img.get_pixel(20, 10).0, RED);
        assert_eq!(img.get_pixel(30, 30).0, RED);
        assert_eq!(img.get_pixel(20, 20).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0, 255]);
    }

    #[test]
    fn stroke_thickness_is_pixel_width() {
        let rect = [Rectangle::new(10.0, 10.0, 20.0, 20.0)];
        let rows_at = |thickness: f32| {
            let stroke = StrokeConfig {
                color: RED,
                thickness,
            };
            let img = composite(&blank(40, 40), &rect, stroke);
            (5..16)
                .filter(|&y| img.get_pixel(20, y).0 == RED)
                .collect::<Vec<u32>>()
        };
        assert_eq!(rows_at(1.0), vec![10]);
        assert_eq!(rows_at(2.0), vec![10, 11]);
        assert_eq!(rows_at(3.0), vec![9, 10, 11]);
        assert_eq!(rows_at(0.2), vec![10]);
    }

    #[test]
    fn composite_clips_rectangles_outside_image() {
        let img = composite(&blank(10, 10), &[Rectangle::new(-50.0, -50.0, 500.0, 500.0)], thin());
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn crop_clips_to_image() {
        let img = blank(50, 50).to_rgba8();
        let cropped = crop_to(&img, &Rectangle::new(40.0, -10.0, 30.0, 30.0)).unwrap();
        assert_eq!(cropped.dimensions(), (10, 20));
        assert!(matches!(
            crop_to(&img, &Rectangle::new(60.0, 60.0, 5.0, 5.0)),
            Err(ExportError::EmptyCrop)
        ));
    }

    #[test]
    fn png_data_url_round_trips_through_decoder() {
        let png = encode_png(&blank(3, 2).to_rgba8()).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        let url = to_data_url(&png);
        let b64 = url.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = image::load_from_memory(&STANDARD.decode(b64).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }
}
