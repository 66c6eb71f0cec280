//! Software render target: draws a grid collection into an RGBA frame.
//!
//! Cell extents come only from the percentages each grid exposes; the
//! rasteriser performs no other layout math.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use image::RgbaImage;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::color::Rgb;
use crate::driver::GridCollection;
use crate::grid::GridInstance;
use crate::motion::{Orientation, GRID_SIZE};

const BACKGROUND: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};
const UNCOLORED_CELL: Rgb = Rgb {
    r: 200,
    g: 200,
    b: 200,
};
const BORDER: Rgb = Rgb { r: 0, g: 0, b: 0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    /// Edge length of one square grid tile in pixels.
    pub tile_px: u32,
    pub margin_px: u32,
    pub tiles_per_row: u32,
}

impl Default for RasterLayout {
    fn default() -> Self {
        Self {
            tile_px: 160,
            margin_px: 24,
            tiles_per_row: 5,
        }
    }
}

impl RasterLayout {
    pub fn validate(&self) -> Result<()> {
        if self.tile_px < GRID_SIZE as u32 {
            bail!(
                "tile size must be at least {} px, got {}",
                GRID_SIZE,
                self.tile_px
            );
        }
        if self.tiles_per_row == 0 {
            bail!("tiles per row must be > 0");
        }
        Ok(())
    }

    /// Canvas `(width, height)` for `grid_count` tiles.
    pub fn canvas_size(&self, grid_count: usize) -> (u32, u32) {
        let count = grid_count.max(1) as u32;
        let columns = count.min(self.tiles_per_row);
        let rows = count.div_ceil(self.tiles_per_row);
        (
            columns * self.tile_px + (columns + 1) * self.margin_px,
            rows * self.tile_px + (rows + 1) * self.margin_px,
        )
    }

    fn tile_origin(&self, index: usize) -> (f32, f32) {
        let index = index as u32;
        let column = index % self.tiles_per_row;
        let row = index / self.tiles_per_row;
        let step = self.tile_px + self.margin_px;
        (
            (self.margin_px + column * step) as f32,
            (self.margin_px + row * step) as f32,
        )
    }
}

fn paint_for(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = false;
    paint
}

/// Pixel rectangles `(x, y, width, height, color)` for every cell of a grid
/// whose tile starts at `(origin_x, origin_y)`.
pub fn cell_rects(
    grid: &GridInstance,
    origin_x: f32,
    origin_y: f32,
    tile_px: u32,
) -> Vec<(f32, f32, f32, f32, Option<Rgb>)> {
    let size = tile_px as f32;
    let mut rects = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    let mut outer_offset = 0.0_f32;
    for stripe in 0..GRID_SIZE {
        let outer_extent = grid.stripe_percent(stripe) as f32 * size / 100.0;
        let mut inner_offset = 0.0_f32;
        for position in 0..GRID_SIZE {
            let (row, col) = match grid.orientation() {
                Orientation::ColumnMajor => (position, stripe),
                Orientation::RowMajor => (stripe, position),
            };
            let cell = grid.cell(row, col);
            let rect = match grid.orientation() {
                Orientation::ColumnMajor => {
                    let height = cell.height_percent as f32 * size / 100.0;
                    let rect = (
                        origin_x + outer_offset,
                        origin_y + inner_offset,
                        outer_extent,
                        height,
                        cell.color,
                    );
                    inner_offset += height;
                    rect
                }
                Orientation::RowMajor => {
                    let width = cell.width_percent as f32 * size / 100.0;
                    let rect = (
                        origin_x + inner_offset,
                        origin_y + outer_offset,
                        width,
                        outer_extent,
                        cell.color,
                    );
                    inner_offset += width;
                    rect
                }
            };
            rects.push(rect);
        }
        outer_offset += outer_extent;
    }
    rects
}

pub fn render_collection(collection: &GridCollection, layout: &RasterLayout) -> Result<Pixmap> {
    layout.validate()?;
    let (width, height) = layout.canvas_size(collection.len());
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("failed to create {width}x{height} pixmap"))?;
    pixmap.fill(Color::from_rgba8(BACKGROUND.r, BACKGROUND.g, BACKGROUND.b, 255));

    let border = paint_for(BORDER);
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };

    for (index, grid) in collection.grids().iter().enumerate() {
        let (origin_x, origin_y) = layout.tile_origin(index);
        for (x, y, w, h, color) in cell_rects(grid, origin_x, origin_y, layout.tile_px) {
            // Sub-pixel cells are possible at small tile sizes.
            let Some(rect) = Rect::from_xywh(x, y, w, h) else {
                continue;
            };
            pixmap.fill_rect(
                rect,
                &paint_for(color.unwrap_or(UNCOLORED_CELL)),
                Transform::identity(),
                None,
            );
            let outline = PathBuilder::from_rect(rect);
            pixmap.stroke_path(&outline, &border, &stroke, Transform::identity(), None);
        }
    }

    Ok(pixmap)
}

/// Render and return tightly packed RGBA bytes (every pixel is opaque, so
/// premultiplication is a no-op).
pub fn render_collection_rgba(
    collection: &GridCollection,
    layout: &RasterLayout,
) -> Result<Vec<u8>> {
    Ok(render_collection(collection, layout)?.take())
}

pub fn save_rgba_png(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> Result<()> {
    let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        anyhow!(
            "failed to construct image buffer for {}x{} RGBA frame",
            width,
            height
        )
    })?;
    image
        .save(path)
        .with_context(|| format!("failed to write png {}", path.display()))
}

pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0001_0000_01b3);
    }
    hash
}

/// Fold per-frame hashes into one sequence hash.
pub fn sequence_digest(frame_hashes: &[u64]) -> u64 {
    let mut bytes = Vec::with_capacity(frame_hashes.len() * 8);
    for hash in frame_hashes {
        bytes.extend_from_slice(&hash.to_le_bytes());
    }
    fnv1a64(&bytes)
}
