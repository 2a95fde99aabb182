//! Composite preview images for chapters.
//!
//! The aligner only depends on [`CompositeImageBuilder`]. [`GridCompositeBuilder`]
//! is the filmstrip implementation: frames are tiled into fixed grids, one PNG
//! per page, each page scaled so its longer side fits the requested maximum.

use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tseg_models::{format_timecode, ImageRef};

use crate::error::{SegmentError, SegmentResult};
use crate::frame::Frame;

/// Default longest side of a rendered composite, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1568;

/// Largest cell edge before a frame is scaled into the grid.
const MAX_CELL_SIZE: u32 = 512;

const BORDER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_BG_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_FG_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Rendering options passed with every build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompositeRequest {
    /// Upper bound on the width and height of each output image.
    pub max_dimension: u32,
    /// Draw a bar under each cell whose filled width marks how far into the
    /// chapter that frame sits. No text is rendered.
    pub position_bar: bool,
}

impl Default for CompositeRequest {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            position_bar: false,
        }
    }
}

/// Renders preview images for a chapter's frame range.
///
/// Called once per chapter with the chapter's frames in id order. Returns as
/// many image references as needed to cover every frame.
pub trait CompositeImageBuilder: Send + Sync {
    fn build(
        &self,
        chapter_id: u64,
        frames: &[Frame],
        request: &CompositeRequest,
    ) -> SegmentResult<Vec<ImageRef>>;
}

impl<T: CompositeImageBuilder + ?Sized> CompositeImageBuilder for &T {
    fn build(
        &self,
        chapter_id: u64,
        frames: &[Frame],
        request: &CompositeRequest,
    ) -> SegmentResult<Vec<ImageRef>> {
        (**self).build(chapter_id, frames, request)
    }
}

impl<T: CompositeImageBuilder + ?Sized> CompositeImageBuilder for Box<T> {
    fn build(
        &self,
        chapter_id: u64,
        frames: &[Frame],
        request: &CompositeRequest,
    ) -> SegmentResult<Vec<ImageRef>> {
        (**self).build(chapter_id, frames, request)
    }
}

/// Builder that renders nothing. Chapters keep an empty image list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoComposites;

impl CompositeImageBuilder for NoComposites {
    fn build(&self, _: u64, _: &[Frame], _: &CompositeRequest) -> SegmentResult<Vec<ImageRef>> {
        Ok(Vec::new())
    }
}

/// Grid geometry for filmstrip pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    /// Border thickness between and around cells, in pixels.
    pub border: u32,
    /// Height of the position bar under each cell, when enabled.
    pub label_height: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 5,
            border: 8,
            label_height: 40,
        }
    }
}

impl GridLayout {
    pub fn cells_per_page(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// Filmstrip renderer writing PNG pages into a directory.
#[derive(Debug, Clone)]
pub struct GridCompositeBuilder {
    output_dir: PathBuf,
    layout: GridLayout,
}

impl GridCompositeBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            layout: GridLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    fn render_page(&self, frames: &[Frame], first_index: usize, total: usize, request: &CompositeRequest) -> RgbImage {
        let GridLayout {
            cols,
            border,
            label_height,
            ..
        } = self.layout;

        // Cell geometry follows the first frame's aspect ratio.
        let (frame_w, frame_h) = (frames[0].width() as u32, frames[0].height() as u32);
        let cell_w = frame_w.min(MAX_CELL_SIZE);
        let cell_h = ((frame_h as u64 * cell_w as u64) / frame_w as u64).max(1) as u32;
        let label_h = if request.position_bar { label_height } else { 0 };

        let cols = cols.min(frames.len() as u32);
        let rows = (frames.len() as u32).div_ceil(cols);
        let sheet_w = cols * cell_w + (cols + 1) * border;
        let sheet_h = rows * (cell_h + label_h) + (rows + 1) * border;

        let mut sheet = RgbImage::from_pixel(sheet_w, sheet_h, BORDER_COLOR);
        for (idx, frame) in frames.iter().enumerate() {
            let (col, row) = (idx as u32 % cols, idx as u32 / cols);
            let x = border + col * (cell_w + border);
            let y = border + row * (cell_h + label_h + border);

            let cell = imageops::resize(&frame.to_rgb_image(), cell_w, cell_h, FilterType::Triangle);
            imageops::replace(&mut sheet, &cell, x as i64, y as i64);

            if label_h > 0 {
                let progress = ((first_index + idx + 1) as u64 * cell_w as u64 / total as u64) as u32;
                let bar = RgbImage::from_fn(cell_w, label_h, |px, _| {
                    if px < progress {
                        LABEL_FG_COLOR
                    } else {
                        LABEL_BG_COLOR
                    }
                });
                imageops::replace(&mut sheet, &bar, x as i64, (y + cell_h) as i64);
            }
        }

        let longest = sheet_w.max(sheet_h);
        if longest <= request.max_dimension {
            return sheet;
        }
        let scale = request.max_dimension as f64 / longest as f64;
        let width = ((sheet_w as f64 * scale) as u32).clamp(1, request.max_dimension);
        let height = ((sheet_h as f64 * scale) as u32).clamp(1, request.max_dimension);
        imageops::resize(&sheet, width, height, FilterType::Triangle)
    }
}

impl CompositeImageBuilder for GridCompositeBuilder {
    fn build(
        &self,
        chapter_id: u64,
        frames: &[Frame],
        request: &CompositeRequest,
    ) -> SegmentResult<Vec<ImageRef>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }
        if request.max_dimension == 0 {
            return Err(SegmentError::composite_failed(chapter_id, "max_dimension must be positive"));
        }
        if self.layout.rows == 0 || self.layout.cols == 0 {
            return Err(SegmentError::composite_failed(chapter_id, "grid must have at least one cell"));
        }
        std::fs::create_dir_all(&self.output_dir)?;

        let per_page = self.layout.cells_per_page();
        let mut images = Vec::with_capacity(frames.len().div_ceil(per_page));
        for (page, chunk) in frames.chunks(per_page).enumerate() {
            let sheet = self.render_page(chunk, page * per_page, frames.len(), request);
            let path = self
                .output_dir
                .join(format!("chapter_{:04}_{:02}.png", chapter_id, page));
            sheet.save(&path)?;
            debug!(
                chapter_id,
                page,
                frames = chunk.len(),
                first = %format_timecode(chunk[0].timestamp_ms()),
                last = %format_timecode(chunk[chunk.len() - 1].timestamp_ms()),
                width = sheet.width(),
                height = sheet.height(),
                path = %path.display(),
                "Composite page written"
            );
            images.push(ImageRef {
                path,
                width: sheet.width(),
                height: sheet.height(),
            });
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn frames(n: u64, width: usize, height: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| {
                let shade = (i * 20 % 256) as u8;
                Frame::solid(i, Duration::from_millis(i * 1000), width, height, [shade, 0, 255 - shade])
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_pages_cover_all_frames() {
        let dir = tempfile::tempdir().unwrap();
        let builder = GridCompositeBuilder::new(dir.path());
        let images = builder
            .build(3, &frames(45, 64, 36), &CompositeRequest::default())
            .unwrap();

        // 20 cells per page: 20 + 20 + 5
        assert_eq!(images.len(), 3);
        for (page, image) in images.iter().enumerate() {
            assert!(image.path.exists());
            assert_eq!(
                image.path.file_name().unwrap().to_str().unwrap(),
                format!("chapter_0003_{:02}.png", page)
            );
        }

        let decoded = image::open(&images[2].path).unwrap();
        assert_eq!(decoded.width(), images[2].width);
        assert_eq!(decoded.height(), images[2].height);
    }

    #[test]
    fn test_respects_max_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let builder = GridCompositeBuilder::new(dir.path());
        let request = CompositeRequest {
            max_dimension: 300,
            position_bar: true,
        };
        let images = builder.build(0, &frames(20, 640, 360), &request).unwrap();

        assert_eq!(images.len(), 1);
        assert!(images[0].width <= 300);
        assert!(images[0].height <= 300);
        assert!(images[0].width > images[0].height);
    }

    #[test]
    fn test_position_bar_marks_progress() {
        let builder = GridCompositeBuilder::new("unused").with_layout(GridLayout {
            rows: 1,
            cols: 2,
            border: 2,
            label_height: 4,
        });
        let request = CompositeRequest {
            max_dimension: DEFAULT_MAX_DIMENSION,
            position_bar: true,
        };
        let sheet = builder.render_page(&frames(2, 10, 10), 0, 2, &request);

        // Two 10px cells with a 4px bar below, 2px borders
        assert_eq!(sheet.dimensions(), (26, 18));
        // First of two frames fills half its bar, the second fills all of it.
        assert_eq!(*sheet.get_pixel(2, 12), LABEL_FG_COLOR);
        assert_eq!(*sheet.get_pixel(6, 12), LABEL_FG_COLOR);
        assert_eq!(*sheet.get_pixel(7, 12), LABEL_BG_COLOR);
        assert_eq!(*sheet.get_pixel(23, 15), LABEL_FG_COLOR);

        let plain = builder.render_page(&frames(2, 10, 10), 0, 2, &CompositeRequest::default());
        assert_eq!(plain.dimensions(), (26, 14));
    }

    #[test]
    fn test_small_page_is_not_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let layout = GridLayout {
            rows: 2,
            cols: 2,
            border: 2,
            label_height: 4,
        };
        let builder = GridCompositeBuilder::new(dir.path()).with_layout(layout);
        let images = builder
            .build(1, &frames(3, 10, 10), &CompositeRequest::default())
            .unwrap();

        // 2x2 grid of 10px cells with 2px borders
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width, images[0].height), (26, 26));
    }

    #[test]
    fn test_empty_frames_render_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let builder = GridCompositeBuilder::new(dir.path().join("never-created"));
        let images = builder.build(0, &[], &CompositeRequest::default()).unwrap();
        assert!(images.is_empty());
        assert!(!dir.path().join("never-created").exists());
    }

    #[test]
    fn test_zero_max_dimension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let builder = GridCompositeBuilder::new(dir.path());
        let request = CompositeRequest {
            max_dimension: 0,
            position_bar: false,
        };
        assert!(matches!(
            builder.build(9, &frames(1, 8, 8), &request),
            Err(SegmentError::CompositeFailed { chapter_id: 9, .. })
        ));
    }
}
