use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::face_detector::FaceBounds;

/// Crop region within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamp a detection to the `source_width` × `source_height` image.
///
/// Returns `None` when nothing of the box lies inside the image.
pub fn face_crop_region(
    bounds: &FaceBounds,
    source_width: u32,
    source_height: u32,
) -> Option<CropRegion> {
    let left = i64::from(bounds.x).clamp(0, i64::from(source_width));
    let top = i64::from(bounds.y).clamp(0, i64::from(source_height));
    let right = (i64::from(bounds.x) + i64::from(bounds.width)).clamp(0, i64::from(source_width));
    let bottom =
        (i64::from(bounds.y) + i64::from(bounds.height)).clamp(0, i64::from(source_height));

    if right <= left || bottom <= top {
        return None;
    }

    // All four values are within 0..=u32::MAX after clamping.
    Some(CropRegion {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}

/// Files produced for one tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CropExport {
    /// Files written, in detection order.
    pub written: Vec<PathBuf>,
    /// Crops that could not be written.
    pub failed: usize,
}

/// Writes detected face regions as `<folder>/<tag>_<index>.png`.
#[derive(Debug, Clone)]
pub struct CropExporter {
    folder: PathBuf,
}

impl CropExporter {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Create the target folder if it does not exist yet.
    pub fn ensure_folder(&self) -> Result<()> {
        fs::create_dir_all(&self.folder)?;
        Ok(())
    }

    /// Output path for face `index` of `tag`.
    pub fn output_path(&self, tag: &str, index: usize) -> PathBuf {
        self.folder.join(format!("{tag}_{index}.png"))
    }

    /// Crop every face from `image` and write it out, in detection order.
    ///
    /// Existing files are overwritten. A box that falls entirely outside the
    /// image is skipped, but still consumes its index. A failed write is
    /// logged and counted; the remaining faces are still written.
    pub fn export(&self, image: &DynamicImage, faces: &[FaceBounds], tag: &str) -> CropExport {
        let mut export = CropExport::default();
        if faces.is_empty() {
            return export;
        }

        info!("Detected {} faces in {}", faces.len(), tag);

        for (index, bounds) in faces.iter().enumerate() {
            let Some(CropRegion {
                x,
                y,
                width,
                height,
            }) = face_crop_region(bounds, image.width(), image.height())
            else {
                warn!(tag, index, ?bounds, "face box lies outside the image, skipping");
                continue;
            };

            let path = self.output_path(tag, index);
            info!("Writing {}", path.display());

            match image
                .crop_imm(x, y, width, height)
                .save_with_format(&path, ImageFormat::Png)
            {
                Ok(()) => export.written.push(path),
                Err(e) => {
                    error!("Failed to write {}: {e}", path.display());
                    export.failed += 1;
                }
            }
        }

        export
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_image(width: u32, height: u32) -> DynamicImage {
        let mut img = image::RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn box_inside_image_is_unchanged() {
        let region = face_crop_region(&FaceBounds::new(10, 20, 30, 40), 100, 100).unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
    }

    #[test]
    fn negative_origin_is_clamped() {
        let region = face_crop_region(&FaceBounds::new(-5, -10, 30, 40), 100, 100).unwrap();
        assert_eq!(region.x, 0);
        assert_eq!(region.y, 0);
        assert_eq!(region.width, 25);
        assert_eq!(region.height, 30);
    }

    #[test]
    fn overhang_on_right_and_bottom_is_trimmed() {
        let region = face_crop_region(&FaceBounds::new(80, 90, 50, 50), 100, 100).unwrap();
        assert_eq!(region.width, 20);
        assert_eq!(region.height, 10);
    }

    #[test]
    fn box_outside_image_has_no_region() {
        assert!(face_crop_region(&FaceBounds::new(200, 0, 10, 10), 100, 100).is_none());
        assert!(face_crop_region(&FaceBounds::new(-50, 0, 10, 10), 100, 100).is_none());
        assert!(face_crop_region(&FaceBounds::new(0, 0, 0, 10), 100, 100).is_none());
    }

    #[test]
    fn no_faces_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CropExporter::new(dir.path());
        let export = exporter.export(&make_test_image(50, 50), &[], "A_B");
        assert_eq!(export, CropExport::default());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn each_face_gets_an_indexed_png() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CropExporter::new(dir.path());
        let faces = [FaceBounds::new(0, 0, 10, 12), FaceBounds::new(20, 20, 15, 5)];

        let written = exporter
            .export(&make_test_image(50, 50), &faces, "Ada_Lovelace_Portrait")
            .written;

        assert_eq!(
            written,
            vec![
                dir.path().join("Ada_Lovelace_Portrait_0.png"),
                dir.path().join("Ada_Lovelace_Portrait_1.png"),
            ]
        );
        let second = image::open(&written[1]).unwrap();
        assert_eq!((second.width(), second.height()), (15, 5));
    }

    #[test]
    fn skipped_box_keeps_later_indices() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CropExporter::new(dir.path());
        let faces = [FaceBounds::new(500, 500, 10, 10), FaceBounds::new(0, 0, 10, 10)];

        let export = exporter.export(&make_test_image(50, 50), &faces, "t");
        assert_eq!(export.written, vec![dir.path().join("t_1.png")]);
        assert_eq!(export.failed, 0);
    }

    #[test]
    fn existing_output_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CropExporter::new(dir.path());
        fs::write(exporter.output_path("t", 0), b"stale").unwrap();

        let export = exporter.export(&make_test_image(20, 20), &[FaceBounds::new(0, 0, 8, 8)], "t");
        assert_eq!(export.failed, 0);

        let img = image::open(exporter.output_path("t", 0)).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }

    #[test]
    fn failed_write_does_not_stop_later_faces() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CropExporter::new(dir.path());
        // A directory in the way makes the first write fail.
        fs::create_dir(exporter.output_path("t", 0)).unwrap();
        let faces = [FaceBounds::new(0, 0, 8, 8), FaceBounds::new(10, 10, 8, 8)];

        let export = exporter.export(&make_test_image(30, 30), &faces, "t");

        assert_eq!(export.failed, 1);
        assert_eq!(export.written, vec![dir.path().join("t_1.png")]);
        assert!(exporter.output_path("t", 1).is_file());
    }

    #[test]
    fn ensure_folder_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CropExporter::new(dir.path().join("catalog"));
        exporter.ensure_folder().unwrap();
        exporter.ensure_folder().unwrap();
        assert!(exporter.folder().is_dir());
    }
}
