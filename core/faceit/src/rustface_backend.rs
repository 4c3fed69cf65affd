use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use image::GrayImage;
use tracing::debug;

use crate::error::{FaceItError, Result};
use crate::face_detector::{FaceBounds, FaceDetector};

/// Scan parameters handed to the SeetaFace cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    /// Smallest face edge, in pixels, the scan looks for.
    pub min_face_size: u32,
    /// Minimum cascade score for a window to count as a face.
    pub score_thresh: f64,
    /// Downscale factor between image pyramid levels.
    pub pyramid_scale_factor: f32,
    /// Sliding window step (x, y) in pixels.
    pub slide_window_step: (u32, u32),
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_face_size: 20,
            score_thresh: 2.0,
            pyramid_scale_factor: 0.8,
            slide_window_step: (4, 4),
        }
    }
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is loaded once and shared read-only; every [`detect`] call
/// builds a fresh scanner from it, so calls never observe each other.
///
/// [`detect`]: FaceDetector::detect
pub struct RustfaceDetector {
    model: rustface::Model,
    settings: DetectorSettings,
}

impl RustfaceDetector {
    /// Load a SeetaFace frontal model from disk.
    pub fn from_path(path: impl AsRef<Path>, settings: DetectorSettings) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| FaceItError::Model(format!("{}: {e}", path.display())))?;
        debug!(model = %path.display(), "loading face model");
        Self::from_reader(BufReader::new(file), settings)
    }

    /// Load a model from an in-memory copy of the model file.
    pub fn from_bytes(bytes: &[u8], settings: DetectorSettings) -> Result<Self> {
        Self::from_reader(std::io::Cursor::new(bytes), settings)
    }

    fn from_reader(reader: impl Read, settings: DetectorSettings) -> Result<Self> {
        let model = rustface::read_model(reader).map_err(|e| FaceItError::Model(e.to_string()))?;
        Ok(Self { model, settings })
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &GrayImage) -> Vec<FaceBounds> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.settings.min_face_size);
        detector.set_score_thresh(self.settings.score_thresh);
        detector.set_pyramid_scale_factor(self.settings.pyramid_scale_factor);
        let (step_x, step_y) = self.settings.slide_window_step;
        detector.set_slide_window_step(step_x, step_y);

        let faces = detector.detect(&rustface::ImageData::new(
            image.as_raw(),
            image.width(),
            image.height(),
        ));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBounds {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    score: face.score(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    const MODEL: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../model/seeta_fd_frontal_v1.0.bin"
    ));

    #[test]
    fn default_settings_match_seetaface_defaults() {
        let settings = DetectorSettings::default();
        assert_eq!(settings.min_face_size, 20);
        assert_eq!(settings.slide_window_step, (4, 4));
    }

    #[test]
    fn missing_model_file_is_a_model_error() {
        let result = RustfaceDetector::from_path("/nonexistent/seeta.bin", DetectorSettings::default());
        assert!(matches!(result, Err(FaceItError::Model(_))));
    }

    #[test]
    fn bundled_model_finds_no_faces_in_blank_images() {
        let detector = RustfaceDetector::from_bytes(MODEL, DetectorSettings::default()).unwrap();

        for (width, height) in [(1, 1), (8, 8), (24, 24), (400, 3)] {
            let blank = GrayImage::from_pixel(width, height, Luma([128]));
            assert!(
                detector.detect(&blank).is_empty(),
                "{width}x{height} image produced faces"
            );
        }
    }

    #[test]
    fn detection_calls_are_independent() {
        let detector = RustfaceDetector::from_bytes(MODEL, DetectorSettings::default()).unwrap();
        let blank = GrayImage::new(64, 64);
        assert_eq!(detector.detect(&blank), detector.detect(&blank));
    }
}
