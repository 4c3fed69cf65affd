use image::GrayImage;

/// Bounding box of a detected face within an image.
///
/// Coordinates are in source-image pixels and may overhang the image edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: i32,
    /// Y coordinate of the top-left corner (pixels).
    pub y: i32,
    /// Width of the bounding box (pixels).
    pub width: u32,
    /// Height of the bounding box (pixels).
    pub height: u32,
    /// Detection confidence score.
    pub score: f64,
}

impl FaceBounds {
    /// Box with a neutral score, mostly useful for custom detectors.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            score: 0.0,
        }
    }
}

/// Pluggable face detection backend.
///
/// Each call is independent: implementations may keep internal state, but
/// results must not depend on earlier calls. Box order is whatever the
/// backend yields.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a grayscale image.
    fn detect(&self, image: &GrayImage) -> Vec<FaceBounds>;
}

