//! Depth-map sample grid and random subsampling.

use glam::{Mat3, Vec3};
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

/// One depth pixel with its precomputed unprojection base.
///
/// `base * depth` is the camera-space point seen at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthGridElement {
    pub x: usize,
    pub y: usize,
    pub base: Vec3,
}

/// Grid of every pixel of a depth map of a given size.
#[derive(Debug, Clone)]
pub struct DepthGrid {
    width: usize,
    height: usize,
    elements: Vec<DepthGridElement>,
}

impl DepthGrid {
    /// Depth pixels are scaled to camera image resolution before applying
    /// the inverse intrinsics, since the intrinsics refer to the image.
    pub fn new(width: usize, height: usize, intrinsics_inverse: Mat3, image_size: (f32, f32)) -> Self {
        let rx = image_size.0 / width as f32;
        let ry = image_size.1 / height as f32;

        let mut elements = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let pixel = Vec3::new(x as f32 * rx, y as f32 * ry, 1.0);
                elements.push(DepthGridElement {
                    x,
                    y,
                    base: intrinsics_inverse * pixel,
                });
            }
        }
        Self {
            width,
            height,
            elements,
        }
    }

    pub fn matches(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[DepthGridElement] {
        &self.elements
    }

    /// `count` distinct cells drawn uniformly at random.
    pub fn sample(&self, rng: &mut impl Rng, count: usize) -> Vec<DepthGridElement> {
        let count = count.min(self.elements.len());
        index::sample(rng, self.elements.len(), count)
            .into_iter()
            .map(|i| self.elements[i])
            .collect()
    }
}

// ── Sampling ─────────────────────────────────────────────────────

/// Power-of-two reduction applied to the depth grid each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    Full,
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    #[default]
    Div256,
    Div512,
}

impl Sampling {
    pub fn denominator(self) -> usize {
        match self {
            Sampling::Full => 1,
            Sampling::Div2 => 2,
            Sampling::Div4 => 4,
            Sampling::Div8 => 8,
            Sampling::Div16 => 16,
            Sampling::Div32 => 32,
            Sampling::Div64 => 64,
            Sampling::Div128 => 128,
            Sampling::Div256 => 256,
            Sampling::Div512 => 512,
        }
    }

    /// Cells to draw from a grid of `cells` cells.
    pub fn sample_count(self, cells: usize) -> usize {
        cells / self.denominator()
    }
}
