//! Circular region masks.

use common::Buffer2;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Named sampling area given by two opposite bounding-box corners `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub label: String,
    pub bounds: [f64; 4],
}

impl Region {
    pub fn new(label: impl Into<String>, bounds: [f64; 4]) -> Self {
        Self {
            label: label.into(),
            bounds,
        }
    }

    /// Box midpoint.
    pub fn center(&self) -> DVec2 {
        let [x1, y1, x2, y2] = self.bounds;
        DVec2::new((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }

    /// Half the box width.
    pub fn radius(&self) -> f64 {
        (self.bounds[2] - self.bounds[0]).abs() / 2.0
    }

    pub fn circle(&self) -> Circle {
        Circle {
            center: self.center(),
            radius: self.radius(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
}

/// Boolean sampling grid plus the flat indices of its `true` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    grid: Buffer2<bool>,
    indices: Vec<usize>,
}

impl Mask {
    pub fn grid(&self) -> &Buffer2<bool> {
        &self.grid
    }

    /// `(width, height)` of the frames this mask applies to.
    pub fn dimensions(&self) -> (usize, usize) {
        self.grid.dimensions()
    }

    /// Row-major indices of included pixels, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn pixel_count(&self) -> usize {
        self.indices.len()
    }

    /// Mean of `pixels` under the mask, NaN for an empty mask.
    ///
    /// `pixels` is a row-major frame with the mask's dimensions.
    pub fn mean(&self, pixels: &[f64]) -> f64 {
        debug_assert_eq!(pixels.len(), self.grid.len());
        if self.indices.is_empty() {
            return f64::NAN;
        }
        let sum: f64 = self.indices.iter().map(|&i| pixels[i]).sum();
        sum / self.indices.len() as f64
    }
}

/// Closed disk mask: pixel `(x, y)` is included iff its distance to the
/// center is at most the radius.
///
/// With radius 0 only a pixel lying exactly on the center is included, so an
/// off-grid or non-integer center yields an empty mask.
pub fn circle_mask(width: usize, height: usize, circle: Circle) -> Mask {
    let grid = Buffer2::from_fn(width, height, |x, y| {
        DVec2::new(x as f64, y as f64).distance(circle.center) <= circle.radius
    });
    let indices = grid
        .iter()
        .enumerate()
        .filter_map(|(i, &inside)| inside.then_some(i))
        .collect();
    Mask { grid, indices }
}

/// Builds one mask per region for frames of the given size.
pub fn region_masks(width: usize, height: usize, regions: &[Region]) -> Vec<Mask> {
    regions
        .iter()
        .map(|region| circle_mask(width, height, region.circle()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(cx: f64, cy: f64, radius: f64) -> Circle {
        Circle {
            center: DVec2::new(cx, cy),
            radius,
        }
    }

    #[test]
    fn region_geometry_from_bounds() {
        let region = Region::new("RegionA", [10.0, 20.0, 30.0, 44.0]);
        assert_eq!(region.center(), DVec2::new(20.0, 32.0));
        assert_eq!(region.radius(), 10.0);
    }

    #[test]
    fn radius_zero_on_pixel_center_selects_one_pixel() {
        let mask = circle_mask(7, 5, circle(3.0, 2.0, 0.0));
        assert_eq!(mask.indices(), &[2 * 7 + 3]);
    }

    #[test]
    fn radius_zero_off_grid_is_empty() {
        assert_eq!(circle_mask(7, 5, circle(3.5, 2.0, 0.0)).pixel_count(), 0);
        assert_eq!(circle_mask(7, 5, circle(-4.0, 2.0, 0.0)).pixel_count(), 0);
    }

    #[test]
    fn boundary_pixels_are_included() {
        let mask = circle_mask(5, 5, circle(2.0, 2.0, 2.0));
        assert!(*mask.grid().get(0, 2));
        assert!(*mask.grid().get(2, 4));
        assert!(!*mask.grid().get(0, 0));
    }

    #[test]
    fn large_radius_covers_whole_frame() {
        let (w, h) = (9, 6);
        let mask = circle_mask(w, h, circle(4.0, 3.0, w.max(h) as f64));
        assert_eq!(mask.pixel_count(), w * h);
    }

    #[test]
    fn mid_grid_mask_is_point_symmetric() {
        let (w, h) = (11, 8);
        let mask = circle_mask(w, h, circle((w - 1) as f64 / 2.0, (h - 1) as f64 / 2.0, 3.2));
        for y in 0..h {
            for x in 0..w {
                assert_eq!(
                    mask.grid().get(x, y),
                    mask.grid().get(w - 1 - x, h - 1 - y),
                    "asymmetric at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn mean_over_mask() {
        let mask = circle_mask(3, 1, circle(0.5, 0.0, 0.5));
        let pixels = [2.0, 4.0, 100.0];
        assert!((mask.mean(&pixels) - 3.0).abs() < 1e-12);
        assert!(circle_mask(3, 1, circle(10.0, 10.0, 0.0)).mean(&pixels).is_nan());
    }
}
