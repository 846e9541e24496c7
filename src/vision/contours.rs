//! Blob extraction from a binary motion mask
//!
//! Boundaries come from border following (outer borders and holes, with their
//! parent links); blobs are whatever boundaries enclose enough area.

use glam::Vec2;
use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

/// Axis-aligned integer rectangle; `width`/`height` of zero means empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box covering every point (inclusive pixel extents)
    pub fn around(points: &[Point<i32>]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Half-open containment: left/top edges inside, right/bottom outside
    pub fn contains(&self, p: Vec2) -> bool {
        let (x, y) = (p.x.floor() as i32, p.y.floor() as i32);
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundingBox::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// A connected region of motion
#[derive(Debug, Clone)]
pub struct Blob {
    /// Boundary in tracing order
    pub points: Vec<Point<i32>>,
    pub bounds: BoundingBox,
    /// Area enclosed by the boundary polygon
    pub area: f64,
    /// Boundary of a hole inside another region
    pub is_hole: bool,
    /// Index of the enclosing boundary in the unfiltered trace
    pub parent: Option<usize>,
}

impl Blob {
    pub fn from_points(points: Vec<Point<i32>>) -> Self {
        let bounds = BoundingBox::around(&points);
        let area = polygon_area(&points);
        Self {
            points,
            bounds,
            area,
            is_hole: false,
            parent: None,
        }
    }

    /// Simplify the boundary, rescale it, and box the result
    pub fn simplified(&self, scale: Vec2, epsilon: f64) -> (Vec<Point<i32>>, BoundingBox) {
        let poly: Vec<Point<i32>> = approximate_polygon_dp(&self.points, epsilon, true)
            .into_iter()
            .map(|p| Point::new((p.x as f32 * scale.x) as i32, (p.y as f32 * scale.y) as i32))
            .collect();
        let bounds = BoundingBox::around(&poly);
        (poly, bounds)
    }
}

/// Unsigned shoelace area of a closed polygon
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Trace every boundary in `mask` (non-zero is foreground) and keep those
/// enclosing at least `min_area`
pub fn find_blobs(mask: &GrayImage, min_area: f64) -> Vec<Blob> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter_map(|contour| {
            let mut blob = Blob::from_points(contour.points);
            if blob.area < min_area {
                return None;
            }
            blob.is_hole = contour.border_type == BorderType::Hole;
            blob.parent = contour.parent;
            Some(blob)
        })
        .collect()
}

/// Unweighted mean of every boundary point of every blob
pub fn centroid(blobs: &[Blob]) -> Option<Vec2> {
    let count: usize = blobs.iter().map(|b| b.points.len()).sum();
    if count == 0 {
        return None;
    }
    let (sx, sy) = blobs
        .iter()
        .flat_map(|b| b.points.iter())
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    Some(Vec2::new((sx / count as f64) as f32, (sy / count as f64) as f32))
}

/// Box around every blob's simplified, rescaled polygon
pub fn enclosing_rect(blobs: &[Blob], scale: Vec2, epsilon: f64) -> BoundingBox {
    blobs
        .iter()
        .map(|b| b.simplified(scale, epsilon).1)
        .fold(BoundingBox::default(), |acc, bb| {
            if acc.area() == 0 { bb } else { acc.union(&bb) }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use proptest::prelude::*;

    fn square_mask(size: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = x >= x0 && x < x0 + side && y >= y0 && y < y0 + side;
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_small_regions_are_filtered() {
        let mask = square_mask(100, 10, 10, 5);
        assert!(find_blobs(&mask, 300.0).is_empty());
        assert!(centroid(&find_blobs(&mask, 300.0)).is_none());
    }

    #[test]
    fn test_empty_mask_has_no_blobs() {
        let mask = GrayImage::new(64, 48);
        assert!(find_blobs(&mask, 0.0).is_empty());
    }

    #[test]
    fn test_symmetric_blob_centroid_is_center() {
        let mask = square_mask(200, 100, 100, 40);
        let blobs = find_blobs(&mask, 300.0);
        assert_eq!(blobs.len(), 1);
        assert!(!blobs[0].is_hole);

        let c = centroid(&blobs).unwrap();
        assert!((c.x - 119.5).abs() < 0.25, "centroid x = {}", c.x);
        assert!((c.y - 119.5).abs() < 0.25, "centroid y = {}", c.y);
        assert_eq!(blobs[0].bounds, BoundingBox::new(100, 100, 40, 40));
    }

    #[test]
    fn test_ring_yields_outer_and_hole() {
        let mut mask = square_mask(200, 50, 50, 100);
        for y in 80..120 {
            for x in 80..120 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        let blobs = find_blobs(&mask, 300.0);
        assert_eq!(blobs.len(), 2);
        assert!(blobs.iter().any(|b| b.is_hole && b.parent.is_some()));
    }

    #[test]
    fn test_polygon_area_rectangle() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ];
        assert_eq!(polygon_area(&pts), 50.0);
        let reversed: Vec<_> = pts.into_iter().rev().collect();
        assert_eq!(polygon_area(&reversed), 50.0);
    }

    #[test]
    fn test_bounding_box_contains_is_half_open() {
        let bb = BoundingBox::new(10, 10, 5, 5);
        assert!(bb.contains(Vec2::new(10.0, 10.0)));
        assert!(bb.contains(Vec2::new(14.9, 14.9)));
        assert!(!bb.contains(Vec2::new(15.0, 12.0)));
        assert!(!BoundingBox::default().contains(Vec2::ZERO));
    }

    #[test]
    fn test_enclosing_rect_covers_all_blobs() {
        let a = Blob::from_points(vec![
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 20),
            Point::new(0, 20),
        ]);
        let b = Blob::from_points(vec![
            Point::new(50, 40),
            Point::new(60, 40),
            Point::new(60, 60),
            Point::new(50, 60),
        ]);
        let rect = enclosing_rect(&[a, b], Vec2::new(2.0, 1.0), 3.0);
        assert_eq!(rect, BoundingBox::new(0, 0, 121, 61));
        assert_eq!(enclosing_rect(&[], Vec2::ONE, 3.0), BoundingBox::default());
    }

    proptest! {
        #[test]
        fn prop_centroid_is_mean_of_all_points(
            groups in proptest::collection::vec(
                proptest::collection::vec((0i32..1000, 0i32..1000), 1..20), 1..5)
        ) {
            let blobs: Vec<Blob> = groups
                .iter()
                .map(|g| Blob::from_points(g.iter().map(|&(x, y)| Point::new(x, y)).collect()))
                .collect();
            let all: Vec<(i32, i32)> = groups.iter().flatten().copied().collect();
            let mx = all.iter().map(|p| p.0 as f64).sum::<f64>() / all.len() as f64;
            let my = all.iter().map(|p| p.1 as f64).sum::<f64>() / all.len() as f64;

            let c = centroid(&blobs).unwrap();
            prop_assert!((c.x as f64 - mx).abs() < 1e-2);
            prop_assert!((c.y as f64 - my).abs() < 1e-2);
        }
    }
}
