//! Geometric primitives for fixture detection.
//!
//! Detections and OCR readings live in page pixel coordinates as axis-aligned
//! rectangles. This module provides the overlap, distance, and clamping
//! operations the grouping and assembly stages are built on.

use serde::{Deserialize, Serialize};

/// A 2D point with floating-point pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned rectangle in page pixel coordinates.
///
/// Serialized as `[x, y, w, h]` to match the pipeline's output format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    /// X-coordinate of the top-left corner.
    pub x: f32,
    /// Y-coordinate of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub w: f32,
    /// Height of the rectangle.
    pub h: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a rectangle from opposite corners.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let x = x1.min(x2);
        let y = y1.min(y2);
        Self {
            x,
            y,
            w: (x2 - x1).abs(),
            h: (y2 - y1).abs(),
        }
    }

    /// X-coordinate of the right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Y-coordinate of the bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Area of the rectangle.
    #[inline]
    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// Returns true when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Center of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Distance between the centers of two rectangles.
    pub fn center_distance(&self, other: &Rect) -> f32 {
        self.center().distance(&other.center())
    }

    /// Returns true when the point lies inside the rectangle (edges
    /// inclusive).
    pub fn contains_point(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Area of the intersection with another rectangle, 0.0 when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let inter_x_min = self.x.max(other.x);
        let inter_y_min = self.y.max(other.y);
        let inter_x_max = self.right().min(other.right());
        let inter_y_max = self.bottom().min(other.bottom());

        if inter_x_min >= inter_x_max || inter_y_min >= inter_y_max {
            return 0.0;
        }

        (inter_x_max - inter_x_min) * (inter_y_max - inter_y_min)
    }

    /// Intersection over union with another rectangle, in [0, 1].
    pub fn iou(&self, other: &Rect) -> f32 {
        let inter_area = self.intersection_area(other);
        if inter_area <= 0.0 {
            return 0.0;
        }

        let union_area = self.area() + other.area() - inter_area;
        if union_area <= 0.0 {
            return 0.0;
        }

        inter_area / union_area
    }

    /// Smallest rectangle enclosing both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Expands the rectangle by `margin` pixels on every side. The origin
    /// never goes negative.
    pub fn expand(&self, margin: f32) -> Rect {
        let x = (self.x - margin).max(0.0);
        let y = (self.y - margin).max(0.0);
        Rect::new(x, y, self.right() + margin - x, self.bottom() + margin - y)
    }

    /// Clamps the rectangle to a page of the given dimensions.
    ///
    /// A box extending beyond the page is cut back to the page, not rejected.
    pub fn clamp_to(&self, page_width: f32, page_height: f32) -> Rect {
        let x = self.x.clamp(0.0, page_width);
        let y = self.y.clamp(0.0, page_height);
        let right = self.right().clamp(x, page_width);
        let bottom = self.bottom().clamp(y, page_height);
        Rect::new(x, y, right - x, bottom - y)
    }
}

impl From<[f32; 4]> for Rect {
    fn from(value: [f32; 4]) -> Self {
        Rect::new(value[0], value[1], value[2], value[3])
    }
}

impl From<Rect> for [f32; 4] {
    fn from(value: Rect) -> Self {
        [value.x, value.y, value.w, value.h]
    }
}
