//! Coordinate geometry support
//!
//! Floating-point points, lines and circles used by the numeric oracle.
//! Nothing here feeds symbolic arithmetic.

use super::symbols::PointId;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Squared-residual threshold below which a normalized quantity is zero
pub const ATOM: f64 = 1e-12;

/// 2D point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point
    pub fn distance(&self, other: &Point2D) -> f64 {
        (*self - *other).norm()
    }

    /// Length as a vector from the origin
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Dot product with another point (as vectors from origin)
    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Cross product z-component (for 2D)
    pub fn cross_z(&self, other: &Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotated by a quarter turn counter-clockwise
    pub fn perp(&self) -> Point2D {
        Point2D::new(-self.y, self.x)
    }

    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        (*self + *other) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Direction of the vector modulo π, in units of π, in `[0, 1)`
    pub fn direction(&self) -> f64 {
        let d = self.y.atan2(self.x) / std::f64::consts::PI;
        let d = d - d.floor();
        if d >= 1.0 {
            0.0
        } else {
            d
        }
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, k: f64) -> Point2D {
        Point2D::new(self.x * k, self.y * k)
    }
}

/// Coordinate store - point coordinates indexed by `PointId`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinateStore {
    coords: Vec<Point2D>,
}

impl CoordinateStore {
    pub fn new() -> Self {
        Self { coords: Vec::new() }
    }

    /// Append coordinates for the next point id
    pub fn push(&mut self, coords: Point2D) -> PointId {
        self.coords.push(coords);
        PointId(self.coords.len() as u32 - 1)
    }

    /// Get coordinates for a point
    pub fn get(&self, point: PointId) -> Option<Point2D> {
        self.coords.get(point.0 as usize).copied()
    }

    pub fn as_slice(&self) -> &[Point2D] {
        &self.coords
    }

    /// Number of points with coordinates
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Largest pairwise distance, or 1.0 when all points coincide
    pub fn diameter(&self) -> f64 {
        let mut best = 0.0f64;
        for (i, p) in self.coords.iter().enumerate() {
            for q in &self.coords[i + 1..] {
                best = best.max(p.distance(q));
            }
        }
        if best > 0.0 && best.is_finite() {
            best
        } else {
            1.0
        }
    }
}

/// Infinite line through `origin` along the unit vector `dir`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumLine {
    pub origin: Point2D,
    pub dir: Point2D,
}

impl NumLine {
    /// Line through two points; `None` when they coincide
    pub fn through(p: Point2D, q: Point2D) -> Option<NumLine> {
        let v = q - p;
        let n = v.norm();
        if n == 0.0 || !n.is_finite() {
            return None;
        }
        Some(NumLine {
            origin: p,
            dir: v * (1.0 / n),
        })
    }

    /// Direction in units of π, in `[0, 1)`
    pub fn direction(&self) -> f64 {
        self.dir.direction()
    }

    /// Signed coordinate of the projection of `p` along the line
    pub fn position(&self, p: Point2D) -> f64 {
        (p - self.origin).dot(&self.dir)
    }

    /// Perpendicular distance from `p`
    pub fn distance(&self, p: Point2D) -> f64 {
        (p - self.origin).cross_z(&self.dir).abs()
    }

    /// Perpendicular foot of `p`
    pub fn foot(&self, p: Point2D) -> Point2D {
        self.origin + self.dir * self.position(p)
    }

    /// Intersection point; `None` for parallel lines
    pub fn intersect(&self, other: &NumLine) -> Option<Point2D> {
        let denom = self.dir.cross_z(&other.dir);
        if denom.abs() < ATOM {
            return None;
        }
        let t = (other.origin - self.origin).cross_z(&other.dir) / denom;
        Some(self.origin + self.dir * t)
    }
}

/// Circle by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumCircle {
    pub center: Point2D,
    pub radius: f64,
}

impl NumCircle {
    pub fn new(center: Point2D, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Circle through three points; `None` when they are collinear
    pub fn through(a: Point2D, b: Point2D, c: Point2D) -> Option<NumCircle> {
        let ab = NumLine::through(a, b)?;
        let bc = NumLine::through(b, c)?;
        let m1 = NumLine {
            origin: a.midpoint(&b),
            dir: ab.dir.perp(),
        };
        let m2 = NumLine {
            origin: b.midpoint(&c),
            dir: bc.dir.perp(),
        };
        let center = m1.intersect(&m2)?;
        Some(NumCircle::new(center, center.distance(&a)))
    }

    /// Distance of `p` from the circumference
    pub fn distance(&self, p: Point2D) -> f64 {
        (self.center.distance(&p) - self.radius).abs()
    }
}

/// Tolerance predicates over raw coordinates
pub mod ops {
    use super::*;

    /// `value / scale` counts as zero
    pub fn is_zero(value: f64, scale: f64) -> bool {
        let r = value / scale;
        r * r < ATOM
    }

    /// Angle in units of π counts as zero modulo 1
    pub fn is_zero_angle(value: f64) -> bool {
        let r = value - value.round();
        r * r < ATOM
    }

    /// Orientation of the triangle `p1 p2 p3`: 1 counter-clockwise, -1 clockwise, 0 degenerate
    pub fn orientation(p1: Point2D, p2: Point2D, p3: Point2D, scale: f64) -> i8 {
        let area = (p2 - p1).cross_z(&(p3 - p1));
        if is_zero(area, scale * scale) {
            0
        } else if area > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Check if three points are collinear
    pub fn are_collinear(p1: Point2D, p2: Point2D, p3: Point2D, scale: f64) -> bool {
        orientation(p1, p2, p3, scale) == 0
    }
}
