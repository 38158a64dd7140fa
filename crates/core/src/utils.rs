//! Geometry helpers shared by the interpreter.
//!
//! Provides:
//! - `Matrix`: affine transforms `(xx, yx, xy, yy, x0, y0)` in row-vector form
//! - `Rectangle`: `x, y, width, height` boxes used for viewports and viewboxes
//! - Part name resolution for archive lookups

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A 6-element affine transformation matrix (xx, yx, xy, yy, x0, y0).
/// Transforms point (x, y) to (xx*x + xy*y + x0, yx*x + yy*y + y0).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Compares two floats for approximate equality.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Multiplies two matrices. The result applies `m1` first, then `m0`.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

pub fn scale_matrix(sx: f64, sy: f64) -> Matrix {
    (sx, 0.0, 0.0, sy, 0.0, 0.0)
}

pub fn translation_matrix(tx: f64, ty: f64) -> Matrix {
    (1.0, 0.0, 0.0, 1.0, tx, ty)
}

pub fn rotation_matrix(radians: f64) -> Matrix {
    let (s, c) = radians.sin_cos();
    (c, s, -s, c, 0.0, 0.0)
}

/// Inverts a matrix. Returns `None` for singular or non-finite input.
pub fn invert_matrix(m: Matrix) -> Option<Matrix> {
    let (a, b, c, d, e, f) = m;
    let det = a * d - b * c;
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some((
        d / det,
        -b / det,
        -c / det,
        a / det,
        (c * f - d * e) / det,
        (b * e - a * f) / det,
    ))
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, (x, y): Point) -> Point {
    let (a, b, c, d, e, f) = m;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies the linear part of a matrix to a distance vector.
pub fn apply_matrix_distance(m: Matrix, (dx, dy): Point) -> Point {
    let (a, b, c, d, _, _) = m;
    (a * dx + c * dy, b * dx + d * dy)
}

/// Length of a distance vector after transformation.
pub fn transform_hypot(m: Matrix, dx: f64, dy: f64) -> f64 {
    let (x, y) = apply_matrix_distance(m, (dx, dy));
    x.hypot(y)
}

/// An axis-aligned box given by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Scales origin and size independently on each axis.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Grows the box by `margin` on every side.
    pub fn inflated(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Bounding box of a set of points; `None` when empty.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (x, y, x, y);
        for (x, y) in iter {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Resolves `target` against the directory of the part `source`.
///
/// Absolute targets are returned unchanged. The joined path is
/// canonicalized: `.` segments are dropped and `..` removes the previous
/// segment.
pub fn resolve_relative_path(source: &str, target: &str) -> String {
    if target.starts_with('/') {
        return target.to_string();
    }

    let base = source.rfind('/').map_or("", |idx| &source[..idx]);
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(target.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if source.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mult_matrix_applies_first_argument_first() {
        let m = mult_matrix(translation_matrix(10.0, 0.0), scale_matrix(2.0, 2.0));
        assert_eq!(apply_matrix_pt(m, (1.0, 1.0)), (22.0, 2.0));
    }

    #[test]
    fn test_invert_round_trip() {
        let m = (2.0, 0.5, -1.0, 3.0, 7.0, -4.0);
        let inv = invert_matrix(m).unwrap();
        let (x, y) = apply_matrix_pt(inv, apply_matrix_pt(m, (3.0, 5.0)));
        assert!(approx_eq(x, 3.0, 1e-9));
        assert!(approx_eq(y, 5.0, 1e-9));
        assert!(invert_matrix((1.0, 2.0, 2.0, 4.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(
            resolve_relative_path("/Documents/1/Pages/1.fpage", "../Resources/Font.odttf"),
            "/Documents/1/Resources/Font.odttf"
        );
        assert_eq!(
            resolve_relative_path("/Documents/1/Pages/1.fpage", "./img.png"),
            "/Documents/1/Pages/img.png"
        );
        assert_eq!(
            resolve_relative_path("/Documents/1/Pages/1.fpage", "/Resources/a.dict"),
            "/Resources/a.dict"
        );
    }
}
