// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal vector, quaternion and column-major 4×4 transform types.
//!
//! This covers the subset of 3-D math the control-node engine needs (bone
//! rest matrices, orientation averaging, head/tail points) without pulling in
//! a full linear-algebra crate. Bones point along their local +Y axis, so a
//! bone's tail is `head + y_axis * length`.

use core::ops::{Add, Mul, Neg, Sub};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A point or direction in armature space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a vector from its components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Distance between two points.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// A rotation quaternion stored as `(w, x, y, z)`.
///
/// Quaternions are summed component-wise when averaging control orientations,
/// so the type also has to represent non-unit values such as [`Quat::ZERO`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    /// Scalar part.
    pub w: f64,
    /// X of the vector part.
    pub x: f64,
    /// Y of the vector part.
    pub y: f64,
    /// Z of the vector part.
    pub z: f64,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    /// The all-zero quaternion, the neutral element for summation.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a quaternion from `(w, x, y, z)`.
    #[inline]
    #[must_use]
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Creates a rotation of `radians` around a unit `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, radians: f64) -> Self {
        let half = radians * 0.5;
        #[cfg(feature = "std")]
        let (s, c) = half.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (half.sin(), half.cos());
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Four-dimensional dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Magnitude of the quaternion.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the unit quaternion with the same direction.
    ///
    /// A zero (or non-finite) quaternion has no direction; it normalizes to
    /// [`Quat::IDENTITY`].
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            let inv = 1.0 / len;
            Self::new(self.w * inv, self.x * inv, self.y * inv, self.z * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Components in `(w, x, y, z)` order.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.w, self.x, self.y, self.z]
    }

    /// Quantized components used to group location drivers by orientation.
    ///
    /// Each component is scaled by 10⁴ and rounded, so orientations closer
    /// than that share a key.
    #[must_use]
    pub fn orientation_key(self) -> [i64; 4] {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "quaternion components are bounded, the scaled value fits in i64"
        )]
        let key = self.to_array().map(|c| (c * 10_000.0).round() as i64);
        key
    }

    /// Converts the (unit) quaternion into a rotation transform.
    #[must_use]
    pub fn to_transform(self) -> Transform3d {
        let Self { w, x, y, z } = self;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        Transform3d::from_cols(
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy), 0.0],
            [2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx), 0.0],
            [2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }
}

impl Add for Quat {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.w + rhs.w,
            self.x + rhs.x,
            self.y + rhs.y,
            self.z + rhs.z,
        )
    }
}

impl Neg for Quat {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.w, -self.x, -self.y, -self.z)
    }
}

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix. For bone rest matrices the
/// first three columns are the bone's local axes and the fourth is its head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(col0: [f64; 4], col1: [f64; 4], col2: [f64; 4], col3: [f64; 4]) -> Self {
        Self {
            cols: [col0, col1, col2, col3],
        }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(t: Vec3) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [t.x, t.y, t.z, 1.0],
            ],
        }
    }

    /// Creates a transform rotating by `rotation` and then moving to `translation`.
    #[must_use]
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let mut m = rotation.to_transform();
        m.set_translation(translation);
        m
    }

    /// The translation column as a point.
    #[inline]
    #[must_use]
    pub const fn translation(&self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }

    /// Replaces the translation column.
    #[inline]
    pub fn set_translation(&mut self, t: Vec3) {
        self.cols[3] = [t.x, t.y, t.z, 1.0];
    }

    /// Local axis `i` (0 = X, 1 = Y, 2 = Z) as a vector.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[inline]
    #[must_use]
    pub const fn axis(&self, i: usize) -> Vec3 {
        assert!(i < 3, "axis index out of range");
        Vec3::new(self.cols[i][0], self.cols[i][1], self.cols[i][2])
    }

    /// Extracts the rotation of an orthonormal upper 3×3 block.
    #[must_use]
    pub fn to_rotation(&self) -> Quat {
        let c = &self.cols;
        // Row-major element accessors: m(r, k) = cols[k][r].
        let (m00, m11, m22) = (c[0][0], c[1][1], c[2][2]);
        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quat::new(
                0.25 * s,
                (c[1][2] - c[2][1]) / s,
                (c[2][0] - c[0][2]) / s,
                (c[0][1] - c[1][0]) / s,
            )
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Quat::new(
                (c[1][2] - c[2][1]) / s,
                0.25 * s,
                (c[1][0] + c[0][1]) / s,
                (c[2][0] + c[0][2]) / s,
            )
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Quat::new(
                (c[2][0] - c[0][2]) / s,
                (c[1][0] + c[0][1]) / s,
                0.25 * s,
                (c[2][1] + c[1][2]) / s,
            )
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Quat::new(
                (c[0][1] - c[1][0]) / s,
                (c[2][0] + c[0][2]) / s,
                (c[2][1] + c[1][2]) / s,
                0.25 * s,
            )
        };
        q.normalized()
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}
