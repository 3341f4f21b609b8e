//! Portable four-lane vectors. The QBVH tests four child boxes (or
//! four triangles) per operation; the lanes are plain arrays so the
//! compiler is free to map them onto whatever vector unit the target
//! has, without committing the traversal code to one instruction set.

// std
use std::ops;
// pbrt
use crate::core::pbrt::Float;

pub const LANE_WIDTH: usize = 4;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[repr(C, align(16))]
pub struct Float4(pub [Float; LANE_WIDTH]);

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Bool4(pub [bool; LANE_WIDTH]);

impl Float4 {
    pub fn splat(v: Float) -> Self {
        Float4([v; LANE_WIDTH])
    }
    pub fn abs(&self) -> Float4 {
        let mut r = self.0;
        for v in r.iter_mut() {
            *v = v.abs();
        }
        Float4(r)
    }
    /// Lane-wise minimum; a NaN lane yields the other operand.
    pub fn min(&self, other: &Float4) -> Float4 {
        self.zip(other, |a, b| a.min(b))
    }
    /// Lane-wise maximum; a NaN lane yields the other operand.
    pub fn max(&self, other: &Float4) -> Float4 {
        self.zip(other, |a, b| a.max(b))
    }
    pub fn lt(&self, other: &Float4) -> Bool4 {
        self.compare(other, |a, b| a < b)
    }
    pub fn gt(&self, other: &Float4) -> Bool4 {
        self.compare(other, |a, b| a > b)
    }
    pub fn ge(&self, other: &Float4) -> Bool4 {
        self.compare(other, |a, b| a >= b)
    }
    fn zip<F>(&self, other: &Float4, f: F) -> Float4
    where
        F: Fn(Float, Float) -> Float,
    {
        let mut r = [0.0 as Float; LANE_WIDTH];
        for i in 0..LANE_WIDTH {
            r[i] = f(self.0[i], other.0[i]);
        }
        Float4(r)
    }
    fn compare<F>(&self, other: &Float4, f: F) -> Bool4
    where
        F: Fn(Float, Float) -> bool,
    {
        let mut r = [false; LANE_WIDTH];
        for i in 0..LANE_WIDTH {
            r[i] = f(self.0[i], other.0[i]);
        }
        Bool4(r)
    }
}

impl Bool4 {
    /// Bit *i* of the result is set iff lane *i* is true.
    pub fn move_mask(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .fold(0_u8, |mask, (i, &b)| mask | ((b as u8) << i))
    }
    pub fn any(&self) -> bool {
        self.move_mask() != 0
    }
}

impl_op_ex!(+|a: &Float4, b: &Float4| -> Float4 { a.zip(b, |x, y| x + y) });
impl_op_ex!(-|a: &Float4, b: &Float4| -> Float4 { a.zip(b, |x, y| x - y) });
impl_op_ex!(*|a: &Float4, b: &Float4| -> Float4 { a.zip(b, |x, y| x * y) });
impl_op_ex!(/|a: &Float4, b: &Float4| -> Float4 { a.zip(b, |x, y| x / y) });

impl ops::BitOr for Bool4 {
    type Output = Bool4;
    fn bitor(self, rhs: Bool4) -> Bool4 {
        let mut r = [false; LANE_WIDTH];
        for i in 0..LANE_WIDTH {
            r[i] = self.0[i] || rhs.0[i];
        }
        Bool4(r)
    }
}

impl ops::BitAnd for Bool4 {
    type Output = Bool4;
    fn bitand(self, rhs: Bool4) -> Bool4 {
        let mut r = [false; LANE_WIDTH];
        for i in 0..LANE_WIDTH {
            r[i] = self.0[i] && rhs.0[i];
        }
        Bool4(r)
    }
}

impl ops::Not for Bool4 {
    type Output = Bool4;
    fn not(self) -> Bool4 {
        Bool4([!self.0[0], !self.0[1], !self.0[2], !self.0[3]])
    }
}
