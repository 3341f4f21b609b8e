//! Type definition of Float, otherwise constants and functions which
//! can be used almost everywhere else in the code.

// std
use std;

pub type Float = f32;

pub const INFINITY: Float = std::f32::INFINITY;

/// Smallest hit distance a ray/triangle test accepts, and the
/// smallest |sine| between ray and triangle plane (relative to the
/// edge lengths) it does not treat as parallel.
pub const TRIANGLE_EPSILON: Float = 1.0e-6;

/// Clamp the given value *val* to lie between the values *low* and
/// *high*.
pub fn clamp_t<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd,
{
    let r: T;
    if val < low {
        r = low;
    } else if val > high {
        r = high;
    } else {
        r = val;
    }
    r
}
