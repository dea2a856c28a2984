//! Quaternion to Tait-Bryan Orientation Conversion
//!
//! ## Overview
//!
//! Converts the device's rotation quaternion into the (yaw, roll, pitch)
//! triple that downstream consumers (the verbose log, the orientation
//! history, the `/myo/imu` OSC message) actually want. This is the
//! only math in the pipeline and it is a pure function: same input, same
//! output, bit for bit.
//!
//! ## Convention
//!
//! Intrinsic z-y'-x'' Tait-Bryan angles, scalar-first quaternion:
//!
//! ```text
//! yaw   = atan2(2(wz + xy), 1 - 2(y² + z²))     rotation about z
//! pitch = asin (2(wy - xz))                      rotation about y'
//! roll  = atan2(2(wx + yz), 1 - 2(x² + y²))     rotation about x''
//! ```
//!
//! The identity quaternion (1, 0, 0, 0) maps to (0, 0, 0). The asin
//! argument is clamped to [-1, 1] so rounding error on inputs near gimbal
//! lock (pitch ±90°) cannot produce NaN.
//!
//! Unit norm is assumed, not enforced: the device normalizes its rotation
//! output, and renormalizing here would hide a corrupt frame instead of
//! surfacing it. Non-finite components fail with [`TransformError`].

use libm::{asinf, atan2f};

use crate::errors::TransformError;
use crate::samples::{Orientation, Quaternion};

/// Convert a rotation quaternion into Tait-Bryan angles.
///
/// Deterministic: identical floating-point input yields identical output.
///
/// ## Errors
///
/// [`TransformError::NonFinite`] when any component is NaN or infinite.
pub fn quat_to_orientation(q: Quaternion) -> Result<Orientation, TransformError> {
    if !q.is_finite() {
        return Err(TransformError::NonFinite {
            w: q.w,
            x: q.x,
            y: q.y,
            z: q.z,
        });
    }

    let Quaternion { w, x, y, z } = q;

    let yaw = atan2f(2.0 * (w * z + x * y), 1.0 - 2.0 * (y * y + z * z));
    let pitch = asinf((2.0 * (w * y - x * z)).clamp(-1.0, 1.0));
    let roll = atan2f(2.0 * (w * x + y * z), 1.0 - 2.0 * (x * x + y * y));

    Ok(Orientation { yaw, roll, pitch })
}
