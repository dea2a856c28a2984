//! Sample Types for the EMG/IMU Dispatch Pipeline
//!
//! ## Overview
//!
//! This module defines the decoded sensor samples that flow through the
//! dispatch layer. The device driver produces them once per frame; the
//! dispatcher hands them to every registered handler by shared reference,
//! so a sample is immutable for the whole of one dispatch.
//!
//! ## Memory Model
//!
//! Samples are small, `Copy`, stack-allocated values:
//!
//! ```text
//! EmgSample: 8 × i16 channels + bool       = 18 bytes
//! ImuSample: 4 + 3 + 3 × f32               = 40 bytes
//! Orientation: 3 × f32                     = 12 bytes
//! ```
//!
//! Keeping samples `Copy` means history buffers and outbound publishers can
//! retain their own copies without reference counting or lifetimes leaking
//! into the handler traits.
//!
//! ## Orientation
//!
//! [`Orientation`] is *derived* state: it does not exist until the first IMU
//! sample has been dispatched, and the dispatcher recomputes it for every
//! sample before any IMU handler runs. Handlers receive it as an explicit
//! argument rather than reading shared mutable state, which pins down the
//! "transform before consumers" ordering by construction.

use core::fmt;

/// Number of EMG channels per sample on the supported armband.
pub const EMG_CHANNELS: usize = 8;

/// One decoded electromyography sample.
///
/// Channel readings are the raw amplitudes reported by the device; no
/// filtering or scaling is applied anywhere in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmgSample {
    /// Raw amplitude per channel, in device units.
    pub channels: [i16; EMG_CHANNELS],
    /// Device-reported "arm is moving" flag.
    pub moving: bool,
}

/// One decoded inertial sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Rotation as a unit quaternion (assumed, not enforced).
    pub rotation: Quaternion,
    /// Gyroscope angular rate, x/y/z.
    pub angular_rate: [f32; 3],
    /// Linear acceleration, x/y/z, in device units.
    pub acceleration: [f32; 3],
}

/// Rotation as a 4-component quaternion, scalar first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// Scalar component.
    pub w: f32,
    /// Vector x component.
    pub x: f32,
    /// Vector y component.
    pub y: f32,
    /// Vector z component.
    pub z: f32,
}

impl Quaternion {
    /// Construct from components, scalar first.
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (1, 0, 0, 0).
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 0.0);

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Derived Tait-Bryan angles for one IMU sample, in radians.
///
/// Produced by [`crate::transform::quat_to_orientation`] using the
/// intrinsic z-y'-x'' convention; see that module for the exact formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Rotation about z (azimuth).
    pub yaw: f32,
    /// Rotation about x.
    pub roll: f32,
    /// Rotation about y (elevation).
    pub pitch: f32,
}

impl Orientation {
    /// Construct from yaw, roll, pitch in radians.
    pub const fn new(yaw: f32, roll: f32, pitch: f32) -> Self {
        Self { yaw, roll, pitch }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "yaw={:.3} roll={:.3} pitch={:.3}",
            self.yaw, self.roll, self.pitch
        )
    }
}
