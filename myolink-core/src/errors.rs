//! Error Types for the Dispatch Pipeline
//!
//! ## Design Philosophy
//!
//! 1. **One enum per failing concern**: transform, device connection, and
//!    dispatch each get their own type so callers can match on exactly the
//!    failures they can act on.
//!
//! 2. **Actionable context inline**: every variant names what failed and,
//!    where it matters, which handler or endpoint was involved. Error
//!    messages are what the operator sees right before the process exits,
//!    so they carry the identifying detail.
//!
//! 3. **No retries here**: these types describe failures; policy (abort the
//!    pipeline vs. isolate the handler) lives in the dispatcher and driver.

use thiserror::Error;

use crate::dispatch::StreamKind;

/// Boxed error type returned by individual handlers.
///
/// Handlers from other crates (the OSC publisher, user code) fail with
/// their own error types; the dispatcher only needs Display and source
/// chaining, so the seam is a boxed `std::error::Error`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Orientation transform failure.
///
/// The conversion itself has no failure modes on well-formed input; the
/// only way to fail is to feed it a rotation containing NaN or infinity,
/// which indicates a corrupt frame from the device.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TransformError {
    /// Rotation input contained NaN or an infinite component.
    #[error("rotation input is not finite (w={w}, x={x}, y={y}, z={z})")]
    NonFinite {
        /// Scalar component as received.
        w: f32,
        /// Vector x component as received.
        x: f32,
        /// Vector y component as received.
        y: f32,
        /// Vector z component as received.
        z: f32,
    },
}

/// Device-boundary failure.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// No device could be found or opened.
    #[error("device unavailable: {reason}")]
    Unavailable {
        /// Driver-reported reason.
        reason: &'static str,
    },

    /// Transport-level I/O failure while connected.
    #[error("device I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An operation was attempted before `connect()` succeeded.
    #[error("device is not connected")]
    NotConnected,
}

/// Dispatch-layer failure.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The per-sample orientation transform failed; the sample is dropped.
    #[error("orientation transform failed: {0}")]
    Transform(#[from] TransformError),

    /// A handler failed under [`crate::FailurePolicy::Abort`].
    ///
    /// Dispatch of subsequent handlers for the same sample was halted.
    #[error("handler '{handler}' failed on {stream} stream: {source}")]
    Handler {
        /// Stream the sample belonged to.
        stream: StreamKind,
        /// Name of the failing handler.
        handler: &'static str,
        /// The handler's own error.
        #[source]
        source: BoxError,
    },

    /// Registration was attempted past the fixed per-stream ceiling.
    #[error("handler registry full ({max} handlers per stream)")]
    RegistryFull {
        /// The ceiling that was hit.
        max: usize,
    },
}
