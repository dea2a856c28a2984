//! Dispatch and stream-processing core for Myolink
//!
//! Fans decoded EMG and IMU samples out to an ordered set of subscriber
//! handlers, keeps bounded sliding-window history per stream, and derives
//! a Tait-Bryan orientation from each IMU rotation before any handler
//! runs.
//!
//! Key constraints:
//! - Single-threaded, synchronous dispatch: handlers run in registration
//!   order, each to completion, with no nested dispatch
//! - Bounded everything: handler registry and history buffers have fixed
//!   ceilings, so a long session cannot grow without limit
//! - The device driver sits behind the [`device::Device`] trait; this
//!   crate never talks to hardware directly
//!
//! ```no_run
//! use myolink_core::{Dispatcher, PipelineDriver};
//! use myolink_core::device::SimulatedDevice;
//! use std::sync::atomic::AtomicBool;
//!
//! let dispatcher = Dispatcher::new();
//! // ... register handlers ...
//! let mut driver = PipelineDriver::new(SimulatedDevice::new(), dispatcher);
//!
//! let stop = AtomicBool::new(false);
//! match driver.run(&stop) {
//!     Ok(()) => {}  // Stopped cooperatively
//!     Err(e) => eprintln!("pipeline failed: {e}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod device;
pub mod dispatch;
pub mod driver;
pub mod errors;
pub mod handlers;
pub mod history;
pub mod samples;
pub mod transform;

// Public API
pub use dispatch::{Dispatcher, EmgHandler, FailurePolicy, ImuHandler, StreamKind};
pub use driver::{PipelineDriver, PipelineError};
pub use errors::{ConnectionError, DispatchError, TransformError};
pub use history::{HistoryBuffer, SharedHistory};
pub use samples::{EmgSample, ImuSample, Orientation, Quaternion};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
