//! Pipeline Driver: Connect, Receive Loop, Guaranteed Release
//!
//! ## Overview
//!
//! The driver owns the device and the fully-registered dispatcher. Its job
//! is a small state machine:
//!
//! ```text
//! Disconnected ──connect()──▶ Running ──stop/close/error──▶ Disconnecting
//! ```
//!
//! While Running it blocks the calling thread, performing one bounded
//! device poll per iteration and routing each decoded frame to the
//! dispatcher. Between iterations no work happens. The loop exits when the
//! cooperative stop flag is raised, the device closes the stream, or a
//! fatal error surfaces. On *every* exit path `disconnect()` runs
//! exactly once before `run` returns.
//!
//! ## Error Routing
//!
//! Connection errors are always fatal: there is nothing to poll without a
//! device. Dispatch errors depend on the dispatcher's failure policy:
//! under [`FailurePolicy::Abort`](crate::FailurePolicy::Abort) they unwind
//! out of the loop; under the default isolate policy a transform failure
//! drops the sample with a warning and the loop keeps going.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;

use crate::device::{Device, Frame, Poll};
use crate::dispatch::{Dispatcher, FailurePolicy};
use crate::errors::{ConnectionError, DispatchError};

/// Pipeline-level failure.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The device could not be opened or failed mid-stream.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A dispatch failure escalated per the failure policy.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Lifecycle state of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Disconnected,
    Running,
    Disconnecting,
}

/// Owns the device connection and runs the blocking receive loop.
pub struct PipelineDriver<D: Device> {
    device: D,
    dispatcher: Dispatcher,
    poll_timeout: Duration,
    state: DriverState,
}

impl<D: Device> PipelineDriver<D> {
    /// Bounded wait per receive step.
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

    /// Build a driver from a device and a fully-registered dispatcher.
    ///
    /// Taking the dispatcher by value is what makes "registration only
    /// before the loop starts" hold: once the driver owns it, nothing
    /// else can register handlers.
    pub fn new(device: D, dispatcher: Dispatcher) -> Self {
        Self {
            device,
            dispatcher,
            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
            state: DriverState::Disconnected,
        }
    }

    /// Override the per-step poll timeout.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Dispatch counters, readable after `run` returns.
    pub fn stats(&self) -> crate::dispatch::DispatchStats {
        self.dispatcher.stats()
    }

    /// Connect, run the blocking receive loop until `stop` is raised, the
    /// stream closes, or a fatal error occurs, then release the device.
    ///
    /// The device is disconnected exactly once on every exit path.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), PipelineError> {
        self.device.connect()?;
        self.state = DriverState::Running;
        log::info!("device connected, entering receive loop");

        let result = self.receive_loop(stop);

        self.state = DriverState::Disconnecting;
        self.device.disconnect();
        log::info!("device disconnected");

        result
    }

    fn receive_loop(&mut self, stop: &AtomicBool) -> Result<(), PipelineError> {
        while !stop.load(Ordering::Relaxed) {
            match self.device.poll(self.poll_timeout)? {
                Poll::Frame(frame) => self.route(frame)?,
                Poll::Idle => continue,
                Poll::Closed => {
                    log::info!("device closed the stream");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Route one frame to the dispatcher, escalating per failure policy.
    fn route(&mut self, frame: Frame) -> Result<(), PipelineError> {
        let outcome = match frame {
            Frame::Emg(sample) => self.dispatcher.dispatch_emg(&sample),
            Frame::Imu(sample) => self.dispatcher.dispatch_imu(&sample),
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(err) => match self.dispatcher.policy() {
                FailurePolicy::Abort => Err(err.into()),
                FailurePolicy::Isolate => {
                    // Only transform errors reach here under isolate; the
                    // sample is dropped, the stream continues.
                    log::warn!("sample dropped: {err}");
                    Ok(())
                }
            },
        }
    }
}
