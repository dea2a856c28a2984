//! Handler Registry and Synchronous Dispatcher
//!
//! ## Overview
//!
//! The dispatcher is the fan-out point of the pipeline: the device driver
//! decodes one frame, the driver routes it here, and every registered
//! handler for that stream runs strictly in registration order, each to
//! completion before the next, on the caller's thread. Handlers do not know
//! about each other; the registry is the only coupling.
//!
//! ```text
//! Frame ──▶ dispatch_emg ──▶ [H1] ──▶ [H2] ──▶ ... ──▶ done
//!           dispatch_imu ──▶ transform ──▶ [H1(sample, orientation)] ──▶ ...
//! ```
//!
//! ## Orientation Context
//!
//! For IMU samples the dispatcher computes the Tait-Bryan orientation
//! *once per sample, before any handler runs*, and passes it to every
//! handler as an argument. There is no shared mutable orientation
//! variable: a handler registered later cannot observe anything other
//! than the same per-sample value the earlier handlers saw.
//!
//! ## Failure Policy
//!
//! "Notify N independent consumers" should not let one consumer take the
//! rest down, so the default policy isolates failures:
//!
//! - [`FailurePolicy::Isolate`] (default): a handler error is logged and
//!   counted; dispatch continues with the next handler. A handler that
//!   fails [`Dispatcher::DEFAULT_MAX_STRIKES`] consecutive times is
//!   disabled for the rest of the session (circuit breaker); any success
//!   resets its strike count.
//! - [`FailurePolicy::Abort`]: the first handler error halts dispatch of
//!   the remaining handlers for that sample and propagates to the caller.
//!   This matches the historical "one dead OSC peer kills the process"
//!   behavior and is kept for callers that want exactly that.
//!
//! A transform failure always aborts the current sample regardless of
//! policy; there is no orientation to hand to anyone.

use heapless::Vec;

use core::fmt;

use crate::errors::{BoxError, DispatchError};
use crate::samples::{EmgSample, ImuSample, Orientation};
use crate::transform::quat_to_orientation;

/// Fixed ceiling on registered handlers per stream.
///
/// The wiring layer registers a handful of handlers at startup and never
/// again, so a small fixed bound keeps the registry allocation-free and
/// catches runaway registration loops at the source.
pub const MAX_HANDLERS: usize = 8;

/// Result type returned by individual handlers.
pub type HandlerResult = Result<(), BoxError>;

/// Subscriber callback for EMG samples.
pub trait EmgHandler {
    /// Called once per EMG sample, in registration order.
    fn on_emg(&mut self, sample: &EmgSample) -> HandlerResult;

    /// Stable name used in logs and error messages.
    fn name(&self) -> &'static str;
}

/// Subscriber callback for IMU samples.
///
/// `orientation` is the per-sample derived value; it is identical for
/// every handler invoked for the same sample.
pub trait ImuHandler {
    /// Called once per IMU sample, in registration order.
    fn on_imu(&mut self, sample: &ImuSample, orientation: &Orientation) -> HandlerResult;

    /// Stable name used in logs and error messages.
    fn name(&self) -> &'static str;
}

/// Which stream a sample or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Electromyography stream.
    Emg,
    /// Inertial stream.
    Imu,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Emg => write!(f, "emg"),
            StreamKind::Imu => write!(f, "imu"),
        }
    }
}

/// What to do when a handler fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log, count, continue with the next handler; disable a handler after
    /// repeated consecutive failures.
    #[default]
    Isolate,
    /// Halt dispatch for the sample and propagate the first failure.
    Abort,
}

/// Dispatch counters for monitoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchStats {
    /// EMG samples dispatched.
    pub emg_dispatched: u64,
    /// IMU samples dispatched.
    pub imu_dispatched: u64,
    /// Handler invocations that returned an error.
    pub handler_errors: u64,
    /// Handlers disabled by the circuit breaker.
    pub handlers_disabled: u32,
}

/// One registered handler plus its circuit-breaker state.
struct Slot<H: ?Sized> {
    handler: Box<H>,
    strikes: u8,
    disabled: bool,
}

impl<H: ?Sized> Slot<H> {
    fn new(handler: Box<H>) -> Self {
        Self {
            handler,
            strikes: 0,
            disabled: false,
        }
    }
}

/// Ordered handler registry with synchronous fan-out.
pub struct Dispatcher {
    emg: Vec<Slot<dyn EmgHandler>, MAX_HANDLERS>,
    imu: Vec<Slot<dyn ImuHandler>, MAX_HANDLERS>,
    policy: FailurePolicy,
    max_strikes: u8,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Consecutive failures before the circuit breaker disables a handler.
    pub const DEFAULT_MAX_STRIKES: u8 = 3;

    /// Create an empty registry with the default [`FailurePolicy::Isolate`].
    pub fn new() -> Self {
        Self::with_policy(FailurePolicy::default())
    }

    /// Create an empty registry with an explicit failure policy.
    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self {
            emg: Vec::new(),
            imu: Vec::new(),
            policy,
            max_strikes: Self::DEFAULT_MAX_STRIKES,
            stats: DispatchStats::default(),
        }
    }

    /// Override the circuit-breaker threshold.
    pub fn max_strikes(mut self, strikes: u8) -> Self {
        self.max_strikes = strikes;
        self
    }

    /// Append an EMG handler. Registration order is dispatch order.
    ///
    /// Only valid before the receive loop starts; the driver takes the
    /// dispatcher by value, so the type system enforces this.
    pub fn register_emg(&mut self, handler: Box<dyn EmgHandler>) -> Result<(), DispatchError> {
        self.emg
            .push(Slot::new(handler))
            .map_err(|_| DispatchError::RegistryFull { max: MAX_HANDLERS })
    }

    /// Append an IMU handler. Registration order is dispatch order.
    pub fn register_imu(&mut self, handler: Box<dyn ImuHandler>) -> Result<(), DispatchError> {
        self.imu
            .push(Slot::new(handler))
            .map_err(|_| DispatchError::RegistryFull { max: MAX_HANDLERS })
    }

    /// The configured failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Dispatch counters.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Names of registered EMG handlers, in dispatch order.
    pub fn emg_handler_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.emg.iter().map(|s| s.handler.name())
    }

    /// Names of registered IMU handlers, in dispatch order.
    pub fn imu_handler_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.imu.iter().map(|s| s.handler.name())
    }

    /// Invoke every enabled EMG handler for `sample`, in order.
    pub fn dispatch_emg(&mut self, sample: &EmgSample) -> Result<(), DispatchError> {
        self.stats.emg_dispatched += 1;
        let policy = self.policy;
        let max_strikes = self.max_strikes;
        for slot in self.emg.iter_mut() {
            if slot.disabled {
                continue;
            }
            match slot.handler.on_emg(sample) {
                Ok(()) => slot.strikes = 0,
                Err(source) => {
                    self.stats.handler_errors += 1;
                    match policy {
                        FailurePolicy::Abort => {
                            return Err(DispatchError::Handler {
                                stream: StreamKind::Emg,
                                handler: slot.handler.name(),
                                source,
                            });
                        }
                        FailurePolicy::Isolate => {
                            let name = slot.handler.name();
                            isolate(slot, name, StreamKind::Emg, &source, max_strikes);
                            if slot.disabled {
                                self.stats.handlers_disabled += 1;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Compute the per-sample orientation, then invoke every enabled IMU
    /// handler for `sample`, in order.
    ///
    /// ## Errors
    ///
    /// A [`TransformError`](crate::TransformError) always aborts the
    /// sample before any handler runs; a handler error propagates only
    /// under [`FailurePolicy::Abort`].
    pub fn dispatch_imu(&mut self, sample: &ImuSample) -> Result<(), DispatchError> {
        let orientation = quat_to_orientation(sample.rotation)?;
        self.stats.imu_dispatched += 1;
        let policy = self.policy;
        let max_strikes = self.max_strikes;
        for slot in self.imu.iter_mut() {
            if slot.disabled {
                continue;
            }
            match slot.handler.on_imu(sample, &orientation) {
                Ok(()) => slot.strikes = 0,
                Err(source) => {
                    self.stats.handler_errors += 1;
                    match policy {
                        FailurePolicy::Abort => {
                            return Err(DispatchError::Handler {
                                stream: StreamKind::Imu,
                                handler: slot.handler.name(),
                                source,
                            });
                        }
                        FailurePolicy::Isolate => {
                            let name = slot.handler.name();
                            isolate(slot, name, StreamKind::Imu, &source, max_strikes);
                            if slot.disabled {
                                self.stats.handlers_disabled += 1;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Record a failure against a slot and trip the breaker once it has had
/// `max_strikes` consecutive strikes.
fn isolate<H: ?Sized>(
    slot: &mut Slot<H>,
    name: &'static str,
    stream: StreamKind,
    source: &BoxError,
    max_strikes: u8,
) {
    slot.strikes = slot.strikes.saturating_add(1);
    log::warn!(
        "{stream} handler '{name}' failed ({}/{max_strikes}): {source}",
        slot.strikes
    );
    if slot.strikes >= max_strikes {
        slot.disabled = true;
        log::error!("{stream} handler '{name}' disabled after {max_strikes} consecutive failures");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::{Quaternion, EMG_CHANNELS};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn emg_sample() -> EmgSample {
        EmgSample {
            channels: [5; EMG_CHANNELS],
            moving: false,
        }
    }

    fn imu_sample() -> ImuSample {
        ImuSample {
            rotation: Quaternion::IDENTITY,
            angular_rate: [0.0; 3],
            acceleration: [0.0, 0.0, 1.0],
        }
    }

    /// Appends its tag to a shared trace on every call.
    struct Tracer {
        tag: &'static str,
        trace: Rc<RefCell<std::vec::Vec<&'static str>>>,
        fail: bool,
    }

    impl EmgHandler for Tracer {
        fn on_emg(&mut self, _: &EmgSample) -> HandlerResult {
            self.trace.borrow_mut().push(self.tag);
            if self.fail {
                Err("tracer failure".into())
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            self.tag
        }
    }

    impl ImuHandler for Tracer {
        fn on_imu(&mut self, _: &ImuSample, _: &Orientation) -> HandlerResult {
            self.trace.borrow_mut().push(self.tag);
            if self.fail {
                Err("tracer failure".into())
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            self.tag
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let trace = Rc::new(RefCell::new(std::vec::Vec::new()));
        let mut d = Dispatcher::new();
        for tag in ["first", "second", "third"] {
            d.register_emg(Box::new(Tracer {
                tag,
                trace: trace.clone(),
                fail: false,
            }))
            .unwrap();
        }

        d.dispatch_emg(&emg_sample()).unwrap();
        assert_eq!(*trace.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn abort_halts_remaining_handlers() {
        let trace = Rc::new(RefCell::new(std::vec::Vec::new()));
        let mut d = Dispatcher::with_policy(FailurePolicy::Abort);
        d.register_imu(Box::new(Tracer {
            tag: "bad",
            trace: trace.clone(),
            fail: true,
        }))
        .unwrap();
        d.register_imu(Box::new(Tracer {
            tag: "never",
            trace: trace.clone(),
            fail: false,
        }))
        .unwrap();

        let err = d.dispatch_imu(&imu_sample()).unwrap_err();
        assert!(matches!(err, DispatchError::Handler { handler: "bad", .. }));
        assert_eq!(*trace.borrow(), vec!["bad"]);
    }

    #[test]
    fn isolate_continues_past_failures() {
        let trace = Rc::new(RefCell::new(std::vec::Vec::new()));
        let mut d = Dispatcher::new();
        d.register_emg(Box::new(Tracer {
            tag: "bad",
            trace: trace.clone(),
            fail: true,
        }))
        .unwrap();
        d.register_emg(Box::new(Tracer {
            tag: "good",
            trace: trace.clone(),
            fail: false,
        }))
        .unwrap();

        d.dispatch_emg(&emg_sample()).unwrap();
        assert_eq!(*trace.borrow(), vec!["bad", "good"]);
        assert_eq!(d.stats().handler_errors, 1);
    }

    #[test]
    fn circuit_breaker_disables_after_max_strikes() {
        let trace = Rc::new(RefCell::new(std::vec::Vec::new()));
        let mut d = Dispatcher::new();
        d.register_emg(Box::new(Tracer {
            tag: "flaky",
            trace: trace.clone(),
            fail: true,
        }))
        .unwrap();

        for _ in 0..Dispatcher::DEFAULT_MAX_STRIKES {
            d.dispatch_emg(&emg_sample()).unwrap();
        }
        assert_eq!(d.stats().handlers_disabled, 1);

        // Disabled handler is skipped from now on
        d.dispatch_emg(&emg_sample()).unwrap();
        assert_eq!(trace.borrow().len(), Dispatcher::DEFAULT_MAX_STRIKES as usize);
    }

    #[test]
    fn transform_failure_aborts_before_any_handler() {
        let trace = Rc::new(RefCell::new(std::vec::Vec::new()));
        let mut d = Dispatcher::new();
        d.register_imu(Box::new(Tracer {
            tag: "untouched",
            trace: trace.clone(),
            fail: false,
        }))
        .unwrap();

        let bad = ImuSample {
            rotation: Quaternion::new(f32::NAN, 0.0, 0.0, 0.0),
            ..imu_sample()
        };
        assert!(matches!(
            d.dispatch_imu(&bad),
            Err(DispatchError::Transform(_))
        ));
        assert!(trace.borrow().is_empty());
        assert_eq!(d.stats().imu_dispatched, 0);
    }

    #[test]
    fn registry_has_a_ceiling() {
        let trace = Rc::new(RefCell::new(std::vec::Vec::new()));
        let mut d = Dispatcher::new();
        for _ in 0..MAX_HANDLERS {
            d.register_emg(Box::new(Tracer {
                tag: "h",
                trace: trace.clone(),
                fail: false,
            }))
            .unwrap();
        }
        let err = d
            .register_emg(Box::new(Tracer {
                tag: "overflow",
                trace: trace.clone(),
                fail: false,
            }))
            .unwrap_err();
        assert!(matches!(err, DispatchError::RegistryFull { max: MAX_HANDLERS }));
    }
}
