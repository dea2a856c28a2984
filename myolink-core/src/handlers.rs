//! Built-in Subscriber Handlers
//!
//! The handlers every deployment wants regardless of publishing: verbose
//! per-sample logging and bounded history tracking. Outbound publishing
//! handlers live in the `myolink-osc` crate so the core stays free of
//! network dependencies.
//!
//! History handlers hold [`SharedHistory`] handles; the wiring layer keeps
//! a clone of each handle so snapshots stay reachable after the handler is
//! boxed into the registry. EMG history retains the full sample (channels
//! plus moving flag together, so the two can never drift apart); IMU
//! history keeps orientation and acceleration in two buffers with
//! independent bounds, both pushed from the same per-dispatch values.

use crate::dispatch::{EmgHandler, HandlerResult, ImuHandler};
use crate::history::{HistoryBuffer, SharedHistory};
use crate::samples::{EmgSample, ImuSample, Orientation};

/// Logs every EMG sample at debug level.
pub struct EmgLogHandler;

impl EmgHandler for EmgLogHandler {
    fn on_emg(&mut self, sample: &EmgSample) -> HandlerResult {
        log::debug!("emg {:?} moving={}", sample.channels, sample.moving);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "emg_log"
    }
}

/// Logs the derived orientation and acceleration of every IMU sample.
pub struct ImuLogHandler;

impl ImuHandler for ImuLogHandler {
    fn on_imu(&mut self, sample: &ImuSample, orientation: &Orientation) -> HandlerResult {
        log::debug!("imu {orientation} acc={:?}", sample.acceleration);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "imu_log"
    }
}

/// Appends every EMG sample to a bounded history window.
pub struct EmgHistoryHandler {
    history: SharedHistory<EmgSample>,
}

impl EmgHistoryHandler {
    /// Create a handler with its own window of `max` samples, returning
    /// the handler and a shared handle for reading it.
    pub fn new(max: usize) -> (Self, SharedHistory<EmgSample>) {
        let history = HistoryBuffer::shared(max);
        (
            Self {
                history: history.clone(),
            },
            history,
        )
    }
}

impl EmgHandler for EmgHistoryHandler {
    fn on_emg(&mut self, sample: &EmgSample) -> HandlerResult {
        self.history.borrow_mut().push(*sample);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "emg_history"
    }
}

/// Appends each IMU sample's derived orientation and raw acceleration to
/// two independently-bounded history windows.
pub struct ImuHistoryHandler {
    orientation: SharedHistory<Orientation>,
    acceleration: SharedHistory<[f32; 3]>,
}

/// Read handles for the two IMU history windows.
pub struct ImuHistoryHandles {
    /// Derived orientation window, newest first.
    pub orientation: SharedHistory<Orientation>,
    /// Raw acceleration window, newest first.
    pub acceleration: SharedHistory<[f32; 3]>,
}

impl ImuHistoryHandler {
    /// Create a handler whose two windows each retain `max` samples.
    pub fn new(max: usize) -> (Self, ImuHistoryHandles) {
        let orientation = HistoryBuffer::shared(max);
        let acceleration = HistoryBuffer::shared(max);
        (
            Self {
                orientation: orientation.clone(),
                acceleration: acceleration.clone(),
            },
            ImuHistoryHandles {
                orientation,
                acceleration,
            },
        )
    }
}

impl ImuHandler for ImuHistoryHandler {
    fn on_imu(&mut self, sample: &ImuSample, orientation: &Orientation) -> HandlerResult {
        // Both windows are fed from the same per-dispatch values
        self.orientation.borrow_mut().push(*orientation);
        self.acceleration.borrow_mut().push(sample.acceleration);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "imu_history"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::{Quaternion, EMG_CHANNELS};

    #[test]
    fn emg_history_retains_newest_first() {
        let (mut handler, history) = EmgHistoryHandler::new(2);
        for v in 0..3 {
            let sample = EmgSample {
                channels: [v; EMG_CHANNELS],
                moving: false,
            };
            handler.on_emg(&sample).unwrap();
        }

        let snap = history.borrow().snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].channels[0], 2);
        assert_eq!(snap[1].channels[0], 1);
    }

    #[test]
    fn imu_history_tracks_both_windows() {
        let (mut handler, handles) = ImuHistoryHandler::new(4);
        let sample = ImuSample {
            rotation: Quaternion::IDENTITY,
            angular_rate: [0.0; 3],
            acceleration: [0.1, 0.2, 0.3],
        };
        let orientation = Orientation::new(1.0, 2.0, 3.0);
        handler.on_imu(&sample, &orientation).unwrap();

        assert_eq!(handles.orientation.borrow().latest(), Some(&orientation));
        assert_eq!(
            handles.acceleration.borrow().latest(),
            Some(&[0.1, 0.2, 0.3])
        );
    }
}
