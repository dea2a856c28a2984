//! Device Driver Boundary
//!
//! ## Overview
//!
//! The physical armband driver (BLE discovery, connection, raw protocol
//! decoding) lives outside this crate. What the pipeline needs from it is
//! small: connect, disconnect, and a bounded poll step that yields at most
//! one decoded frame. That contract is the [`Device`] trait; everything in
//! the pipeline is written against it, never against hardware.
//!
//! Two implementations ship with the crate:
//!
//! - [`ReplayDevice`] feeds a pre-recorded frame sequence and then reports
//!   end of stream. It is the test double for the whole pipeline.
//! - [`SimulatedDevice`] synthesizes a plausible interleaved EMG/IMU
//!   stream (a slow rotation about z with gravity on the acceleration
//!   vector, plus low-amplitude EMG noise) so the binary is usable
//!   without hardware.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::errors::ConnectionError;
use crate::samples::{EmgSample, ImuSample, Quaternion, EMG_CHANNELS};

/// One decoded frame from the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// An EMG sample.
    Emg(EmgSample),
    /// An IMU sample.
    Imu(ImuSample),
}

/// Outcome of one bounded poll step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll {
    /// A frame was decoded within the timeout.
    Frame(Frame),
    /// The timeout elapsed with nothing to report.
    Idle,
    /// The device signalled end of stream; no more frames will come.
    Closed,
}

/// Contract the pipeline consumes from the device driver.
pub trait Device {
    /// Discover and open the device. Fatal at startup if it fails.
    fn connect(&mut self) -> Result<(), ConnectionError>;

    /// Release the device. Must be safe to call after any failure.
    fn disconnect(&mut self);

    /// Perform one bounded wait, yielding at most one decoded frame.
    fn poll(&mut self, timeout: Duration) -> Result<Poll, ConnectionError>;
}

/// Replays a fixed frame sequence, then closes. Test double.
#[derive(Debug, Default)]
pub struct ReplayDevice {
    frames: VecDeque<Frame>,
    connected: bool,
    fail_connect: Option<&'static str>,
}

impl ReplayDevice {
    /// Build from the frames to replay, in order.
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            connected: false,
            fail_connect: None,
        }
    }

    /// A device whose `connect` fails with the given reason.
    pub fn unavailable(reason: &'static str) -> Self {
        Self {
            frames: VecDeque::new(),
            connected: false,
            fail_connect: Some(reason),
        }
    }

    /// Frames not yet replayed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Device for ReplayDevice {
    fn connect(&mut self) -> Result<(), ConnectionError> {
        if let Some(reason) = self.fail_connect {
            return Err(ConnectionError::Unavailable { reason });
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn poll(&mut self, _timeout: Duration) -> Result<Poll, ConnectionError> {
        if !self.connected {
            return Err(ConnectionError::NotConnected);
        }
        match self.frames.pop_front() {
            Some(frame) => Ok(Poll::Frame(frame)),
            None => Ok(Poll::Closed),
        }
    }
}

/// Synthesizes an endless EMG/IMU stream at roughly the armband's rates.
///
/// Deterministic: the stream is a pure function of the internal step
/// counter, so two runs produce identical frames.
#[derive(Debug)]
pub struct SimulatedDevice {
    step: u64,
    connected: bool,
    frame_interval: Duration,
}

impl SimulatedDevice {
    /// Interval between synthesized frames (~100 Hz interleaved).
    const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

    /// Create a simulator with the default pacing.
    pub fn new() -> Self {
        Self {
            step: 0,
            connected: false,
            frame_interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// Override the pacing interval (useful to speed tests up).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    fn emg_at(step: u64) -> EmgSample {
        let mut channels = [0i16; EMG_CHANNELS];
        let t = step as f32 * 0.05;
        for (i, ch) in channels.iter_mut().enumerate() {
            // Small per-channel oscillation, phase-shifted per channel
            *ch = (libm::sinf(t + i as f32) * 40.0) as i16;
        }
        EmgSample {
            channels,
            moving: step % 64 < 32,
        }
    }

    fn imu_at(step: u64) -> ImuSample {
        // Slow rotation about z, one revolution every ~1250 frames
        let half_angle = step as f32 * 0.0025;
        ImuSample {
            rotation: Quaternion::new(libm::cosf(half_angle), 0.0, 0.0, libm::sinf(half_angle)),
            angular_rate: [0.0, 0.0, 0.5],
            acceleration: [0.0, 0.0, 1.0],
        }
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for SimulatedDevice {
    fn connect(&mut self) -> Result<(), ConnectionError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn poll(&mut self, timeout: Duration) -> Result<Poll, ConnectionError> {
        if !self.connected {
            return Err(ConnectionError::NotConnected);
        }

        thread::sleep(self.frame_interval.min(timeout));

        let step = self.step;
        self.step += 1;
        // Alternate streams: odd steps EMG, even steps IMU
        let frame = if step % 2 == 0 {
            Frame::Imu(Self::imu_at(step))
        } else {
            Frame::Emg(Self::emg_at(step))
        };
        Ok(Poll::Frame(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_yields_then_closes() {
        let emg = EmgSample {
            channels: [1; EMG_CHANNELS],
            moving: false,
        };
        let mut dev = ReplayDevice::new([Frame::Emg(emg)]);
        dev.connect().unwrap();

        assert_eq!(
            dev.poll(Duration::ZERO).unwrap(),
            Poll::Frame(Frame::Emg(emg))
        );
        assert_eq!(dev.poll(Duration::ZERO).unwrap(), Poll::Closed);
        assert_eq!(dev.poll(Duration::ZERO).unwrap(), Poll::Closed);
    }

    #[test]
    fn replay_requires_connect() {
        let mut dev = ReplayDevice::new([]);
        assert!(matches!(
            dev.poll(Duration::ZERO),
            Err(ConnectionError::NotConnected)
        ));
    }

    #[test]
    fn unavailable_device_fails_connect() {
        let mut dev = ReplayDevice::unavailable("no adapter");
        assert!(matches!(
            dev.connect(),
            Err(ConnectionError::Unavailable { reason: "no adapter" })
        ));
    }

    #[test]
    fn simulator_is_deterministic() {
        let a = SimulatedDevice::imu_at(10);
        let b = SimulatedDevice::imu_at(10);
        assert_eq!(a, b);
        assert!(a.rotation.is_finite());
    }

    #[test]
    fn simulator_alternates_streams() {
        let mut dev = SimulatedDevice::new().with_interval(Duration::ZERO);
        dev.connect().unwrap();

        let first = dev.poll(Duration::ZERO).unwrap();
        let second = dev.poll(Duration::ZERO).unwrap();
        assert!(matches!(first, Poll::Frame(Frame::Imu(_))));
        assert!(matches!(second, Poll::Frame(Frame::Emg(_))));
    }
}
