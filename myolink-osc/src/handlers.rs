//! Dispatcher handlers that forward samples to the OSC client.
//!
//! Both handlers share one [`OscClient`] so EMG and IMU traffic leaves
//! through the same socket. Publish failures are returned to the
//! dispatcher untouched; whether they halt the pipeline or merely disable
//! the handler is the dispatcher's failure policy, not ours.

use myolink_core::dispatch::{EmgHandler, HandlerResult, ImuHandler};
use myolink_core::{EmgSample, ImuSample, Orientation};

use crate::client::SharedOscClient;

/// Publishes every EMG sample to `/myo/emg`.
pub struct EmgOscHandler {
    client: SharedOscClient,
}

impl EmgOscHandler {
    /// Wrap a shared client.
    pub fn new(client: SharedOscClient) -> Self {
        Self { client }
    }
}

impl EmgHandler for EmgOscHandler {
    fn on_emg(&mut self, sample: &EmgSample) -> HandlerResult {
        self.client.borrow_mut().publish_emg(sample)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "emg_osc"
    }
}

/// Publishes every IMU sample's orientation and acceleration to `/myo/imu`.
pub struct ImuOscHandler {
    client: SharedOscClient,
}

impl ImuOscHandler {
    /// Wrap a shared client.
    pub fn new(client: SharedOscClient) -> Self {
        Self { client }
    }
}

impl ImuHandler for ImuOscHandler {
    fn on_imu(&mut self, sample: &ImuSample, orientation: &Orientation) -> HandlerResult {
        self.client
            .borrow_mut()
            .publish_imu(orientation, sample.acceleration)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "imu_osc"
    }
}
