//! OSC-over-UDP Republishing for Myolink
//!
//! ## Overview
//!
//! Adapts EMG and IMU samples into Open Sound Control messages and fires
//! them at a single UDP endpoint, typically a live-coding or audio/visual
//! environment (the default port, 57120, is SuperCollider's sclang).
//!
//! ## Wire Format
//!
//! | Address     | Payload                                             |
//! |-------------|-----------------------------------------------------|
//! | `/myo/emg`  | 8 int32 raw channel amplitudes                      |
//! | `/myo/imu`  | 6 float32: yaw, roll, pitch, accX, accY, accZ       |
//!
//! ## Failure Model
//!
//! UDP is fire-and-forget: delivery is not guaranteed and no retries are
//! attempted. What *is* guaranteed is that every failure is a
//! [`PublishError`] naming the configured endpoint, so the operator knows
//! which peer to look at, and that transport trouble stays inside the
//! publishing handlers; the dispatcher's failure policy decides whether
//! it takes the pipeline down.
//!
//! No socket is opened unless a client is constructed; when publishing is
//! disabled the wiring layer simply never builds one.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod handlers;

pub use client::{OscClient, PublisherStats, SharedOscClient, EMG_ADDR, IMU_ADDR};
pub use handlers::{EmgOscHandler, ImuOscHandler};

use std::net::SocketAddr;

use thiserror::Error;

/// Outbound publishing failure, always naming the configured endpoint.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The UDP socket could not be opened, connected, or written.
    #[error("OSC endpoint {endpoint}: socket error: {source}")]
    Socket {
        /// Destination the client was configured with.
        endpoint: SocketAddr,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The sample could not be encoded as an OSC packet.
    #[error("OSC endpoint {endpoint}: encode failed: {source}")]
    Encode {
        /// Destination the client was configured with.
        endpoint: SocketAddr,
        /// Encoder failure from `rosc`.
        #[source]
        source: rosc::OscError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn errors_name_the_endpoint() {
        let endpoint = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 57120);
        let err = PublishError::Socket {
            endpoint,
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("127.0.0.1"));
        assert!(msg.contains("57120"));
    }
}
