//! UDP client and OSC message construction.

use std::cell::RefCell;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::rc::Rc;

use rosc::{encoder, OscMessage, OscPacket, OscType};

use myolink_core::{EmgSample, Orientation};

use crate::PublishError;

/// OSC address for EMG messages.
pub const EMG_ADDR: &str = "/myo/emg";

/// OSC address for IMU messages.
pub const IMU_ADDR: &str = "/myo/imu";

/// Shared handle to one client, so the EMG and IMU handlers publish over
/// the same socket. Single-threaded pipeline, hence `Rc<RefCell<..>>`.
pub type SharedOscClient = Rc<RefCell<OscClient>>;

/// Publishing counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PublisherStats {
    /// Messages handed to the socket successfully.
    pub messages_sent: u64,
    /// Messages that failed to encode or send.
    pub messages_failed: u64,
    /// Total payload bytes sent.
    pub bytes_sent: u64,
}

/// Fire-and-forget OSC publisher over a connected UDP socket.
pub struct OscClient {
    socket: UdpSocket,
    endpoint: SocketAddr,
    stats: PublisherStats,
}

impl OscClient {
    /// Bind an ephemeral local socket and connect it to `ip:port`.
    ///
    /// UDP "connect" only fixes the destination; it does not verify a
    /// peer is listening.
    pub fn connect(ip: IpAddr, port: u16) -> Result<Self, PublishError> {
        let endpoint = SocketAddr::new(ip, port);

        // Bind on the unspecified address of the matching family
        let local: SocketAddr = if endpoint.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).map_err(|source| PublishError::Socket {
            endpoint,
            source,
        })?;
        socket
            .connect(endpoint)
            .map_err(|source| PublishError::Socket { endpoint, source })?;

        log::info!("publishing OSC to {endpoint}");
        Ok(Self {
            socket,
            endpoint,
            stats: PublisherStats::default(),
        })
    }

    /// Wrap the client in a shared handle.
    pub fn into_shared(self) -> SharedOscClient {
        Rc::new(RefCell::new(self))
    }

    /// The configured destination.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /// Publishing counters.
    pub fn stats(&self) -> PublisherStats {
        self.stats
    }

    /// Publish one EMG sample as `/myo/emg` with 8 int32 args.
    pub fn publish_emg(&mut self, sample: &EmgSample) -> Result<(), PublishError> {
        self.send(emg_packet(sample))
    }

    /// Publish one IMU sample as `/myo/imu` with 6 float32 args:
    /// yaw, roll, pitch, then the acceleration vector.
    pub fn publish_imu(
        &mut self,
        orientation: &Orientation,
        acceleration: [f32; 3],
    ) -> Result<(), PublishError> {
        self.send(imu_packet(orientation, acceleration))
    }

    fn send(&mut self, packet: OscPacket) -> Result<(), PublishError> {
        let bytes = encoder::encode(&packet).map_err(|source| {
            self.stats.messages_failed += 1;
            PublishError::Encode {
                endpoint: self.endpoint,
                source,
            }
        })?;

        match self.socket.send(&bytes) {
            Ok(n) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += n as u64;
                Ok(())
            }
            Err(source) => {
                self.stats.messages_failed += 1;
                Err(PublishError::Socket {
                    endpoint: self.endpoint,
                    source,
                })
            }
        }
    }
}

fn emg_packet(sample: &EmgSample) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: EMG_ADDR.to_string(),
        args: sample
            .channels
            .iter()
            .map(|&ch| OscType::Int(ch as i32))
            .collect(),
    })
}

fn imu_packet(orientation: &Orientation, acceleration: [f32; 3]) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: IMU_ADDR.to_string(),
        args: vec![
            OscType::Float(orientation.yaw),
            OscType::Float(orientation.roll),
            OscType::Float(orientation.pitch),
            OscType::Float(acceleration[0]),
            OscType::Float(acceleration[1]),
            OscType::Float(acceleration[2]),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::decoder;

    fn decode(packet: OscPacket) -> OscMessage {
        let bytes = encoder::encode(&packet).unwrap();
        let (_, decoded) = decoder::decode_udp(&bytes).unwrap();
        match decoded {
            OscPacket::Message(msg) => msg,
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn emg_message_is_8_ints() {
        let sample = EmgSample {
            channels: [1, -2, 3, -4, 5, -6, 7, -8],
            moving: true,
        };
        let msg = decode(emg_packet(&sample));
        assert_eq!(msg.addr, "/myo/emg");
        assert_eq!(msg.args.len(), 8);
        assert_eq!(msg.args[0], OscType::Int(1));
        assert_eq!(msg.args[7], OscType::Int(-8));
    }

    #[test]
    fn imu_message_is_orientation_then_acceleration() {
        let orientation = Orientation::new(0.1, 0.2, 0.3);
        let msg = decode(imu_packet(&orientation, [9.0, 8.0, 7.0]));
        assert_eq!(msg.addr, "/myo/imu");
        assert_eq!(msg.args.len(), 6);
        assert_eq!(msg.args[0], OscType::Float(0.1));
        assert_eq!(msg.args[1], OscType::Float(0.2));
        assert_eq!(msg.args[2], OscType::Float(0.3));
        assert_eq!(msg.args[3], OscType::Float(9.0));
        assert_eq!(msg.args[5], OscType::Float(7.0));
    }
}
