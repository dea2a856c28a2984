use std::net::IpAddr;

use clap::Parser;
use myolink_core::history::DEFAULT_MAX;

#[derive(Parser, Debug)]
#[command(
    name = "myolink",
    version,
    about = "Stream Myo armband EMG/IMU data, optionally republished over OSC",
    long_about = "Connects to the armband, fans each EMG and IMU sample out to the\n\
                  configured handlers (logging, bounded history, optional OSC), and\n\
                  runs until Ctrl-C or the device closes the stream."
)]
pub struct Cli {
    /// Send OSC messages to the configured endpoint (0 = off, 1 = on)
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub send: u8,

    /// Destination IP for OSC messages
    #[arg(short, long, default_value = "127.0.0.1")]
    pub ip: IpAddr,

    /// Destination port for OSC messages
    #[arg(short, long, default_value_t = 57120)]
    pub port: u16,

    /// Samples retained per history window
    #[arg(long, default_value_t = DEFAULT_MAX)]
    pub history: usize,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn defaults_match_documented_surface() {
        let cli = Cli::try_parse_from(["myolink"]).unwrap();
        assert_eq!(cli.send, 0);
        assert_eq!(cli.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(cli.port, 57120);
        assert_eq!(cli.history, 100);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn short_flags_parse() {
        let cli = Cli::try_parse_from(["myolink", "-s", "1", "-i", "10.0.0.7", "-p", "9000", "-vv"])
            .unwrap();
        assert_eq!(cli.send, 1);
        assert_eq!(cli.ip, "10.0.0.7".parse::<IpAddr>().unwrap());
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn send_rejects_values_other_than_0_and_1() {
        assert!(Cli::try_parse_from(["myolink", "--send", "2"]).is_err());
    }

    #[test]
    fn malformed_ip_is_rejected() {
        assert!(Cli::try_parse_from(["myolink", "--ip", "not-an-ip"]).is_err());
    }
}
