//! Wiring: builds the dispatcher from CLI options and drives the device.
//!
//! Handler registration order is load-bearing; for each stream the
//! logging handler runs first, then history tracking, then OSC
//! publishing when enabled. No UDP socket is opened unless `--send 1`
//! was given.

use std::net::IpAddr;
use std::sync::atomic::AtomicBool;

use myolink_core::device::SimulatedDevice;
use myolink_core::handlers::{
    EmgHistoryHandler, EmgLogHandler, ImuHistoryHandler, ImuHistoryHandles, ImuLogHandler,
};
use myolink_core::{Dispatcher, EmgSample, PipelineDriver, SharedHistory};
use myolink_osc::{EmgOscHandler, ImuOscHandler, OscClient, SharedOscClient};

use crate::cli::Cli;

pub type RunError = Box<dyn std::error::Error + Send + Sync>;

/// Everything the pipeline needs to be wired, taken from the parsed CLI.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub send: bool,
    pub ip: IpAddr,
    pub port: u16,
    pub history: usize,
}

impl From<&Cli> for PipelineConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            send: cli.send == 1,
            ip: cli.ip,
            port: cli.port,
            history: cli.history,
        }
    }
}

/// Read-side handles kept by the wiring layer after the handlers are
/// boxed into the registry.
pub struct PipelineHandles {
    pub emg_history: SharedHistory<EmgSample>,
    pub imu_history: ImuHistoryHandles,
    pub client: Option<SharedOscClient>,
}

/// Register the handler set for `config`, returning the dispatcher and
/// the read handles for the history windows and OSC client.
pub fn build_dispatcher(
    config: &PipelineConfig,
) -> Result<(Dispatcher, PipelineHandles), RunError> {
    let mut dispatcher = Dispatcher::new();

    dispatcher.register_emg(Box::new(EmgLogHandler))?;
    dispatcher.register_imu(Box::new(ImuLogHandler))?;

    let (emg_history, emg_handle) = EmgHistoryHandler::new(config.history);
    dispatcher.register_emg(Box::new(emg_history))?;
    let (imu_history, imu_handles) = ImuHistoryHandler::new(config.history);
    dispatcher.register_imu(Box::new(imu_history))?;

    let client = if config.send {
        let client = OscClient::connect(config.ip, config.port)?.into_shared();
        dispatcher.register_emg(Box::new(EmgOscHandler::new(client.clone())))?;
        dispatcher.register_imu(Box::new(ImuOscHandler::new(client.clone())))?;
        Some(client)
    } else {
        log::info!("OSC publishing disabled");
        None
    };

    Ok((
        dispatcher,
        PipelineHandles {
            emg_history: emg_handle,
            imu_history: imu_handles,
            client,
        },
    ))
}

/// Run the pipeline to completion. Blocking; returns when the stop flag
/// is raised, the device closes the stream, or a fatal error occurs.
pub fn run_pipeline(config: PipelineConfig, stop: &AtomicBool) -> Result<(), RunError> {
    let (dispatcher, handles) = build_dispatcher(&config)?;

    let device = SimulatedDevice::new();
    let mut driver = PipelineDriver::new(device, dispatcher);

    let result = driver.run(stop);

    let stats = driver.stats();
    log::info!(
        "dispatched {} emg / {} imu samples, {} handler errors, {} handlers disabled",
        stats.emg_dispatched,
        stats.imu_dispatched,
        stats.handler_errors,
        stats.handlers_disabled,
    );
    log::info!(
        "history windows: {} emg samples, {} orientations retained",
        handles.emg_history.borrow().len(),
        handles.imu_history.orientation.borrow().len(),
    );
    if let Some(orientation) = handles.imu_history.orientation.borrow().latest() {
        log::info!("last orientation: {orientation}");
    }
    if let Some(client) = &handles.client {
        let publish = client.borrow().stats();
        log::info!(
            "published {} OSC messages ({} bytes), {} failed",
            publish.messages_sent,
            publish.bytes_sent,
            publish.messages_failed,
        );
    }

    result.map_err(RunError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn config(send: bool, port: u16) -> PipelineConfig {
        PipelineConfig {
            send,
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            history: 100,
        }
    }

    #[test]
    fn send_disabled_registers_no_osc_handlers() {
        let (dispatcher, handles) = build_dispatcher(&config(false, 57120)).unwrap();
        assert!(handles.client.is_none());
        assert_eq!(handles.emg_history.borrow().max_len(), 100);

        let emg: Vec<_> = dispatcher.emg_handler_names().collect();
        let imu: Vec<_> = dispatcher.imu_handler_names().collect();
        assert_eq!(emg, ["emg_log", "emg_history"]);
        assert_eq!(imu, ["imu_log", "imu_history"]);
    }

    #[test]
    fn send_enabled_appends_osc_handlers_last() {
        // A throwaway receiver gives us a real port; nothing reads it.
        let receiver = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = receiver.local_addr().unwrap().port();
        let (dispatcher, handles) = build_dispatcher(&config(true, port)).unwrap();
        assert!(handles.client.is_some());

        let emg: Vec<_> = dispatcher.emg_handler_names().collect();
        let imu: Vec<_> = dispatcher.imu_handler_names().collect();
        assert_eq!(emg, ["emg_log", "emg_history", "emg_osc"]);
        assert_eq!(imu, ["imu_log", "imu_history", "imu_osc"]);
    }

    #[test]
    fn cli_maps_onto_config() {
        use clap::Parser;
        let cli = Cli::try_parse_from(["myolink", "-s", "1", "-p", "9001", "--history", "32"])
            .unwrap();
        let config = PipelineConfig::from(&cli);
        assert!(config.send);
        assert_eq!(config.port, 9001);
        assert_eq!(config.history, 32);
    }
}
