//! Connection supervisor
//!
//! Owns the discovery backend, the open transport (if any) and the link
//! state machine. One call to [`Supervisor::step`] is one iteration of the
//! watch loop: either a connection attempt or one poll of an open device.
//!
//! The dongle may keep reporting a stale link state right after it is
//! plugged in, so a fresh connection is confirmed with a ping probe before
//! the initial layout is chosen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use dongle_transport::protocol::{self, READ_BUFFER_SIZE};
use dongle_transport::{
    classify_inbound, encode_lighting_packet, Channel, DeviceDiscovery, InboundEvent,
    LightingConfiguration, Packet, Transport, TransportError,
};
use tracing::{debug, info, warn};

use crate::config::{TimingConfig, WatcherConfig};
use crate::error::WatcherError;
use crate::layout::LayoutSwitcher;
use crate::link::{LinkState, LinkStateMachine};

/// What a single [`Supervisor::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No dongle attached; backed off
    NotFound,
    /// Discovery or open failed; backed off
    ConnectFailed,
    /// Opened and probed a dongle
    Connected(LinkState),
    /// Polled an open dongle
    Polled,
    /// The dongle failed hard and was dropped (backed off if it failed
    /// while being probed)
    Removed,
}

pub struct Supervisor {
    discovery: Box<dyn DeviceDiscovery>,
    link: LinkStateMachine,
    timing: TimingConfig,
    /// Lighting packet written before the first ping
    greeting: Packet,
    transport: Option<Box<dyn Transport>>,
}

impl Supervisor {
    pub fn new(
        discovery: Box<dyn DeviceDiscovery>,
        link: LinkStateMachine,
        timing: TimingConfig,
        greeting: Packet,
    ) -> Self {
        Self {
            discovery,
            link,
            timing,
            greeting,
            transport: None,
        }
    }

    /// Wire up a supervisor from the loaded configuration
    pub fn from_config(
        config: &WatcherConfig,
        discovery: Box<dyn DeviceDiscovery>,
        switcher: Box<dyn LayoutSwitcher>,
    ) -> Self {
        let link = LinkStateMachine::new(
            config.layout.primary.clone(),
            config.layout.fallback.clone(),
            switcher,
        );
        Self::new(
            discovery,
            link,
            config.timing,
            protocol::ripple_packet(config.ripple.preset()),
        )
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Run one iteration of the watch loop
    ///
    /// Every failed connection attempt backs off, including a dongle that
    /// opens but fails during the probe.
    pub fn step(&mut self) -> StepOutcome {
        if self.transport.is_some() {
            return self.poll();
        }

        match self.try_connect() {
            Ok(state) => StepOutcome::Connected(state),
            Err((outcome, e)) => {
                match e {
                    WatcherError::NotFound => debug!("Dongle not found"),
                    // Removal during the probe was already reported
                    _ if outcome == StepOutcome::Removed => {}
                    e => warn!("{e}"),
                }
                debug!("Retrying in {} ms", self.timing.backoff_ms);
                thread::sleep(self.timing.backoff());
                outcome
            }
        }
    }

    /// Loop until `running` is cleared, then release the device
    pub fn run(&mut self, running: &AtomicBool) {
        info!("Watching dongle link (Ctrl+C to stop)");
        while running.load(Ordering::SeqCst) {
            self.step();
        }
        self.close();
        info!("Stopped");
    }

    /// Discover, open and probe the dongle, then settle the initial state
    ///
    /// Does not back off. A hard error during the probe is handled as a
    /// removal before it is returned.
    pub fn connect(&mut self) -> Result<LinkState, WatcherError> {
        self.try_connect().map_err(|(_, e)| e)
    }

    fn try_connect(&mut self) -> Result<LinkState, (StepOutcome, WatcherError)> {
        if self.transport.is_some() {
            return Ok(self.link.state());
        }

        let device = match self.discovery.find_device() {
            Ok(Some(device)) => device,
            Ok(None) => return Err((StepOutcome::NotFound, WatcherError::NotFound)),
            Err(e) => return Err((StepOutcome::ConnectFailed, e.into())),
        };
        info!(
            "Found dongle {:04X}:{:04X} at {}",
            device.info.vid, device.info.pid, device.info.device_path
        );

        let transport = self
            .discovery
            .open_device(&device)
            .map_err(|e| (StepOutcome::ConnectFailed, e.into()))?;
        self.transport = Some(transport);

        match self.probe() {
            Ok(pong_seen) => {
                self.link.resolve_initial(pong_seen);
                Ok(self.link.state())
            }
            Err(e) => {
                self.handle_removal(&e);
                Err((StepOutcome::Removed, e.into()))
            }
        }
    }

    /// Wake the dongle and ping it until it answers
    ///
    /// Status reports that arrive in between are dispatched as usual.
    /// Write failures are logged and the probe goes on; read failures abort
    /// it.
    ///
    /// # Returns
    /// Whether a ping reply was seen
    pub fn probe(&mut self) -> Result<bool, TransportError> {
        let timing = self.timing;
        let transport = self.transport.as_mut().ok_or(TransportError::Disconnected)?;

        if let Err(e) = transport.send_packet(&self.greeting) {
            warn!("Wake-up packet failed: {e}");
        }
        thread::sleep(timing.probe_settle());

        let mut buf = [0u8; READ_BUFFER_SIZE];
        for attempt in 1..=timing.probe_attempts {
            if let Err(e) = transport.send_packet(&protocol::PING) {
                warn!("Ping {attempt} failed: {e}");
            }

            let len = transport.read(Channel::Command, &mut buf, timing.probe_command_timeout_ms)?;
            if classify_inbound(&buf[..len], Channel::Command) == InboundEvent::LivenessReply {
                debug!("Ping answered on attempt {attempt}");
                return Ok(true);
            }

            let len = transport.read(Channel::Status, &mut buf, timing.probe_status_timeout_ms)?;
            self.link.handle(classify_inbound(&buf[..len], Channel::Status));
        }

        debug!("No ping reply after {} attempts", timing.probe_attempts);
        Ok(false)
    }

    /// One steady-state poll: wait for a status report, then drain pongs
    fn poll(&mut self) -> StepOutcome {
        let Some(transport) = self.transport.as_mut() else {
            return StepOutcome::NotFound;
        };
        let mut buf = [0u8; READ_BUFFER_SIZE];

        match transport.read(Channel::Status, &mut buf, self.timing.status_poll_timeout_ms) {
            Ok(len) => {
                self.link.handle(classify_inbound(&buf[..len], Channel::Status));
            }
            Err(e) => {
                self.handle_removal(&e);
                return StepOutcome::Removed;
            }
        }

        match transport.read(Channel::Command, &mut buf, self.timing.command_drain_timeout_ms) {
            Ok(len) => {
                self.link.handle(classify_inbound(&buf[..len], Channel::Command));
                StepOutcome::Polled
            }
            Err(e) => {
                self.handle_removal(&e);
                StepOutcome::Removed
            }
        }
    }

    fn handle_removal(&mut self, error: &TransportError) {
        warn!("Dongle lost: {error}");
        self.close();
        self.link.reset();
    }

    /// Encode a lighting configuration and send it to the open dongle
    pub fn send_lighting(
        &mut self,
        config: &LightingConfiguration,
    ) -> Result<Packet, WatcherError> {
        let transport = self.transport.as_mut().ok_or(WatcherError::NotFound)?;
        let packet = encode_lighting_packet(config);
        debug!("Sending {:?}", packet);
        transport.send_packet(&packet)?;
        Ok(packet)
    }

    /// Close the transport if one is open
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            info!("Closed {}", transport.device_info().device_path);
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.close();
    }
}
