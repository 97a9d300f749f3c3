// src/controller.rs - Context object and the single-threaded control cycle
use thiserror::Error;
use tokio::time::sleep;

use crate::config::{ButtonMode, Config};
use crate::gateway::{self, RegisterMap};
use crate::host::{HostPort, SerialHostPort};
use crate::io::{
    DebouncedInput, EdgeDebounce, EstopOutput, LogEstop, NullInput, PolledDebounce, RgLed,
};
use crate::motor::lifecycle::SETTLE_DELAY;
use crate::motor::{Axis, MotorChannel, MotorStatus};
use crate::router::{self, Command, OperatingMode};
use crate::transport::adu::{EX_GATEWAY_PATH_UNAVAILABLE, EX_GATEWAY_TARGET_FAILED};
use crate::transport::SerialTransport;

/// Reported to the host on VERSION and at startup.
pub const VERSION: &str = concat!("magx-eslm-", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("serial error: {0}")]
    Serial(#[from] tokio_serial::Error),
}

/// Everything the control loop owns: both drive channels, the host port,
/// panel I/O and the process-wide operating mode. One instance, one
/// owner; all mutation happens inside one cycle's sequential execution,
/// so no synchronization is needed.
pub struct Controller {
    mode: OperatingMode,
    timing: crate::config::TimingConfig,
    gateway_unit: u8,
    x_subordinate: u8,
    y_subordinate: u8,
    host: Box<dyn HostPort>,
    x: MotorChannel,
    y: MotorChannel,
    x_led: RgLed,
    y_led: RgLed,
    x_fault: bool,
    y_fault: bool,
    estop: Box<dyn EstopOutput>,
    enable_button: Box<dyn DebouncedInput>,
    disable_button: Box<dyn DebouncedInput>,
}

impl Controller {
    pub fn new(
        config: &Config,
        host: Box<dyn HostPort>,
        x: MotorChannel,
        y: MotorChannel,
        enable_button: Box<dyn DebouncedInput>,
        disable_button: Box<dyn DebouncedInput>,
        estop: Box<dyn EstopOutput>,
    ) -> Self {
        Self {
            mode: OperatingMode::Ascii,
            timing: config.timing.clone(),
            gateway_unit: config.gateway.unit,
            x_subordinate: config.axis.x.subordinate_unit,
            y_subordinate: config.axis.y.subordinate_unit,
            host,
            x,
            y,
            x_led: RgLed::new(),
            y_led: RgLed::new(),
            x_fault: false,
            y_fault: false,
            estop,
            enable_button,
            disable_button,
        }
    }

    /// Open the real serial links and panel wiring described by `config`.
    pub fn connect(config: &Config) -> Result<Self, ControllerError> {
        config.validate()?;
        let host = SerialHostPort::open(&config.host.port, config.host.baud)?;
        let timeout = config.timing.response_timeout();
        let x = MotorChannel::new(
            config.axis.x.unit,
            Box::new(SerialTransport::open(
                &config.axis.x.port,
                config.axis.x.baud,
                timeout,
            )?),
        );
        let y = MotorChannel::new(
            config.axis.y.unit,
            Box::new(SerialTransport::open(
                &config.axis.y.port,
                config.axis.y.baud,
                timeout,
            )?),
        );
        let debounce = std::time::Duration::from_millis(config.buttons.debounce_ms);
        let (enable_button, disable_button): (Box<dyn DebouncedInput>, Box<dyn DebouncedInput>) =
            match config.buttons.mode {
                ButtonMode::Polled => (
                    Box::new(PolledDebounce::new(Box::new(NullInput), debounce)),
                    Box::new(PolledDebounce::new(Box::new(NullInput), debounce)),
                ),
                ButtonMode::Interrupt => {
                    let (_enable_tx, enable) = EdgeDebounce::new(debounce);
                    let (_disable_tx, disable) = EdgeDebounce::new(debounce);
                    (Box::new(enable), Box::new(disable))
                }
            };
        Ok(Self::new(
            config,
            Box::new(host),
            x,
            y,
            enable_button,
            disable_button,
            Box::new(LogEstop::default()),
        ))
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn x_led(&self) -> &RgLed {
        &self.x_led
    }

    pub fn y_led(&self) -> &RgLed {
        &self.y_led
    }

    /// Run forever. Every error is local to its cycle; the loop never
    /// exits and there is no crash/restart path.
    pub async fn run(&mut self) {
        tracing::info!("System inited, Version: {}", VERSION);
        loop {
            self.cycle().await;
            sleep(self.timing.cycle()).await;
        }
    }

    /// One control cycle, strictly sequential: axis status polling, host
    /// command routing per the active mode, gateway poll, button update.
    pub async fn cycle(&mut self) {
        self.check_axis(Axis::X).await;
        sleep(self.timing.inter_axis()).await;
        self.check_axis(Axis::Y).await;
        sleep(self.timing.inter_axis()).await;

        if self.mode.ascii_active() {
            if let Some(line) = self.host.poll_line().await {
                let command = router::parse(&line);
                self.execute(command).await;
            }
        }
        if self.mode.gateway_active() {
            self.gateway_poll().await;
        }

        if self.disable_button.update() {
            tracing::info!("Disable button pressed");
            self.disable_both().await;
        }
        if self.enable_button.update() {
            tracing::info!("Enable button pressed");
            self.enable_both().await;
        }
    }

    /// Query one axis, drive its LED and the e-stop line, report faults.
    async fn check_axis(&mut self, axis: Axis) {
        let status = match axis {
            Axis::X => self.x.get_status().await,
            Axis::Y => self.y.get_status().await,
        };
        let fault = status.is_error();
        if fault {
            self.report_fault(axis, &status).await;
        }
        let led = match axis {
            Axis::X => &mut self.x_led,
            Axis::Y => &mut self.y_led,
        };
        if fault {
            led.set_red();
        } else {
            led.set_green();
        }
        match axis {
            Axis::X => self.x_fault = fault,
            Axis::Y => self.y_fault = fault,
        }
        self.estop.set_fault(self.x_fault || self.y_fault);
    }

    async fn report_fault(&mut self, axis: Axis, status: &MotorStatus) {
        if status.comm_error.is_some() {
            self.host
                .write_line(&format!("{} axis error: Communication Error", axis))
                .await;
        } else {
            self.host
                .write_line(&format!(
                    "{} axis error: {}",
                    axis,
                    router::format_hex(&status.error_code.to_be_bytes())
                ))
                .await;
        }
    }

    fn channel_mut(&mut self, axis: Axis) -> &mut MotorChannel {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }

    /// Dispatch one parsed host command. Always ends by purging both
    /// drive links so a stale reply cannot leak into the next exchange.
    pub async fn execute(&mut self, command: Command) {
        tracing::debug!("Dispatching {:?}", command);
        match command {
            Command::ModeSwitch(mode) => {
                tracing::info!("Operating mode -> {:?}", mode);
                self.mode = mode;
            }
            Command::Enable => self.enable_both().await,
            Command::Disable => self.disable_both().await,
            Command::AutoGainOff => {
                self.x.set_auto_gain(false).await;
                sleep(SETTLE_DELAY).await;
                self.y.set_auto_gain(false).await;
            }
            Command::FilterOff => {
                self.x.set_filter1_off().await;
                sleep(SETTLE_DELAY).await;
                self.x.set_filter2_off().await;
                sleep(SETTLE_DELAY).await;
                self.y.set_filter1_off().await;
                sleep(SETTLE_DELAY).await;
                self.y.set_filter2_off().await;
            }
            Command::SetCurrentGain(axis, value) => {
                let outcome = self.channel_mut(axis).set_current_gain(value).await;
                if !outcome.write_ok() {
                    tracing::warn!("{} axis current gain write failed", axis);
                }
            }
            Command::SetInertia(axis, value) => {
                let outcome = self.channel_mut(axis).set_inertia(value).await;
                if !outcome.write_ok() {
                    tracing::warn!("{} axis inertia write failed", axis);
                }
            }
            Command::GetCurrentGain(axis) => {
                let result = self.channel_mut(axis).get_current_gain().await;
                self.report_value(result).await;
            }
            Command::GetInertia(axis) => {
                let result = self.channel_mut(axis).get_inertia().await;
                self.report_value(result).await;
            }
            Command::Raw(axis, bytes) => self.raw_passthrough(axis, &bytes).await,
            Command::Version => self.host.write_line(VERSION).await,
            Command::Unknown => self.host.write_line("Unknown Command").await,
        }
        self.x.purge().await;
        self.y.purge().await;
    }

    async fn report_value(&mut self, result: Result<u32, crate::transport::CommError>) {
        match result {
            Ok(value) => self.host.write_line(&value.to_string()).await,
            Err(_) => self.host.write_line("Communication Error").await,
        }
    }

    /// Forward a host-supplied frame body verbatim (CRC recomputed by the
    /// transport) and echo the decoded response payload.
    async fn raw_passthrough(&mut self, axis: Axis, bytes: &[u8]) {
        let adu = match crate::transport::Adu::from_raw(bytes) {
            Ok(adu) => adu,
            Err(_) => {
                self.host.write_line("Unknown Command").await;
                return;
            }
        };
        match self.channel_mut(axis).forward_frame(&adu).await {
            Ok(response) => {
                self.host
                    .write_line(&format!(
                        "{} axis value: {}",
                        axis,
                        router::format_hex(&response.data)
                    ))
                    .await;
            }
            Err(_) => {
                self.host
                    .write_line(&format!("{} axis error: Communication Error", axis))
                    .await;
            }
        }
    }

    async fn enable_both(&mut self) {
        if let Err(e) = self.x.enable().await {
            tracing::warn!("X axis enable failed: {}", e);
        }
        sleep(self.timing.inter_axis()).await;
        if let Err(e) = self.y.enable().await {
            tracing::warn!("Y axis enable failed: {}", e);
        }
        self.x.purge().await;
        self.y.purge().await;
    }

    async fn disable_both(&mut self) {
        if let Err(e) = self.x.disable().await {
            tracing::warn!("X axis disable failed: {}", e);
        }
        sleep(self.timing.inter_axis()).await;
        if let Err(e) = self.y.disable().await {
            tracing::warn!("Y axis disable failed: {}", e);
        }
        self.x.purge().await;
        self.y.purge().await;
    }

    /// One non-blocking gateway poll: answer frames for our own unit id
    /// from the register-map projection, forward subordinate frames with
    /// the unit id rewritten, and synthesize exception responses for
    /// everything else. A response always goes back to the host.
    async fn gateway_poll(&mut self) {
        let Some(frame) = self.host.poll_frame().await else {
            return;
        };
        let response = if frame.unit == self.gateway_unit {
            self.serve_own_frame(&frame)
        } else if frame.unit == self.x_subordinate {
            self.forward_to(Axis::X, &frame).await
        } else if frame.unit == self.y_subordinate {
            self.forward_to(Axis::Y, &frame).await
        } else {
            tracing::warn!("Gateway: no route to unit {}", frame.unit);
            // Visible diagnostic for a misaddressed bus.
            self.y_led.set_red();
            frame.exception(EX_GATEWAY_PATH_UNAVAILABLE)
        };
        self.host.send_frame(&response).await;
    }

    /// Rebuild the register map from live state, run the slave logic, and
    /// re-apply whatever a write changed. The map is only a projection.
    fn serve_own_frame(&mut self, frame: &crate::transport::Adu) -> crate::transport::Adu {
        let mut map = RegisterMap::project(
            self.mode,
            self.x_led.color(),
            self.y_led.color(),
            self.disable_button.is_pressed(),
            self.enable_button.is_pressed(),
        );
        let response = gateway::serve(&mut map, frame);
        if let Some(mode) = map.mode() {
            if mode != self.mode {
                tracing::info!("Operating mode -> {:?} (via gateway write)", mode);
                self.mode = mode;
            }
        }
        if let Some(color) = map.x_led() {
            self.x_led.set_color(color);
        }
        if let Some(color) = map.y_led() {
            self.y_led.set_color(color);
        }
        response
    }

    async fn forward_to(&mut self, axis: Axis, frame: &crate::transport::Adu) -> crate::transport::Adu {
        let original_unit = frame.unit;
        match self.channel_mut(axis).forward_frame(frame).await {
            Ok(mut response) => {
                response.unit = original_unit;
                response
            }
            Err(e) => {
                tracing::warn!("Gateway: {} axis did not respond: {}", axis, e);
                frame.exception(EX_GATEWAY_TARGET_FAILED)
            }
        }
    }
}
