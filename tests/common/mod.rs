// Shared test harness: a Controller wired to in-memory fakes.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use eslm_rs::config::Config;
use eslm_rs::controller::Controller;
use eslm_rs::host::MockHostPort;
use eslm_rs::io::{Edge, EdgeDebounce, EstopOutput};
use eslm_rs::motor::MotorChannel;
use eslm_rs::transport::{Adu, MockTransport};

pub struct RecordingEstop(pub Arc<AtomicBool>);

impl EstopOutput for RecordingEstop {
    fn set_fault(&mut self, fault: bool) {
        self.0.store(fault, Ordering::Relaxed);
    }
}

pub struct Harness {
    pub controller: Controller,
    pub host: MockHostPort,
    pub x: MockTransport,
    pub y: MockTransport,
    pub enable_tx: UnboundedSender<Edge>,
    pub disable_tx: UnboundedSender<Edge>,
    pub estop: Arc<AtomicBool>,
}

pub fn harness() -> Harness {
    let config = Config::default();
    let host = MockHostPort::new();
    let x = MockTransport::new();
    let y = MockTransport::new();
    let (enable_tx, enable_button) = EdgeDebounce::new(Duration::from_millis(1000));
    let (disable_tx, disable_button) = EdgeDebounce::new(Duration::from_millis(1000));
    let estop = Arc::new(AtomicBool::new(false));
    let controller = Controller::new(
        &config,
        Box::new(host.clone()),
        MotorChannel::new(config.axis.x.unit, Box::new(x.clone())),
        MotorChannel::new(config.axis.y.unit, Box::new(y.clone())),
        Box::new(enable_button),
        Box::new(disable_button),
        Box::new(RecordingEstop(estop.clone())),
    );
    Harness {
        controller,
        host,
        x,
        y,
        enable_tx,
        disable_tx,
        estop,
    }
}

/// Drive reply to a status poll of the error-code register.
pub fn status_reply(error_code: u16) -> Adu {
    Adu::new(
        1,
        0x03,
        vec![0x02, (error_code >> 8) as u8, (error_code & 0xFF) as u8],
    )
}

/// Drive echo to a single-register write.
pub fn write_echo(addr: u16, value: u16) -> Adu {
    Adu::new(
        1,
        0x06,
        vec![
            (addr >> 8) as u8,
            (addr & 0xFF) as u8,
            (value >> 8) as u8,
            (value & 0xFF) as u8,
        ],
    )
}

/// Drive echo to a multi-register write.
pub fn multi_write_echo(addr: u16, count: u16) -> Adu {
    Adu::new(
        1,
        0x10,
        vec![
            (addr >> 8) as u8,
            (addr & 0xFF) as u8,
            (count >> 8) as u8,
            (count & 0xFF) as u8,
        ],
    )
}

/// Script one clean status poll on each axis, as consumed by
/// `Controller::cycle` before any routing happens.
pub fn script_clean_status(h: &Harness) {
    h.x.queue_response(status_reply(0));
    h.y.queue_response(status_reply(0));
}

/// Queue every reply the four-step enable sequence expects.
pub fn script_enable(mock: &MockTransport) {
    mock.queue_response(write_echo(0xF002, 0x0006));
    mock.queue_response(write_echo(0xF002, 0x0080));
    mock.queue_response(write_echo(0xF002, 0x0006));
    mock.queue_response(write_echo(0xF002, 0x000F));
}

/// Control-word values extracted from the FC06 frames sent to a drive.
pub fn control_word_writes(mock: &MockTransport) -> Vec<u16> {
    mock.sent()
        .iter()
        .filter(|adu| {
            adu.function == 0x06 && adu.data.len() >= 4 && adu.data[0] == 0xF0 && adu.data[1] == 0x02
        })
        .map(|adu| (u16::from(adu.data[2]) << 8) | u16::from(adu.data[3]))
        .collect()
}
