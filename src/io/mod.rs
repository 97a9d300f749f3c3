// src/io/mod.rs - Panel I/O: status LEDs, debounced buttons, e-stop line
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

/// Color of a two-color status LED. Red and green are mutually exclusive
/// by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedColor {
    #[default]
    Off,
    Red,
    Green,
}

impl LedColor {
    /// Gateway register-map encoding: 0 = off, 1 = red, 2 = green.
    pub fn to_register(self) -> u16 {
        match self {
            LedColor::Off => 0,
            LedColor::Red => 1,
            LedColor::Green => 2,
        }
    }

    pub fn from_register(value: u16) -> Option<Self> {
        match value {
            0 => Some(LedColor::Off),
            1 => Some(LedColor::Red),
            2 => Some(LedColor::Green),
            _ => None,
        }
    }
}

/// Per-axis red/green status LED.
///
/// The physical pin driver is a collaborator; this holds the logical
/// color, which is also what the gateway register map projects.
#[derive(Debug, Default)]
pub struct RgLed {
    color: LedColor,
}

impl RgLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_red(&mut self) {
        self.color = LedColor::Red;
    }

    pub fn set_green(&mut self) {
        self.color = LedColor::Green;
    }

    pub fn off(&mut self) {
        self.color = LedColor::Off;
    }

    pub fn set_color(&mut self, color: LedColor) {
        self.color = color;
    }

    pub fn color(&self) -> LedColor {
        self.color
    }

    pub fn is_red(&self) -> bool {
        self.color == LedColor::Red
    }

    pub fn is_green(&self) -> bool {
        self.color == LedColor::Green
    }
}

/// A debounced panel button.
///
/// `update` is called once per control cycle and returns `true` exactly
/// once per press held longer than the debounce window; `is_pressed`
/// reflects the current debounced level (projected into the gateway
/// register map as a discrete input).
pub trait DebouncedInput: Send {
    fn update(&mut self) -> bool;
    fn is_pressed(&self) -> bool;
}

/// Level source sampled by [`PolledDebounce`].
pub trait LevelInput: Send {
    fn is_low(&self) -> bool;
}

/// Input that is never asserted. Default wiring on hosts without GPIO.
pub struct NullInput;

impl LevelInput for NullInput {
    fn is_low(&self) -> bool {
        false
    }
}

/// Polled debounce: samples the level on every update, fires the press
/// once after the level has been held low for the debounce window.
/// Deliberately interrupt-free; checks happen only when `update` runs.
pub struct PolledDebounce {
    input: Box<dyn LevelInput>,
    debounce: Duration,
    pressed_at: Option<Instant>,
    fired: bool,
}

impl PolledDebounce {
    pub fn new(input: Box<dyn LevelInput>, debounce: Duration) -> Self {
        Self {
            input,
            debounce,
            pressed_at: None,
            fired: false,
        }
    }
}

impl DebouncedInput for PolledDebounce {
    fn update(&mut self) -> bool {
        if self.input.is_low() {
            let pressed_at = *self.pressed_at.get_or_insert_with(Instant::now);
            if !self.fired && pressed_at.elapsed() >= self.debounce {
                self.fired = true;
                return true;
            }
        } else {
            self.pressed_at = None;
            self.fired = false;
        }
        false
    }

    fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }
}

/// Edge event from an interrupt-driven input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Interrupt-driven debounce: consumes edge events from a channel instead
/// of sampling a level. The press still only fires once the press edge is
/// older than the debounce window, evaluated on `update`.
pub struct EdgeDebounce {
    events: mpsc::UnboundedReceiver<Edge>,
    debounce: Duration,
    pressed_at: Option<Instant>,
    fired: bool,
}

impl EdgeDebounce {
    pub fn new(debounce: Duration) -> (mpsc::UnboundedSender<Edge>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                events: rx,
                debounce,
                pressed_at: None,
                fired: false,
            },
        )
    }
}

impl DebouncedInput for EdgeDebounce {
    fn update(&mut self) -> bool {
        while let Ok(edge) = self.events.try_recv() {
            match edge {
                Edge::Pressed => {
                    self.pressed_at.get_or_insert_with(Instant::now);
                }
                Edge::Released => {
                    self.pressed_at = None;
                    self.fired = false;
                }
            }
        }
        if let Some(at) = self.pressed_at {
            if !self.fired && at.elapsed() >= self.debounce {
                self.fired = true;
                return true;
            }
        }
        false
    }

    fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }
}

/// Emergency-stop output driven from the per-cycle fault state. Asserted
/// while either axis reports an error; the consumer halts motion on it.
pub trait EstopOutput: Send {
    fn set_fault(&mut self, fault: bool);
}

/// Default e-stop sink: logs transitions instead of toggling a pin.
#[derive(Default)]
pub struct LogEstop {
    fault: bool,
}

impl EstopOutput for LogEstop {
    fn set_fault(&mut self, fault: bool) {
        if fault != self.fault {
            self.fault = fault;
            if fault {
                tracing::error!("Emergency stop asserted");
            } else {
                tracing::info!("Emergency stop released");
            }
        }
    }
}
