// src/motor/mod.rs - Motor channel, lifecycle sequencing, status
pub mod channel;
pub mod lifecycle;
pub mod registers;
pub mod status;

pub use channel::MotorChannel;
pub use status::MotorStatus;

/// One of the two controlled linear-motor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
