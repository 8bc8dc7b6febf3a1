mod bridge;
mod link;
mod protocol;

pub use bridge::{BridgeError, ConsoleBridge};
pub use link::{LoopbackLink, PortLink, SerialLink};
pub use protocol::{button_delay_line, led_line, parse_press_line};

/// One of the three physical console buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Button1,
    Button2,
    Button3,
}

pub const BUTTON_COUNT: usize = 3;

impl ButtonId {
    /// All buttons in consumption priority order.
    pub const ALL: [ButtonId; BUTTON_COUNT] =
        [ButtonId::Button1, ButtonId::Button2, ButtonId::Button3];

    /// Zero-based bit/slot index.
    pub fn index(self) -> usize {
        match self {
            ButtonId::Button1 => 0,
            ButtonId::Button2 => 1,
            ButtonId::Button3 => 2,
        }
    }

    /// One-based number as printed on the console and in the wire protocol.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    pub fn from_number(n: u8) -> Option<ButtonId> {
        match n {
            1 => Some(ButtonId::Button1),
            2 => Some(ButtonId::Button2),
            3 => Some(ButtonId::Button3),
            _ => None,
        }
    }
}
