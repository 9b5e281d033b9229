use ::serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};

/// The nine enumerated hat (POV) directions, bitwise-OR'd from the four
/// cardinal bits as laid out in the glossary: `UP=1, RIGHT=2, DOWN=4,
/// LEFT=8`, diagonals being the OR of two adjacent cardinals.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HatDirection {
    Center = 0x00,
    Up = 0x01,
    Right = 0x02,
    UpRight = 0x03,
    Down = 0x04,
    DownRight = 0x06,
    Left = 0x08,
    UpLeft = 0x09,
    DownLeft = 0x0C,
}

impl HatDirection {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// The low nibble carried by a hat value frame. Any bit pattern outside
    /// the nine legal combinations (e.g. UP|DOWN together) is rejected.
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0x00 => Ok(Self::Center),
            0x01 => Ok(Self::Up),
            0x02 => Ok(Self::Right),
            0x03 => Ok(Self::UpRight),
            0x04 => Ok(Self::Down),
            0x06 => Ok(Self::DownRight),
            0x08 => Ok(Self::Left),
            0x09 => Ok(Self::UpLeft),
            0x0C => Ok(Self::DownLeft),
            other => Err(WireError::BadValue(format!(
                "{:#06b} is not one of the nine hat directions",
                other
            ))),
        }
    }
}
