use crate::error::{Result, WireError};
use crate::hat::HatDirection;

/// A control's value as carried by a value frame. Length encodes the kind:
/// empty is a ready token, 8 bytes a double, 1 byte a button or hat (the
/// MSB disambiguating the two without consulting the identity frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Ready,
    Axis(f64),
    Button(bool),
    Hat(HatDirection),
}

impl Value {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Value::Ready => Vec::new(),
            Value::Axis(v) => v.to_be_bytes().to_vec(),
            Value::Button(v) => vec![*v as u8],
            Value::Hat(dir) => vec![0x80 | dir.bits()],
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        match buf.len() {
            0 => Ok(Value::Ready),
            8 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(buf);
                Ok(Value::Axis(f64::from_be_bytes(bytes)))
            }
            1 => {
                let byte = buf[0];
                if byte & 0x80 == 0 {
                    match byte {
                        0 => Ok(Value::Button(false)),
                        1 => Ok(Value::Button(true)),
                        other => Err(WireError::BadValue(format!(
                            "button value byte must be 0000000v, got {:#010b}",
                            other
                        ))),
                    }
                } else {
                    Ok(Value::Hat(HatDirection::from_bits(byte & 0x0F)?))
                }
            }
            n => Err(WireError::BadValue(format!(
                "value frame must be 0, 1 or 8 bytes, got {}",
                n
            ))),
        }
    }

    pub fn as_axis(&self) -> Option<f64> {
        match self {
            Value::Axis(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_button(&self) -> Option<bool> {
        match self {
            Value::Button(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_hat(&self) -> Option<HatDirection> {
        match self {
            Value::Hat(v) => Some(*v),
            _ => None,
        }
    }
}

/// Normalises a raw HID axis reading in `[-32768, 32767]` to `[-1.0, 1.0]`,
/// per the input-node wire contract.
pub fn normalize_axis(raw: i16) -> f64 {
    2.0 * (f64::from(raw) + 32768.0) / 65535.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_axis_doubles_bit_exact() {
        for v in [-1.0, 0.0, 0.5, 1.0, f64::MIN_POSITIVE, -0.000001] {
            let encoded = Value::Axis(v).encode();
            let decoded = Value::decode(&encoded).unwrap();
            assert_eq!(decoded.as_axis().unwrap().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn round_trips_ready() {
        assert_eq!(Value::decode(&Value::Ready.encode()).unwrap(), Value::Ready);
    }

    #[test]
    fn round_trips_button() {
        assert_eq!(
            Value::decode(&Value::Button(true).encode()).unwrap(),
            Value::Button(true)
        );
        assert_eq!(
            Value::decode(&Value::Button(false).encode()).unwrap(),
            Value::Button(false)
        );
    }

    #[test]
    fn round_trips_hat() {
        let v = Value::Hat(HatDirection::UpRight);
        assert_eq!(Value::decode(&v.encode()).unwrap(), v);
    }

    #[test]
    fn rejects_malformed_button_byte() {
        assert!(Value::decode(&[0x02]).is_err());
    }

    #[test]
    fn normalizes_hid_axis_range_per_spec_example() {
        // Endpoints land exactly on [-1.0, 1.0]; interior points are the
        // affine map's actual output, not the prose's rounded figures.
        assert_eq!(normalize_axis(-32768), -1.0);
        assert_eq!(normalize_axis(0), 1.5259021896696368e-5);
        assert_eq!(normalize_axis(16383), 0.49999237048905165);
        assert_eq!(normalize_axis(32767), 1.0);
    }
}
