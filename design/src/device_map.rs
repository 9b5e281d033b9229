//! Data model and reader for the `nJoyDeviceMap` text grammar sketched in
//! spec §6:
//!
//! ```text
//! nJoyDeviceMap "<device name>":
//!     axis <id> => <alias>[, <alias>]*
//!     button <id> => <alias>[, <alias>]*
//!     hat <id> <dir> => <alias>[, <alias>]*
//!     neither buttons <id>+ => <alias>[, <alias>]*
//! ```
//!
//! where `<dir>` is one of `up|down|left|right|up-left|up-right|
//! down-left|down-right`. This document names aliases for a real HID
//! device's raw controls (and the `not_any`-style pseudo-button shorthand
//! at the grammar level); the Core Orchestrator's capacity-greedy
//! assignment (§4.8) never consults it, so this module is a standalone
//! reader, not wired into `njoy_core::Engine`.

use ::njoy_wire::HatDirection;

use crate::error::{DesignError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceMapEntry {
    Axis { id: u8, aliases: Vec<String> },
    Button { id: u8, aliases: Vec<String> },
    Hat { id: u8, direction: HatDirection, aliases: Vec<String> },
    NeitherButtons { ids: Vec<u8>, aliases: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMap {
    pub device_name: String,
    pub entries: Vec<DeviceMapEntry>,
}

fn parse_direction(word: &str) -> Option<HatDirection> {
    match word {
        "up" => Some(HatDirection::Up),
        "down" => Some(HatDirection::Down),
        "left" => Some(HatDirection::Left),
        "right" => Some(HatDirection::Right),
        "up-left" => Some(HatDirection::UpLeft),
        "up-right" => Some(HatDirection::UpRight),
        "down-left" => Some(HatDirection::DownLeft),
        "down-right" => Some(HatDirection::DownRight),
        _ => None,
    }
}

struct Cursor<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor { rest: text, line: 1 }
    }

    fn err(&self, message: impl Into<String>) -> DesignError {
        DesignError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            let before = self.rest;
            self.rest = self.rest.trim_start_matches([' ', '\t', '\r']);
            while let Some(rest) = self.rest.strip_prefix('\n') {
                self.rest = rest;
                self.line += 1;
                self.rest = self.rest.trim_start_matches([' ', '\t', '\r']);
            }
            if self.rest.starts_with('#') {
                let nl = self.rest.find('\n').unwrap_or(self.rest.len());
                self.rest = &self.rest[nl..];
                continue;
            }
            if self.rest == before {
                break;
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let mut chars = self.rest.chars();
        let c = chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        self.rest = chars.as_str();
        Some(c)
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        self.skip_trivia();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.err(format!("expected {:?}, got {:?}", expected, c))),
            None => Err(self.err(format!("expected {:?}, got end of input", expected))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        self.skip_trivia();
        if let Some(rest) = self.rest.strip_prefix(keyword) {
            self.rest = rest;
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}", keyword)))
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_trivia();
        self.rest.is_empty()
    }

    fn ident(&mut self) -> Result<String> {
        self.skip_trivia();
        let end = self
            .rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.err("expected an identifier"));
        }
        let ident = self.rest[..end].to_string();
        self.rest = &self.rest[end..];
        Ok(ident)
    }

    fn quoted_string(&mut self) -> Result<String> {
        self.expect_char('"')?;
        let end = self.rest.find('"').ok_or_else(|| self.err("unterminated string"))?;
        let value = self.rest[..end].to_string();
        self.rest = &self.rest[end + 1..];
        Ok(value)
    }

    fn u8(&mut self) -> Result<u8> {
        self.skip_trivia();
        let end = self.rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.err("expected a number"));
        }
        let digits = &self.rest[..end];
        self.rest = &self.rest[end..];
        digits.parse::<u8>().map_err(|_| self.err(format!("{:?} is not a valid id", digits)))
    }

    fn try_expect_char(&mut self, expected: char) -> bool {
        self.skip_trivia();
        if self.rest.starts_with(expected) {
            self.bump();
            true
        } else {
            false
        }
    }
}

fn parse_aliases(cur: &mut Cursor) -> Result<Vec<String>> {
    cur.expect_char('=')?;
    cur.expect_char('>')?;
    let mut aliases = vec![cur.ident()?];
    while cur.try_expect_char(',') {
        aliases.push(cur.ident()?);
    }
    Ok(aliases)
}

fn parse_entry(cur: &mut Cursor) -> Result<DeviceMapEntry> {
    let word = cur.ident()?;
    match word.as_str() {
        "axis" => {
            let id = cur.u8()?;
            Ok(DeviceMapEntry::Axis { id, aliases: parse_aliases(cur)? })
        }
        "button" => {
            let id = cur.u8()?;
            Ok(DeviceMapEntry::Button { id, aliases: parse_aliases(cur)? })
        }
        "hat" => {
            let id = cur.u8()?;
            let dir_word = cur.ident()?;
            let direction = parse_direction(&dir_word).ok_or_else(|| cur.err(format!("unknown hat direction {:?}", dir_word)))?;
            Ok(DeviceMapEntry::Hat { id, direction, aliases: parse_aliases(cur)? })
        }
        "neither" => {
            cur.expect_keyword("buttons")?;
            let mut ids = vec![cur.u8()?];
            loop {
                cur.skip_trivia();
                if cur.rest.starts_with(|c: char| c.is_ascii_digit()) {
                    ids.push(cur.u8()?);
                } else {
                    break;
                }
            }
            Ok(DeviceMapEntry::NeitherButtons { ids, aliases: parse_aliases(cur)? })
        }
        other => Err(cur.err(format!("unknown device map entry {:?}", other))),
    }
}

/// Parses one `nJoyDeviceMap "<device name>": <entry>*` document.
pub fn parse_device_map(text: &str) -> Result<DeviceMap> {
    let mut cur = Cursor::new(text);
    cur.expect_keyword("nJoyDeviceMap")?;
    let device_name = cur.quoted_string()?;
    cur.expect_char(':')?;
    let mut entries = Vec::new();
    while !cur.at_end() {
        entries.push(parse_entry(&mut cur)?);
    }
    Ok(DeviceMap { device_name, entries })
}

/// Collects device maps loaded from separate files/sources, keyed by the
/// device name each one names. A deployment that accidentally ships two
/// device maps for the same physical device is a configuration error, not
/// something the last-loaded one should silently win.
#[derive(Default)]
pub struct DeviceMapRegistry {
    by_device_name: ::std::collections::HashMap<String, DeviceMap>,
}

impl DeviceMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, map: DeviceMap) -> Result<()> {
        if self.by_device_name.contains_key(&map.device_name) {
            return Err(DesignError::DuplicateDeviceMap(map.device_name));
        }
        self.by_device_name.insert(map.device_name.clone(), map);
        Ok(())
    }

    pub fn get(&self, device_name: &str) -> Option<&DeviceMap> {
        self.by_device_name.get(device_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_entry_kind() {
        let text = r#"
            nJoyDeviceMap "Throttle - HOTAS Warthog":
                axis 0 => scx
                button 0 => sc
                hat 0 up-right => joy_hat_ur
                neither buttons 21 22 => flaps_mid
        "#;
        let map = parse_device_map(text).unwrap();
        assert_eq!(map.device_name, "Throttle - HOTAS Warthog");
        assert_eq!(map.entries.len(), 4);
        assert_eq!(
            map.entries[2],
            DeviceMapEntry::Hat {
                id: 0,
                direction: HatDirection::UpRight,
                aliases: vec!["joy_hat_ur".into()]
            }
        );
        assert_eq!(
            map.entries[3],
            DeviceMapEntry::NeitherButtons {
                ids: vec![21, 22],
                aliases: vec!["flaps_mid".into()]
            }
        );
    }

    #[test]
    fn rejects_unknown_direction() {
        let text = r#"nJoyDeviceMap "d": hat 0 sideways => x"#;
        assert!(parse_device_map(text).is_err());
    }

    #[test]
    fn registry_rejects_duplicate_device_name() {
        let mut registry = DeviceMapRegistry::new();
        let first = parse_device_map(r#"nJoyDeviceMap "Throttle": axis 0 => scx"#).unwrap();
        let second = parse_device_map(r#"nJoyDeviceMap "Throttle": axis 1 => scy"#).unwrap();
        registry.insert(first).unwrap();
        assert!(matches!(
            registry.insert(second),
            Err(DesignError::DuplicateDeviceMap(name)) if name == "Throttle"
        ));
    }
}
