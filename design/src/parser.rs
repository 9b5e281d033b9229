//! A small, dependency-free recursive-descent reader for the `nJoyDesign`
//! text grammar sketched in spec §6:
//!
//! ```text
//! nJoyDesign "<name>":
//!
//! device <alias>: name="<name>"[, guid="<guid>"]
//! device <alias>: guid="<guid>"[, name="<name>"]
//!
//! axis   [<label>:] <processor>(<input>[; <input>]*)
//! button [<label>:] <processor>(<input>[; <input>]*)
//! hat    [<label>:] <processor>(<input>[; <input>]*)
//! ```
//!
//! where `<input>` is either `dev=<alias>, ctrl=<id>` (a physical control)
//! or `virt=<label>` (another virtual control declared earlier in the
//! same document, under its own `<label>:`). `#` starts a line comment.
//!
//! This reader is a convenience, not load-bearing: `njoy_core::Engine`
//! consumes a [`Design`](crate::Design) value directly, so a caller can
//! always build one by hand (or from a test fixture) and skip the text
//! format entirely, exactly as the original's `parse_design()` stub did.

use ::njoy_wire::ControlKind;

use crate::error::{DesignError, Result};
use crate::model::{Design, InputRef, PhysicalDeviceDescriptor, VirtualControlSpec};

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
            if let Some(idx) = self.rest.find('#') {
                if self.rest[..idx].chars().all(|c| c == ' ' || c == '\t') || idx == 0 {
                    let nl = self.rest.find('\n').unwrap_or(self.rest.len());
                    self.rest = &self.rest[nl..];
                    continue;
                }
            }
            if self.rest == before {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
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

    /// A bare identifier: `[A-Za-z0-9_.-]+`.
    fn ident(&mut self) -> Result<String> {
        self.skip_trivia();
        let end = self
            .rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.' || c == '-'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.err("expected an identifier"));
        }
        let ident = self.rest[..end].to_string();
        self.rest = &self.rest[end..];
        Ok(ident)
    }

    /// A `"..."` string literal, no escape sequences.
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
        digits.parse::<u8>().map_err(|_| self.err(format!("{:?} is not a valid control id", digits)))
    }

    fn try_expect_char(&mut self, expected: char) -> bool {
        self.skip_trivia();
        if self.peek_char() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }
}

fn control_kind(word: &str) -> Option<ControlKind> {
    match word {
        "axis" => Some(ControlKind::Axis),
        "button" => Some(ControlKind::Button),
        "hat" => Some(ControlKind::Hat),
        _ => None,
    }
}

/// Parses either a `dev=<alias>, ctrl=<id>` physical reference or a
/// `virt=<label>` reference to an earlier virtual control.
fn parse_input(cur: &mut Cursor, kind: ControlKind) -> Result<InputRef> {
    let key = cur.ident()?;
    match key.as_str() {
        "dev" => {
            cur.expect_char('=')?;
            let alias = cur.ident()?;
            cur.expect_char(',')?;
            cur.expect_keyword("ctrl")?;
            cur.expect_char('=')?;
            let id = cur.u8()?;
            Ok(InputRef::Physical { alias, kind, id })
        }
        "virt" => {
            cur.expect_char('=')?;
            let name = cur.ident()?;
            Ok(InputRef::Virtual { name })
        }
        other => Err(cur.err(format!("unknown input kind {:?}, expected \"dev\" or \"virt\"", other))),
    }
}

fn parse_device_statement(cur: &mut Cursor) -> Result<PhysicalDeviceDescriptor> {
    let alias = cur.ident()?;
    cur.expect_char(':')?;
    let mut guid = None;
    let mut name = None;
    loop {
        let key = cur.ident()?;
        cur.expect_char('=')?;
        let value = cur.quoted_string()?;
        match key.as_str() {
            "guid" => guid = Some(value),
            "name" => name = Some(value),
            other => return Err(cur.err(format!("unknown device attribute {:?}", other))),
        }
        if !cur.try_expect_char(',') {
            break;
        }
    }
    if guid.is_none() && name.is_none() {
        return Err(cur.err("a device needs at least one of guid or name"));
    }
    Ok(PhysicalDeviceDescriptor { alias, guid, name })
}

fn parse_control_statement(cur: &mut Cursor, kind: ControlKind) -> Result<VirtualControlSpec> {
    let first = cur.ident()?;
    let (name, processor) = if cur.try_expect_char(':') {
        (Some(first), cur.ident()?)
    } else {
        (None, first)
    };
    cur.expect_char('(')?;
    let mut inputs = Vec::new();
    loop {
        cur.skip_trivia();
        if cur.peek_char() == Some(')') {
            break;
        }
        inputs.push(parse_input(cur, kind)?);
        if !cur.try_expect_char(';') {
            break;
        }
    }
    cur.expect_char(')')?;
    Ok(VirtualControlSpec { name, kind, processor, inputs })
}

/// Parses one `nJoyDesign "<name>": <statement>*` document.
pub fn parse_design(text: &str) -> Result<Design> {
    let mut cur = Cursor::new(text);
    cur.expect_keyword("nJoyDesign")?;
    let name = cur.quoted_string()?;
    cur.expect_char(':')?;

    let mut devices = Vec::new();
    let mut controls = Vec::new();
    while !cur.at_end() {
        let word = cur.ident()?;
        match word.as_str() {
            "device" => devices.push(parse_device_statement(&mut cur)?),
            other => {
                let kind = control_kind(other).ok_or_else(|| cur.err(format!("unknown statement {:?}", other)))?;
                controls.push(parse_control_statement(&mut cur, kind)?);
            }
        }
    }
    Design::new(name, devices, controls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_design() {
        let text = r#"
            nJoyDesign "HOTAS Warthog":

            # physical devices
            device joy: name="Joystick - HOTAS Warthog", guid="030000004F0400000204000000000000"
            device thr: name="Throttle - HOTAS Warthog"

            axis passthrough(dev=joy, ctrl=0)
            axis passthrough(dev=joy, ctrl=1)
            button not_any(dev=thr, ctrl=21; dev=thr, ctrl=22)
            hat passthrough(dev=joy, ctrl=0)
        "#;
        let design = parse_design(text).unwrap();
        assert_eq!(design.name, "HOTAS Warthog");
        assert_eq!(design.devices.len(), 2);
        assert_eq!(design.controls.len(), 4);
        assert_eq!(design.controls[2].inputs.len(), 2);
        assert_eq!(design.controls[2].processor, "not_any");
        assert_eq!(design.controls[0].kind, ControlKind::Axis);
        assert_eq!(design.controls[3].kind, ControlKind::Hat);
    }

    #[test]
    fn rejects_unknown_statement() {
        assert!(parse_design(r#"nJoyDesign "d": bogus foo(dev=x, ctrl=0)"#).is_err());
    }

    #[test]
    fn rejects_device_without_guid_or_name() {
        assert!(parse_design(r#"nJoyDesign "d": device joy:"#).is_err());
    }

    #[test]
    fn rejects_unknown_alias_reference() {
        let text = r#"nJoyDesign "d": axis passthrough(dev=nope, ctrl=0)"#;
        assert!(matches!(parse_design(text), Err(DesignError::UnknownAlias(_))));
    }

    #[test]
    fn parses_labeled_control_referenced_by_a_later_one() {
        let text = r#"
            nJoyDesign "chained":

            device joy: guid="G1"

            axis base: passthrough(dev=joy, ctrl=0)
            axis not_: not_(virt=base)
        "#;
        let design = parse_design(text).unwrap();
        assert_eq!(design.controls.len(), 2);
        assert_eq!(design.controls[0].name.as_deref(), Some("base"));
        assert_eq!(
            design.controls[1].inputs,
            vec![InputRef::Virtual { name: "base".into() }]
        );
    }

    #[test]
    fn rejects_virtual_reference_to_an_undeclared_label() {
        let text = r#"
            nJoyDesign "d":
            device joy: guid="G1"
            axis passthrough(virt=nope)
        "#;
        assert!(matches!(parse_design(text), Err(DesignError::UnknownVirtualControl(_))));
    }
}
