//! The design document's data model (§3 "Design"): a list of referenced
//! physical device descriptors plus an ordered list of virtual controls,
//! each with its processor name and the inputs it reads.
//!
//! A virtual control's inputs form a DAG over physical-or-virtual controls
//! (§3 invariant 2). Cycle-freedom is enforced by a forward-reference
//! rule: a `virt=<name>` input may only name a virtual control declared
//! earlier in `controls` than the one referencing it. A reference graph
//! that only ever points backward along a fixed declaration order cannot
//! contain a cycle, so this is the parser-level rejection §3 calls for
//! without needing a separate graph traversal. See `DESIGN.md`'s Open
//! Question resolutions for the reasoning behind this choice.

use ::njoy_wire::ControlKind;

use crate::error::{DesignError, Result};

/// A physical device the design references by alias, with at least one of
/// `guid`/`name` to match it against a real device at handshake time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalDeviceDescriptor {
    pub alias: String,
    pub guid: Option<String>,
    pub name: Option<String>,
}

impl PhysicalDeviceDescriptor {
    pub fn new(alias: impl Into<String>, guid: Option<String>, name: Option<String>) -> Self {
        Self {
            alias: alias.into(),
            guid,
            name,
        }
    }
}

/// A reference to one input of a virtual control: either one physical
/// control, named by its device alias/kind/id, or another virtual control
/// declared earlier in the same design, named by the label it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRef {
    Physical { alias: String, kind: ControlKind, id: u8 },
    Virtual { name: String },
}

/// One virtual control declared by the design: its kind, an optional
/// label other virtual controls can reference it by, the name of the
/// processor combinator that computes its value, and the ordered list of
/// inputs that processor is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualControlSpec {
    pub name: Option<String>,
    pub kind: ControlKind,
    pub processor: String,
    pub inputs: Vec<InputRef>,
}

/// A parsed design: the sole source of truth for what the core constructs
/// at run time (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Design {
    pub name: String,
    pub devices: Vec<PhysicalDeviceDescriptor>,
    pub controls: Vec<VirtualControlSpec>,
}

impl Design {
    /// Validates cross-references: device aliases must be unique, every
    /// physical input must reference a declared alias, every virtual
    /// input must reference a virtual control label declared earlier in
    /// `controls`, and virtual control labels must themselves be unique.
    pub fn new(
        name: impl Into<String>,
        devices: Vec<PhysicalDeviceDescriptor>,
        controls: Vec<VirtualControlSpec>,
    ) -> Result<Self> {
        let mut seen_aliases = ::std::collections::HashSet::new();
        for device in &devices {
            if !seen_aliases.insert(device.alias.as_str()) {
                return Err(DesignError::DuplicateAlias(device.alias.clone()));
            }
        }

        let mut declared_names = ::std::collections::HashSet::new();
        for control in &controls {
            for input in &control.inputs {
                match input {
                    InputRef::Physical { alias, .. } => {
                        if !devices.iter().any(|d| &d.alias == alias) {
                            return Err(DesignError::UnknownAlias(alias.clone()));
                        }
                    }
                    InputRef::Virtual { name } => {
                        if !declared_names.contains(name.as_str()) {
                            return Err(DesignError::UnknownVirtualControl(name.clone()));
                        }
                    }
                }
            }
            if let Some(name) = &control.name {
                if !declared_names.insert(name.clone()) {
                    return Err(DesignError::DuplicateVirtualControlName(name.clone()));
                }
            }
        }

        Ok(Design {
            name: name.into(),
            devices,
            controls,
        })
    }
}
