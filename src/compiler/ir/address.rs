//! Segmented virtual addresses
//!
//! Addresses are carried as an explicit `(segment, kind, offset)` triple and
//! only collapse to the classic integer ranges at the serialization boundary:
//!
//! ```text
//!              int         float       string
//! global     1000-1999   2000-2999       -
//! local      3000-3999   4000-4999       -
//! temporary  5000-5999   6000-6999       -
//! constant   7000-7999   8000-8999   9000-9999
//! ```

use crate::compiler::types::Type;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// Number of slots in every `(segment, kind)` range
pub const SEGMENT_SLOTS: u32 = 1000;

/// Memory segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// Program-wide variables and function return slots
    Global,
    /// Per-activation variables and parameters
    Local,
    /// Per-activation expression temporaries
    Temporary,
    /// Read-only literal pool
    Constant,
}

impl Segment {
    /// All segments in address order
    pub const ALL: [Segment; 4] = [
        Segment::Global,
        Segment::Local,
        Segment::Temporary,
        Segment::Constant,
    ];

    /// First raw address of the segment
    pub fn base(&self) -> u32 {
        match self {
            Segment::Global => 1000,
            Segment::Local => 3000,
            Segment::Temporary => 5000,
            Segment::Constant => 7000,
        }
    }

    /// Kinds that may live in this segment
    pub fn kinds(&self) -> &'static [SlotKind] {
        match self {
            Segment::Constant => &[SlotKind::Int, SlotKind::Float, SlotKind::Str],
            _ => &[SlotKind::Int, SlotKind::Float],
        }
    }

    /// True for the segments that belong to an activation record
    pub fn is_frame_local(&self) -> bool {
        matches!(self, Segment::Local | Segment::Temporary)
    }

    /// Lowercase segment name
    pub fn name(&self) -> &'static str {
        match self {
            Segment::Global => "global",
            Segment::Local => "local",
            Segment::Temporary => "temporary",
            Segment::Constant => "constant",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// `int` value
    Int,
    /// `float` value
    Float,
    /// String literal (constant segment only)
    Str,
}

impl SlotKind {
    fn index(&self) -> u32 {
        match self {
            SlotKind::Int => 0,
            SlotKind::Float => 1,
            SlotKind::Str => 2,
        }
    }

    /// Lowercase kind name
    pub fn name(&self) -> &'static str {
        match self {
            SlotKind::Int => "int",
            SlotKind::Float => "float",
            SlotKind::Str => "string",
        }
    }
}

impl From<Type> for SlotKind {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => SlotKind::Int,
            Type::Float => SlotKind::Float,
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub struct Address {
    /// Segment the slot lives in
    pub segment: Segment,
    /// Kind of value the slot holds
    pub kind: SlotKind,
    /// Slot index inside the `(segment, kind)` range
    pub offset: u32,
}

impl Address {
    /// Builds an address, returning `None` for an impossible combination
    pub fn new(segment: Segment, kind: SlotKind, offset: u32) -> Option<Self> {
        if offset >= SEGMENT_SLOTS || !segment.kinds().contains(&kind) {
            return None;
        }
        Some(Address {
            segment,
            kind,
            offset,
        })
    }

    /// Integer encoding of the address
    pub fn to_raw(&self) -> u32 {
        self.segment.base() + self.kind.index() * SEGMENT_SLOTS + self.offset
    }

    /// Decodes an integer address; `None` when it falls outside every segment
    pub fn from_raw(raw: u32) -> Option<Self> {
        let segment = Segment::ALL
            .iter()
            .rev()
            .find(|segment| raw >= segment.base())?;
        let relative = raw - segment.base();
        let kind = *segment
            .kinds()
            .get((relative / SEGMENT_SLOTS) as usize)?;
        Address::new(*segment, kind, relative % SEGMENT_SLOTS)
    }

    /// The value type of the slot, `None` for string constants
    pub fn value_type(&self) -> Option<Type> {
        match self.kind {
            SlotKind::Int => Some(Type::Int),
            SlotKind::Float => Some(Type::Float),
            SlotKind::Str => None,
        }
    }
}

impl From<Address> for u32 {
    fn from(address: Address) -> Self {
        address.to_raw()
    }
}

/// Raw integer that does not decode to a valid address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidAddress(pub u32);

impl fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "address {} is outside every segment", self.0)
    }
}

impl TryFrom<u32> for Address {
    type Error = InvalidAddress;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Address::from_raw(raw).ok_or(InvalidAddress(raw))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}
