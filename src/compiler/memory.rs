//! Segmented virtual memory allocator
//!
//! Hands out addresses in the four segments described in [`crate::compiler::ir::address`].
//! Global and constant counters live for the whole compilation; local and
//! temporary counters restart for every function so that each activation
//! record starts at offset zero.

use super::ir::{Address, Segment, SlotKind};
use super::types::Type;
use crate::error::{Error, Result};
use crate::runtime::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Local and temporary slots used by one function
///
/// Recorded when a function is closed; the VM does not need it because frames
/// grow on demand, but it documents the resource needs of each function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Local int slots (parameters included)
    pub local_int: u32,
    /// Local float slots (parameters included)
    pub local_float: u32,
    /// Temporary int slots
    pub temp_int: u32,
    /// Temporary float slots
    pub temp_float: u32,
}

impl FrameSize {
    /// Total slots in the frame
    pub fn total(&self) -> u32 {
        self.local_int + self.local_float + self.temp_int + self.temp_float
    }
}

/// Constant address to value table, preloaded by the VM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstantTable {
    entries: BTreeMap<Address, Value>,
}

impl ConstantTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Value bound to a constant address
    pub fn get(&self, address: &Address) -> Option<&Value> {
        self.entries.get(address)
    }

    /// Bind a value; the address must be in the constant segment
    pub fn insert(&mut self, address: Address, value: Value) -> Result<()> {
        if address.segment != Segment::Constant || address.kind != value.kind() {
            return Err(Error::internal(format!(
                "constant {} cannot live at address {}",
                value, address
            )));
        }
        self.entries.insert(address, value);
        Ok(())
    }

    /// All bindings in address order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Value)> {
        self.entries.iter()
    }

    /// Number of constants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no constant was allocated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Dedup key; floats compare by bit pattern so that `0.1` always maps to one slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Int(i64),
    Float(u64),
    Str(String),
}

impl From<&Value> for ConstantKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Int(n) => ConstantKey::Int(*n),
            Value::Float(x) => ConstantKey::Float(x.to_bits()),
            Value::Str(s) => ConstantKey::Str(s.clone()),
        }
    }
}

/// Address allocator
#[derive(Debug, Clone, Default)]
pub struct MemoryManager {
    counters: HashMap<(Segment, SlotKind), u32>,
    constants: ConstantTable,
    constant_index: HashMap<ConstantKey, Address>,
}

impl MemoryManager {
    /// Create an allocator with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next free slot of `ty` in a variable segment
    pub fn allocate(&mut self, segment: Segment, ty: Type) -> Result<Address> {
        if segment == Segment::Constant {
            return Err(Error::internal(
                "constants must be allocated through allocate_constant",
            ));
        }
        self.next_slot(segment, SlotKind::from(ty))
    }

    /// Address holding `value`, allocating it on first use
    pub fn allocate_constant(&mut self, value: Value) -> Result<Address> {
        let key = ConstantKey::from(&value);
        if let Some(address) = self.constant_index.get(&key) {
            return Ok(*address);
        }

        let address = self.next_slot(Segment::Constant, value.kind())?;
        tracing::trace!("constant {} -> {}", value, address);
        self.constants.insert(address, value)?;
        self.constant_index.insert(key, address);
        Ok(address)
    }

    /// Restart the local and temporary counters of every kind
    pub fn reset_local_segments(&mut self) {
        self.counters
            .retain(|(segment, _), _| !segment.is_frame_local());
    }

    /// Local and temporary slots handed out since the last reset
    pub fn usage(&self) -> FrameSize {
        let count = |segment, kind| self.counters.get(&(segment, kind)).copied().unwrap_or(0);
        FrameSize {
            local_int: count(Segment::Local, SlotKind::Int),
            local_float: count(Segment::Local, SlotKind::Float),
            temp_int: count(Segment::Temporary, SlotKind::Int),
            temp_float: count(Segment::Temporary, SlotKind::Float),
        }
    }

    /// The constant pool
    pub fn constants(&self) -> &ConstantTable {
        &self.constants
    }

    /// Move the constant pool out of the allocator
    pub fn into_constants(self) -> ConstantTable {
        self.constants
    }

    fn next_slot(&mut self, segment: Segment, kind: SlotKind) -> Result<Address> {
        let counter = self.counters.entry((segment, kind)).or_insert(0);
        let address = Address::new(segment, kind, *counter).ok_or_else(|| {
            Error::SegmentOverflow {
                segment: segment.name().to_string(),
                kind: kind.name().to_string(),
            }
        })?;
        *counter += 1;
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ir::SEGMENT_SLOTS;

    #[test]
    fn test_counters_are_per_segment_and_kind() {
        let mut mem = MemoryManager::new();
        assert_eq!(mem.allocate(Segment::Global, Type::Int).unwrap().to_raw(), 1000);
        assert_eq!(mem.allocate(Segment::Global, Type::Int).unwrap().to_raw(), 1001);
        assert_eq!(mem.allocate(Segment::Global, Type::Float).unwrap().to_raw(), 2000);
        assert_eq!(mem.allocate(Segment::Local, Type::Float).unwrap().to_raw(), 4000);
        assert_eq!(mem.allocate(Segment::Temporary, Type::Int).unwrap().to_raw(), 5000);
    }

    #[test]
    fn test_constants_are_deduplicated() {
        let mut mem = MemoryManager::new();
        let a = mem.allocate_constant(Value::Int(5)).unwrap();
        let b = mem.allocate_constant(Value::Float(5.0)).unwrap();
        let c = mem.allocate_constant(Value::Int(5)).unwrap();
        let s = mem.allocate_constant(Value::Str("hola".into())).unwrap();

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(a.to_raw(), 7000);
        assert_eq!(b.to_raw(), 8000);
        assert_eq!(s.to_raw(), 9000);
        assert_eq!(mem.constants().len(), 3);
        assert_eq!(mem.constants().get(&b), Some(&Value::Float(5.0)));
    }

    #[test]
    fn test_reset_only_touches_frame_segments() {
        let mut mem = MemoryManager::new();
        mem.allocate(Segment::Global, Type::Int).unwrap();
        mem.allocate(Segment::Local, Type::Int).unwrap();
        mem.allocate(Segment::Temporary, Type::Float).unwrap();
        mem.allocate_constant(Value::Int(1)).unwrap();
        assert_eq!(mem.usage().total(), 2);

        mem.reset_local_segments();
        assert_eq!(mem.usage(), FrameSize::default());
        assert_eq!(mem.allocate(Segment::Local, Type::Int).unwrap().to_raw(), 3000);
        assert_eq!(mem.allocate(Segment::Global, Type::Int).unwrap().to_raw(), 1001);
        assert_eq!(mem.allocate_constant(Value::Int(2)).unwrap().to_raw(), 7001);
    }

    #[test]
    fn test_exhausted_range_overflows() {
        let mut mem = MemoryManager::new();
        for _ in 0..SEGMENT_SLOTS {
            mem.allocate(Segment::Temporary, Type::Int).unwrap();
        }
        let err = mem.allocate(Segment::Temporary, Type::Int).unwrap_err();
        assert!(matches!(err, Error::SegmentOverflow { .. }));
        // The float range is independent.
        assert!(mem.allocate(Segment::Temporary, Type::Float).is_ok());
    }

    #[test]
    fn test_constant_segment_rejected_for_variables() {
        let mut mem = MemoryManager::new();
        assert!(mem.allocate(Segment::Constant, Type::Int).unwrap_err().is_internal());
    }
}
