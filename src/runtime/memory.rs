//! Execution memory: global slots, the constant pool and activation records

use super::value::Value;
use crate::compiler::ir::{Address, Segment, SlotKind};
use crate::compiler::memory::ConstantTable;
use crate::error::Fault;

/// Int and float slots of one segment, grown on first write
#[derive(Debug, Clone, Default)]
struct Bank {
    ints: Vec<Option<Value>>,
    floats: Vec<Option<Value>>,
}

impl Bank {
    fn slots(&self, kind: SlotKind) -> Option<&Vec<Option<Value>>> {
        match kind {
            SlotKind::Int => Some(&self.ints),
            SlotKind::Float => Some(&self.floats),
            SlotKind::Str => None,
        }
    }

    fn slots_mut(&mut self, kind: SlotKind) -> Option<&mut Vec<Option<Value>>> {
        match kind {
            SlotKind::Int => Some(&mut self.ints),
            SlotKind::Float => Some(&mut self.floats),
            SlotKind::Str => None,
        }
    }

    fn read(&self, address: Address) -> Result<Value, Fault> {
        self.slots(address.kind)
            .ok_or(Fault::SegmentationFault(address.to_raw()))?
            .get(address.offset as usize)
            .cloned()
            .flatten()
            .ok_or(Fault::UninitializedRead(address.to_raw()))
    }

    fn write(&mut self, address: Address, value: Value) -> Result<(), Fault> {
        let slots = self
            .slots_mut(address.kind)
            .ok_or(Fault::SegmentationFault(address.to_raw()))?;
        let offset = address.offset as usize;
        if slots.len() <= offset {
            slots.resize(offset + 1, None);
        }
        slots[offset] = Some(value);
        Ok(())
    }
}

/// Activation record: local and temporary slots of one invocation
#[derive(Debug, Clone, Default)]
pub struct Frame {
    locals: Bank,
    temps: Bank,
}

impl Frame {
    /// Empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Store into a local slot; used by `PARAM` on a pending record
    pub fn write_local(&mut self, address: Address, value: Value) -> Result<(), Fault> {
        if address.segment != Segment::Local {
            return Err(Fault::SegmentationFault(address.to_raw()));
        }
        let value = coerce(address, value)?;
        self.locals.write(address, value)
    }

    fn bank(&self, segment: Segment) -> Option<&Bank> {
        match segment {
            Segment::Local => Some(&self.locals),
            Segment::Temporary => Some(&self.temps),
            _ => None,
        }
    }

    fn bank_mut(&mut self, segment: Segment) -> Option<&mut Bank> {
        match segment {
            Segment::Local => Some(&mut self.locals),
            Segment::Temporary => Some(&mut self.temps),
            _ => None,
        }
    }
}

/// Whole addressable memory of a running program
#[derive(Debug, Clone)]
pub struct Memory {
    globals: Bank,
    constants: ConstantTable,
    frame: Frame,
}

impl Memory {
    /// Memory with the constant pool preloaded and an empty base frame
    pub fn new(constants: ConstantTable) -> Self {
        Memory {
            globals: Bank::default(),
            constants,
            frame: Frame::new(),
        }
    }

    /// Read a slot of any segment
    pub fn read(&self, address: Address) -> Result<Value, Fault> {
        match address.segment {
            Segment::Global => self.globals.read(address),
            Segment::Constant => self
                .constants
                .get(&address)
                .cloned()
                .ok_or(Fault::UninitializedRead(address.to_raw())),
            segment => self
                .frame
                .bank(segment)
                .ok_or(Fault::SegmentationFault(address.to_raw()))?
                .read(address),
        }
    }

    /// Write a slot; ints stored in float slots are promoted
    pub fn write(&mut self, address: Address, value: Value) -> Result<(), Fault> {
        let value = coerce(address, value)?;
        match address.segment {
            Segment::Global => self.globals.write(address, value),
            Segment::Constant => Err(Fault::ConstantWrite(address.to_raw())),
            segment => self
                .frame
                .bank_mut(segment)
                .ok_or(Fault::SegmentationFault(address.to_raw()))?
                .write(address, value),
        }
    }

    /// Install `frame` as the active record, returning the previous one
    pub fn swap_frame(&mut self, frame: Frame) -> Frame {
        std::mem::replace(&mut self.frame, frame)
    }
}

/// Fit a value to the kind of the slot it is stored in
fn coerce(address: Address, value: Value) -> Result<Value, Fault> {
    match (address.kind, value) {
        (SlotKind::Int, Value::Int(n)) => Ok(Value::Int(n)),
        (SlotKind::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
        (SlotKind::Float, Value::Float(x)) => Ok(Value::Float(x)),
        (SlotKind::Int, Value::Float(_)) => Err(Fault::NarrowingStore(address.to_raw())),
        (_, Value::Str(_)) | (SlotKind::Str, _) => Err(Fault::Malformed(format!(
            "string value cannot be stored at {}",
            address
        ))),
    }
}
