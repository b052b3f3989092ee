//! Quadruple virtual machine
//!
//! Fetch-execute loop over a [`CompiledProgram`]'s quadruples. The instruction
//! pointer starts at 0 and the program ends when it moves past the last
//! quadruple. Calls push the active [`Frame`] and the resume index onto two
//! parallel stacks; `ENDFUNC` pops both.

use super::memory::{Frame, Memory};
use super::value::Value;
use crate::compiler::ir::{Address, CompiledProgram, OpCode, Operand, Quadruple};
use crate::compiler::memory::ConstantTable;
use crate::error::{Error, Fault, Result};
use std::io::Write;

/// Virtual machine options
#[derive(Debug, Clone)]
pub struct VmOptions {
    /// Deepest allowed call nesting; `None` means unbounded
    pub max_call_depth: Option<usize>,
    /// Most values `PRINT` may emit; `None` means unbounded
    pub max_output: Option<usize>,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            max_call_depth: Some(10_000),
            max_output: None,
        }
    }
}

/// Counters collected during the last run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Quadruples executed
    pub instructions: usize,
    /// Control transfers to an earlier or equal index (loop iterations)
    pub backward_jumps: usize,
    /// Deepest call nesting reached
    pub max_depth: usize,
}

/// Executes quadruples against segmented memory
pub struct VirtualMachine<'p> {
    quadruples: &'p [Quadruple],
    constants: &'p ConstantTable,
    options: VmOptions,
    memory: Memory,
    call_stack: Vec<Frame>,
    return_stack: Vec<usize>,
    pending: Option<Frame>,
    output: Vec<Value>,
    stats: ExecutionStats,
}

impl<'p> VirtualMachine<'p> {
    /// VM for a compiled program with default options
    pub fn new(program: &'p CompiledProgram) -> Self {
        Self::with_options(program, VmOptions::default())
    }

    /// VM for a compiled program
    pub fn with_options(program: &'p CompiledProgram, options: VmOptions) -> Self {
        Self::from_parts(&program.quadruples, &program.constants, options)
    }

    /// VM over a bare quadruple sequence and constant pool
    pub fn from_parts(
        quadruples: &'p [Quadruple],
        constants: &'p ConstantTable,
        options: VmOptions,
    ) -> Self {
        VirtualMachine {
            quadruples,
            constants,
            options,
            memory: Memory::new(constants.clone()),
            call_stack: Vec::new(),
            return_stack: Vec::new(),
            pending: None,
            output: Vec::new(),
            stats: ExecutionStats::default(),
        }
    }

    /// Run to completion and return every printed value in order
    pub fn execute(&mut self) -> Result<Vec<Value>> {
        self.run(None)
    }

    /// Like [`execute`](Self::execute), also writing each value on its own line
    pub fn execute_to<W: Write>(&mut self, writer: &mut W) -> Result<Vec<Value>> {
        self.run(Some(writer as &mut dyn Write))
    }

    /// Current call depth
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Counters of the last run
    pub fn stats(&self) -> ExecutionStats {
        self.stats
    }

    fn reset(&mut self) {
        self.memory = Memory::new(self.constants.clone());
        self.call_stack.clear();
        self.return_stack.clear();
        self.pending = None;
        self.output.clear();
        self.stats = ExecutionStats::default();
    }

    fn run(&mut self, mut writer: Option<&mut dyn Write>) -> Result<Vec<Value>> {
        self.reset();

        let quadruples = self.quadruples;
        let mut ip = 0;
        while let Some(quad) = quadruples.get(ip) {
            tracing::trace!("{:>4}: {}", ip, quad);

            let printed_before = self.output.len();
            let next = self
                .step(ip, quad)
                .map_err(|fault| Error::RuntimeFault { index: ip, fault })?;

            self.stats.instructions += 1;
            if next <= ip && quad.op.is_jump() {
                self.stats.backward_jumps += 1;
            }
            self.stats.max_depth = self.stats.max_depth.max(self.call_stack.len());
            ip = next;

            if let Some(writer) = writer.as_mut() {
                for value in &self.output[printed_before..] {
                    writeln!(writer, "{}", value)?;
                }
            }
        }

        Ok(std::mem::take(&mut self.output))
    }

    /// Execute one quadruple and return the next instruction index
    fn step(&mut self, ip: usize, quad: &Quadruple) -> std::result::Result<usize, Fault> {
        match quad.op {
            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Gt
            | OpCode::Lt
            | OpCode::NotEq => {
                let left = self.read(&quad.arg1)?;
                let right = self.read(&quad.arg2)?;
                let value = binary(quad.op, &left, &right, operand_raw(&quad.arg1))?;
                self.write(&quad.result, value)?;
            }

            OpCode::Assign => {
                let value = self.read(&quad.arg1)?;
                self.write(&quad.result, value)?;
            }

            OpCode::Neg => {
                let value = match self.read(&quad.arg1)? {
                    Value::Int(n) => Value::Int(n.checked_neg().ok_or(Fault::IntegerOverflow)?),
                    Value::Float(x) => Value::Float(-x),
                    Value::Str(_) => return Err(Fault::NotANumber(operand_raw(&quad.arg1))),
                };
                self.write(&quad.result, value)?;
            }

            OpCode::Print => {
                let value = self.read(&quad.arg1)?;
                if let Some(limit) = self.options.max_output {
                    if self.output.len() >= limit {
                        return Err(Fault::OutputLimit(limit));
                    }
                }
                self.output.push(value);
            }

            OpCode::Goto => return jump_target(&quad.result),

            OpCode::GotoF => {
                let condition = self.read(&quad.arg1)?;
                let truthy = condition
                    .is_truthy()
                    .ok_or(Fault::NotANumber(operand_raw(&quad.arg1)))?;
                if !truthy {
                    return jump_target(&quad.result);
                }
            }

            OpCode::Era => {
                self.pending = Some(Frame::new());
            }

            OpCode::Param => {
                let value = self.read(&quad.arg1)?;
                let target = address(&quad.result)?;
                self.pending
                    .as_mut()
                    .ok_or(Fault::NoPendingFrame)?
                    .write_local(target, value)?;
            }

            OpCode::Gosub => {
                let target = jump_target(&quad.result)?;
                let frame = self.pending.take().ok_or(Fault::NoPendingFrame)?;
                if let Some(limit) = self.options.max_call_depth {
                    if self.call_stack.len() >= limit {
                        return Err(Fault::StackOverflow(limit));
                    }
                }

                let caller = self.memory.swap_frame(frame);
                self.call_stack.push(caller);
                self.return_stack.push(ip + 1);
                tracing::debug!(
                    "call {} -> {} (depth {})",
                    quad.arg1.as_ref().map(Operand::to_string).unwrap_or_default(),
                    target,
                    self.call_stack.len()
                );
                return Ok(target);
            }

            OpCode::EndFunc => {
                let caller = self.call_stack.pop().ok_or(Fault::EmptyCallStack)?;
                let resume = self.return_stack.pop().ok_or(Fault::EmptyCallStack)?;
                self.memory.swap_frame(caller);
                tracing::debug!("return -> {} (depth {})", resume, self.call_stack.len());
                return Ok(resume);
            }
        }

        Ok(ip + 1)
    }

    fn read(&self, operand: &Option<Operand>) -> std::result::Result<Value, Fault> {
        self.memory.read(address(operand)?)
    }

    fn write(&mut self, operand: &Option<Operand>, value: Value) -> std::result::Result<(), Fault> {
        self.memory.write(address(operand)?, value)
    }
}

fn address(operand: &Option<Operand>) -> std::result::Result<Address, Fault> {
    match operand {
        Some(Operand::Address(address)) => Ok(*address),
        Some(other) => Err(Fault::Malformed(format!("expected an address, got {}", other))),
        None => Err(Fault::Malformed("missing address operand".to_string())),
    }
}

fn jump_target(operand: &Option<Operand>) -> std::result::Result<usize, Fault> {
    match operand {
        Some(Operand::Jump(target)) => Ok(*target),
        Some(Operand::Pending) => Err(Fault::Malformed("unpatched jump target".to_string())),
        Some(other) => Err(Fault::Malformed(format!("expected a jump target, got {}", other))),
        None => Err(Fault::Malformed("missing jump target".to_string())),
    }
}

fn operand_raw(operand: &Option<Operand>) -> u32 {
    operand
        .as_ref()
        .and_then(Operand::address)
        .map(|a| a.to_raw())
        .unwrap_or(0)
}

/// Arithmetic and relational semantics
fn binary(op: OpCode, left: &Value, right: &Value, at: u32) -> std::result::Result<Value, Fault> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let value = match op {
            OpCode::Add => a.checked_add(b).ok_or(Fault::IntegerOverflow)?,
            OpCode::Sub => a.checked_sub(b).ok_or(Fault::IntegerOverflow)?,
            OpCode::Mul => a.checked_mul(b).ok_or(Fault::IntegerOverflow)?,
            OpCode::Div => {
                if b == 0 {
                    return Err(Fault::DivisionByZero);
                }
                // Rust integer division truncates toward zero
                a.checked_div(b).ok_or(Fault::IntegerOverflow)?
            }
            OpCode::Gt => (a > b) as i64,
            OpCode::Lt => (a < b) as i64,
            OpCode::NotEq => (a != b) as i64,
            other => return Err(Fault::Malformed(format!("{} is not a binary operator", other))),
        };
        return Ok(Value::Int(value));
    }

    let a = left.as_float().ok_or(Fault::NotANumber(at))?;
    let b = right.as_float().ok_or(Fault::NotANumber(at))?;
    let value = match op {
        OpCode::Add => Value::Float(a + b),
        OpCode::Sub => Value::Float(a - b),
        OpCode::Mul => Value::Float(a * b),
        OpCode::Div => {
            if b == 0.0 {
                return Err(Fault::DivisionByZero);
            }
            Value::Float(a / b)
        }
        OpCode::Gt => Value::Int((a > b) as i64),
        OpCode::Lt => Value::Int((a < b) as i64),
        OpCode::NotEq => Value::Int((a != b) as i64),
        other => return Err(Fault::Malformed(format!("{} is not a binary operator", other))),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: u32) -> Option<Operand> {
        Some(Operand::Address(Address::from_raw(raw).unwrap()))
    }

    fn quad(op: OpCode, a: Option<Operand>, b: Option<Operand>, r: Option<Operand>) -> Quadruple {
        Quadruple::new(op, a, b, r)
    }

    fn constants(values: &[(u32, Value)]) -> ConstantTable {
        let mut table = ConstantTable::new();
        for (raw, value) in values {
            table
                .insert(Address::from_raw(*raw).unwrap(), value.clone())
                .unwrap();
        }
        table
    }

    #[test]
    fn test_integer_division_truncates() {
        let quads = vec![
            quad(OpCode::Div, at(7000), at(7001), at(5000)),
            quad(OpCode::Print, at(5000), None, None),
        ];
        let table = constants(&[(7000, Value::Int(-7)), (7001, Value::Int(2))]);
        let mut vm = VirtualMachine::from_parts(&quads, &table, VmOptions::default());
        assert_eq!(vm.execute().unwrap(), vec![Value::Int(-3)]);
    }

    #[test]
    fn test_division_by_zero_reports_index() {
        let quads = vec![
            quad(OpCode::Print, at(7000), None, None),
            quad(OpCode::Div, at(7000), at(7001), at(5000)),
        ];
        let table = constants(&[(7000, Value::Int(1)), (7001, Value::Int(0))]);
        let mut vm = VirtualMachine::from_parts(&quads, &table, VmOptions::default());
        assert_eq!(
            vm.execute().unwrap_err(),
            Error::RuntimeFault {
                index: 1,
                fault: Fault::DivisionByZero
            }
        );
    }

    #[test]
    fn test_relational_yields_int() {
        let quads = vec![
            quad(OpCode::Gt, at(8000), at(7000), at(5000)),
            quad(OpCode::NotEq, at(7000), at(7000), at(5001)),
            quad(OpCode::Print, at(5000), None, None),
            quad(OpCode::Print, at(5001), None, None),
        ];
        let table = constants(&[(7000, Value::Int(2)), (8000, Value::Float(2.5))]);
        let mut vm = VirtualMachine::from_parts(&quads, &table, VmOptions::default());
        assert_eq!(vm.execute().unwrap(), vec![Value::Int(1), Value::Int(0)]);
    }

    #[test]
    fn test_unpatched_jump_is_malformed() {
        let quads = vec![quad(OpCode::Goto, None, None, Some(Operand::Pending))];
        let table = ConstantTable::new();
        let mut vm = VirtualMachine::from_parts(&quads, &table, VmOptions::default());
        assert!(matches!(
            vm.execute(),
            Err(Error::RuntimeFault {
                index: 0,
                fault: Fault::Malformed(_)
            })
        ));
    }

    #[test]
    fn test_call_protocol_faults() {
        let table = constants(&[(7000, Value::Int(1))]);

        let param_without_era = vec![quad(OpCode::Param, at(7000), None, at(3000))];
        let mut vm = VirtualMachine::from_parts(&param_without_era, &table, VmOptions::default());
        assert!(matches!(
            vm.execute(),
            Err(Error::RuntimeFault {
                fault: Fault::NoPendingFrame,
                ..
            })
        ));

        let bare_return = vec![quad(OpCode::EndFunc, None, None, None)];
        let mut vm = VirtualMachine::from_parts(&bare_return, &table, VmOptions::default());
        assert!(matches!(
            vm.execute(),
            Err(Error::RuntimeFault {
                fault: Fault::EmptyCallStack,
                ..
            })
        ));
    }

    #[test]
    fn test_call_depth_ceiling() {
        // 0: ERA f; 1: GOSUB f -> 0 (unbounded self-recursion)
        let quads = vec![
            quad(OpCode::Era, Some(Operand::Function("f".into())), None, None),
            quad(
                OpCode::Gosub,
                Some(Operand::Function("f".into())),
                None,
                Some(Operand::Jump(0)),
            ),
        ];
        let table = ConstantTable::new();
        let options = VmOptions {
            max_call_depth: Some(16),
            max_output: None,
        };
        let mut vm = VirtualMachine::from_parts(&quads, &table, options);
        assert_eq!(
            vm.execute().unwrap_err(),
            Error::RuntimeFault {
                index: 1,
                fault: Fault::StackOverflow(16)
            }
        );
    }

    #[test]
    fn test_execute_to_writes_lines() {
        let quads = vec![
            quad(OpCode::Print, at(9000), None, None),
            quad(OpCode::Print, at(8000), None, None),
        ];
        let table = constants(&[(9000, Value::Str("total".into())), (8000, Value::Float(1.5))]);
        let mut vm = VirtualMachine::from_parts(&quads, &table, VmOptions::default());
        let mut out = Vec::new();
        vm.execute_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "total\n1.5\n");
    }

    #[test]
    fn test_output_limit() {
        let quads = vec![
            quad(OpCode::Print, at(7000), None, None),
            quad(OpCode::Goto, None, None, Some(Operand::Jump(0))),
        ];
        let table = constants(&[(7000, Value::Int(1))]);
        let options = VmOptions {
            max_call_depth: None,
            max_output: Some(3),
        };
        let mut vm = VirtualMachine::from_parts(&quads, &table, options);
        assert!(matches!(
            vm.execute(),
            Err(Error::RuntimeFault {
                fault: Fault::OutputLimit(3),
                ..
            })
        ));
    }
}
