//! Reduction-driven quadruple translation
//!
//! [`Translator`] is the [`ReductionSink`] of the compiler core. It keeps two
//! parallel working stacks (operand addresses and their types) for expressions
//! and a jump stack for structured control flow, and emits quadruples as
//! reductions arrive:
//!
//! ```text
//! if (c) A else B          while (c) do A
//!
//!   c                        L: c
//!   GOTOF c, _, E            GOTOF c, _, X
//!   A                        A
//!   GOTO _, _, X             GOTO _, _, L
//! E: B                     X:
//! X:
//! ```

use super::analyzer::SemanticAnalyzer;
use super::ir::{Address, CompiledProgram, OpCode, Operand, QuadrupleGenerator};
use super::types::{Operator, ReturnType, Type};
use crate::error::{Error, Result};
use crate::parser::{CallContext, Reduction, ReductionSink, UnaryOp};
use crate::runtime::Value;

/// Semantic-directed translator
#[derive(Debug, Clone)]
pub struct Translator {
    analyzer: SemanticAnalyzer,
    generator: QuadrupleGenerator,
    operands: Vec<Address>,
    types: Vec<Type>,
    jumps: Vec<usize>,
    main_jump: Option<usize>,
    program_name: Option<String>,
    finished: bool,
}

impl Translator {
    /// Create a translator whose entry body is named `entry_point`
    pub fn new(entry_point: impl Into<String>) -> Self {
        Translator {
            analyzer: SemanticAnalyzer::new(entry_point),
            generator: QuadrupleGenerator::new(),
            operands: Vec::new(),
            types: Vec::new(),
            jumps: Vec::new(),
            main_jump: None,
            program_name: None,
            finished: false,
        }
    }

    /// The semantic analyzer
    pub fn analyzer(&self) -> &SemanticAnalyzer {
        &self.analyzer
    }

    /// Quadruples emitted so far
    pub fn generator(&self) -> &QuadrupleGenerator {
        &self.generator
    }

    /// Build the program once `ProgramEnd` has been reduced
    pub fn finish(self) -> Result<CompiledProgram> {
        if !self.finished {
            return Err(Error::internal("translation finished before program end"));
        }
        let name = self.program_name.unwrap_or_default();
        let quadruples = self.generator.finish()?;
        let tables = self.analyzer.finish();
        Ok(CompiledProgram {
            name,
            quadruples,
            constants: tables.constants,
            globals: tables.globals,
            functions: tables.functions,
        })
    }

    fn push_operand(&mut self, address: Address, ty: Type) {
        self.operands.push(address);
        self.types.push(ty);
    }

    fn pop_operand(&mut self) -> Result<(Address, Type)> {
        match (self.operands.pop(), self.types.pop()) {
            (Some(address), Some(ty)) => Ok((address, ty)),
            _ => Err(Error::internal("operand stack underflow")),
        }
    }

    fn pop_jump(&mut self) -> Result<usize> {
        self.jumps
            .pop()
            .ok_or_else(|| Error::internal("jump stack underflow"))
    }

    /// Working stacks must be empty between statement lists
    fn ensure_balanced(&self, at: &str) -> Result<()> {
        if !self.jumps.is_empty() {
            return Err(Error::internal(format!(
                "{} pending jump(s) at {}",
                self.jumps.len(),
                at
            )));
        }
        if !self.operands.is_empty() || !self.types.is_empty() {
            return Err(Error::internal(format!(
                "{} leftover operand(s) at {}",
                self.operands.len(),
                at
            )));
        }
        Ok(())
    }

    fn emit(
        &mut self,
        op: OpCode,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<Operand>,
    ) -> usize {
        self.generator.emit(op, arg1, arg2, result)
    }

    fn binary(&mut self, op: Operator, line: usize) -> Result<()> {
        let (right, right_type) = self.pop_operand()?;
        let (left, left_type) = self.pop_operand()?;
        let result_type = self.analyzer.check_operation(left_type, op, right_type, line)?;
        let temp = self.analyzer.allocate_temporary(result_type)?;
        self.emit(
            OpCode::from(op),
            Some(left.into()),
            Some(right.into()),
            Some(temp.into()),
        );
        self.push_operand(temp, result_type);
        Ok(())
    }

    fn unary(&mut self, op: UnaryOp) -> Result<()> {
        match op {
            UnaryOp::Plus => {
                if self.operands.is_empty() {
                    return Err(Error::internal("operand stack underflow"));
                }
                Ok(())
            }
            UnaryOp::Minus => {
                let (operand, ty) = self.pop_operand()?;
                let temp = self.analyzer.allocate_temporary(ty)?;
                self.emit(OpCode::Neg, Some(operand.into()), None, Some(temp.into()));
                self.push_operand(temp, ty);
                Ok(())
            }
        }
    }

    fn call(&mut self, name: &str, argc: usize, context: CallContext, line: usize) -> Result<()> {
        if self.operands.len() < argc {
            return Err(Error::internal(format!(
                "call to '{}' needs {} argument(s) on the stack",
                name, argc
            )));
        }
        let split = self.operands.len() - argc;
        let args = self.operands.split_off(split);
        let arg_types = self.types.split_off(split);

        let signature = self.analyzer.validate_call(name, &arg_types, line)?;
        let return_type = signature.return_type;
        let return_address = signature.return_address;
        let targets: Vec<Address> = signature.params.iter().map(|p| p.address).collect();
        let entry = signature
            .entry
            .ok_or_else(|| Error::internal(format!("'{}' called before its body", name)))?;

        if context == CallContext::Expression && return_type == ReturnType::Void {
            return Err(Error::type_error(
                line,
                format!("void function '{}' used in an expression", name),
            ));
        }

        self.emit(
            OpCode::Era,
            Some(Operand::Function(name.to_string())),
            None,
            None,
        );
        for (arg, target) in args.into_iter().zip(targets) {
            self.emit(OpCode::Param, Some(arg.into()), None, Some(target.into()));
        }
        self.emit(
            OpCode::Gosub,
            Some(Operand::Function(name.to_string())),
            None,
            Some(Operand::Jump(entry)),
        );

        if context == CallContext::Expression {
            let (ty, address) = match (return_type.value_type(), return_address) {
                (Some(ty), Some(address)) => (ty, address),
                _ => return Err(Error::internal(format!("'{}' has no return slot", name))),
            };
            let temp = self.analyzer.allocate_temporary(ty)?;
            self.emit(OpCode::Assign, Some(address.into()), None, Some(temp.into()));
            self.push_operand(temp, ty);
        }
        Ok(())
    }
}

impl ReductionSink for Translator {
    fn reduce(&mut self, reduction: Reduction) -> Result<()> {
        tracing::trace!("reduce {:?}", reduction);

        match reduction {
            Reduction::ProgramStart { name, .. } => {
                self.program_name = Some(name);
                let jump = self.emit(OpCode::Goto, None, None, Some(Operand::Pending));
                self.main_jump = Some(jump);
            }

            Reduction::VarDecl { names, ty, line } => {
                for name in &names {
                    self.analyzer.declare_variable(name, ty, line)?;
                }
            }

            Reduction::FunctionHeader {
                name,
                return_type,
                line,
            } => {
                self.ensure_balanced("function header")?;
                self.analyzer.declare_function(&name, return_type, line)?;
            }

            Reduction::Param { name, ty, line } => {
                self.analyzer.add_parameter(&name, ty, line)?;
            }

            Reduction::FunctionBodyStart { .. } => {
                let entry = self.generator.next_index();
                self.analyzer.set_entry(entry)?;
            }

            Reduction::FunctionEnd { .. } => {
                self.ensure_balanced("function end")?;
                self.emit(OpCode::EndFunc, None, None, None);
                self.analyzer.exit_function()?;
            }

            Reduction::MainStart { .. } => {
                self.ensure_balanced("main")?;
                let jump = self
                    .main_jump
                    .take()
                    .ok_or_else(|| Error::internal("entry body without program start"))?;
                let target = self.generator.next_index();
                self.generator.patch(jump, target)?;
                self.analyzer.enter_main()?;
            }

            Reduction::ProgramEnd { .. } => {
                self.ensure_balanced("program end")?;
                if self.main_jump.is_some() {
                    return Err(Error::internal("program ended without an entry body"));
                }
                self.finished = true;
            }

            Reduction::Identifier { name, line } => {
                let (ty, address) = self.analyzer.lookup_variable(&name, line)?;
                self.push_operand(address, ty);
            }

            Reduction::IntLiteral { value, .. } => {
                let address = self.analyzer.allocate_constant(Value::Int(value))?;
                self.push_operand(address, Type::Int);
            }

            Reduction::FloatLiteral { value, .. } => {
                let address = self.analyzer.allocate_constant(Value::Float(value))?;
                self.push_operand(address, Type::Float);
            }

            Reduction::Unary { op, .. } => self.unary(op)?,

            Reduction::Binary { op, line } => self.binary(op, line)?,

            Reduction::Parenthesized { .. } => {}

            Reduction::Call {
                name,
                argc,
                context,
                line,
            } => self.call(&name, argc, context, line)?,

            Reduction::Assign { name, line } => {
                let (value, value_type) = self.pop_operand()?;
                let (_, target) = self.analyzer.check_assignment(&name, value_type, line)?;
                self.emit(OpCode::Assign, Some(value.into()), None, Some(target.into()));
            }

            Reduction::PrintExpression { .. } => {
                let (value, _) = self.pop_operand()?;
                self.emit(OpCode::Print, Some(value.into()), None, None);
            }

            Reduction::PrintString { value, .. } => {
                let address = self.analyzer.allocate_constant(Value::Str(value))?;
                self.emit(OpCode::Print, Some(address.into()), None, None);
            }

            Reduction::IfCondition { .. } | Reduction::WhileCondition { .. } => {
                let (condition, _) = self.pop_operand()?;
                let jump = self.emit(
                    OpCode::GotoF,
                    Some(condition.into()),
                    None,
                    Some(Operand::Pending),
                );
                self.jumps.push(jump);
            }

            Reduction::Else { .. } => {
                let false_jump = self.pop_jump()?;
                let exit_jump = self.emit(OpCode::Goto, None, None, Some(Operand::Pending));
                self.jumps.push(exit_jump);
                let target = self.generator.next_index();
                self.generator.patch(false_jump, target)?;
            }

            Reduction::IfEnd { .. } => {
                let jump = self.pop_jump()?;
                let target = self.generator.next_index();
                self.generator.patch(jump, target)?;
            }

            Reduction::WhileStart { .. } => {
                let loop_back = self.generator.next_index();
                self.jumps.push(loop_back);
            }

            Reduction::WhileEnd { .. } => {
                let exit = self.pop_jump()?;
                let loop_back = self.pop_jump()?;
                self.emit(OpCode::Goto, None, None, Some(Operand::Jump(loop_back)));
                let target = self.generator.next_index();
                self.generator.patch(exit, target)?;
            }

            Reduction::Return { line } => {
                let (value, value_type) = self.pop_operand()?;
                let slot = self.analyzer.validate_return(value_type, line)?;
                self.emit(OpCode::Assign, Some(value.into()), None, Some(slot.into()));
                self.emit(OpCode::EndFunc, None, None, None);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: Vec<Reduction>) -> Result<CompiledProgram> {
        let mut translator = Translator::new("main");
        for event in events {
            translator.reduce(event)?;
        }
        translator.finish()
    }

    fn var(name: &str, ty: Type) -> Reduction {
        Reduction::VarDecl {
            names: vec![name.to_string()],
            ty,
            line: 1,
        }
    }

    fn id(name: &str) -> Reduction {
        Reduction::Identifier {
            name: name.to_string(),
            line: 2,
        }
    }

    #[test]
    fn test_binary_emits_into_temporary() {
        let program = run(vec![
            Reduction::ProgramStart {
                name: "p".into(),
                line: 1,
            },
            var("a", Type::Int),
            var("b", Type::Float),
            Reduction::MainStart { line: 2 },
            id("a"),
            id("b"),
            Reduction::Binary {
                op: Operator::Add,
                line: 2,
            },
            Reduction::PrintExpression { line: 2 },
            Reduction::ProgramEnd { line: 3 },
        ])
        .unwrap();

        let quads: Vec<String> = program.quadruples.iter().map(|q| q.to_string()).collect();
        assert_eq!(
            quads,
            vec!["(GOTO, _, _, 1)", "(+, 1000, 2000, 6000)", "(PRINT, 6000, _, _)"]
        );
    }

    #[test]
    fn test_if_else_backpatching() {
        let program = run(vec![
            Reduction::ProgramStart {
                name: "p".into(),
                line: 1,
            },
            var("x", Type::Int),
            Reduction::MainStart { line: 2 },
            id("x"),
            Reduction::IfCondition { line: 3 },
            Reduction::IntLiteral { value: 1, line: 3 },
            Reduction::Assign {
                name: "x".into(),
                line: 3,
            },
            Reduction::Else { line: 4 },
            Reduction::IntLiteral { value: 2, line: 4 },
            Reduction::Assign {
                name: "x".into(),
                line: 4,
            },
            Reduction::IfEnd { line: 3 },
            Reduction::ProgramEnd { line: 5 },
        ])
        .unwrap();

        let quads: Vec<String> = program.quadruples.iter().map(|q| q.to_string()).collect();
        assert_eq!(
            quads,
            vec![
                "(GOTO, _, _, 1)",
                "(GOTOF, 1000, _, 4)",
                "(=, 7000, _, 1000)",
                "(GOTO, _, _, 5)",
                "(=, 7001, _, 1000)",
            ]
        );
    }

    #[test]
    fn test_void_call_in_expression_is_type_error() {
        let err = run(vec![
            Reduction::ProgramStart {
                name: "p".into(),
                line: 1,
            },
            Reduction::FunctionHeader {
                name: "f".into(),
                return_type: ReturnType::Void,
                line: 2,
            },
            Reduction::FunctionBodyStart { line: 2 },
            Reduction::FunctionEnd { line: 2 },
            Reduction::MainStart { line: 3 },
            Reduction::Call {
                name: "f".into(),
                argc: 0,
                context: CallContext::Expression,
                line: 3,
            },
        ])
        .unwrap_err();
        assert!(matches!(err, Error::TypeError { line: 3, .. }));
    }

    #[test]
    fn test_unbalanced_jump_stack_is_internal() {
        let err = run(vec![
            Reduction::ProgramStart {
                name: "p".into(),
                line: 1,
            },
            Reduction::MainStart { line: 2 },
            Reduction::WhileStart { line: 2 },
            Reduction::ProgramEnd { line: 3 },
        ])
        .unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_finish_requires_program_end() {
        let mut translator = Translator::new("main");
        translator
            .reduce(Reduction::ProgramStart {
                name: "p".into(),
                line: 1,
            })
            .unwrap();
        assert!(translator.finish().unwrap_err().is_internal());
    }
}
