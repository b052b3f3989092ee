//! Semantic analyzer
//!
//! Owns the global symbol table, the function directory and the memory
//! manager, and tracks which scope declarations currently land in. Every
//! check that can fail on user input returns a positioned [`Error`].

use super::function_directory::{FunctionDirectory, FunctionSignature, Parameter};
use super::ir::{Address, Segment};
use super::memory::{ConstantTable, MemoryManager};
use super::semantic_cube::SemanticCube;
use super::symbols::{StorageClass, Symbol, SymbolTable};
use super::types::{Operator, ReturnType, Type};
use crate::error::{Error, Result};
use crate::runtime::Value;

/// Where declarations currently go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Program level (global `var` section and the entry body)
    Global,
    /// Inside the named function
    InFunction(String),
}

/// Tables produced by a finished analysis
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Global variables
    pub globals: SymbolTable,
    /// Declared functions
    pub functions: FunctionDirectory,
    /// Constant pool
    pub constants: ConstantTable,
}

/// Scoped symbol resolution and type checking
#[derive(Debug, Clone)]
pub struct SemanticAnalyzer {
    scope: Scope,
    globals: SymbolTable,
    functions: FunctionDirectory,
    memory: MemoryManager,
    cube: SemanticCube,
    entry_point: String,
}

impl SemanticAnalyzer {
    /// Create an analyzer; `entry_point` is the reserved name of the entry body
    pub fn new(entry_point: impl Into<String>) -> Self {
        SemanticAnalyzer {
            scope: Scope::Global,
            globals: SymbolTable::new(),
            functions: FunctionDirectory::new(),
            memory: MemoryManager::new(),
            cube: SemanticCube::new(),
            entry_point: entry_point.into(),
        }
    }

    /// Current scope
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Global symbol table
    pub fn globals(&self) -> &SymbolTable {
        &self.globals
    }

    /// Function directory
    pub fn functions(&self) -> &FunctionDirectory {
        &self.functions
    }

    /// Signature of the function being compiled, if any
    pub fn current_function(&self) -> Option<&FunctionSignature> {
        match &self.scope {
            Scope::InFunction(name) => self.functions.get(name),
            Scope::Global => None,
        }
    }

    /// Declare a variable in the active scope
    pub fn declare_variable(&mut self, name: &str, ty: Type, line: usize) -> Result<Address> {
        match self.scope.clone() {
            Scope::Global => {
                if self.globals.contains(name) {
                    return Err(redefinition(name, line));
                }
                let address = self.memory.allocate(Segment::Global, ty)?;
                self.globals.insert(Symbol {
                    name: name.to_string(),
                    ty,
                    storage: StorageClass::Global,
                    line,
                    address,
                })?;
                Ok(address)
            }
            Scope::InFunction(function) => {
                if self.function_mut(&function)?.locals.contains(name) {
                    return Err(redefinition(name, line));
                }
                let address = self.memory.allocate(Segment::Local, ty)?;
                self.function_mut(&function)?.locals.insert(Symbol {
                    name: name.to_string(),
                    ty,
                    storage: StorageClass::Local,
                    line,
                    address,
                })?;
                Ok(address)
            }
        }
    }

    /// Resolve a variable: the active function's locals first, then globals
    pub fn lookup_variable(&self, name: &str, line: usize) -> Result<(Type, Address)> {
        let local = self
            .current_function()
            .and_then(|function| function.locals.get(name));

        local
            .or_else(|| self.globals.get(name))
            .map(|symbol| (symbol.ty, symbol.address))
            .ok_or_else(|| Error::UndefinedVariable {
                name: name.to_string(),
                line,
            })
    }

    /// Open a function declaration and enter its scope
    pub fn declare_function(
        &mut self,
        name: &str,
        return_type: ReturnType,
        line: usize,
    ) -> Result<()> {
        if let Scope::InFunction(open) = &self.scope {
            return Err(Error::internal(format!(
                "function '{}' declared while '{}' is still open",
                name, open
            )));
        }
        if name == self.entry_point || self.functions.contains(name) {
            return Err(redefinition(name, line));
        }

        self.memory.reset_local_segments();

        let mut signature = FunctionSignature::new(name, return_type, line);
        if let Some(ty) = return_type.value_type() {
            signature.return_address = Some(self.memory.allocate(Segment::Global, ty)?);
        }
        self.functions.insert(signature)?;
        self.scope = Scope::InFunction(name.to_string());

        tracing::debug!("enter function {} ({})", name, return_type);
        Ok(())
    }

    /// Add the next formal parameter of the open function
    pub fn add_parameter(&mut self, name: &str, ty: Type, line: usize) -> Result<Address> {
        let function = self.open_function("parameter")?;
        if self.function_mut(&function)?.locals.contains(name) {
            return Err(redefinition(name, line));
        }

        let address = self.memory.allocate(Segment::Local, ty)?;
        let signature = self.function_mut(&function)?;
        signature.locals.insert(Symbol {
            name: name.to_string(),
            ty,
            storage: StorageClass::Parameter,
            line,
            address,
        })?;
        signature.params.push(Parameter {
            name: name.to_string(),
            ty,
            address,
        });
        Ok(address)
    }

    /// Record the entry quadruple of the open function
    pub fn set_entry(&mut self, index: usize) -> Result<()> {
        let function = self.open_function("entry")?;
        self.function_mut(&function)?.set_entry(index)
    }

    /// Result type of `left op right`
    pub fn check_operation(
        &self,
        left: Type,
        op: Operator,
        right: Type,
        line: usize,
    ) -> Result<Type> {
        self.cube.result_type(left, op, right).ok_or_else(|| {
            Error::type_error(
                line,
                format!("operator '{}' is not defined for {} and {}", op, left, right),
            )
        })
    }

    /// Resolve an assignment target and check the value fits
    pub fn check_assignment(
        &self,
        name: &str,
        expr_type: Type,
        line: usize,
    ) -> Result<(Type, Address)> {
        let (target_type, address) = self.lookup_variable(name, line)?;
        if !self.cube.is_valid(target_type, Operator::Assign, expr_type) {
            return Err(Error::type_error(
                line,
                format!(
                    "cannot assign {} to '{}' of type {}",
                    expr_type, name, target_type
                ),
            ));
        }
        Ok((target_type, address))
    }

    /// Check a call's arity and argument types against the signature
    ///
    /// Arguments must match the parameter types exactly; no promotion happens
    /// at call sites.
    pub fn validate_call(
        &self,
        name: &str,
        arg_types: &[Type],
        line: usize,
    ) -> Result<&FunctionSignature> {
        let signature = self
            .functions
            .get(name)
            .ok_or_else(|| Error::UndefinedVariable {
                name: name.to_string(),
                line,
            })?;

        if signature.arity() != arg_types.len() {
            return Err(Error::type_error(
                line,
                format!(
                    "function '{}' expects {} argument(s), got {}",
                    name,
                    signature.arity(),
                    arg_types.len()
                ),
            ));
        }

        for (position, (param, arg)) in signature.params.iter().zip(arg_types).enumerate() {
            if param.ty != *arg {
                return Err(Error::type_error(
                    line,
                    format!(
                        "argument {} of '{}' must be {}, got {}",
                        position + 1,
                        name,
                        param.ty,
                        arg
                    ),
                ));
            }
        }

        Ok(signature)
    }

    /// Check a `return` and give back the slot the value goes to
    pub fn validate_return(&mut self, expr_type: Type, line: usize) -> Result<Address> {
        let function = match &self.scope {
            Scope::InFunction(name) => name.clone(),
            Scope::Global => {
                return Err(Error::type_error(line, "return outside of a function"));
            }
        };

        let signature = self.function_mut(&function)?;
        let declared = signature.return_type.value_type().ok_or_else(|| {
            Error::type_error(
                line,
                format!("void function '{}' cannot return a value", function),
            )
        })?;

        let compatible = declared == expr_type || (declared == Type::Float && expr_type == Type::Int);
        if !compatible {
            return Err(Error::type_error(
                line,
                format!(
                    "function '{}' returns {}, got {}",
                    function, declared, expr_type
                ),
            ));
        }

        signature.has_return = true;
        signature
            .return_address
            .ok_or_else(|| Error::internal(format!("'{}' has no return slot", function)))
    }

    /// Close the open function and go back to global scope
    pub fn exit_function(&mut self) -> Result<()> {
        let function = self.open_function("exit")?;
        let frame = self.memory.usage();
        let signature = self.function_mut(&function)?;
        signature.frame = frame;

        if signature.return_type != ReturnType::Void && !signature.has_return {
            return Err(Error::type_error(
                signature.line,
                format!(
                    "function '{}' returns {} but has no return statement",
                    function, signature.return_type
                ),
            ));
        }

        tracing::debug!(
            "exit function {} (frame: {} slots)",
            function,
            frame.total()
        );
        self.scope = Scope::Global;
        Ok(())
    }

    /// Start the entry body: temporaries restart in the base frame
    pub fn enter_main(&mut self) -> Result<()> {
        if let Scope::InFunction(open) = &self.scope {
            return Err(Error::internal(format!(
                "entry body started while '{}' is still open",
                open
            )));
        }
        self.memory.reset_local_segments();
        Ok(())
    }

    /// Fresh temporary in the active frame
    pub fn allocate_temporary(&mut self, ty: Type) -> Result<Address> {
        self.memory.allocate(Segment::Temporary, ty)
    }

    /// Address of a literal in the constant pool
    pub fn allocate_constant(&mut self, value: Value) -> Result<Address> {
        self.memory.allocate_constant(value)
    }

    /// Hand over the finished tables
    pub fn finish(self) -> AnalysisResult {
        AnalysisResult {
            globals: self.globals,
            functions: self.functions,
            constants: self.memory.into_constants(),
        }
    }

    fn open_function(&self, what: &str) -> Result<String> {
        match &self.scope {
            Scope::InFunction(name) => Ok(name.clone()),
            Scope::Global => Err(Error::internal(format!(
                "{} outside of a function declaration",
                what
            ))),
        }
    }

    fn function_mut(&mut self, name: &str) -> Result<&mut FunctionSignature> {
        self.functions
            .get_mut(name)
            .ok_or_else(|| Error::internal(format!("function '{}' is not registered", name)))
    }
}

fn redefinition(name: &str, line: usize) -> Error {
    Error::Redefinition {
        name: name.to_string(),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SemanticAnalyzer {
        SemanticAnalyzer::new("main")
    }

    #[test]
    fn test_global_then_local_lookup() {
        let mut sa = analyzer();
        let global = sa.declare_variable("x", Type::Int, 1).unwrap();
        assert_eq!(global.to_raw(), 1000);

        sa.declare_function("f", ReturnType::Void, 2).unwrap();
        let local = sa.declare_variable("x", Type::Float, 3).unwrap();
        assert_eq!(local.to_raw(), 4000);
        assert_eq!(sa.lookup_variable("x", 4).unwrap(), (Type::Float, local));

        sa.exit_function().unwrap();
        assert_eq!(sa.lookup_variable("x", 5).unwrap(), (Type::Int, global));
    }

    #[test]
    fn test_undefined_variable_names_identifier() {
        let sa = analyzer();
        let err = sa.lookup_variable("y", 9).unwrap_err();
        assert!(err.to_string().contains("'y'"));
        assert_eq!(err.line(), Some(9));
    }

    #[test]
    fn test_redefinition_in_same_scope() {
        let mut sa = analyzer();
        sa.declare_variable("x", Type::Int, 1).unwrap();
        let err = sa.declare_variable("x", Type::Float, 2).unwrap_err();
        assert!(matches!(err, Error::Redefinition { ref name, line: 2 } if name == "x"));
    }

    #[test]
    fn test_parameter_clash_is_redefinition() {
        let mut sa = analyzer();
        sa.declare_function("f", ReturnType::Void, 1).unwrap();
        sa.add_parameter("a", Type::Int, 1).unwrap();
        assert!(sa.add_parameter("a", Type::Float, 1).is_err());
        assert!(sa.declare_variable("a", Type::Int, 2).is_err());
    }

    #[test]
    fn test_entry_point_name_is_reserved() {
        let mut sa = analyzer();
        assert!(matches!(
            sa.declare_function("main", ReturnType::Void, 1),
            Err(Error::Redefinition { .. })
        ));
    }

    #[test]
    fn test_function_counters_restart() {
        let mut sa = analyzer();
        sa.declare_function("f", ReturnType::Int, 1).unwrap();
        assert_eq!(sa.add_parameter("a", Type::Int, 1).unwrap().to_raw(), 3000);
        assert_eq!(sa.allocate_temporary(Type::Int).unwrap().to_raw(), 5000);
        sa.validate_return(Type::Int, 2).unwrap();
        sa.exit_function().unwrap();

        sa.declare_function("g", ReturnType::Float, 3).unwrap();
        assert_eq!(sa.add_parameter("b", Type::Int, 3).unwrap().to_raw(), 3000);
        assert_eq!(sa.allocate_temporary(Type::Int).unwrap().to_raw(), 5000);

        let f = sa.functions().get("f").unwrap();
        assert_eq!(f.return_address.unwrap().to_raw(), 1000);
        assert_eq!(f.frame.local_int, 1);
        assert_eq!(f.frame.temp_int, 1);
        let g = sa.functions().get("g").unwrap();
        assert_eq!(g.return_address.unwrap().to_raw(), 2000);
    }

    #[test]
    fn test_validate_call_arity_and_types() {
        let mut sa = analyzer();
        sa.declare_function("f", ReturnType::Int, 1).unwrap();
        sa.add_parameter("a", Type::Int, 1).unwrap();
        sa.add_parameter("b", Type::Float, 1).unwrap();
        sa.validate_return(Type::Int, 2).unwrap();
        sa.exit_function().unwrap();

        assert!(sa.validate_call("f", &[Type::Int, Type::Float], 5).is_ok());
        let arity = sa.validate_call("f", &[Type::Int], 5).unwrap_err();
        assert!(matches!(arity, Error::TypeError { .. }));
        let mismatch = sa.validate_call("f", &[Type::Int, Type::Int], 5).unwrap_err();
        assert!(mismatch.to_string().contains("argument 2"));
        assert!(matches!(
            sa.validate_call("nope", &[], 5),
            Err(Error::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_return_rules() {
        let mut sa = analyzer();
        assert!(sa.validate_return(Type::Int, 1).is_err());

        sa.declare_function("v", ReturnType::Void, 1).unwrap();
        assert!(sa.validate_return(Type::Int, 2).is_err());
        sa.exit_function().unwrap();

        sa.declare_function("f", ReturnType::Float, 3).unwrap();
        assert!(sa.validate_return(Type::Int, 4).is_ok());
        sa.exit_function().unwrap();

        sa.declare_function("i", ReturnType::Int, 5).unwrap();
        assert!(sa.validate_return(Type::Float, 6).is_err());
    }

    #[test]
    fn test_missing_return_detected_on_exit() {
        let mut sa = analyzer();
        sa.declare_function("f", ReturnType::Int, 7).unwrap();
        let err = sa.exit_function().unwrap_err();
        assert!(matches!(err, Error::TypeError { line: 7, .. }));
    }

    #[test]
    fn test_assignment_narrowing_rejected() {
        let mut sa = analyzer();
        sa.declare_variable("x", Type::Int, 1).unwrap();
        sa.declare_variable("y", Type::Float, 1).unwrap();
        assert!(sa.check_assignment("x", Type::Float, 2).is_err());
        assert!(sa.check_assignment("y", Type::Int, 2).is_ok());
    }
}
