//! Append-only quadruple sequence with patch-once jump targets

use super::quadruple::{OpCode, Operand, Quadruple};
use crate::error::{Error, Result};

/// Quadruple generator
///
/// Quadruples are only ever appended. The single mutation allowed after
/// emission is filling a [`Operand::Pending`] jump target, and each target can
/// be filled exactly once.
#[derive(Debug, Clone, Default)]
pub struct QuadrupleGenerator {
    quadruples: Vec<Quadruple>,
}

impl QuadrupleGenerator {
    /// Create an empty generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a quadruple and return its index
    pub fn emit(
        &mut self,
        op: OpCode,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<Operand>,
    ) -> usize {
        let index = self.quadruples.len();
        let quad = Quadruple::new(op, arg1, arg2, result);
        tracing::debug!("emit {:>4}: {}", index, quad);
        self.quadruples.push(quad);
        index
    }

    /// Index the next emitted quadruple will get
    pub fn next_index(&self) -> usize {
        self.quadruples.len()
    }

    /// Fill the pending jump target of quadruple `index`
    pub fn patch(&mut self, index: usize, target: usize) -> Result<()> {
        let quad = self
            .quadruples
            .get_mut(index)
            .ok_or_else(|| Error::internal(format!("patch of missing quadruple {}", index)))?;

        if !quad.op.is_jump() {
            return Err(Error::internal(format!(
                "patch of non-jump quadruple {} ({})",
                index, quad.op
            )));
        }

        match quad.result {
            Some(Operand::Pending) => {
                quad.result = Some(Operand::Jump(target));
                tracing::debug!("patch {:>4} -> {}", index, target);
                Ok(())
            }
            _ => Err(Error::internal(format!(
                "quadruple {} has no pending target (already {})",
                index, quad
            ))),
        }
    }

    /// Quadruple at `index`
    pub fn get(&self, index: usize) -> Option<&Quadruple> {
        self.quadruples.get(index)
    }

    /// Emitted quadruples so far
    pub fn quadruples(&self) -> &[Quadruple] {
        &self.quadruples
    }

    /// Number of emitted quadruples
    pub fn len(&self) -> usize {
        self.quadruples.len()
    }

    /// True when nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.quadruples.is_empty()
    }

    /// Consume the generator, failing if any jump target is still pending
    pub fn finish(self) -> Result<Vec<Quadruple>> {
        if let Some(index) = self.quadruples.iter().position(Quadruple::is_pending) {
            return Err(Error::internal(format!(
                "quadruple {} was never patched",
                index
            )));
        }
        Ok(self.quadruples)
    }
}
