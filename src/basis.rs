//! The ordered sequence of orthonormal Krylov basis vectors `V`.

use crate::operand::Operand;

/// Up to `m+1` basis operands, owned exclusively by one solve for its
/// duration. No back-references or cyclic ownership: this is a plain
/// growable sequence.
pub struct KrylovBasis<V> {
    vectors: Vec<V>,
}

impl<V: Operand> KrylovBasis<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vectors: Vec::with_capacity(capacity),
        }
    }

    /// Drop all basis vectors, keeping the underlying allocation for reuse
    /// on the next restart cycle.
    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    pub fn push(&mut self, v: V) {
        self.vectors.push(v);
    }

    pub fn get(&self, i: usize) -> &V {
        &self.vectors[i]
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
