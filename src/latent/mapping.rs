//! Semantic-to-raw index mapping for latent coordinates.

use crate::{Error, Result};

/// Raw latent indices of the 29 coordinates the shipped decoder responds to.
///
/// Most of the 400 latent coordinates are ignored by the trained decoder;
/// these were found empirically to carry visible variation. Entry `i` is the
/// raw index of semantic dimension `i`.
pub const STANDARD_INDEX_MAPPING: [usize; 29] = [
    31, 37, 42, 47, 69, 83, 84, 94, 101, 137, 138, 139, 165, 178, 192, 197, 206, 212, 219, 235,
    259, 275, 280, 288, 319, 340, 354, 369, 380,
];

/// Immutable table from semantic dimension to raw latent index.
///
/// The domain is `0..len()`; the raw indices are pairwise distinct and all
/// lie below the latent width the mapping was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMapping {
    raw: Vec<usize>,
}

impl IndexMapping {
    /// Build a mapping, checking that every raw index is distinct and inside
    /// a latent space of width `latent_dim`.
    pub fn new(raw: Vec<usize>, latent_dim: usize) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::Config { message: "index mapping must not be empty".to_string() });
        }

        let mut seen = vec![false; latent_dim];
        for (semantic, &index) in raw.iter().enumerate() {
            if index >= latent_dim {
                return Err(Error::Config {
                    message: format!(
                        "semantic dimension {semantic} maps to raw index {index}, outside [0, {}]",
                        latent_dim.saturating_sub(1)
                    ),
                });
            }
            if seen[index] {
                return Err(Error::Config {
                    message: format!("raw index {index} is mapped more than once"),
                });
            }
            seen[index] = true;
        }

        Ok(Self { raw })
    }

    /// The 29-entry mapping of the shipped face model.
    #[must_use]
    pub fn standard() -> Self {
        Self { raw: STANDARD_INDEX_MAPPING.to_vec() }
    }

    /// Resolve a semantic dimension to its raw latent index.
    pub fn resolve(&self, semantic: usize) -> Result<usize> {
        self.raw
            .get(semantic)
            .copied()
            .ok_or(Error::InvalidDimension { index: semantic, max: self.max_dimension() })
    }

    /// Number of semantic dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Always false for a constructed mapping.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Largest valid semantic dimension.
    #[must_use]
    pub fn max_dimension(&self) -> usize {
        self.raw.len().saturating_sub(1)
    }

    /// Raw indices in semantic order.
    #[must_use]
    pub fn raw_indices(&self) -> &[usize] {
        &self.raw
    }
}

impl Default for IndexMapping {
    fn default() -> Self {
        Self::standard()
    }
}
