use async_trait::async_trait;

use crate::errors::RetrievalError;

/// The embedding model collaborator memloom consumes. `model` and
/// `dimensions` are immutable for the lifetime of the provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;

    fn model(&self) -> &str;

    fn dimensions(&self) -> usize;
}

/// Validates an embedding vector per §6: length must match `dimensions`,
/// and every entry must be finite.
pub fn validate_vector(vector: &[f32], dimensions: usize) -> Result<(), RetrievalError> {
    if vector.len() != dimensions {
        return Err(RetrievalError::DimensionMismatch {
            expected: dimensions,
            actual: vector.len(),
        });
    }
    for (index, value) in vector.iter().enumerate() {
        if !value.is_finite() {
            return Err(RetrievalError::NonFiniteVector { index });
        }
    }
    Ok(())
}
