/*!
 * Token counting for annotation records.
 */

/// Measures the size of a line in model tokens
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Rough estimate: about four characters per token for English text
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTokenCounter;

impl TokenCounter for EstimatedTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
