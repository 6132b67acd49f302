//! Synthetic token embeddings.
//!
//! Two generators share the same character seed: [`SimpleEmbedder`] for the
//! educational variant and [`FeatureEmbedder`] for the richer node features of
//! the original variant, which are then projected by a [`LinearTransform`].
//! Any other source of equal-length vectors can stand in through
//! [`TokenEmbedder`].

pub mod features;
pub mod simple;
pub mod transform;

pub use features::FeatureEmbedder;
pub use simple::SimpleEmbedder;
pub use transform::{LinearTransform, attention_vector};

/// Trait for per-token embedding generators.
pub trait TokenEmbedder: Send + Sync {
    /// Embed `token` occurring at `position` in the query, given the
    /// paragraph tokens as context.
    fn embed(&self, token: &str, position: usize, context: &[String]) -> Vec<f64>;

    /// Embed every query token. Repeated tokens are embedded independently.
    fn embed_tokens(&self, tokens: &[String], context: &[String]) -> Vec<Vec<f64>> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| self.embed(t, i, context))
            .collect()
    }

    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

/// Character seed: sum of `code(c) * (1 + index)` over the token's chars.
pub fn token_seed(token: &str) -> u64 {
    token
        .chars()
        .enumerate()
        .map(|(i, c)| u64::from(c).wrapping_mul(i as u64 + 1))
        .fold(0u64, u64::wrapping_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_seed_is_position_weighted() {
        // 'a' = 97, 'b' = 98
        assert_eq!(token_seed("ab"), 97 + 98 * 2);
        assert_eq!(token_seed("ba"), 98 + 97 * 2);
        assert_ne!(token_seed("ab"), token_seed("ba"));
    }

    #[test]
    fn test_token_seed_empty() {
        assert_eq!(token_seed(""), 0);
    }
}
