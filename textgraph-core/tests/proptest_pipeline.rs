//! Property-based tests for the attention pipeline using proptest.

use proptest::prelude::*;

use textgraph_core::embedding::{SimpleEmbedder, TokenEmbedder};
use textgraph_core::{AttentionMatrix, AttentionStats, SoftmaxNormalizer, Variant};
use textgraph_core::{compute_attention, compute_dual_attention, tokenize};

fn query_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 2..8).prop_map(|words| words.join(" "))
}

fn row_sums_close(m: &AttentionMatrix) -> bool {
    m.row_sums().iter().all(|s| (s - 1.0).abs() < 1e-6)
}

// --- Tokenizer properties ---

proptest! {
    #[test]
    fn tokens_are_nonempty_lowercase_words(text in "[A-Za-z0-9_ ,.!?'-]{0,80}") {
        for token in tokenize(&text) {
            prop_assert!(!token.is_empty());
            prop_assert!(token.chars().all(|c| c.is_alphanumeric() || c == '_'));
            prop_assert_eq!(token.to_lowercase(), token.clone());
        }
    }

    #[test]
    fn tokenize_is_idempotent(text in "[A-Za-z0-9_ ,.!?'-]{0,80}") {
        let once = tokenize(&text);
        let twice = tokenize(&once.join(" "));
        prop_assert_eq!(once, twice);
    }
}

// --- Pipeline properties ---

proptest! {
    #[test]
    fn educational_rows_sum_to_one_with_zero_diagonal(query in query_strategy()) {
        let result = compute_attention("", &query, Variant::Educational).unwrap();
        let m = &result.attention_matrix;
        prop_assert!(row_sums_close(m));
        prop_assert!(m.diagonal().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn original_rows_sum_to_one(query in query_strategy(), paragraph in ".{0,60}") {
        let result = compute_attention(&paragraph, &query, Variant::Original).unwrap();
        prop_assert!(row_sums_close(&result.attention_matrix));
    }

    #[test]
    fn dual_matrices_share_shape(query in query_strategy()) {
        let dual = compute_dual_attention("", &query).unwrap();
        let n = dual.query_tokens.len();
        prop_assert_eq!(dual.educational.attention_matrix.size(), n);
        prop_assert_eq!(dual.original.attention_matrix.size(), n);
    }

    #[test]
    fn simple_embedding_is_deterministic(token in "[a-z_0-9]{1,12}") {
        let embedder = SimpleEmbedder::default();
        let a = embedder.embed(&token, 0, &[]);
        let b = embedder.embed(&token, 3, &[]);
        prop_assert_eq!(a, b);
    }
}

// --- Softmax / statistics properties ---

proptest! {
    #[test]
    fn aggregate_range_ordered_unless_all_zero(
        raw in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 4), 4),
        include_diagonal in any::<bool>(),
    ) {
        let softmax = SoftmaxNormalizer::new(false, !include_diagonal);
        let m = softmax.normalize(&raw).unwrap();
        let stats = AttentionStats::aggregate(&m, include_diagonal);
        let all_zero = m.rows().iter().flatten().all(|v| *v == 0.0);
        prop_assert!(stats.min_attention <= stats.max_attention || all_zero);
    }

    #[test]
    fn softmax_cells_are_probabilities(
        raw in prop::collection::vec(prop::collection::vec(-50.0f64..50.0, 5), 5),
    ) {
        let m = SoftmaxNormalizer::new(false, false).normalize(&raw).unwrap();
        prop_assert!(m.rows().iter().flatten().all(|v| (0.0..=1.0).contains(v)));
        prop_assert!(row_sums_close(&m));
    }
}
