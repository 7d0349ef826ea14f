//! Vector similarity.
//!
//! Embeddings reach the engine in more than one encoding: native float
//! sequences, JSON strings such as `"[0.1, 0.2]"`, or bare delimited lists.
//! Every input is normalized once into a float slice before comparison.
//! An input that cannot be normalized is "not similar" (0.0), never a fault.

use std::borrow::Cow;

use curator_types::RawEmbedding;

/// The closed set of embedding representations the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmbeddingInput<'a> {
    /// Native numeric sequence
    Values(&'a [f32]),
    /// JSON array string or comma/whitespace delimited numbers
    Text(&'a str),
    /// Null embedding
    Missing,
}

impl<'a> From<&'a [f32]> for EmbeddingInput<'a> {
    fn from(values: &'a [f32]) -> Self {
        EmbeddingInput::Values(values)
    }
}

impl<'a> From<&'a Vec<f32>> for EmbeddingInput<'a> {
    fn from(values: &'a Vec<f32>) -> Self {
        EmbeddingInput::Values(values.as_slice())
    }
}

impl<'a> From<&'a str> for EmbeddingInput<'a> {
    fn from(text: &'a str) -> Self {
        EmbeddingInput::Text(text)
    }
}

impl<'a> From<&'a RawEmbedding> for EmbeddingInput<'a> {
    fn from(raw: &'a RawEmbedding) -> Self {
        match raw {
            RawEmbedding::Values(values) => EmbeddingInput::Values(values.as_slice()),
            RawEmbedding::Text(text) => EmbeddingInput::Text(text.as_str()),
        }
    }
}

impl<'a, T> From<Option<T>> for EmbeddingInput<'a>
where
    T: Into<EmbeddingInput<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(EmbeddingInput::Missing)
    }
}

/// Normalize an embedding input into a float vector.
///
/// Returns `None` for null, empty, unparseable or non-finite input.
pub fn parse_embedding<'a>(input: impl Into<EmbeddingInput<'a>>) -> Option<Cow<'a, [f32]>> {
    match input.into() {
        EmbeddingInput::Values(values) => {
            if is_usable(values) {
                Some(Cow::Borrowed(values))
            } else {
                None
            }
        }
        EmbeddingInput::Text(text) => parse_text(text).map(Cow::Owned),
        EmbeddingInput::Missing => None,
    }
}

fn parse_text(text: &str) -> Option<Vec<f32>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let values = match serde_json::from_str::<Vec<f32>>(trimmed) {
        Ok(values) => values,
        Err(_) => {
            let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
            let inner = inner.strip_suffix(']').unwrap_or(inner);
            inner
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(str::parse::<f32>)
                .collect::<Result<Vec<_>, _>>()
                .ok()?
        }
    };

    if is_usable(&values) {
        Some(values)
    } else {
        None
    }
}

fn is_usable(values: &[f32]) -> bool {
    !values.is_empty() && values.iter().all(|v| v.is_finite())
}

/// Cosine similarity between two float vectors.
///
/// Returns 0.0 for mismatched dimensions, empty vectors, zero vectors, or a
/// non-finite result.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot_product / (norm_a * norm_b);
    if sim.is_finite() {
        sim
    } else {
        0.0
    }
}

/// Similarity between two embeddings in any accepted encoding.
///
/// # Example
///
/// ```
/// use curator_core::similarity;
///
/// let a = vec![1.0f32, 0.0];
/// assert!((similarity(&a, "[1.0, 0.0]") - 1.0).abs() < 1e-6);
/// assert_eq!(similarity(&a, "not a vector"), 0.0);
/// assert_eq!(similarity(&a, None::<&str>), 0.0);
/// ```
pub fn similarity<'a, 'b>(
    a: impl Into<EmbeddingInput<'a>>,
    b: impl Into<EmbeddingInput<'b>>,
) -> f32 {
    match (parse_embedding(a), parse_embedding(b)) {
        (Some(a), Some(b)) => cosine_similarity(&a, &b),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let a = vec![0.3, 0.4, 0.5];
        assert!((similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_json_string_matches_native() {
        let native = vec![0.8, 0.6];
        assert!((similarity(&native, "[0.8, 0.6]") - 1.0).abs() < 1e-6);
        assert!((similarity("[0.8,0.6]", "[0.8, 0.6]") - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_delimited_strings() {
        let native = vec![1.0, 2.0, 3.0];
        assert!((similarity(&native, "1.0, 2.0, 3.0") - 1.0).abs() < 1e-6);
        assert!((similarity(&native, "1 2 3") - 1.0).abs() < 1e-6);
        assert!((similarity(&native, "[1.0 2.0 3.0]") - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_null_is_not_similar() {
        let a = vec![1.0, 0.0];
        assert_eq!(similarity(&a, None::<&Vec<f32>>), 0.0);
        assert_eq!(similarity(EmbeddingInput::Missing, &a), 0.0);
    }

    #[test]
    fn test_malformed_json_is_not_similar() {
        let a = vec![1.0, 0.0];
        assert_eq!(similarity(&a, "[1.0, oops]"), 0.0);
        assert_eq!(similarity(&a, "{\"x\": 1}"), 0.0);
        assert_eq!(similarity(&a, ""), 0.0);
        assert_eq!(similarity(&a, "[]"), 0.0);
    }

    #[test]
    fn test_mismatched_dimensions_are_not_similar() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_zero_vector_is_not_similar() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let a = vec![1.0, 0.0];
        let b = vec![f32::NAN, 0.0];
        assert_eq!(similarity(&a, &b), 0.0);
        assert_eq!(similarity(&a, "inf, 0"), 0.0);
        assert!(parse_embedding(&b).is_none());
    }

    #[test]
    fn test_raw_embedding_inputs() {
        let values = RawEmbedding::Values(vec![0.6, 0.8]);
        let text = RawEmbedding::Text("[0.6, 0.8]".to_string());
        assert!((similarity(&values, &text) - 1.0).abs() < 1e-6);
        assert_eq!(parse_embedding(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_borrows_native_values() {
        let a = vec![1.0, 2.0];
        assert!(matches!(parse_embedding(&a), Some(Cow::Borrowed(_))));
    }
}
