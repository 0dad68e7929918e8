//! Hybrid retrieval and vector index tunables

use serde::{Deserialize, Serialize};

/// Defaults for hybrid retrieval; every field can be overridden per call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a vector-path anchor
    #[serde(default = "default_vector_score_threshold")]
    pub vector_score_threshold: f32,
    /// Maximum anchors from the vector path
    #[serde(default = "default_limit")]
    pub vector_limit: usize,
    /// Maximum anchors per extracted entity name
    #[serde(default = "default_limit")]
    pub entity_match_limit: usize,
    /// Expansion depth (1 or 2)
    #[serde(default = "default_hop_depth")]
    pub hop_depth: u8,
    /// Maximum triples returned
    #[serde(default = "default_max_triples")]
    pub max_triples: usize,
    /// Per-path timeout in seconds. A path that times out contributes no anchors.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_vector_score_threshold() -> f32 {
    0.6
}

fn default_limit() -> usize {
    5
}

fn default_hop_depth() -> u8 {
    1
}

fn default_max_triples() -> usize {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_score_threshold: default_vector_score_threshold(),
            vector_limit: default_limit(),
            entity_match_limit: default_limit(),
            hop_depth: default_hop_depth(),
            max_triples: default_max_triples(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Similarity function of a vector index
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityFunction {
    /// Cosine distance
    #[default]
    Cosine,
    /// Euclidean distance
    Euclidean,
    /// Manhattan distance
    Manhattan,
}

impl SimilarityFunction {
    /// Keyword used by SurrealQL `DIST`
    pub fn as_surql(&self) -> &'static str {
        match self {
            Self::Cosine => "COSINE",
            Self::Euclidean => "EUCLIDEAN",
            Self::Manhattan => "MANHATTAN",
        }
    }

    /// SurrealQL expression scoring `embedding` against `$vector`, on the
    /// same scale as [`SimilarityFunction::score`]
    pub fn surql_score(&self) -> &'static str {
        match self {
            Self::Cosine => "vector::similarity::cosine(embedding, $vector)",
            Self::Euclidean => "1.0 / (1.0 + vector::distance::euclidean(embedding, $vector))",
            Self::Manhattan => "1.0 / (1.0 + vector::distance::manhattan(embedding, $vector))",
        }
    }

    /// Higher is closer. Cosine similarity for `Cosine`; distances map to
    /// `1 / (1 + d)`, so identical vectors score 1 under every function.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    0.0
                } else {
                    dot / (norm_a * norm_b)
                }
            }
            Self::Euclidean => {
                let distance = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt();
                1.0 / (1.0 + distance)
            }
            Self::Manhattan => {
                let distance: f32 = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum();
                1.0 / (1.0 + distance)
            }
        }
    }
}

/// Per-namespace vector index settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorIndexConfig {
    /// Similarity function for the index
    #[serde(default)]
    pub similarity: SimilarityFunction,
    /// Dimensions used when no embedding model tells us otherwise
    #[serde(default = "default_dimensions")]
    pub default_dimensions: usize,
    /// Readiness probes before giving up
    #[serde(default = "default_ready_attempts")]
    pub ready_max_attempts: u32,
    /// Delay between the first two readiness probes, in milliseconds
    #[serde(default = "default_ready_interval_ms")]
    pub ready_interval_ms: u64,
    /// Upper bound for a single backoff delay, in milliseconds
    #[serde(default = "default_ready_max_interval_ms")]
    pub ready_max_interval_ms: u64,
}

fn default_dimensions() -> usize {
    768
}

fn default_ready_attempts() -> u32 {
    10
}

fn default_ready_interval_ms() -> u64 {
    300
}

fn default_ready_max_interval_ms() -> u64 {
    300
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityFunction::default(),
            default_dimensions: default_dimensions(),
            ready_max_attempts: default_ready_attempts(),
            ready_interval_ms: default_ready_interval_ms(),
            ready_max_interval_ms: default_ready_max_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_scores() {
        let cosine = SimilarityFunction::Cosine;
        assert!((cosine.score(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine.score(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine.score(&[0.0, 0.0], &[1.0, 0.0]), 0.0);

        let euclidean = SimilarityFunction::Euclidean;
        assert!((euclidean.score(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!((euclidean.score(&[0.0, 0.0], &[3.0, 4.0]) - 1.0 / 6.0).abs() < 1e-6);

        let manhattan = SimilarityFunction::Manhattan;
        assert!((manhattan.score(&[0.0, 0.0], &[3.0, 4.0]) - 1.0 / 8.0).abs() < 1e-6);
        assert!(manhattan.surql_score().contains("vector::distance::manhattan"));
    }

    #[test]
    fn test_retrieval_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.vector_score_threshold, 0.6);
        assert_eq!(config.vector_limit, 5);
        assert_eq!(config.entity_match_limit, 5);
        assert_eq!(config.hop_depth, 1);
        assert_eq!(config.max_triples, 30);
    }

    #[test]
    fn test_partial_retrieval_section() {
        let config: RetrievalConfig = toml::from_str("hop_depth = 2").unwrap();
        assert_eq!(config.hop_depth, 2);
        assert_eq!(config.max_triples, 30);
    }

    #[test]
    fn test_similarity_keyword() {
        let config: VectorIndexConfig = toml::from_str(r#"similarity = "euclidean""#).unwrap();
        assert_eq!(config.similarity.as_surql(), "EUCLIDEAN");
        assert_eq!(config.ready_max_attempts, 10);
    }
}
