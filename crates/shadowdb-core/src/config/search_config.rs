use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE, DEFAULT_RECENCY_WEIGHT, DEFAULT_TEXT_WEIGHT,
    DEFAULT_VECTOR_WEIGHT,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub min_score: f64,
    pub vector_weight: f64,
    pub text_weight: f64,
    pub recency_weight: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
            vector_weight: DEFAULT_VECTOR_WEIGHT,
            text_weight: DEFAULT_TEXT_WEIGHT,
            recency_weight: DEFAULT_RECENCY_WEIGHT,
        }
    }
}
