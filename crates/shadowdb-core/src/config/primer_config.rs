use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PRIMER_MAX_CHARS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectMode {
    Always,
    FirstRun,
    Digest,
}

impl Default for InjectMode {
    fn default() -> Self {
        InjectMode::Digest
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimerConfig {
    pub enabled: bool,
    pub mode: InjectMode,
    pub max_chars: usize,
    /// Lowercased model-identifier substrings, in configuration order. The
    /// first substring match against the host-supplied model id wins.
    pub max_chars_by_model: Vec<(String, usize)>,
    pub cache_ttl_ms: i64,
}

impl Default for PrimerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: InjectMode::Digest,
            max_chars: DEFAULT_PRIMER_MAX_CHARS,
            max_chars_by_model: Vec::new(),
            cache_ttl_ms: 0,
        }
    }
}

impl PrimerConfig {
    /// Resolve the effective character budget for a given host-supplied
    /// model id: first insertion-order substring match in
    /// `max_chars_by_model` wins; invalid (non-positive/non-finite) budgets
    /// are ignored and `max_chars` is used.
    pub fn budget_for_model(&self, model: Option<&str>) -> usize {
        if let Some(model) = model {
            let lower = model.to_lowercase();
            for (needle, budget) in &self.max_chars_by_model {
                if *budget == 0 {
                    continue;
                }
                if lower.contains(&needle.to_lowercase()) {
                    return *budget;
                }
            }
        }
        if self.max_chars == 0 {
            DEFAULT_PRIMER_MAX_CHARS
        } else {
            self.max_chars
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_substring_match_wins() {
        let cfg = PrimerConfig {
            max_chars_by_model: vec![
                ("gpt-4".to_string(), 8_000),
                ("gpt".to_string(), 2_000),
            ],
            ..Default::default()
        };
        assert_eq!(cfg.budget_for_model(Some("gpt-4-turbo")), 8_000);
        assert_eq!(cfg.budget_for_model(Some("gpt-3.5")), 2_000);
    }

    #[test]
    fn invalid_budget_falls_back_to_default() {
        let cfg = PrimerConfig {
            max_chars_by_model: vec![("claude".to_string(), 0)],
            ..Default::default()
        };
        assert_eq!(
            cfg.budget_for_model(Some("claude-3")),
            DEFAULT_PRIMER_MAX_CHARS
        );
    }

    #[test]
    fn no_model_uses_default_budget() {
        let cfg = PrimerConfig::default();
        assert_eq!(cfg.budget_for_model(None), DEFAULT_PRIMER_MAX_CHARS);
    }
}
