//! Per-item batch results: one item's failure never aborts the batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use featurelab_core::data::{CleanError, PanelError, ProviderError, WriteError};
use featurelab_core::indicators::IndicatorError;

use crate::config::ConfigError;

/// Any failure the pipelines can report for an asset, a series or a panel.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("cleaning failed: {0}")]
    Clean(#[from] CleanError),

    #[error("indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),

    #[error("no rows between {start} and {end}")]
    EmptyRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("reference series '{name}' unavailable: {reason}")]
    Reference { name: String, reason: String },
}

/// A failed item, named so the user can tell which symbol or series broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub name: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(name: impl Into<String>, error: &PipelineError) -> Self {
        Self {
            name: name.into(),
            reason: error.to_string(),
        }
    }
}

/// Successes and failures of a batch, each in input order.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub succeeded: Vec<(String, T)>,
    pub failed: Vec<ItemFailure>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    /// Split tagged per-item results, keeping input order on both sides.
    pub fn from_results(
        results: impl IntoIterator<Item = (String, Result<T, PipelineError>)>,
    ) -> Self {
        let mut outcome = Self::default();
        for (name, result) in results {
            match result {
                Ok(value) => outcome.succeeded.push((name, value)),
                Err(e) => outcome.failed.push(ItemFailure::new(name, &e)),
            }
        }
        outcome
    }

    /// True if no item failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.succeeded
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> Vec<&str> {
        self.succeeded.iter().map(|(n, _)| n.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_results_keeps_order_and_names() {
        let results = vec![
            ("SPY".to_string(), Ok(1)),
            (
                "BAD".to_string(),
                Err(PipelineError::Provider(ProviderError::SymbolNotFound {
                    symbol: "BAD".into(),
                })),
            ),
            ("TLT".to_string(), Ok(3)),
        ];
        let outcome = BatchOutcome::from_results(results);

        assert_eq!(outcome.names(), vec!["SPY", "TLT"]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].name, "BAD");
        assert!(outcome.failed[0].reason.contains("symbol not found: BAD"));
        assert_eq!(outcome.total(), 3);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.get("TLT"), Some(&3));
        assert_eq!(outcome.get("BAD"), None);
    }

    #[test]
    fn empty_batch_is_complete() {
        let outcome: BatchOutcome<()> = BatchOutcome::from_results(Vec::new());
        assert!(outcome.is_complete());
        assert_eq!(outcome.total(), 0);
    }

    #[test]
    fn clean_error_message_names_symbol_and_field() {
        let err = PipelineError::from(CleanError::MissingField {
            symbol: "QQQ".into(),
            field: "volume".into(),
        });
        let failure = ItemFailure::new("QQQ", &err);
        assert_eq!(
            failure.reason,
            "cleaning failed: QQQ: missing required field 'volume'"
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn partition_keeps_input_order(flags in proptest::collection::vec(any::<bool>(), 0..40)) {
                let results: Vec<(String, Result<usize, PipelineError>)> = flags
                    .iter()
                    .enumerate()
                    .map(|(i, ok)| {
                        let result = if *ok {
                            Ok(i)
                        } else {
                            Err(PipelineError::Provider(ProviderError::Network("down".into())))
                        };
                        (format!("S{i}"), result)
                    })
                    .collect();
                let outcome = BatchOutcome::from_results(results);

                prop_assert_eq!(outcome.total(), flags.len());
                prop_assert_eq!(outcome.is_complete(), flags.iter().all(|ok| *ok));

                let kept: Vec<usize> = outcome.succeeded.iter().map(|(_, i)| *i).collect();
                let expected: Vec<usize> = (0..flags.len()).filter(|&i| flags[i]).collect();
                prop_assert_eq!(kept, expected);

                let failed: Vec<String> = outcome.failed.iter().map(|f| f.name.clone()).collect();
                let expected: Vec<String> = (0..flags.len())
                    .filter(|&i| !flags[i])
                    .map(|i| format!("S{i}"))
                    .collect();
                prop_assert_eq!(failed, expected);
            }
        }
    }
}
