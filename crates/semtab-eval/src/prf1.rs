use crate::error::{EvalError, Result};
use std::collections::BTreeSet;
use tracing::debug;

/// How well a predicted label matches a true label; `0.0` means no match.
pub trait ScoringFn {
    fn get_match_score(&self, pred: &str, target: &str) -> f64;
}

/// Exact string equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl ScoringFn for ExactMatch {
    fn get_match_score(&self, pred: &str, target: &str) -> f64 {
        if pred == target {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrecisionRecallF1 {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// True labels per example: at most one label, or a set of acceptable ones.
#[derive(Debug, Clone, PartialEq)]
pub enum TrueLabels {
    Single(Vec<Option<String>>),
    Sets(Vec<BTreeSet<String>>),
}

impl TrueLabels {
    pub fn len(&self) -> usize {
        match self {
            TrueLabels::Single(v) => v.len(),
            TrueLabels::Sets(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn into_sets(self) -> Vec<BTreeSet<String>> {
        match self {
            TrueLabels::Single(v) => v.into_iter().map(|y| y.into_iter().collect()).collect(),
            TrueLabels::Sets(v) => v,
        }
    }
}

impl From<Vec<Option<String>>> for TrueLabels {
    fn from(v: Vec<Option<String>>) -> Self {
        TrueLabels::Single(v)
    }
}

impl From<Vec<String>> for TrueLabels {
    fn from(v: Vec<String>) -> Self {
        TrueLabels::Single(v.into_iter().map(Some).collect())
    }
}

impl From<Vec<BTreeSet<String>>> for TrueLabels {
    fn from(v: Vec<BTreeSet<String>>) -> Self {
        TrueLabels::Sets(v)
    }
}

/// Precision, recall and F1 of top-1 predictions.
///
/// An example counts as correct when it has at least one true label, a
/// prediction, and the prediction scores above zero against some true
/// label. Precision is 1.0 when nothing is predicted, recall is 1.0 when
/// nothing is labeled, and an empty input scores all zeros.
///
/// Every example must have a true label or a prediction (a placeholder when
/// there is nothing to predict).
pub fn precision_recall_f1(
    ytrue: impl Into<TrueLabels>,
    ypreds: &[Option<String>],
    scoring_fn: Option<&dyn ScoringFn>,
) -> Result<PrecisionRecallF1> {
    let ytrue = ytrue.into();
    if ytrue.is_empty() {
        return Ok(PrecisionRecallF1::default());
    }
    if ytrue.len() != ypreds.len() {
        return Err(EvalError::Inconsistent(format!(
            "{} true labels but {} predictions",
            ytrue.len(),
            ypreds.len()
        )));
    }
    let scoring_fn = scoring_fn.unwrap_or(&ExactMatch);
    let ytrue = ytrue.into_sets();

    let n_predictions = ypreds.iter().filter(|p| p.is_some()).count();
    let n_labels = ytrue.iter().filter(|y| !y.is_empty()).count();
    let mut n_correct = 0usize;

    for (index, (labels, pred)) in ytrue.iter().zip(ypreds).enumerate() {
        match pred {
            Some(pred) if !labels.is_empty() => {
                let score = labels
                    .iter()
                    .map(|label| scoring_fn.get_match_score(pred, label))
                    .fold(f64::NEG_INFINITY, f64::max);
                if score > 0.0 {
                    n_correct += 1;
                }
            }
            Some(_) => {}
            None if labels.is_empty() => return Err(EvalError::MissingPrediction { index }),
            None => {}
        }
    }

    let precision = if n_predictions > 0 {
        n_correct as f64 / n_predictions as f64
    } else {
        1.0
    };
    let recall = if n_labels > 0 {
        n_correct as f64 / n_labels as f64
    } else {
        1.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    debug!(n_correct, n_predictions, n_labels, "scored predictions");
    Ok(PrecisionRecallF1 {
        precision,
        recall,
        f1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labels(items: &[&str]) -> Vec<Option<String>> {
        items.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn one_of_two_correct() {
        let r = precision_recall_f1(labels(&["A", "B"]), &labels(&["A", "C"]), None).unwrap();
        assert_relative_eq!(r.precision, 0.5);
        assert_relative_eq!(r.recall, 0.5);
        assert_relative_eq!(r.f1, 0.5);
    }

    #[test]
    fn empty_input_scores_zero() {
        let r = precision_recall_f1(Vec::<Option<String>>::new(), &[], None).unwrap();
        assert_eq!(r, PrecisionRecallF1::default());
    }

    #[test]
    fn any_acceptable_label_counts() {
        let truth = vec![BTreeSet::from(["A".to_string(), "B".to_string()])];
        let r = precision_recall_f1(truth, &labels(&["A"]), None).unwrap();
        assert_relative_eq!(r.precision, 1.0);
        assert_relative_eq!(r.recall, 1.0);
        assert_relative_eq!(r.f1, 1.0);
    }

    #[test]
    fn missing_predictions_lower_recall_only() {
        let truth = labels(&["A", "B", "C", "D"]);
        let preds = vec![Some("A".to_string()), None, Some("C".to_string()), None];
        let r = precision_recall_f1(truth, &preds, None).unwrap();
        assert_relative_eq!(r.precision, 1.0);
        assert_relative_eq!(r.recall, 0.5);
        assert_relative_eq!(r.f1, 2.0 / 3.0);
    }

    #[test]
    fn unlabeled_examples_need_a_prediction() {
        let truth = vec![None, Some("A".to_string())];
        let preds = vec![None, Some("A".to_string())];
        let err = precision_recall_f1(truth, &preds, None).unwrap_err();
        assert!(matches!(err, EvalError::MissingPrediction { index: 0 }));

        let truth = vec![None, Some("A".to_string())];
        let preds = vec![Some("X".to_string()), Some("A".to_string())];
        let r = precision_recall_f1(truth, &preds, None).unwrap();
        assert_relative_eq!(r.precision, 0.5);
        assert_relative_eq!(r.recall, 1.0);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = precision_recall_f1(labels(&["A"]), &labels(&["A", "B"]), None).unwrap_err();
        assert!(matches!(err, EvalError::Inconsistent(_)));
    }

    struct PrefixMatch;

    impl ScoringFn for PrefixMatch {
        fn get_match_score(&self, pred: &str, target: &str) -> f64 {
            if target.starts_with(pred) {
                0.5
            } else {
                0.0
            }
        }
    }

    #[test]
    fn custom_scorer_is_used() {
        let scorer: &dyn ScoringFn = &PrefixMatch;
        let r = precision_recall_f1(labels(&["Q515", "Q6256"]), &labels(&["Q5", "Q1"]), Some(scorer))
            .unwrap();
        assert_relative_eq!(r.precision, 0.5);
        assert_relative_eq!(r.recall, 0.5);
    }
}
