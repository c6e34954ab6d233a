//! Semtab evaluation
//!
//! Graph rewrites applied to semantic models before comparison, and
//! precision/recall/F1 over top-1 predictions.

pub mod error;
pub mod prf1;
pub mod transformation;

pub use error::{EvalError, Result};
pub use prf1::{precision_recall_f1, ExactMatch, PrecisionRecallF1, ScoringFn, TrueLabels};
pub use transformation::{remove_isolated_nodes, replace_class_nodes_by_subject_columns};
