//! Reconciliation pipeline and its run report.

mod reconcile;
mod report;

pub use reconcile::{
    InputSources, PipelineInputs, PipelineOptions, Reconciled, ReconciliationPipeline,
};
pub use report::{Report, RuleApplication};
