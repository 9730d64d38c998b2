use std::path::PathBuf;

use thiserror::Error;

use crate::classifier::TableKind;

/// Failures a stage reports to the operator.
///
/// Fatal variants are raised through `anyhow` so binaries can still
/// `downcast_ref` them; `ClassificationMiss` is logged and skipped by callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store not found at {}; run the load stage first", .0.display())]
    MissingStore(PathBuf),
    #[error("expected table `{0}` not found in store")]
    MissingTable(&'static str),
    #[error("no {kind} table found in {document}")]
    ClassificationMiss { kind: TableKind, document: String },
    #[error("no profile rows matched the population filter")]
    EmptyPopulation,
    #[error("player {0} is not in the profile population")]
    UnknownPlayer(i64),
}
