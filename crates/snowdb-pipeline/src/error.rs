use snowdb_core::ResortId;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("resort {0} is not in the catalog")]
    UnknownResort(ResortId),

    #[error("no resort with slug {0:?} in the catalog")]
    UnknownSlug(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
