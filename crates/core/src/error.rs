use thiserror::Error;

use crate::model::{DefinitionError, ParseIdError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
