// Store errors
// NotFound is the only domain error; everything else is infrastructure.

use crate::entities::VendorId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Target id never existed or was deleted
    #[error("No vendor with ID {0} found.")]
    NotFound(VendorId),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
