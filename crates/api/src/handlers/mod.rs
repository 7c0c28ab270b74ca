pub mod locks;
pub mod versions;

use folio_core::error::CoreError;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Run a request body's `validator` rules, reporting failures as 400.
pub(crate) fn validate_body<T: Validate>(input: &T) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}
