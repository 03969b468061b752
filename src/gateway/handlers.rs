mod health;
mod internal;
mod payments;
mod reports;

// glob re-exports carry the generated OpenAPI path types along with the handlers
pub use health::*;
pub use internal::*;
pub use payments::*;
pub use reports::*;

use chrono::NaiveDate;

use super::error::ApiError;
use crate::payment::types::execution_date;

/// Path date segment, `YYYY-MM-DD`
fn parse_day(raw: &str) -> Result<NaiveDate, ApiError> {
    execution_date::parse(raw).map_err(ApiError::bad_request)
}
