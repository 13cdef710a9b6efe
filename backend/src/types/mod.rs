mod environment;
mod error;
mod extractors;

pub use environment::{ConfigError, Environment, SumsubConfig};
pub use error::{ApiErrorResponse, AppError};
pub use extractors::ValidatedJson;
