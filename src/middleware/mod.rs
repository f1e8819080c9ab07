pub mod auth;
pub mod metrics;
pub mod normalize;
pub mod rate_limit;
pub mod recover;
pub mod response;
pub mod timeout;

pub use auth::{authenticate, AuthenticatedUser};
pub use metrics::{record_metrics, Metrics, MetricsSnapshot};
pub use normalize::normalize_errors;
pub use rate_limit::rate_limit;
pub use recover::{handle_panic, recover_panic};
pub use response::{ApiResponse, ApiResult};
pub use timeout::request_deadline;
