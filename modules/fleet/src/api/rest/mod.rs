pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{APPLICATION_PROBLEM_JSON, ApiResult, Problem};
pub use routes::router;
