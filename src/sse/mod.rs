pub mod models;
pub use models::*;

mod results_sse;

pub use results_sse::results_sse;
