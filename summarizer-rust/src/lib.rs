mod client_utils;
mod errors;
pub mod google;
mod opentelemetry;
mod retry;
mod summarizer;
pub mod testing;
mod types;

pub use errors::*;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use summarizer::Summarizer;
pub use types::*;
