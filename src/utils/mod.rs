//! Utility modules.

pub mod retry;
pub mod text;

pub use retry::{Backoff, RetryOutcome, RetryPolicy, Retryable, with_retry};
pub use text::{char_len, truncate_chars};
