//! Contract-violation boundary.
//!
//! Library code reports precondition failures (invalid camera handles,
//! duplicate profile names, unbalanced profiler stops) as typed errors. Code
//! at the top of the frame loop, where such a failure is a programmer error
//! with no sensible recovery, converts them into an abort with
//! [`Contract::or_abort`].

use std::fmt::Display;

use tracing::error;

pub trait Contract<T> {
    /// Returns the value, or logs the violation and panics.
    fn or_abort(self, what: &str) -> T;
}

impl<T, E: Display> Contract<T> for Result<T, E> {
    #[track_caller]
    fn or_abort(self, what: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "contract violation: {what}");
                panic!("contract violation: {what}: {e}");
            }
        }
    }
}
