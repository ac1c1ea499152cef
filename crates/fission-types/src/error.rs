//! Unified error interface for fission crates.
//!
//! Every public error enum in the workspace implements [`ErrorCode`]:
//! a stable, machine-readable UPPER_SNAKE_CASE code plus a
//! recoverability hint. Codes are namespaced by domain (`BIND_`,
//! `CONFIG_`, `IO_`, `NET_`) so logs and callers can match on prefix.
//!
//! # Example
//!
//! ```
//! use fission_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum QueueError {
//!     Full,
//!     Closed,
//! }
//!
//! impl ErrorCode for QueueError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Full => "QUEUE_FULL",
//!             Self::Closed => "QUEUE_CLOSED",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Full)
//!     }
//! }
//!
//! assert_eq!(QueueError::Full.code(), "QUEUE_FULL");
//! assert!(QueueError::Full.is_recoverable());
//! ```

/// Machine-readable error code contract.
///
/// Codes are API: once published they do not change. An error is
/// *recoverable* when retrying (or a corrective user action) may
/// succeed; invalid compositions and configuration mistakes are not.
pub trait ErrorCode {
    /// Returns the stable UPPER_SNAKE_CASE code, e.g. `"BIND_NO_TRIGGERS"`.
    fn code(&self) -> &'static str;

    /// Returns whether retrying or corrective action may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error's code follows fission conventions.
///
/// Checks the code is non-empty, UPPER_SNAKE_CASE, and starts with
/// `expected_prefix`.
///
/// # Panics
///
/// Panics with a descriptive message when a check fails. Intended for
/// tests.
///
/// # Example
///
/// ```
/// use fission_types::{assert_error_code, ErrorCode};
///
/// #[derive(Debug)]
/// struct Oops;
///
/// impl ErrorCode for Oops {
///     fn code(&self) -> &'static str { "DEMO_OOPS" }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_code(&Oops, "DEMO_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Asserts conventions for every variant of an error enum at once.
///
/// Each error module's tests list all variants and pass them through
/// here, so a new variant with a malformed code fails loudly.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl ErrorCode for TestError {
        fn code(&self) -> &'static str {
            match self {
                Self::Transient => "TEST_TRANSIENT",
                Self::Permanent => "TEST_PERMANENT",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    #[test]
    fn trait_surface() {
        assert_eq!(TestError::Transient.code(), "TEST_TRANSIENT");
        assert!(TestError::Transient.is_recoverable());
        assert!(!TestError::Permanent.is_recoverable());
    }

    #[test]
    fn all_variants_pass() {
        assert_error_codes(&[TestError::Transient, TestError::Permanent], "TEST_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn wrong_prefix_panics() {
        assert_error_code(&TestError::Transient, "OTHER_");
    }

    #[test]
    fn snake_case_checker() {
        assert!(is_upper_snake_case("A_B_C"));
        assert!(is_upper_snake_case("ERR_42"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("lower"));
        assert!(!is_upper_snake_case("_LEAD"));
        assert!(!is_upper_snake_case("TRAIL_"));
        assert!(!is_upper_snake_case("DOUBLE__UNDER"));
    }
}
