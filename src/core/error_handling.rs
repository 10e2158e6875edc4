//! Generic error handling utilities
//!
//! Lets fatal errors from any module be reported the same way: a specific
//! message when the user can act on it, generic context otherwise.

/// Errors that know whether their message is meant for the user
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True for errors the user can fix (bad root path, invalid flag, ...)
    fn is_user_actionable(&self) -> bool;

    /// The message to show for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with the level of detail appropriate to its kind
///
/// # Examples
/// ```rust,no_run
/// # use repotree::core::error_handling::log_error_with_context;
/// # use repotree::core::validation::ValidationError;
/// let err = ValidationError::new("--max-concurrent must be at least 1");
/// log_error_with_context(&err, "Argument validation");
/// // Logs: "FATAL: --max-concurrent must be at least 1"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
