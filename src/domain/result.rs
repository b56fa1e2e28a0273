//! Result type alias for queuewatch

use super::errors::QueueWatchError;

/// Result type alias for queuewatch operations
///
/// # Examples
///
/// ```
/// use queuewatch::domain::result::Result;
/// use queuewatch::domain::errors::QueueWatchError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(QueueWatchError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, QueueWatchError>;
