//! Result type alias for Tabula
//!
//! This module provides a convenient Result type alias that uses TabulaError
//! as the error type.

use super::errors::TabulaError;

/// Result type alias for Tabula operations
///
/// # Examples
///
/// ```
/// use tabula::domain::result::Result;
/// use tabula::domain::errors::TabulaError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(TabulaError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(TabulaError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
