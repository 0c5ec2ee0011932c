//! Result type alias for hubtrack

use super::errors::HubError;

/// Result type alias for hubtrack operations
///
/// # Examples
///
/// ```
/// use hubtrack::domain::result::Result;
/// use hubtrack::domain::errors::HubError;
///
/// fn failing_function() -> Result<()> {
///     Err(HubError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, HubError>;

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
}
