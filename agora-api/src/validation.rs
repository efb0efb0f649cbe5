//! Validation Traits
//!
//! Common validation patterns extracted from route handlers.

use crate::error::{ApiError, ApiResult};

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty.
    ///
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or
    /// whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

/// Trait for validating string lengths against a char-count range.
pub trait ValidateLength {
    /// Validate that the value's length is within `[min, max]`.
    ///
    /// # Errors
    /// Returns `ApiError::invalid_range` when out of bounds.
    fn validate_length(&self, field_name: &str, min: usize, max: usize) -> ApiResult<()>;
}

impl ValidateLength for str {
    fn validate_length(&self, field_name: &str, min: usize, max: usize) -> ApiResult<()> {
        let len = self.chars().count();
        if len < min || len > max {
            return Err(ApiError::invalid_range(field_name, min, max));
        }
        Ok(())
    }
}

impl ValidateLength for String {
    fn validate_length(&self, field_name: &str, min: usize, max: usize) -> ApiResult<()> {
        self.as_str().validate_length(field_name, min, max)
    }
}

/// Validate a username: 3-80 chars, alphanumeric plus `_` and `-`.
pub fn validate_username(username: &str) -> ApiResult<()> {
    username.validate_non_empty("username")?;
    username.validate_length("username", 3, 80)?;
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::invalid_input(
            "Username may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

/// Validate an email address. Deliberately shallow: one '@' with a
/// non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> ApiResult<()> {
    email.validate_non_empty("email")?;
    email.validate_length("email", 3, 120)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::invalid_input("Invalid email address"));
    }
    Ok(())
}

/// Validate a community name: 3-50 chars, lowercase alphanumeric plus `_`.
pub fn validate_community_name(name: &str) -> ApiResult<()> {
    name.validate_non_empty("name")?;
    name.validate_length("name", 3, 50)?;
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ApiError::invalid_input(
            "Community name may only contain lowercase letters, digits and '_'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_non_empty() {
        assert!("title".validate_non_empty("title").is_ok());
        assert!("   ".validate_non_empty("title").is_err());
        assert!("".validate_non_empty("title").is_err());
    }

    #[test]
    fn test_length_bounds() {
        assert!("abc".validate_length("f", 3, 5).is_ok());
        assert!("ab".validate_length("f", 3, 5).is_err());
        assert!("abcdef".validate_length("f", 3, 5).is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice_99").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        let err = validate_username("x!").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRange);
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@nodot").is_err());
    }

    #[test]
    fn test_community_name_rules() {
        assert!(validate_community_name("rustaceans").is_ok());
        assert!(validate_community_name("rust_lang2").is_ok());
        assert!(validate_community_name("Rust").is_err());
        assert!(validate_community_name("r s").is_err());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        /// Any username drawn from the allowed charset and length range
        /// passes validation.
        #[test]
        fn prop_wellformed_usernames_accepted(name in "[A-Za-z0-9_-]{3,80}") {
            prop_assert!(validate_username(&name).is_ok());
        }

        /// A single disallowed character anywhere fails validation.
        #[test]
        fn prop_invalid_character_rejected(
            prefix in "[A-Za-z0-9_-]{1,20}",
            bad in "[ !@#$%^&*()+=/\\\\]",
            suffix in "[A-Za-z0-9_-]{1,20}",
        ) {
            let name = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(validate_username(&name).is_err());
        }

        /// Community names reject anything outside lowercase/digit/underscore.
        #[test]
        fn prop_community_names(name in "[a-z0-9_]{3,50}") {
            prop_assert!(validate_community_name(&name).is_ok());
            let upper = name.to_ascii_uppercase();
            if upper != name {
                prop_assert!(validate_community_name(&upper).is_err());
            }
        }
    }
}
