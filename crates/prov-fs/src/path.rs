//! Identifier validation for names used as path components

use crate::{Error, Result};

/// Validate that a name is safe for use as a single directory component.
///
/// Provider names and backup ids become directory names under the
/// configuration root; anything that could escape that directory or hide the
/// entry is rejected.
pub fn validate_identifier(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidIdentifier {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return reject("must not be empty");
    }
    if name.len() > 128 {
        return reject("must be at most 128 characters");
    }
    if name.starts_with('.') {
        return reject("must not start with a dot");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("must not contain path separators");
    }
    if name.contains("..") {
        return reject("must not contain '..'");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return reject("may only contain alphanumerics, '-', '_' and '.'");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("openai")]
    #[case("my-provider_2")]
    #[case("20260830-120000123")]
    fn accepts_safe_names(#[case] name: &str) {
        assert!(validate_identifier(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case(".hidden")]
    #[case("../escape")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case("name with spaces")]
    #[case("sneaky..name")]
    fn rejects_unsafe_names(#[case] name: &str) {
        assert!(validate_identifier(name).is_err());
    }
}
