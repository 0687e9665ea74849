//! Shell alias and environment snippet generation
//!
//! Pure string templating over a provider profile; no I/O. The generated
//! snippet exports the provider's variables and defines an alias that
//! switches the active profile.

use std::fmt::Write;
use std::str::FromStr;

use crate::provider::Provider;
use crate::{Error, Result};

/// Shells we can render snippets for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bash" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "fish" => Ok(Self::Fish),
            other => Err(Error::UnsupportedShell {
                name: other.to_string(),
            }),
        }
    }
}

/// Render the snippet that loads `provider`'s variables into the
/// environment and defines a `use-<name>` alias.
pub fn render(shell: Shell, provider: &Provider) -> String {
    let mut out = String::new();
    let name = &provider.name;

    match shell {
        Shell::Bash | Shell::Zsh => {
            let _ = writeln!(out, "# provider: {name}");
            let _ = writeln!(out, "export PROV_BASE_URL={}", quote_posix(&provider.base_url));
            let _ = writeln!(out, "export PROV_API_KEY={}", quote_posix(&provider.api_key));
            if let Some(timeout) = provider.timeout_ms {
                let _ = writeln!(out, "export PROV_TIMEOUT_MS={timeout}");
            }
            if let Some(model) = &provider.model {
                let _ = writeln!(out, "export PROV_MODEL={}", quote_posix(model));
            }
            let _ = writeln!(out, "alias use-{name}='prov provider use {name}'");
        }
        Shell::Fish => {
            let _ = writeln!(out, "# provider: {name}");
            let _ = writeln!(out, "set -gx PROV_BASE_URL {}", quote_posix(&provider.base_url));
            let _ = writeln!(out, "set -gx PROV_API_KEY {}", quote_posix(&provider.api_key));
            if let Some(timeout) = provider.timeout_ms {
                let _ = writeln!(out, "set -gx PROV_TIMEOUT_MS {timeout}");
            }
            if let Some(model) = &provider.model {
                let _ = writeln!(out, "set -gx PROV_MODEL {}", quote_posix(model));
            }
            let _ = writeln!(out, "alias use-{name} 'prov provider use {name}'");
        }
    }

    out
}

/// Single-quote a value for shell consumption, escaping embedded quotes.
fn quote_posix(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn provider() -> Provider {
        Provider {
            name: "openai".to_string(),
            base_url: "https://api.example.com".to_string(),
            api_key: "sk-test".to_string(),
            timeout_ms: Some(30_000),
            model: None,
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn shell_parses_case_insensitively() {
        assert_eq!("BASH".parse::<Shell>().unwrap(), Shell::Bash);
        assert_eq!("fish".parse::<Shell>().unwrap(), Shell::Fish);
        assert!("powershell".parse::<Shell>().is_err());
    }

    #[test]
    fn bash_snippet_exports_and_aliases() {
        let snippet = render(Shell::Bash, &provider());
        assert!(snippet.contains("export PROV_BASE_URL='https://api.example.com'"));
        assert!(snippet.contains("export PROV_API_KEY='sk-test'"));
        assert!(snippet.contains("export PROV_TIMEOUT_MS=30000"));
        assert!(snippet.contains("alias use-openai='prov provider use openai'"));
    }

    #[test]
    fn fish_snippet_uses_set_gx() {
        let snippet = render(Shell::Fish, &provider());
        assert!(snippet.contains("set -gx PROV_BASE_URL 'https://api.example.com'"));
        assert!(snippet.contains("alias use-openai 'prov provider use openai'"));
    }

    #[test]
    fn values_with_quotes_are_escaped() {
        let mut p = provider();
        p.api_key = "it's-a-key".to_string();
        let snippet = render(Shell::Bash, &p);
        assert!(snippet.contains(r"export PROV_API_KEY='it'\''s-a-key'"));
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let mut p = provider();
        p.timeout_ms = None;
        let snippet = render(Shell::Zsh, &p);
        assert!(!snippet.contains("PROV_TIMEOUT_MS"));
        assert!(!snippet.contains("PROV_MODEL"));
    }
}
