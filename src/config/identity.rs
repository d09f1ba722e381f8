//! Commit identities written as `Name <email>`.

use std::{fmt, str::FromStr};
use thiserror::Error;

/// Errors produced while parsing an identity string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity is empty")]
    Empty,

    #[error("identity `{0}` has no name, expected `Name <email>`")]
    MissingName(String),

    #[error("identity `{0}` has no valid email address")]
    InvalidAddress(String),

    #[error("identity `{0}` is malformed, expected `Name <email>`")]
    Malformed(String),
}

/// A name and email pair used for git author and committer fields.
///
/// # Example
/// ```ignore
/// let id: Identity = "GitHub <noreply@github.com>".parse()?;
/// assert_eq!(id.name(), "GitHub");
/// assert_eq!(id.email(), "noreply@github.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    email: String,
}

impl Identity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }

        let Some(open) = s.rfind('<') else {
            // A bare address still lacks the name git needs
            return Err(if is_address(s) {
                IdentityError::MissingName(s.to_owned())
            } else {
                IdentityError::Malformed(s.to_owned())
            });
        };

        let email = s[open + 1..]
            .strip_suffix('>')
            .ok_or_else(|| IdentityError::Malformed(s.to_owned()))?
            .trim();
        if !is_address(email) {
            return Err(IdentityError::InvalidAddress(s.to_owned()));
        }

        let name = unquote(s[..open].trim());
        if name.is_empty() {
            return Err(IdentityError::MissingName(s.to_owned()));
        }
        if name.contains(['<', '>', '\n']) {
            return Err(IdentityError::Malformed(s.to_owned()));
        }

        Ok(Self {
            name: name.to_owned(),
            email: email.to_owned(),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// `local@domain` with no whitespace or brackets.
fn is_address(s: &str) -> bool {
    if s.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '>')) {
        return false;
    }
    matches!(s.split_once('@'), Some((local, domain))
        if !local.is_empty() && !domain.is_empty() && !domain.contains('@'))
}

/// Strip one pair of surrounding double quotes.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map_or(s, str::trim)
}
