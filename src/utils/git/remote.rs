use crate::config::ConfigError;
use crate::utils::exec;
use std::fmt;

/// Host used when no server URL is configured.
const DEFAULT_HOST: &str = "github.com";

/// Authenticated push/fetch endpoint of the deployment repository.
///
/// The token is part of the URL git talks to, but never of anything printed:
/// `Display` masks it, and commands run against the remote pass
/// [`Remote::secret`] to `exec!` so their logs and errors mask it too.
#[derive(Clone)]
pub struct Remote {
    url: String,
    token: Option<String>,
}

impl Remote {
    /// Build the HTTPS remote for `slug` (`owner/name`) authenticated with `token`.
    ///
    /// `server_url` selects a GitHub Enterprise host; `None` means github.com.
    pub fn resolve(slug: &str, token: &str, server_url: Option<&str>) -> Result<Self, ConfigError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let slug = validate_slug(slug)?;
        let host = server_url.map_or(DEFAULT_HOST, host_of);
        let host = if host.is_empty() { DEFAULT_HOST } else { host };

        Ok(Self {
            url: format!("https://x-access-token:{token}@{host}/{slug}.git"),
            token: Some(token.to_owned()),
        })
    }

    /// Unauthenticated remote pointing at a local repository.
    #[cfg(test)]
    pub fn local(path: &std::path::Path) -> Self {
        Self {
            url: path.to_string_lossy().into_owned(),
            token: None,
        }
    }

    /// Local remote whose URL embeds `secret`, as an authenticated URL would.
    #[cfg(test)]
    pub fn local_with_secret(path: &std::path::Path, secret: &str) -> Self {
        Self {
            url: path.join(secret).to_string_lossy().into_owned(),
            token: Some(secret.to_owned()),
        }
    }

    /// URL handed to git. Contains the token; never log it.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The token, for masking command output.
    pub fn secret(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&exec::redact(&self.url, self.secret()))
    }
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote").field("url", &self.to_string()).finish()
    }
}

/// Accept `owner/name` only.
fn validate_slug(slug: &str) -> Result<&str, ConfigError> {
    let slug = slug.trim().trim_end_matches(".git");
    let valid = match slug.split_once('/') {
        Some((owner, name)) => {
            !owner.is_empty()
                && !name.is_empty()
                && !name.contains('/')
                && !slug.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(slug)
    } else {
        Err(ConfigError::Validation(format!(
            "repository must look like `owner/name`, got `{slug}`"
        )))
    }
}

/// Strip scheme and trailing slashes from a server URL.
fn host_of(server_url: &str) -> &str {
    let trimmed = server_url.trim();
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/')
}
