//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [deploy] Section Defaults
// ============================================================================

pub mod deploy {
    pub fn repository() -> Option<String> {
        None
    }

    pub fn server_url() -> Option<String> {
        None
    }

    /// Files listed by the post-commit diff stat.
    pub fn stat_count() -> usize {
        10
    }
}

// ============================================================================
// [commit] Section Defaults
// ============================================================================

pub mod commit {
    pub fn author() -> String {
        "github-actions[bot] <41898282+github-actions[bot]@users.noreply.github.com>".into()
    }

    pub fn committer() -> String {
        "GitHub <noreply@github.com>".into()
    }

    pub fn message() -> String {
        "Deploy to GitHub pages".into()
    }
}
