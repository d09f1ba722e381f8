use crate::{
    config::Identity,
    exec,
    utils::exec::{CommandError, FilterRule, internal, probe},
};
use gix::ObjectId;
use std::path::{Path, PathBuf};

use super::{Remote, VcsError};

/// Advice and local-transport notices git prints on stderr.
const GIT_FILTER: FilterRule = FilterRule::new(&[
    "hint:",
    "warning: --depth is ignored in local clones",
    "Initialized empty Git repository",
]);

/// A git working tree addressed by its root directory.
///
/// Each method runs git inside `root`, so several repositories can be driven
/// side by side without touching the process working directory.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Create a new repository rooted at `root`.
    pub fn init(root: &Path) -> Result<Self, VcsError> {
        gix::init(root).map_err(|err| VcsError::repository(root, err))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Shallow-clone a single `branch` of `remote` into the empty directory `dest`.
    pub fn clone_branch(remote: &Remote, branch: &str, dest: &Path) -> Result<Self, VcsError> {
        exec!(
            filter=&GIT_FILTER;
            secret=remote.secret();
            ["git"];
            "clone", "--quiet", "--depth", "1", "--single-branch", "--no-tags",
            "--branch", branch, remote.url(), dest
        )?;
        Ok(Self {
            root: dest.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Point `HEAD` at `refs/heads/<name>`; the branch need not exist yet.
    pub fn checkout_branch(&self, name: &str) -> Result<(), VcsError> {
        let target = format!("refs/heads/{name}");
        exec!(filter=&GIT_FILTER; self.root(); ["git"]; "symbolic-ref", "HEAD", target)?;
        Ok(())
    }

    /// Adopt the tip of `branch` from the local repository at `source`.
    ///
    /// Afterwards `HEAD` and the index match that tip while the working tree
    /// is left untouched, so status reports exactly what the caller writes.
    pub fn fetch_tip(&self, source: &Path, branch: &str) -> Result<(), VcsError> {
        let refspec = format!("+refs/heads/{branch}:refs/heads/{branch}");
        exec!(
            filter=&GIT_FILTER;
            self.root();
            ["git"];
            "fetch", "--quiet", "--no-tags", "--depth", "1", "--update-head-ok", source, refspec
        )?;
        exec!(filter=&GIT_FILTER; self.root(); ["git"]; "reset", "--quiet", "--mixed")?;
        Ok(())
    }

    /// Stage every change in the working tree, deletions included.
    pub fn stage_all(&self) -> Result<(), VcsError> {
        exec!(filter=&GIT_FILTER; self.root(); ["git"]; "add", "--all")?;
        Ok(())
    }

    /// Whether the working tree or index differs from `HEAD`.
    pub fn is_dirty(&self) -> Result<bool, VcsError> {
        let output = exec!(
            filter=&GIT_FILTER;
            self.root();
            ["git"];
            "status", "--porcelain", "--untracked-files=all"
        )?;
        Ok(!output.stdout.trim_ascii().is_empty())
    }

    /// Whether anything is staged relative to `HEAD`.
    pub fn has_staged_changes(&self) -> Result<bool, VcsError> {
        let args = internal::filter_args(&[
            internal::to_os("diff"),
            internal::to_os("--cached"),
            internal::to_os("--quiet"),
        ]);
        let output = probe(Some(self.root()), &internal::to_cmd_vec(["git"]), &args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(CommandError::Failed {
                name: "git".into(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            }
            .into()),
        }
    }

    /// Set a repository-scoped config value.
    pub fn set_config(&self, key: &str, value: &str) -> Result<(), VcsError> {
        exec!(filter=&GIT_FILTER; self.root(); ["git"]; "config", "--local", key, value)?;
        Ok(())
    }

    /// Record the staged tree with an explicit author.
    ///
    /// The committer comes from `user.name`/`user.email`, see [`GitRepo::set_config`].
    pub fn commit(&self, allow_empty: bool, author: &Identity, message: &str) -> Result<(), VcsError> {
        let author = format!("--author={author}");
        let allow_empty = if allow_empty { "--allow-empty" } else { "" };
        exec!(
            filter=&GIT_FILTER;
            self.root();
            ["git"];
            "commit", "--quiet", "--no-verify", "--no-gpg-sign", allow_empty, author, "-m", message
        )?;
        Ok(())
    }

    /// Delete the local `branch` ref so the next commit starts a new history.
    pub fn drop_history(&self, branch: &str) -> Result<(), VcsError> {
        let target = format!("refs/heads/{branch}");
        exec!(filter=&GIT_FILTER; self.root(); ["git"]; "update-ref", "-d", target)?;
        Ok(())
    }

    /// Changed-file summary of the last commit, limited to `max_files` entries.
    pub fn diff_stat(&self, max_files: usize) -> Result<String, VcsError> {
        let count = format!("--stat-count={max_files}");
        let output = exec!(
            filter=&GIT_FILTER;
            self.root();
            ["git"];
            "show", "--no-color", "--stat", count, "--format=%h %s", "HEAD"
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_owned())
    }

    /// Push the local `branch` to the same branch of `remote`.
    pub fn push(&self, remote: &Remote, branch: &str, force: bool) -> Result<(), VcsError> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let force = if force { "--force" } else { "" };
        exec!(
            filter=&GIT_FILTER;
            secret=remote.secret();
            self.root();
            ["git"];
            "push", "--quiet", force, remote.url(), refspec
        )?;
        Ok(())
    }

    /// Commit id `HEAD` resolves to.
    pub fn head_id(&self) -> Result<ObjectId, VcsError> {
        let repo = gix::open(&self.root).map_err(|err| VcsError::repository(&self.root, err))?;
        let id = repo
            .head_id()
            .map_err(|err| VcsError::repository(&self.root, err))?;
        Ok(id.detach())
    }
}

/// Whether `branch` exists on `remote`. Reads nothing into any local repository.
pub fn remote_branch_exists(remote: &Remote, branch: &str) -> Result<bool, VcsError> {
    let pattern = format!("refs/heads/{branch}");
    let output = exec!(
        filter=&GIT_FILTER;
        secret=remote.secret();
        ["git"];
        "ls-remote", "--heads", remote.url(), pattern
    )?;
    Ok(!output.stdout.trim_ascii().is_empty())
}
