//! Per-deploy-type copy plans.
//!
//! A strategy never touches the filesystem itself: [`DeployType::plan`]
//! returns a list of [`Step`]s and [`apply`] carries them out. Every copy is
//! whole-directory, recursive and overwrites the destination.

use super::DeployError;
use crate::{log, utils::fs};
use clap::ValueEnum;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Directories of the old branch snapshot that frontend deploys keep.
const FRONTEND_PRESERVED: &[&str] = &["api", "media", "assets"];

/// What kind of artifact a run publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeployType {
    /// Built site from `build/`; keeps `api/`, `media/` and `assets/`
    Frontend,
    /// API data from `build/api` and `build/media`; keeps everything else
    Backend,
    /// Local `assets/` directory; keeps everything else
    Assets,
    /// `build/assets` replaces the whole `assets` branch
    BackendAssets,
}

impl DeployType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Assets => "assets",
            Self::BackendAssets => "backend-assets",
        }
    }

    /// Branch this type publishes to.
    pub const fn branch(self) -> &'static str {
        match self {
            Self::BackendAssets => "assets",
            Self::Frontend | Self::Backend | Self::Assets => "gh-pages",
        }
    }

    /// Input whose absence turns the whole run into a no-op.
    pub fn optional_input(self, root: &Path) -> Option<PathBuf> {
        match self {
            Self::BackendAssets => Some(root.join("build").join("assets")),
            Self::Frontend | Self::Backend | Self::Assets => None,
        }
    }

    /// Build the copy plan that fills `layout.new`.
    pub fn plan(self, layout: &Layout<'_>) -> Vec<Step> {
        let Layout { old, new, root } = *layout;
        let build = root.join("build");

        match self {
            Self::Frontend => {
                let mut steps = vec![Step::copy(&build, new)];
                steps.extend(
                    FRONTEND_PRESERVED
                        .iter()
                        .map(|dir| Step::preserve(&old.join(dir), &new.join(dir))),
                );
                steps
            }
            Self::Backend => vec![
                Step::preserve(old, new),
                Step::empty(&new.join("api")),
                Step::copy(&build.join("api"), &new.join("api")),
                Step::empty(&new.join("media")),
                Step::copy(&build.join("media"), &new.join("media")),
            ],
            Self::Assets => vec![
                Step::preserve(old, new),
                Step::empty(&new.join("assets")),
                Step::copy(&root.join("assets"), &new.join("assets")),
            ],
            Self::BackendAssets => vec![Step::copy(&build.join("assets"), new)],
        }
    }
}

impl fmt::Display for DeployType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three directories a plan works with.
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    /// Checkout of the branch as currently deployed
    pub old: &'a Path,
    /// Fresh snapshot that becomes the commit tree
    pub new: &'a Path,
    /// Invocation root holding `build/` and `assets/`
    pub root: &'a Path,
}

/// One filesystem operation of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Copy `from` into `to`. A missing optional source is skipped.
    Copy {
        from: PathBuf,
        to: PathBuf,
        required: bool,
    },
    /// Leave `dir` existing and empty.
    Empty { dir: PathBuf },
}

impl Step {
    fn copy(from: &Path, to: &Path) -> Self {
        Self::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            required: true,
        }
    }

    fn preserve(from: &Path, to: &Path) -> Self {
        Self::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            required: false,
        }
    }

    fn empty(dir: &Path) -> Self {
        Self::Empty {
            dir: dir.to_path_buf(),
        }
    }
}

/// Execute `steps` in order, stopping at the first failure.
pub fn apply(steps: &[Step]) -> Result<(), DeployError> {
    for step in steps {
        match step {
            Step::Copy { from, to, required } => {
                if !required && !from.is_dir() {
                    log!("deploy"; "nothing to keep at `{}`", from.display());
                    continue;
                }
                let count = fs::copy_tree(from, to)?;
                log!("deploy"; "copied {count} files from `{}`", from.display());
            }
            Step::Empty { dir } => fs::empty_dir(dir)?,
        }
    }
    Ok(())
}
