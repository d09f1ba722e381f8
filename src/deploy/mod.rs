//! Branch deployment.
//!
//! A run publishes one [`DeployType`] to its branch:
//!
//! 1. Resolve the authenticated remote and make sure the branch exists.
//! 2. Clone the branch as currently deployed into a scratch directory.
//! 3. Start a second snapshot at the same tip with an empty working tree.
//! 4. Fill it according to the type's copy plan.
//! 5. Commit and force-push if anything changed.
//!
//! Both scratch directories are removed when the run ends, whatever the
//! outcome.

mod error;
mod strategy;

pub use error::DeployError;
pub use strategy::DeployType;

use crate::{
    config::{Config, ConfigError, Identity},
    log,
    utils::{
        fs::FsError,
        git::{GitRepo, Remote, remote_branch_exists},
    },
};
use gix::ObjectId;
use std::path::PathBuf;
use strategy::Layout;
use tempfile::TempDir;

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The optional input was absent; nothing was contacted
    Skipped,
    /// The assembled tree equals what is deployed
    NoChanges,
    /// Changes disappeared once staged, e.g. all of them are ignored
    NothingToDeploy,
    /// Committed locally, push skipped
    DryRun { commit: ObjectId },
    /// Committed and pushed
    Deployed { commit: ObjectId },
}

/// One deployment of `kind` driven by `config`.
pub struct Deployer<'a> {
    kind: DeployType,
    config: &'a Config,
    scratch_root: PathBuf,
}

impl<'a> Deployer<'a> {
    pub fn new(kind: DeployType, config: &'a Config) -> Self {
        Self {
            kind,
            config,
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Place scratch snapshots under `dir` instead of the system temp dir.
    #[cfg(test)]
    fn scratch_in(mut self, dir: &std::path::Path) -> Self {
        self.scratch_root = dir.to_path_buf();
        self
    }

    /// Run the whole deployment.
    pub fn run(&self) -> Result<Outcome, DeployError> {
        let missing = self
            .kind
            .optional_input(&self.config.root)
            .filter(|input| !input.is_dir());
        if let Some(input) = missing {
            log!("deploy"; "`{}` not found, skipping {} deploy", input.display(), self.kind);
            return Ok(Outcome::Skipped);
        }

        let remote = self.resolve_remote()?;
        self.deploy_to(&remote)
    }

    /// Token first, so a missing secret is reported before anything else.
    fn resolve_remote(&self) -> Result<Remote, DeployError> {
        let token = self
            .config
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let remote = Remote::resolve(
            self.config.repository()?,
            token,
            self.config.deploy.server_url.as_deref(),
        )?;
        Ok(remote)
    }

    fn deploy_to(&self, remote: &Remote) -> Result<Outcome, DeployError> {
        let branch = self.kind.branch();
        let author = self.config.commit.author()?;
        let committer = self.config.commit.committer()?;

        log!("deploy"; "deploying {} to `{branch}` of {remote}", self.kind);
        if !remote_branch_exists(remote, branch)? {
            return Err(DeployError::RemoteBranchMissing {
                branch: branch.to_owned(),
            });
        }

        let old_dir = self.scratch("branch-old")?;
        let old = GitRepo::clone_branch(remote, branch, old_dir.path())?;

        let new_dir = self.scratch("branch-new")?;
        let new = GitRepo::init(new_dir.path())?;
        new.checkout_branch(branch)?;
        new.fetch_tip(old.root(), branch)?;

        let layout = Layout {
            old: old.root(),
            new: new.root(),
            root: &self.config.root,
        };
        strategy::apply(&self.kind.plan(&layout))?;

        if !new.is_dirty()? {
            log!("deploy"; "No changes to commit");
            return Ok(Outcome::NoChanges);
        }

        self.publish(&new, remote, &author, &committer)
    }

    /// Stage, commit and push the assembled snapshot.
    ///
    /// Nothing is committed when staging leaves the index equal to `HEAD`.
    fn publish(
        &self,
        repo: &GitRepo,
        remote: &Remote,
        author: &Identity,
        committer: &Identity,
    ) -> Result<Outcome, DeployError> {
        let branch = self.kind.branch();
        repo.set_config("user.name", committer.name())?;
        repo.set_config("user.email", committer.email())?;
        repo.stage_all()?;
        if !repo.has_staged_changes()? {
            log!("deploy"; "Nothing to deploy");
            return Ok(Outcome::NothingToDeploy);
        }

        if !self.config.deploy.keep_history {
            repo.drop_history(branch)?;
        }
        repo.commit(true, author, &self.config.commit.message)?;
        let commit = repo.head_id()?;
        let stat = repo.diff_stat(self.config.deploy.stat_count)?;
        if !stat.is_empty() {
            log!("git"; "{stat}");
        }

        if self.config.dry_run {
            log!("deploy"; "dry run, not pushing to {remote}");
            return Ok(Outcome::DryRun { commit });
        }

        repo.push(remote, branch, true)?;
        log!("deploy"; "Content has been deployed to `{branch}`");
        Ok(Outcome::Deployed { commit })
    }

    fn scratch(&self, prefix: &str) -> Result<TempDir, DeployError> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(&self.scratch_root)
            .map_err(|err| FsError::new(&self.scratch_root, err).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path, process::Command};

    /// Run git in `dir` for fixture setup and inspection.
    fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(["-c", "user.name=Fixture", "-c", "user.email=fixture@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .output()
            .expect("Failed to execute git command");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// A bare "remote", the invocation root and a scratch area for one run.
    struct Fixture {
        bare: TempDir,
        root: TempDir,
        scratch: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let bare = TempDir::new().unwrap();
            git(bare.path(), &["init", "--quiet", "--bare"]);
            let root = TempDir::new().unwrap();
            let config = Config {
                root: root.path().to_path_buf(),
                ..Config::default()
            };
            Self {
                bare,
                root,
                scratch: TempDir::new().unwrap(),
                config,
            }
        }

        /// Push `files` as a single commit on `branch` of the bare remote.
        fn seed(&self, branch: &str, files: &[(&str, &str)]) {
            let work = TempDir::new().unwrap();
            git(work.path(), &["init", "--quiet"]);
            git(work.path(), &["checkout", "--quiet", "--orphan", branch]);
            for (path, content) in files {
                write(&work.path().join(path), content);
            }
            git(work.path(), &["add", "--all"]);
            git(work.path(), &["commit", "--quiet", "-m", "seed"]);
            let target = self.bare.path().to_string_lossy().into_owned();
            git(work.path(), &["push", "--quiet", &target, &format!("{branch}:{branch}")]);
        }

        fn input(&self, path: &str, content: &str) {
            write(&self.root.path().join(path), content);
        }

        fn deploy(&self, kind: DeployType) -> Result<Outcome, DeployError> {
            Deployer::new(kind, &self.config)
                .scratch_in(self.scratch.path())
                .deploy_to(&Remote::local(self.bare.path()))
        }

        fn files(&self, branch: &str) -> Vec<String> {
            git(self.bare.path(), &["ls-tree", "-r", "--name-only", branch])
                .lines()
                .map(str::to_owned)
                .collect()
        }

        fn show(&self, branch: &str, path: &str) -> String {
            git(self.bare.path(), &["show", &format!("{branch}:{path}")])
        }

        fn tip(&self, branch: &str) -> String {
            git(self.bare.path(), &["rev-parse", branch]).trim().to_owned()
        }

        fn history_len(&self, branch: &str) -> usize {
            git(self.bare.path(), &["rev-list", "--count", branch])
                .trim()
                .parse()
                .unwrap()
        }

        fn scratch_is_clean(&self) -> bool {
            fs::read_dir(self.scratch.path()).unwrap().next().is_none()
        }
    }

    #[test]
    fn test_assets_deploy() {
        let fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "<h1>site</h1>"), ("assets/old.png", "old")]);
        fixture.input("assets/new.png", "new");

        let outcome = fixture.deploy(DeployType::Assets).unwrap();

        let Outcome::Deployed { commit } = outcome else {
            panic!("expected a deploy, got {outcome:?}");
        };
        assert_eq!(fixture.tip("gh-pages"), commit.to_string());
        assert_eq!(fixture.files("gh-pages"), ["assets/new.png", "index.html"]);
        assert_eq!(fixture.show("gh-pages", "index.html"), "<h1>site</h1>");
        assert!(fixture.scratch_is_clean());
    }

    #[test]
    fn test_commit_identity_and_message() {
        let mut fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "old")]);
        fixture.input("assets/logo.png", "logo");
        fixture.config.commit.author = "Jane Doe <jane@example.com>".into();
        fixture.config.commit.message = "Publish assets".into();

        fixture.deploy(DeployType::Assets).unwrap();

        let log = git(
            fixture.bare.path(),
            &["log", "-1", "--format=%an <%ae>|%cn <%ce>|%s", "gh-pages"],
        );
        assert_eq!(
            log.trim(),
            "Jane Doe <jane@example.com>|GitHub <noreply@github.com>|Publish assets"
        );
    }

    #[test]
    fn test_second_run_has_no_changes() {
        let fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "<h1>site</h1>")]);
        fixture.input("assets/new.png", "new");

        fixture.deploy(DeployType::Assets).unwrap();
        let tip = fixture.tip("gh-pages");

        assert_eq!(fixture.deploy(DeployType::Assets).unwrap(), Outcome::NoChanges);
        assert_eq!(fixture.tip("gh-pages"), tip);
        assert!(fixture.scratch_is_clean());
    }

    #[test]
    fn test_history_replaced_by_default() {
        let fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "v1")]);
        fixture.input("build/index.html", "v2");

        fixture.deploy(DeployType::Frontend).unwrap();
        assert_eq!(fixture.history_len("gh-pages"), 1);
        assert_eq!(fixture.show("gh-pages", "index.html"), "v2");
    }

    #[test]
    fn test_keep_history() {
        let mut fixture = Fixture::new();
        fixture.config.deploy.keep_history = true;
        fixture.seed("gh-pages", &[("index.html", "v1")]);
        let seed = fixture.tip("gh-pages");
        fixture.input("build/index.html", "v2");

        fixture.deploy(DeployType::Frontend).unwrap();

        assert_eq!(fixture.history_len("gh-pages"), 2);
        let parent = git(fixture.bare.path(), &["rev-parse", "gh-pages^"]);
        assert_eq!(parent.trim(), seed);
    }

    #[test]
    fn test_frontend_keeps_backend_data() {
        let fixture = Fixture::new();
        fixture.seed(
            "gh-pages",
            &[
                ("index.html", "old"),
                ("old-page.html", "gone"),
                ("api/index.json", "[1]"),
                ("media/a.png", "a"),
            ],
        );
        fixture.input("build/index.html", "new");
        fixture.input("build/js/app.js", "app");

        fixture.deploy(DeployType::Frontend).unwrap();

        assert_eq!(
            fixture.files("gh-pages"),
            ["api/index.json", "index.html", "js/app.js", "media/a.png"]
        );
        assert_eq!(fixture.show("gh-pages", "api/index.json"), "[1]");
    }

    #[test]
    fn test_backend_assets_replaces_branch() {
        let fixture = Fixture::new();
        fixture.seed("assets", &[("stale.png", "stale")]);
        fixture.input("build/assets/.git/HEAD", "ref: refs/heads/main");
        fixture.input("build/assets/img/a.png", "a");

        fixture.deploy(DeployType::BackendAssets).unwrap();

        assert_eq!(fixture.files("assets"), ["img/a.png"]);
        assert!(fixture.root.path().join("build/assets/.git/HEAD").exists());
    }

    #[test]
    fn test_dry_run_does_not_push() {
        let mut fixture = Fixture::new();
        fixture.config.dry_run = true;
        fixture.seed("gh-pages", &[("index.html", "old")]);
        let tip = fixture.tip("gh-pages");
        fixture.input("build/index.html", "new");

        let outcome = fixture.deploy(DeployType::Frontend).unwrap();

        assert!(matches!(outcome, Outcome::DryRun { .. }));
        assert_eq!(fixture.tip("gh-pages"), tip);
        assert!(fixture.scratch_is_clean());
    }

    #[test]
    fn test_ignored_files_are_not_changes() {
        let fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "site"), (".gitignore", "*.log\n")]);
        fixture.input("build/index.html", "site");
        fixture.input("build/.gitignore", "*.log\n");
        fixture.input("build/debug.log", "noise");

        // The ignored file keeps status clean, so this is not even dirty
        assert_eq!(fixture.deploy(DeployType::Frontend).unwrap(), Outcome::NoChanges);
    }

    #[test]
    fn test_nothing_staged_is_nothing_to_deploy() {
        let fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "site")]);
        let tip = fixture.tip("gh-pages");
        let remote = Remote::local(fixture.bare.path());
        let checkout = TempDir::new().unwrap();
        // A checkout equal to the deployed tip: `add --all` stages nothing
        let repo = GitRepo::clone_branch(&remote, "gh-pages", checkout.path()).unwrap();

        let deployer = Deployer::new(DeployType::Frontend, &fixture.config);
        let author = fixture.config.commit.author().unwrap();
        let committer = fixture.config.commit.committer().unwrap();
        let outcome = deployer.publish(&repo, &remote, &author, &committer).unwrap();

        assert_eq!(outcome, Outcome::NothingToDeploy);
        assert_eq!(fixture.tip("gh-pages"), tip);
        let count = git(checkout.path(), &["rev-list", "--count", "HEAD"]);
        assert_eq!(count.trim(), "1");
    }

    #[test]
    fn test_missing_remote_branch() {
        let fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "site")]);
        fixture.input("build/assets/a.png", "a");

        let err = fixture.deploy(DeployType::BackendAssets).unwrap_err();

        assert!(matches!(err, DeployError::RemoteBranchMissing { ref branch } if branch == "assets"));
        assert!(fixture.scratch_is_clean());
    }

    #[test]
    fn test_missing_input_cleans_scratch() {
        let fixture = Fixture::new();
        fixture.seed("gh-pages", &[("index.html", "site")]);
        let tip = fixture.tip("gh-pages");

        let err = fixture.deploy(DeployType::Frontend).unwrap_err();

        assert!(matches!(err, DeployError::Filesystem(_)));
        assert_eq!(fixture.tip("gh-pages"), tip);
        assert!(fixture.scratch_is_clean());
    }

    #[test]
    fn test_backend_assets_without_input_is_skipped() {
        // No token, no repository, no remote: none of them are consulted
        let fixture = Fixture::new();
        let outcome = Deployer::new(DeployType::BackendAssets, &fixture.config)
            .scratch_in(fixture.scratch.path())
            .run()
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped);
        assert!(fixture.scratch_is_clean());
    }

    #[test]
    fn test_missing_token_is_reported_first() {
        let mut fixture = Fixture::new();
        fixture.input("build/index.html", "site");
        fixture.config.token = Some("  ".into());

        let err = Deployer::new(DeployType::Frontend, &fixture.config)
            .scratch_in(fixture.scratch.path())
            .run()
            .unwrap_err();

        assert!(matches!(err, DeployError::Config(ConfigError::MissingToken)));
        assert!(fixture.scratch_is_clean());
    }

    #[test]
    fn test_missing_repository() {
        let mut fixture = Fixture::new();
        fixture.config.token = Some("tok".into());

        let err = Deployer::new(DeployType::Assets, &fixture.config)
            .run()
            .unwrap_err();
        assert!(matches!(err, DeployError::Config(ConfigError::Validation(_))));
    }
}
