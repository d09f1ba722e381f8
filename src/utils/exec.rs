//! External command execution utilities.
//!
//! Provides macros and functions for running commands in an explicit working
//! directory, with stderr filtering and typed failures.

use crate::log;
use regex::Regex;
use std::{
    ffi::OsString,
    io,
    path::Path,
    process::{Command, ExitStatus, Output},
    sync::OnceLock,
};
use thiserror::Error;

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments, failing on non-zero exit.
///
/// Supports optional `filter` and `secret` arguments. A secret is masked in
/// everything the command's output contributes to logs and errors.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(["git"]; "ls-remote", "--heads", url, branch)?;
///
/// // With working directory
/// exec!(root; ["git"]; "add", "--all")?;
///
/// // With custom filter
/// const MY_FILTER: FilterRule = FilterRule::new(&["hint:"]);
/// exec!(filter=&MY_FILTER; root; ["git"]; "init")?;
///
/// // With a secret embedded in the arguments
/// exec!(filter=&MY_FILTER; secret=remote.secret(); ["git"]; "ls-remote", url)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($($tt:tt)*) => {
        $crate::exec_internal!(@parse_filter $($tt)*)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! exec_internal {
    // Parse filter argument
    (@parse_filter filter=$filter:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_secret $filter; $($rest)*)
    };
    (@parse_filter $($rest:tt)*) => {
        $crate::exec_internal!(@parse_secret &$crate::utils::exec::EMPTY_FILTER; $($rest)*)
    };

    // Parse secret argument
    (@parse_secret $filter:expr; secret=$secret:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root $filter; $secret; $($rest)*)
    };
    (@parse_secret $filter:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root $filter; None; $($rest)*)
    };

    // Parse root and command (with root)
    (@parse_root $filter:expr; $secret:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
            $secret,
        )
    };
    // Parse command (without root)
    (@parse_root $filter:expr; $secret:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
            $secret,
        )
    };
}

// ============================================================================
// Errors
// ============================================================================

/// Failure of an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute `{name}`")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("command `{name}` failed with {status}{}", fmt_detail(.stderr))]
    Failed {
        name: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("empty command")]
    Empty,
}

fn fmt_detail(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

// ============================================================================
// Argument Conversion
// ============================================================================

#[doc(hidden)]
#[allow(clippy::wildcard_imports)] // Needed for macro internal module
pub mod internal {
    use super::*;

    /// Convert to `OsString`.
    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    /// Trait for converting to command vector.
    pub trait ToCmd {
        fn to_cmd(self) -> Vec<OsString>;
    }

    impl<const N: usize> ToCmd for [&str; N] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.into_iter().map(OsString::from).collect()
        }
    }

    /// Convert command to Vec<OsString>.
    #[inline]
    pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
        cmd.to_cmd()
    }

    /// Filter out empty args.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    filter: &'static FilterRule,
    secret: Option<&str>,
) -> Result<Output, CommandError> {
    let (name, output) = run(root, cmd, args)?;
    log_output(&name, &output, filter, secret)?;
    Ok(output)
}

/// Execute a command without judging its exit status.
///
/// For probes like `git diff --quiet` where the exit code is the answer.
pub fn probe(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<Output, CommandError> {
    run(root, cmd, args).map(|(_, output)| output)
}

fn run(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
) -> Result<(String, Output), CommandError> {
    let (name, mut command) = prepare(root, cmd, args)?;
    let output = command.output().map_err(|source| CommandError::Spawn {
        name: name.clone(),
        source,
    })?;
    Ok((name, output))
}

/// Prepare a Command from components.
fn prepare(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
) -> Result<(String, Command), CommandError> {
    let program = cmd.first().ok_or(CommandError::Empty)?;
    let name = program.to_string_lossy().into_owned();

    let mut command = Command::new(program);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Placeholder written wherever a secret would appear.
pub const MASK: &str = "***";

/// Replace every occurrence of `secret` in `text`.
pub fn redact(text: &str, secret: Option<&str>) -> String {
    match secret {
        Some(secret) if !secret.is_empty() => text.replace(secret, MASK),
        _ => text.to_owned(),
    }
}

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));
    re.replace_all(s, "")
}

/// Filter rule for skipping specific output lines by prefix.
///
/// Used to reduce noise in command output logging by ignoring known hints
/// or irrelevant messages.
pub struct FilterRule {
    /// Prefixes to match at the start of output lines.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule with the given prefixes.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Lines of `output` that survive the filter.
    fn keep<'a>(&self, output: &'a str) -> Vec<&'a str> {
        output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect()
    }

    /// Surviving output lines, ANSI-free and with `secret` masked.
    fn render(&self, output: &str, secret: Option<&str>) -> String {
        let kept = self.keep(output).join("\n");
        redact(&strip_ansi(&kept), secret)
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Log command output, filtering known noise.
fn log_output(
    name: &str,
    output: &Output,
    filter: &'static FilterRule,
    secret: Option<&str>,
) -> Result<(), CommandError> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = filter.render(stderr.trim(), secret);

    if !output.status.success() {
        return Err(CommandError::Failed {
            name: name.to_owned(),
            status: output.status,
            stderr,
        });
    }

    // On success, only log stderr (warnings, progress) to reduce noise
    if !stderr.is_empty() {
        log!(name; "{stderr}");
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
