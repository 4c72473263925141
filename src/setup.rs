// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfile repository setup logic.
//!
//! The middle of the wizard. The user either already keeps dotfiles in a
//! repository, in which case chezmoi clones it and optionally applies it, or
//! starts from scratch, in which case chezup walks over well known dotfiles
//! in the home directory, lets the user pick which ones chezmoi should
//! manage, and optionally wires the fresh source repository up to a remote.
//!
//! Every prompt loop in here terminates on blank input and aborts cleanly on
//! escape or interrupt, which surfaces as
//! [`inquire::InquireError::OperationCanceled`] through [`SetupError`].

use crate::{
    path::home_dir,
    platform::Platform,
    tool::{DotfileTool, ToolError},
};

use git2::{BranchType, Commit, IndexAddOption, Repository, RepositoryInitOptions};
use inquire::{validator::Validation, Confirm, CustomUserError, Select, Text};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Git hosts offered when the user wants a remote for a fresh repository.
const PROVIDERS: &[&str] = &["github.com", "gitlab.com", "codeberg.org", "bitbucket.org"];

/// Well known dotfiles offered for management, relative to the home
/// directory, with the platforms each one makes sense on.
///
/// Unrecognized platforms are treated as POSIX-ish, so they see everything
/// except the Windows specific entries.
const CANDIDATES: &[(&str, &[Platform])] = &[
    (".bashrc", UNIX),
    (".bash_profile", UNIX),
    (".profile", UNIX),
    (".zshrc", UNIX),
    (".zprofile", UNIX),
    (".vimrc", ALL),
    (".config/nvim/init.vim", ALL),
    (".config/nvim/init.lua", ALL),
    (".gitconfig", ALL),
    (".tmux.conf", UNIX),
    (".config/alacritty/alacritty.toml", ALL),
    (".config/kitty/kitty.conf", UNIX),
    (".wezterm.lua", ALL),
    ("Documents/PowerShell/Microsoft.PowerShell_profile.ps1", WINDOWS),
];

const UNIX: &[Platform] = &[Platform::Linux, Platform::MacOs, Platform::Unknown];
const WINDOWS: &[Platform] = &[Platform::Windows];
const ALL: &[Platform] = &[
    Platform::Linux,
    Platform::MacOs,
    Platform::Windows,
    Platform::Unknown,
];

/// Set up the user's dotfile repository through chezmoi.
///
/// # Errors
///
/// - Return [`SetupError::Prompt`] if a prompt fails or the user cancels.
/// - Return [`SetupError::Tool`] if a chezmoi invocation fails.
/// - Return [`SetupError::NoWayHome`] if the home directory is unknown.
#[instrument(skip(tool), level = "debug")]
pub fn bootstrap_repository(platform: Platform, tool: &impl DotfileTool) -> Result<()> {
    let existing = Confirm::new("Do you already have a dotfiles repository?")
        .with_default(false)
        .prompt()?;

    if existing {
        init_from_existing(tool)
    } else {
        init_fresh(platform, tool)
    }
}

fn init_from_existing(tool: &impl DotfileTool) -> Result<()> {
    let url = Text::new("Repository URL:")
        .with_validator(require_nonempty)
        .prompt()?;
    let apply = Confirm::new("Apply your dotfiles to this machine now?")
        .with_default(true)
        .prompt()?;

    info!("initializing chezmoi from {}", url.trim());
    tool.init(Some(url.trim()), apply)?;

    if apply {
        println!("Your dotfiles have been cloned and applied.");
    } else {
        println!("Your dotfiles have been cloned. Run `chezmoi apply` when ready.");
    }

    Ok(())
}

fn init_fresh(platform: Platform, tool: &impl DotfileTool) -> Result<()> {
    info!("creating a fresh dotfiles repository");
    tool.init(None, false)?;

    let home = home_dir()?;
    let mut selections = Vec::new();
    for rel in candidate_dotfiles(platform) {
        let path = home.join(rel);
        if !path.exists() {
            continue;
        }

        let manage = Confirm::new(format!("Manage ~/{rel}?").as_str())
            .with_default(false)
            .prompt()?;
        if manage {
            selections.push(path);
        }
    }

    println!("Enter any other files to manage, one per prompt.");
    drain_custom_paths(
        &mut selections,
        || {
            Text::new("Path (blank to finish):")
                .prompt()
                .map_err(SetupError::from)
        },
        |error| warn!("{error}"),
    )?;

    let selections = dedup_paths(selections);
    register_paths(tool, &selections)?;

    offer_remote(tool)
}

/// Candidate dotfiles that make sense on `platform`, in presentation order.
fn candidate_dotfiles(platform: Platform) -> impl Iterator<Item = &'static str> {
    CANDIDATES
        .iter()
        .filter(move |(_, platforms)| platforms.contains(&platform))
        .map(|(rel, _)| *rel)
}

/// Collect custom dotfile paths until the user submits a blank line.
///
/// Paths that fail to expand or do not exist are handed to `report` and the
/// user is asked again rather than the whole run dying over a typo.
fn drain_custom_paths(
    selections: &mut Vec<PathBuf>,
    mut next_input: impl FnMut() -> Result<String>,
    mut report: impl FnMut(&SetupError),
) -> Result<()> {
    loop {
        let input = next_input()?;
        let input = input.trim();
        if input.is_empty() {
            break;
        }

        match expand_custom_path(input) {
            Ok(path) => selections.push(path),
            Err(error) => report(&error),
        }
    }

    Ok(())
}

/// Expand tildes and environment variables, then insist the path exists.
fn expand_custom_path(input: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(input).map_err(|err| SetupError::ShellExpansion {
        source: err,
        input: input.to_string(),
    })?;

    let path = PathBuf::from(expanded.as_ref());
    if !path.exists() {
        return Err(SetupError::MissingPath { path });
    }

    Ok(path)
}

// INVARIANT: First occurrence wins, order preserved.
fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

fn register_paths(tool: &impl DotfileTool, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        info!("placing {} under management", path.display());
        tool.add(path)?;
    }

    Ok(())
}

fn offer_remote(tool: &impl DotfileTool) -> Result<()> {
    let wanted = Confirm::new("Create a remote repository for your dotfiles?")
        .with_default(false)
        .prompt()?;
    if !wanted {
        return Ok(());
    }

    let host = Select::new("Git host:", PROVIDERS.to_vec()).prompt()?;
    let user = Text::new("Username on that host:")
        .with_validator(require_nonempty)
        .prompt()?;
    let repo = Text::new("Repository name:")
        .with_default("dotfiles")
        .with_validator(require_nonempty)
        .prompt()?;
    let url = remote_url(host, user.trim(), repo.trim());

    println!("Remote URL: {url}");
    println!("Create that repository on {host} if it does not exist yet.");

    let source_dir = tool.source_dir()?;
    let run_now = Confirm::new("Point the local repository at this remote now?")
        .with_default(true)
        .prompt()?;

    if run_now {
        // The remote is a convenience, so a failure here downgrades to the
        // manual instructions instead of aborting the whole wizard.
        match bootstrap_remote(&source_dir, &url) {
            Ok(()) => {
                println!("Local repository is on branch main with origin set to {url}.");
                println!("Push whenever you are ready: git push -u origin main");
            }
            Err(error) => {
                warn!("cannot prepare local repository: {error}");
                print_manual_remote_steps(&source_dir, &url);
            }
        }
    } else {
        print_manual_remote_steps(&source_dir, &url);
    }

    Ok(())
}

/// Normalize git host details into an HTTPS clone URL.
fn remote_url(host: &str, user: &str, repo: &str) -> String {
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    format!("https://{host}/{user}/{repo}.git")
}

/// Prepare the chezmoi source repository for its new remote.
///
/// Stages everything, commits when the tree actually changed, renames the
/// current branch to `main`, and points `origin` at `url`. The push itself is
/// always left to the user.
#[instrument(level = "debug")]
fn bootstrap_remote(source_dir: &Path, url: &str) -> Result<()> {
    let repo = match Repository::open(source_dir) {
        Ok(repo) => repo,
        Err(_) => {
            let mut opts = RepositoryInitOptions::new();
            opts.initial_head("main");
            Repository::init_opts(source_dir, &opts)?
        }
    };

    let mut index = repo.index()?;
    index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree_id = index.write_tree()?;

    // INVARIANT: Only commit when the staged tree differs from HEAD.
    let head_commit = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    if head_commit.as_ref().map(|commit| commit.tree_id()) != Some(tree_id) {
        let tree = repo.find_tree(tree_id)?;
        let signature = repo.signature()?;
        let message = if head_commit.is_some() {
            "Update dotfiles"
        } else {
            "Initial commit"
        };
        let parents = head_commit.iter().collect::<Vec<&Commit<'_>>>();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
    }

    rename_default_branch(&repo)?;

    if repo.find_remote("origin").is_ok() {
        repo.remote_set_url("origin", url)?;
    } else {
        repo.remote("origin", url)?;
    }

    Ok(())
}

fn rename_default_branch(repo: &Repository) -> Result<()> {
    let Ok(head) = repo.head() else {
        return Ok(());
    };
    let Some(name) = head.shorthand().map(ToString::to_string) else {
        return Ok(());
    };
    if name == "main" {
        return Ok(());
    }

    let mut branch = repo.find_branch(name.as_str(), BranchType::Local)?;
    branch.rename("main", true)?;
    repo.set_head("refs/heads/main")?;

    Ok(())
}

fn print_manual_remote_steps(source_dir: &Path, url: &str) {
    println!("Run these commands once the remote repository exists:");
    println!("  cd {}", source_dir.display());
    println!("  git init");
    println!("  git add -A");
    println!("  git commit -m \"Initial commit\"");
    println!("  git branch -M main");
    println!("  git remote add origin {url}");
    println!("  git push -u origin main");
}

/// Prompt validator that rejects blank submissions.
pub(crate) fn require_nonempty(input: &str) -> std::result::Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("a value is required".into()))
    } else {
        Ok(Validation::Valid)
    }
}

/// Repository setup error types.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Custom dotfile path does not exist on disk.
    #[error("path {path:?} does not exist")]
    MissingPath { path: PathBuf },

    /// Custom dotfile path contains an unexpandable tilde or variable.
    #[error("cannot expand path {input:?}")]
    ShellExpansion {
        #[source]
        source: shellexpand::LookupError<std::env::VarError>,
        input: String,
    },

    /// Prompt failed or was canceled by the user.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// chezmoi invocation failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Git operation on the source repository failed.
    #[error(transparent)]
    Git(#[from] git2::Error),

    /// Home directory cannot be resolved.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

/// Friendly result alias :3
pub type Result<T, E = SetupError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;
    use std::{cell::RefCell, collections::VecDeque, fs};

    #[derive(Default)]
    struct CountingTool {
        added: RefCell<Vec<PathBuf>>,
    }

    impl DotfileTool for CountingTool {
        fn init(&self, _url: Option<&str>, _apply: bool) -> crate::tool::Result<()> {
            Ok(())
        }

        fn add(&self, path: &Path) -> crate::tool::Result<()> {
            self.added.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn source_dir(&self) -> crate::tool::Result<PathBuf> {
            Ok(PathBuf::from("."))
        }
    }

    #[test_case("dotfiles", true; "plain value accepted")]
    #[test_case("  padded  ", true; "padded value accepted")]
    #[test_case("", false; "empty rejected")]
    #[test_case("   ", false; "blank rejected")]
    #[test]
    fn nonempty_validator(input: &str, accept: bool) {
        match require_nonempty(input) {
            Ok(Validation::Valid) => assert!(accept),
            Ok(Validation::Invalid(_)) => assert!(!accept),
            Err(error) => panic!("validator failed: {error}"),
        }
    }

    #[test]
    fn candidate_dotfiles_respect_platform() {
        let linux: Vec<&str> = candidate_dotfiles(Platform::Linux).collect();
        let windows: Vec<&str> = candidate_dotfiles(Platform::Windows).collect();
        let unknown: Vec<&str> = candidate_dotfiles(Platform::Unknown).collect();

        assert!(linux.contains(&".bashrc"));
        assert!(!linux.contains(&"Documents/PowerShell/Microsoft.PowerShell_profile.ps1"));
        assert!(windows.contains(&"Documents/PowerShell/Microsoft.PowerShell_profile.ps1"));
        assert!(!windows.contains(&".bashrc"));
        assert!(unknown.contains(&".gitconfig"));
        assert!(!unknown.contains(&"Documents/PowerShell/Microsoft.PowerShell_profile.ps1"));
    }

    #[sealed_test(env = [("HOME", ".")])]
    fn expand_custom_path_handles_tilde() -> anyhow::Result<()> {
        fs::write("existing", "")?;

        let result = expand_custom_path("~/existing")?;

        assert_eq!(result, PathBuf::from("./existing"));

        Ok(())
    }

    #[test]
    fn expand_custom_path_rejects_missing_file() {
        let result = expand_custom_path("/definitely/not/a/real/path/7b3f");
        assert!(matches!(result, Err(SetupError::MissingPath { .. })));
    }

    #[test]
    fn expand_custom_path_rejects_unset_variable() {
        let result = expand_custom_path("$CHEZUP_UNSET_VARIABLE_7B3F/file");
        assert!(matches!(result, Err(SetupError::ShellExpansion { .. })));
    }

    #[test]
    fn drain_custom_paths_reprompts_after_bad_entry() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let existing = temp.path().join("managed");
        fs::write(&existing, "")?;

        let mut inputs = VecDeque::from([
            "/definitely/not/a/real/path/7b3f".to_string(),
            existing.to_string_lossy().into_owned(),
            String::new(),
        ]);
        let mut reported = 0;

        let mut selections = Vec::new();
        drain_custom_paths(
            &mut selections,
            || Ok(inputs.pop_front().unwrap_or_default()),
            |_| reported += 1,
        )?;

        assert_eq!(selections, vec![existing]);
        assert_eq!(reported, 1);

        Ok(())
    }

    #[test]
    fn drain_custom_paths_stops_on_blank_input() -> anyhow::Result<()> {
        let mut selections = Vec::new();
        drain_custom_paths(&mut selections, || Ok("   ".to_string()), |_| {})?;

        assert!(selections.is_empty());

        Ok(())
    }

    #[test]
    fn dedup_paths_keeps_first_occurrence() {
        let paths = vec![
            PathBuf::from("/home/user/.bashrc"),
            PathBuf::from("/home/user/.vimrc"),
            PathBuf::from("/home/user/.bashrc"),
        ];

        let result = dedup_paths(paths);

        assert_eq!(
            result,
            vec![PathBuf::from("/home/user/.bashrc"), PathBuf::from("/home/user/.vimrc")],
        );
    }

    #[test]
    fn register_paths_adds_each_selection_in_order() -> anyhow::Result<()> {
        let tool = CountingTool::default();
        let paths = vec![PathBuf::from("/home/user/.bashrc"), PathBuf::from("/home/user/.vimrc")];

        register_paths(&tool, &paths)?;

        assert_eq!(tool.added.borrow().clone(), paths);

        Ok(())
    }

    #[test]
    fn register_paths_with_nothing_selected_is_a_noop() -> anyhow::Result<()> {
        let tool = CountingTool::default();

        register_paths(&tool, &[])?;

        assert!(tool.added.borrow().is_empty());

        Ok(())
    }

    #[test_case("github.com", "user", "dotfiles", "https://github.com/user/dotfiles.git"; "plain name")]
    #[test_case("gitlab.com", "user", "dotfiles.git", "https://gitlab.com/user/dotfiles.git"; "suffix not doubled")]
    #[test]
    fn remote_url_normalizes(host: &str, user: &str, repo: &str, expect: &str) {
        // Qualified: test_case expands the body into a nested module where
        // the unqualified macro is ambiguous.
        pretty_assertions::assert_eq!(remote_url(host, user, repo), expect);
    }

    #[test]
    fn bootstrap_remote_commits_and_wires_origin() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path();
        fs::write(dir.join("dot_bashrc"), "export EDITOR=vim\n")?;

        // Mimic a repository chezmoi created with an old default branch name.
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = Repository::init_opts(dir, &opts)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;
        drop(config);
        drop(repo);

        bootstrap_remote(dir, "https://github.com/user/dotfiles.git")?;

        let repo = Repository::open(dir)?;
        let head = repo.head()?;
        assert_eq!(head.shorthand(), Some("main"));

        let commit = head.peel_to_commit()?;
        assert_eq!(commit.message(), Some("Initial commit"));
        assert_eq!(commit.parent_count(), 0);

        let remote = repo.find_remote("origin")?;
        assert_eq!(remote.url(), Some("https://github.com/user/dotfiles.git"));

        Ok(())
    }

    #[test]
    fn bootstrap_remote_skips_commit_when_tree_unchanged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path();
        fs::write(dir.join("dot_bashrc"), "export EDITOR=vim\n")?;

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir, &opts)?;
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;
        drop(config);
        drop(repo);

        bootstrap_remote(dir, "https://github.com/user/dotfiles.git")?;
        bootstrap_remote(dir, "https://gitlab.com/user/dotfiles.git")?;

        let repo = Repository::open(dir)?;
        let commit = repo.head()?.peel_to_commit()?;
        assert_eq!(commit.parent_count(), 0);
        assert_eq!(commit.message(), Some("Initial commit"));

        let remote = repo.find_remote("origin")?;
        assert_eq!(remote.url(), Some("https://gitlab.com/user/dotfiles.git"));

        Ok(())
    }

    #[test]
    fn bootstrap_remote_commits_again_when_tree_changes() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let dir = temp.path();
        fs::write(dir.join("dot_bashrc"), "export EDITOR=vim\n")?;

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir, &opts)?;
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;
        drop(config);
        drop(repo);

        bootstrap_remote(dir, "https://github.com/user/dotfiles.git")?;
        fs::write(dir.join("dot_vimrc"), "set number\n")?;
        bootstrap_remote(dir, "https://github.com/user/dotfiles.git")?;

        let repo = Repository::open(dir)?;
        let commit = repo.head()?.peel_to_commit()?;
        assert_eq!(commit.parent_count(), 1);
        assert_eq!(commit.message(), Some("Update dotfiles"));

        Ok(())
    }
}
