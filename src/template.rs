// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Example template handling.
//!
//! chezmoi's templates are the feature newcomers miss most, so the wizard
//! offers to drop a small annotated example into the source directory. The
//! example renders to `~/.example` and demonstrates platform conditionals,
//! machine conditionals, and command output.
//!
//! The dangerous demonstrations, file includes and secret manager lookups,
//! are wrapped in `{{/* */}}` template comments. Hash prefixed lines still
//! execute at render time, template comments never do, so the example stays
//! inert until the user arms those lines deliberately.

use crate::tool::{DotfileTool, ToolError};

use inquire::Confirm;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

/// File name chezmoi maps to `~/.example`.
pub const EXAMPLE_FILE_NAME: &str = "dot_example.tmpl";

/// Annotated example template seeded into the source directory.
pub const EXAMPLE_TEMPLATE: &str = r#"{{/* Example template seeded by chezup. Edit or delete it freely. */}}
{{/* It renders to ~/.example. Stop managing it with: chezmoi forget ~/.example */}}

# Values below are filled in when you run chezmoi apply.
hostname: {{ .chezmoi.hostname }}
operating system: {{ .chezmoi.os }}

{{ if eq .chezmoi.os "darwin" -}}
platform note: this line only renders on macOS
{{ else if eq .chezmoi.os "linux" -}}
platform note: this line only renders on Linux
{{ end -}}

{{ if eq .chezmoi.hostname "work-laptop" -}}
machine note: this line only renders on the work laptop
{{ end -}}

git version: {{ output "git" "--version" | trim }}

# The examples below are template comments. They render to nothing until you
# remove the comment markers to arm them.
{{/* include "dot_aliases" */}}
{{/* pass "github/token" */}}
"#;

/// Offer to seed the example template into the source directory.
///
/// # Errors
///
/// - Return [`TemplateError::Prompt`] if the prompt fails or the user
///   cancels.
/// - Return [`TemplateError::Tool`] if chezmoi cannot report its source
///   directory.
/// - Return [`TemplateError::Write`] if the example cannot be written.
#[instrument(skip(tool), level = "debug")]
pub fn offer_example(tool: &impl DotfileTool) -> Result<()> {
    let wanted = Confirm::new("Drop an example template into your source directory?")
        .with_default(true)
        .prompt()?;
    if !wanted {
        return Ok(());
    }

    let source_dir = tool.source_dir()?;
    let target = write_example(&source_dir)?;
    info!("example template written to {}", target.display());

    println!("Example template written to {}.", target.display());
    println!("It renders to ~/.example. Edit or delete it before your next `chezmoi apply`.");

    Ok(())
}

/// Write the example template into `source_dir`, clobbering any old copy.
///
/// # Errors
///
/// - Return [`TemplateError::Write`] if the example cannot be written.
pub fn write_example(source_dir: &Path) -> Result<PathBuf> {
    let target = source_dir.join(EXAMPLE_FILE_NAME);
    fs::write(&target, EXAMPLE_TEMPLATE).map_err(|err| TemplateError::Write {
        source: err,
        target: target.clone(),
    })?;

    Ok(target)
}

/// Example template error types.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Cannot write the example template.
    #[error("cannot write example template to {target:?}")]
    Write {
        #[source]
        source: std::io::Error,
        target: PathBuf,
    },

    /// Prompt failed or was canceled by the user.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// chezmoi invocation failed.
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Friendly result alias :3
pub type Result<T, E = TemplateError> = std::result::Result<T, E>;
