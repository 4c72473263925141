// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! # chezup
//!
//! Interactive installer and first run bootstrapper for
//! [chezmoi](https://www.chezmoi.io/), the dotfile manager. chezup takes a
//! machine from "nothing installed" to "dotfiles under management" through a
//! single guided run.
//!
//! # Pipeline
//!
//! A run walks through five stages. Detection never fails; every stage
//! after it reports failure through its own error type:
//!
//! 1. [`platform::Platform::detect`] classifies the host.
//! 2. [`install`] makes sure the chezmoi binary exists, installing it
//!    through the platform's package manager or the vendor script.
//! 3. [`setup`] initializes the dotfile repository, either by cloning an
//!    existing one or by picking dotfiles to manage from scratch.
//! 4. [`config`] writes `chezmoi.toml` with the user's identity and
//!    preferences.
//! 5. [`template`] and [`guide`] round things off with an example template
//!    and a quick reference.
//!
//! chezmoi itself does all dotfile management. chezup only drives it.

pub mod config;
pub mod guide;
pub mod install;
pub mod path;
pub mod platform;
pub mod process;
pub mod setup;
pub mod template;
pub mod tool;

pub use config::{configure, ChezmoiConfig, Identity, SecretManager};
pub use install::Installer;
pub use platform::Platform;
pub use process::{probe, CommandRunner, Syscall};
pub use setup::bootstrap_repository;
pub use template::offer_example;
pub use tool::{Chezmoi, DotfileTool};
