// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Closing quick reference.

/// Everyday chezmoi commands, printed once the wizard finishes.
const REFERENCE: &str = "\
Everyday commands:
  chezmoi add <file>    start managing a file
  chezmoi edit <file>   edit the source state of a file
  chezmoi diff          preview pending changes
  chezmoi apply         deploy pending changes
  chezmoi update        pull and apply the latest changes
  chezmoi cd            open a shell in the source directory

Documentation: https://www.chezmoi.io/
";

/// Print the quick reference for daily use.
pub fn print_reference() {
    println!("{REFERENCE}");
}
