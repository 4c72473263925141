// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use chezup::{
    bootstrap_repository, configure, guide::print_reference, offer_example, path::tool_config_file,
    probe, Chezmoi, Installer, Platform, Syscall,
};

use anyhow::Result;
use clap::Parser;
use std::process::exit;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(about, version)]
struct Cli {}

impl Cli {
    fn run(self) -> Result<()> {
        println!("Welcome to chezup. Let's get your dotfiles under management.");
        println!();

        let platform = Platform::detect();
        println!("Detected platform: {platform}");

        let bin = Installer::new(platform, probe, Syscall).ensure_installed()?;
        let chezmoi = Chezmoi::new(bin);

        bootstrap_repository(platform, &chezmoi)?;
        configure(&tool_config_file()?)?;
        offer_example(&chezmoi)?;
        print_reference();

        println!("All done. Enjoy your freshly managed dotfiles!");

        Ok(())
    }
}

fn main() {
    let layer = fmt::layer().compact().with_target(false).without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}
