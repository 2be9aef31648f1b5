// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lakeshore command-line entry point

mod cli;

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Run(args) => cli::handle_run(*args),
        Commands::Show {
            table,
            catalog,
            version,
            limit,
            format,
        } => cli::handle_show(&table, &catalog, version, limit, format),
        Commands::History { table, catalog } => cli::handle_history(&table, &catalog),
        Commands::Tables { catalog } => cli::handle_tables(&catalog),
        Commands::Branch { action, catalog } => cli::handle_branch(action, &catalog),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    match (cli.verbose, cli.log_level) {
        (true, _) => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        (false, Some(level)) => {
            builder.filter_level(level.to_level_filter());
        }
        // No flag: warnings by default, RUST_LOG may override
        (false, None) => {
            builder
                .filter_level(log::LevelFilter::Warn)
                .parse_default_env();
        }
    }
    builder.init();
}
