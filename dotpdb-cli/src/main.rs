mod app;
mod commands;
mod output;

use anyhow::Context;
use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(commands::generate::request_cancel)
        .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // dotpdb info+ on stderr unless --json; -v enables debug, -vv trace; RUST_LOG overrides
    if !cli.global.json {
        let level = match cli.global.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::new()
            .filter_module("dotpdb", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Generate {
            path,
            decompiled,
            output,
            flat,
            sequential,
            threads,
            require_codeview,
            banner,
        } => commands::generate::run(
            path,
            &commands::generate::GenerateOptions {
                decompiled,
                output: output.as_deref(),
                flat: *flat,
                sequential: *sequential,
                threads: *threads,
                require_codeview: *require_codeview,
                banner: banner.as_deref(),
                global: &cli.global,
            },
        ),
        Command::Dump { path, points } => commands::dump::run(path, *points, &cli.global),
        Command::Info { path } => commands::info::run(path, &cli.global),
    }
}
