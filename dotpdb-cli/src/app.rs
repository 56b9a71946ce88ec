use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// dotpdb - Portable PDB generation for decompiled .NET assemblies
#[derive(Debug, Parser)]
#[command(name = "dotpdb", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a Portable PDB from an assembly and its decompiled sources.
    Generate {
        /// Path to the .NET assembly file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// JSON manifest of the decompiled source files.
        #[arg(long, value_name = "MANIFEST")]
        decompiled: PathBuf,

        /// Output path (defaults to the assembly path with a .pdb extension).
        #[arg(short, long, value_name = "PDB")]
        output: Option<PathBuf>,

        /// Put every source file at the root instead of one directory per namespace.
        #[arg(long)]
        flat: bool,

        /// Process the source files on the calling thread.
        #[arg(long)]
        sequential: bool,

        /// Worker threads for parallel processing (defaults to the global pool).
        #[arg(long, value_name = "N", conflicts_with = "sequential")]
        threads: Option<usize>,

        /// Fail if the assembly has no CodeView debug directory entry.
        #[arg(long)]
        require_codeview: bool,

        /// Comment line prepended to every embedded source file.
        #[arg(long, value_name = "TEXT")]
        banner: Option<String>,
    },

    /// Print the id, table row counts and documents of a Portable PDB.
    Dump {
        /// Path to the Portable PDB file.
        #[arg(value_name = "PDB")]
        path: PathBuf,

        /// Also print the sequence points of every method.
        #[arg(long)]
        points: bool,
    },

    /// Display the module summary used for generation.
    Info {
        /// Path to the .NET assembly file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}
