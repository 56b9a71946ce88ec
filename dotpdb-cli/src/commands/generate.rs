use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::Context;
use dotpdb::prelude::{
    DiagnosticSeverity, GenerationReport, GeneratorOptions, PdbGenerator, ProgressObserver,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_manifest, load_module},
    output::{format_size, print_output, Align, TabWriter},
};

static CANCELLED: AtomicBool = AtomicBool::new(false);

/// Ctrl+C handler: the first press stops generation after the files in flight, the second exits.
pub fn request_cancel() {
    if CANCELLED.swap(true, Ordering::SeqCst) {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    }
    eprintln!("\nCancelling, press Ctrl+C again to exit immediately.");
}

pub struct GenerateOptions<'a> {
    pub decompiled: &'a Path,
    pub output: Option<&'a Path>,
    pub flat: bool,
    pub sequential: bool,
    pub threads: Option<usize>,
    pub require_codeview: bool,
    pub banner: Option<&'a str>,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOutput<'a> {
    assembly: String,
    output: String,
    #[serde(flatten)]
    report: &'a GenerationReport,
}

struct Progress {
    visible: bool,
}

impl ProgressObserver for Progress {
    fn file_completed(&self, completed: usize, total: usize, _path: &str) {
        if self.visible {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\r  {completed}/{total} source files");
            if completed == total {
                let _ = writeln!(stderr);
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        CANCELLED.load(Ordering::SeqCst)
    }
}

fn default_output(assembly: &Path) -> PathBuf {
    assembly.with_extension("pdb")
}

pub fn run(path: &Path, opts: &GenerateOptions<'_>) -> anyhow::Result<()> {
    let module = load_module(path)?;
    let decompiler = load_manifest(opts.decompiled)?;

    let mut options = GeneratorOptions::default()
        .with_nested_directories(!opts.flat)
        .with_parallel(!opts.sequential)
        .with_require_codeview(opts.require_codeview);
    if let Some(threads) = opts.threads {
        options = options.with_threads(threads);
    }
    if let Some(banner) = opts.banner {
        options = options.with_banner(banner);
    }

    let progress = Progress {
        visible: !opts.global.json,
    };
    let pdb = PdbGenerator::new(&module, &decompiler)
        .with_options(options)
        .with_observer(&progress)
        .generate()
        .with_context(|| format!("failed to generate PDB for {}", path.display()))?;

    let target = opts
        .output
        .map_or_else(|| default_output(path), Path::to_path_buf);
    pdb.write_file(&target)
        .with_context(|| format!("failed to write {}", target.display()))?;

    let output = GenerateOutput {
        assembly: file_display_name(path),
        output: target.display().to_string(),
        report: &pdb.report,
    };

    print_output(&output, opts.global, |out| {
        let report = out.report;
        println!("Assembly:        {}", out.assembly);
        println!("Output:          {}", out.output);
        println!(
            "PDB id:          {} ({:?})",
            report.content_id, report.content_id_source
        );
        println!("Size:            {}", format_size(report.size));
        println!();

        let mut counts = TabWriter::new(&[("Item", Align::Left), ("Count", Align::Right)]);
        counts.row(vec!["Source files".into(), report.source_files.to_string()]);
        counts.row(vec!["Documents".into(), report.documents.to_string()]);
        counts.row(vec![
            "Methods with sequence points".into(),
            report.methods_with_sequence_points.to_string(),
        ]);
        counts.row(vec!["Local scopes".into(), report.local_scopes.to_string()]);
        counts.row(vec!["Import scopes".into(), report.import_scopes.to_string()]);
        counts.row(vec![
            "State machine methods".into(),
            report.state_machine_methods.to_string(),
        ]);
        counts.row(vec![
            "Custom debug information".into(),
            report.custom_debug_information.to_string(),
        ]);
        counts.print();

        if !report.diagnostics.is_empty() {
            let errors = report
                .diagnostics
                .iter()
                .filter(|d| d.severity == DiagnosticSeverity::Error)
                .count();
            println!();
            println!(
                "Diagnostics ({}, {} errors):",
                report.diagnostics.len(),
                errors
            );

            let mut table = TabWriter::new(&[
                ("Severity", Align::Left),
                ("Category", Align::Left),
                ("Token", Align::Left),
                ("File", Align::Left),
                ("Message", Align::Left),
            ])
            .indent("  ");
            for diagnostic in &report.diagnostics {
                table.row(vec![
                    diagnostic.severity.to_string(),
                    diagnostic.category.to_string(),
                    diagnostic
                        .token
                        .map_or_else(|| "-".to_string(), |t| t.to_string()),
                    diagnostic.file.clone().unwrap_or_else(|| "-".to_string()),
                    diagnostic.message.clone(),
                ]);
            }
            table.print();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_next_to_assembly() {
        assert_eq!(
            default_output(Path::new("bin/App.dll")),
            PathBuf::from("bin/App.pdb")
        );
        assert_eq!(
            default_output(Path::new("Tool.exe")),
            PathBuf::from("Tool.pdb")
        );
    }
}
