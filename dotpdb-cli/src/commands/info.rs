use std::path::Path;

use dotpdb::{file::IMAGE_DEBUG_TYPE_CODEVIEW, prelude::ModuleInfo, pdb::ContentId};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_module},
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct CodeViewSummary {
    guid: String,
    age: u32,
    path: String,
    time_date_stamp: String,
    pdb_id: String,
}

#[derive(Debug, Serialize)]
struct DebugEntrySummary {
    debug_type: u32,
    time_date_stamp: String,
    version: String,
    size: u32,
}

#[derive(Debug, Serialize)]
struct ModuleSummary {
    file: String,
    module: String,
    entry_point: String,
    type_count: usize,
    top_level_type_count: usize,
    method_count: u32,
    methods_with_body: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    codeview: Option<CodeViewSummary>,
    debug_directory: Vec<DebugEntrySummary>,
}

fn debug_type_name(debug_type: u32) -> &'static str {
    match debug_type {
        IMAGE_DEBUG_TYPE_CODEVIEW => "CodeView",
        12 => "VcFeature",
        13 => "POGO",
        14 => "ILTCG",
        16 => "Reproducible",
        17 => "EmbeddedPortablePdb",
        19 => "PdbChecksum",
        _ => "Other",
    }
}

fn summarize(path: &Path, module: &ModuleInfo) -> ModuleSummary {
    let codeview = module.codeview().map(|codeview| CodeViewSummary {
        guid: codeview.guid.to_string(),
        age: codeview.age,
        path: codeview.path.clone(),
        time_date_stamp: format!("0x{:08X}", codeview.time_date_stamp),
        pdb_id: ContentId::from_codeview(codeview).to_string(),
    });

    let debug_directory = module
        .debug_directory()
        .iter()
        .map(|entry| DebugEntrySummary {
            debug_type: entry.debug_type,
            time_date_stamp: format!("0x{:08X}", entry.time_date_stamp),
            version: format!("{:04X}.{:04X}", entry.major_version, entry.minor_version),
            size: entry.size_of_data,
        })
        .collect();

    ModuleSummary {
        file: file_display_name(path),
        module: module.name().to_string(),
        entry_point: if module.entry_point().is_null() {
            "none".to_string()
        } else {
            module.entry_point().to_string()
        },
        type_count: module.types().len(),
        top_level_type_count: module.top_level_types().count(),
        method_count: module.method_count(),
        methods_with_body: module
            .methods()
            .iter()
            .filter(|method| method.body.is_some())
            .count(),
        codeview,
        debug_directory,
    }
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let module = load_module(path)?;
    let summary = summarize(path, &module);

    print_output(&summary, opts, |info| {
        println!("File:            {}", info.file);
        println!("Module:          {}", info.module);
        println!("Entry point:     {}", info.entry_point);
        println!(
            "Types:           {} ({} top-level)",
            info.type_count, info.top_level_type_count
        );
        println!(
            "Methods:         {} ({} with IL body)",
            info.method_count, info.methods_with_body
        );

        match &info.codeview {
            Some(codeview) => {
                println!("CodeView:        {} age {}", codeview.guid, codeview.age);
                println!("  PDB path:      {}", codeview.path);
                println!("  Time stamp:    {}", codeview.time_date_stamp);
                println!("  PDB id:        {}", codeview.pdb_id);
            }
            None => println!("CodeView:        none (the PDB id will be derived from content)"),
        }

        if !info.debug_directory.is_empty() {
            println!();
            println!("Debug directory:");
            let mut table = TabWriter::new(&[
                ("Type", Align::Left),
                ("Stamp", Align::Left),
                ("Version", Align::Left),
                ("Size", Align::Right),
            ])
            .indent("  ");
            for entry in &info.debug_directory {
                table.row(vec![
                    format!("{} ({})", debug_type_name(entry.debug_type), entry.debug_type),
                    entry.time_date_stamp.clone(),
                    entry.version.clone(),
                    entry.size.to_string(),
                ]);
            }
            table.print();
        }
    })
}
