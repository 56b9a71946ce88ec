use std::path::Path;

use dotpdb::{
    pdb::{
        document::LANGUAGE_CSHARP,
        reader::{PdbMethod, PortablePdb},
    },
    prelude::SequencePoint,
};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_pdb},
    output::{format_size, print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct TableEntry {
    table: String,
    rows: u32,
}

#[derive(Debug, Serialize)]
struct DocumentEntry {
    row: u32,
    name: String,
    language: String,
    hash: String,
    source_size: Option<usize>,
    methods: usize,
}

#[derive(Debug, Serialize)]
struct MethodEntry {
    method: String,
    document: u32,
    points: Vec<SequencePoint>,
}

#[derive(Debug, Serialize)]
struct DumpOutput {
    file: String,
    id: String,
    entry_point: String,
    tables: Vec<TableEntry>,
    documents: Vec<DocumentEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    methods: Vec<MethodEntry>,
}

/// The document a method's points start in
fn method_document(method: &PdbMethod) -> u32 {
    if method.document != 0 {
        return method.document;
    }
    method
        .sequence_points
        .as_ref()
        .and_then(|points| points.initial_document)
        .unwrap_or(0)
}

fn format_hash(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn format_point(point: &SequencePoint) -> String {
    if point.is_hidden {
        format!("IL_{:04X}  hidden", point.il_offset)
    } else {
        format!(
            "IL_{:04X}  ({},{})-({},{})",
            point.il_offset, point.start_line, point.start_column, point.end_line, point.end_column
        )
    }
}

fn summarize(path: &Path, pdb: &PortablePdb, with_points: bool) -> DumpOutput {
    let tables = pdb
        .tables
        .iter()
        .map(|summary| TableEntry {
            table: format!("{:?}", summary.table_id),
            rows: summary.row_count,
        })
        .collect();

    let documents = pdb
        .documents
        .iter()
        .map(|document| DocumentEntry {
            row: document.row,
            name: document.name.clone(),
            language: if document.language == LANGUAGE_CSHARP {
                "C#".to_string()
            } else {
                document.language.to_string()
            },
            hash: format_hash(&document.hash),
            source_size: document.source.as_ref().map(String::len),
            methods: pdb
                .methods
                .iter()
                .filter(|method| method_document(method) == document.row)
                .count(),
        })
        .collect();

    let methods = if with_points {
        pdb.methods
            .iter()
            .filter_map(|method| {
                method.sequence_points.as_ref().map(|points| MethodEntry {
                    method: method.method.to_string(),
                    document: method_document(method),
                    points: points.points.clone(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    DumpOutput {
        file: file_display_name(path),
        id: pdb.id.to_string(),
        entry_point: pdb.entry_point.to_string(),
        tables,
        documents,
        methods,
    }
}

pub fn run(path: &Path, points: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let pdb = load_pdb(path)?;
    let output = summarize(path, &pdb, points);

    print_output(&output, opts, |out| {
        println!("File:            {}", out.file);
        println!("PDB id:          {}", out.id);
        println!("Entry point:     {}", out.entry_point);
        println!();

        println!("Tables:");
        let mut tables = TabWriter::new(&[("Table", Align::Left), ("Rows", Align::Right)])
            .indent("  ");
        for table in &out.tables {
            tables.row(vec![table.table.clone(), table.rows.to_string()]);
        }
        tables.print();

        if !out.documents.is_empty() {
            println!();
            println!("Documents:");
            let mut documents = TabWriter::new(&[
                ("Row", Align::Right),
                ("Language", Align::Left),
                ("Methods", Align::Right),
                ("Source", Align::Right),
                ("Name", Align::Left),
            ])
            .indent("  ");
            for document in &out.documents {
                documents.row(vec![
                    document.row.to_string(),
                    document.language.clone(),
                    document.methods.to_string(),
                    document
                        .source_size
                        .map_or_else(|| "-".to_string(), format_size),
                    document.name.clone(),
                ]);
            }
            documents.print();
        }

        for method in &out.methods {
            println!();
            println!("{} (document {}):", method.method, method.document);
            for point in &method.points {
                println!("  {}", format_point(point));
            }
        }
    })
}
