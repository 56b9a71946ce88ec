//! Lays out the finished tables as a Portable PDB container.
//!
//! The container is a metadata root followed by six streams in fixed order: `#Pdb`, `#~`,
//! `#Strings`, `#US`, `#GUID` and `#Blob`. Index widths of every column follow from the row
//! counts, where the tables below `0x30` count the rows of the assembly the PDB belongs to.

use std::sync::Arc;

use crate::{
    metadata::{
        root::{Root, PDB_VERSION_STRING},
        tables::{
            write_rows, TableId, TableInfo, HEAP_LARGE_BLOB, HEAP_LARGE_GUID, HEAP_LARGE_STRINGS,
            TABLE_SLOTS,
        },
        token::Token,
    },
    pdb::{builder::PdbTables, contentid::ContentId},
    utils::pad_to_4,
    Result,
};

/// Name of the stream carrying the PDB id and the type-system row counts
pub const PDB_STREAM: &str = "#Pdb";

/// Tables whose rows are written in key order
pub const SORTED_TABLES: u64 = (1 << TableId::LocalScope as u8)
    | (1 << TableId::StateMachineMethod as u8)
    | (1 << TableId::CustomDebugInformation as u8);

const DEBUG_TABLES: [TableId; 8] = [
    TableId::Document,
    TableId::MethodDebugInformation,
    TableId::LocalScope,
    TableId::LocalVariable,
    TableId::LocalConstant,
    TableId::ImportScope,
    TableId::StateMachineMethod,
    TableId::CustomDebugInformation,
];

/// Serialize a Portable PDB
///
/// ## Arguments
/// * 'tables'           - Output of [`crate::pdb::PdbBuilder::finish`]
/// * 'id'               - The `PdbId`, zero while minting
/// * 'entry_point'      - `MethodDef` token of the entry point, or the nil token
/// * 'type_system_rows' - Row counts of the assembly, by table id
///
/// # Errors
/// Returns an error if a row does not fit its column or the container outgrows 32-bit offsets.
pub fn serialize(
    tables: &PdbTables,
    id: ContentId,
    entry_point: Token,
    type_system_rows: &[u32; TABLE_SLOTS],
) -> Result<Vec<u8>> {
    let mut row_counts = [0u32; TABLE_SLOTS];
    let mut referenced = 0u64;
    for slot in 0..(TableId::Document as usize) {
        row_counts[slot] = type_system_rows[slot];
        if type_system_rows[slot] != 0 {
            referenced |= 1u64 << slot;
        }
    }
    for table in DEBUG_TABLES {
        row_counts[table as usize] = tables.row_count(table);
    }

    let pdb_stream = write_pdb_stream(id, entry_point, referenced, &row_counts);
    let tables_stream = write_tables_stream(tables, &row_counts)?;
    let user_strings = [0u8; 4];

    Root::write_with_streams(
        PDB_VERSION_STRING,
        &[
            (PDB_STREAM, &pdb_stream),
            ("#~", &tables_stream),
            ("#Strings", &tables.strings),
            ("#US", &user_strings),
            ("#GUID", &tables.guids),
            ("#Blob", &tables.blobs),
        ],
    )
}

fn write_pdb_stream(
    id: ContentId,
    entry_point: Token,
    referenced: u64,
    row_counts: &[u32; TABLE_SLOTS],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + 4 * referenced.count_ones() as usize);
    out.extend_from_slice(&id.to_bytes());
    out.extend_from_slice(&entry_point.value().to_le_bytes());
    out.extend_from_slice(&referenced.to_le_bytes());
    for (slot, rows) in row_counts.iter().enumerate() {
        if referenced & (1u64 << slot) != 0 {
            out.extend_from_slice(&rows.to_le_bytes());
        }
    }
    out
}

fn heap_sizes(tables: &PdbTables) -> u8 {
    let mut flags = 0;
    if tables.strings.len() > 0xFFFF {
        flags |= HEAP_LARGE_STRINGS;
    }
    if tables.guids.len() > 0xFFFF {
        flags |= HEAP_LARGE_GUID;
    }
    if tables.blobs.len() > 0xFFFF {
        flags |= HEAP_LARGE_BLOB;
    }
    flags
}

fn write_tables_stream(tables: &PdbTables, row_counts: &[u32; TABLE_SLOTS]) -> Result<Vec<u8>> {
    let heap_sizes = heap_sizes(tables);
    let info = Arc::new(TableInfo::from_row_counts(row_counts, heap_sizes));

    let mut valid = 0u64;
    for table in DEBUG_TABLES {
        if row_counts[table as usize] != 0 {
            valid |= table.mask();
        }
    }

    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_le_bytes());
    out.push(2);
    out.push(0);
    out.push(heap_sizes);
    out.push(1);
    out.extend_from_slice(&valid.to_le_bytes());
    out.extend_from_slice(&SORTED_TABLES.to_le_bytes());
    for table in DEBUG_TABLES {
        if valid & table.mask() != 0 {
            out.extend_from_slice(&row_counts[table as usize].to_le_bytes());
        }
    }

    write_rows(&tables.documents, &info, &mut out)?;
    write_rows(&tables.method_debug_information, &info, &mut out)?;
    write_rows(&tables.local_scopes, &info, &mut out)?;
    write_rows(&tables.local_variables, &info, &mut out)?;
    write_rows(&tables.local_constants, &info, &mut out)?;
    write_rows(&tables.import_scopes, &info, &mut out)?;
    write_rows(&tables.state_machine_methods, &info, &mut out)?;
    write_rows(&tables.custom_debug_information, &info, &mut out)?;
    pad_to_4(&mut out);

    Ok(out)
}

/// Overwrite the `PdbId` of a serialized container
///
/// # Errors
/// Returns an error if `data` is not a metadata root with a `#Pdb` stream.
pub fn patch_content_id(data: &mut [u8], id: ContentId) -> Result<()> {
    let root = Root::read(data)?;
    let Some(stream) = root.stream(PDB_STREAM) else {
        return Err(malformed_error!("Container has no {} stream", PDB_STREAM));
    };

    let start = stream.offset as usize;
    let Some(target) = data.get_mut(start..start + id.to_bytes().len()) else {
        return Err(crate::Error::OutOfBounds);
    };
    target.copy_from_slice(&id.to_bytes());
    Ok(())
}
