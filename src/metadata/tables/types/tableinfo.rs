use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::tables::types::{CodedIndexType, TableId};

/// Number of table slots addressable by the 64-bit `Valid` mask
pub const TABLE_SLOTS: usize = 64;

/// `HeapSizes` flag: `#Strings` indices are 4 bytes wide
pub const HEAP_LARGE_STRINGS: u8 = 0x01;
/// `HeapSizes` flag: `#GUID` indices are 4 bytes wide
pub const HEAP_LARGE_GUID: u8 = 0x02;
/// `HeapSizes` flag: `#Blob` indices are 4 bytes wide
pub const HEAP_LARGE_BLOB: u8 = 0x04;

/// Row count of one table, with the index width it implies
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows
    pub rows: u32,
    /// Bits needed to store the largest row index
    pub bits: u8,
    /// Whether simple indices into this table are 4 bytes wide
    pub is_large: bool,
}

impl TableRowInfo {
    /// Create a new `TableRowInfo` for `rows` rows
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// Sizes of every table and heap index, which together decide each row's byte layout.
///
/// For a Portable PDB the row counts below `0x30` are the counts of the *assembly* the PDB
/// describes (from the `#Pdb` stream), and the rest are the counts of the PDB's own tables.
#[derive(Clone, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// Shared reference to a [`TableInfo`]
pub type TableInfoRef = Arc<TableInfo>;

impl Default for TableInfo {
    fn default() -> Self {
        TableInfo::from_row_counts(&[0; TABLE_SLOTS], 0)
    }
}

impl TableInfo {
    /// Build from per-table row counts and the `HeapSizes` flags
    ///
    /// ## Arguments
    /// * 'row_counts' - Row count per table id
    /// * 'heap_sizes' - Combination of the `HEAP_LARGE_*` flags
    #[must_use]
    pub fn from_row_counts(row_counts: &[u32; TABLE_SLOTS], heap_sizes: u8) -> Self {
        let mut table_info = TableInfo {
            rows: row_counts.iter().map(|rows| TableRowInfo::new(*rows)).collect(),
            coded_indexes: vec![0; CodedIndexType::COUNT],
            is_large_index_str: heap_sizes & HEAP_LARGE_STRINGS != 0,
            is_large_index_guid: heap_sizes & HEAP_LARGE_GUID != 0,
            is_large_index_blob: heap_sizes & HEAP_LARGE_BLOB != 0,
        };

        table_info.calculate_coded_index_bits();
        table_info
    }

    /// Build a `TableInfo` for crafted unit-test rows
    #[cfg(test)]
    pub fn new_test(
        valid_tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut row_counts = [0u32; TABLE_SLOTS];
        for (table, rows) in valid_tables {
            row_counts[*table as usize] = *rows;
        }

        let mut heap_sizes = 0;
        if large_str {
            heap_sizes |= HEAP_LARGE_STRINGS;
        }
        if large_guid {
            heap_sizes |= HEAP_LARGE_GUID;
        }
        if large_blob {
            heap_sizes |= HEAP_LARGE_BLOB;
        }

        TableInfo::from_row_counts(&row_counts, heap_sizes)
    }

    /// The `HeapSizes` byte describing this layout
    #[must_use]
    pub fn heap_sizes(&self) -> u8 {
        let mut flags = 0;
        if self.is_large_index_str {
            flags |= HEAP_LARGE_STRINGS;
        }
        if self.is_large_index_guid {
            flags |= HEAP_LARGE_GUID;
        }
        if self.is_large_index_blob {
            flags |= HEAP_LARGE_BLOB;
        }
        flags
    }

    /// Row info of a table
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table as usize]
    }

    /// Row count of a table
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize].rows
    }

    /// Whether simple indices into `id` are 4 bytes wide
    #[must_use]
    pub fn is_large(&self, id: TableId) -> bool {
        self.rows[id as usize].is_large
    }

    /// Whether `#Strings` indices are 4 bytes wide
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// Whether `#GUID` indices are 4 bytes wide
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// Whether `#Blob` indices are 4 bytes wide
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Width of a `#Strings` index
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    /// Width of a `#GUID` index
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    /// Width of a `#Blob` index
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    /// Width of a simple index into `table_id`
    #[must_use]
    pub fn table_index_bytes(&self, table_id: TableId) -> u8 {
        if self.rows[table_id as usize].bits > 16 {
            4
        } else {
            2
        }
    }

    /// Bits a coded index of this kind needs, tag included
    #[must_use]
    pub fn coded_index_bits(&self, coded_index_type: CodedIndexType) -> u8 {
        self.coded_indexes[coded_index_type as usize]
    }

    /// Width of a coded index of this kind
    #[must_use]
    pub fn coded_index_bytes(&self, coded_index_type: CodedIndexType) -> u8 {
        if self.coded_indexes[coded_index_type as usize] > 16 {
            4
        } else {
            2
        }
    }

    fn calculate_coded_index_bits(&mut self) {
        for coded_index in CodedIndexType::iter() {
            let max_bits = coded_index
                .tables()
                .iter()
                .map(|table| self.rows[*table as usize].bits)
                .max()
                .unwrap_or(1);

            self.coded_indexes[coded_index as usize] = max_bits + coded_index.tag_bits();
        }
    }
}
