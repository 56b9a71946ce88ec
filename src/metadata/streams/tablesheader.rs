//! Tables stream (`#~`) header and table directory.
//!
//! The header is followed by one row count per present table and then by the tables themselves,
//! back to back in table id order. Locating any one table requires the byte size of every table
//! before it, which [`crate::metadata::tables::row_size`] provides.
//!
//! A Portable PDB's `#~` only stores its own debug tables. Its rows still index into the
//! type-system tables of the assembly it describes, so [`TablesHeader::from_pdb`] takes those
//! row counts from the `#Pdb` stream to size the columns.
//!
//! # Reference
//! - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::sync::Arc;

use crate::{
    file::io::{read_le, read_le_at},
    metadata::tables::{
        row_size, MetadataTable, RowReadable, TableId, TableInfo, TableInfoRef, TABLE_SLOTS,
    },
    Error::OutOfBounds,
    Result,
};

/// `HeapSizes` flag: four bytes of extra data follow the row counts
const HEAP_EXTRA_DATA: u8 = 0x40;

/// The header of the `#~` stream, with the location of every present table
///
/// # Examples
///
/// ```rust,no_run
/// use dotpdb::metadata::{streams::TablesHeader, tables::{MethodDefRaw, TableId}};
///
/// # fn example(tables: &TablesHeader) -> dotpdb::Result<()> {
/// if let Some(methods) = tables.table::<MethodDefRaw>(TableId::MethodDef) {
///     for method in &methods {
///         println!("{} at RVA {:#x}", method.token, method.rva);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct TablesHeader<'a> {
    /// Major version of the table schema, 2
    pub major_version: u8,
    /// Minor version of the table schema, 0
    pub minor_version: u8,
    /// `HeapSizes` flags
    pub heap_sizes: u8,
    /// Bit vector of present tables
    pub valid: u64,
    /// Bit vector of sorted tables
    pub sorted: u64,
    /// Index sizes derived from the row counts
    pub info: TableInfoRef,
    data: &'a [u8],
    locations: Vec<Option<TableLocation>>,
}

#[derive(Clone, Copy, Debug)]
struct TableLocation {
    offset: usize,
    rows: u32,
}

/// Row count of one present table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// The table
    pub table_id: TableId,
    /// Number of rows
    pub row_count: u32,
}

impl<'a> TablesHeader<'a> {
    /// Parse the `#~` stream of an assembly
    ///
    /// ## Arguments
    /// * 'data' - The whole `#~` stream
    ///
    /// # Errors
    /// Returns an error if the stream is truncated, empty, or names an unknown table.
    pub fn from(data: &'a [u8]) -> Result<TablesHeader<'a>> {
        Self::parse(data, None)
    }

    /// Parse the `#~` stream of a Portable PDB
    ///
    /// ## Arguments
    /// * 'data'             - The whole `#~` stream
    /// * 'type_system_rows' - Row counts of the assembly tables, from the `#Pdb` stream
    ///
    /// # Errors
    /// Returns an error if the stream is truncated or stores anything but debug tables.
    pub fn from_pdb(
        data: &'a [u8],
        type_system_rows: &[u32; TABLE_SLOTS],
    ) -> Result<TablesHeader<'a>> {
        Self::parse(data, Some(type_system_rows))
    }

    fn parse(
        data: &'a [u8],
        type_system_rows: Option<&[u32; TABLE_SLOTS]>,
    ) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(OutOfBounds);
        }

        let major_version = read_le::<u8>(&data[4..])?;
        let minor_version = read_le::<u8>(&data[5..])?;
        let heap_sizes = read_le::<u8>(&data[6..])?;
        let valid = read_le::<u64>(&data[8..])?;
        let sorted = read_le::<u64>(&data[16..])?;

        if valid == 0 && type_system_rows.is_none() {
            return Err(malformed_error!("No valid rows in any of the tables"));
        }

        let mut offset = 24;
        let mut row_counts = [0u32; TABLE_SLOTS];
        let mut present = Vec::new();
        for slot in 0..TABLE_SLOTS {
            if valid & (1u64 << slot) == 0 {
                continue;
            }

            #[allow(clippy::cast_possible_truncation)]
            let Some(table_id) = TableId::from_u8(slot as u8) else {
                return Err(malformed_error!("Unknown table present - 0x{:02x}", slot));
            };
            if type_system_rows.is_some() && !table_id.is_debug_table() {
                return Err(malformed_error!(
                    "Portable PDB stores type-system table {:?}",
                    table_id
                ));
            }

            row_counts[slot] = read_le_at::<u32>(data, &mut offset)?;
            present.push(table_id);
        }

        if heap_sizes & HEAP_EXTRA_DATA != 0 {
            offset += 4;
        }

        if let Some(external) = type_system_rows {
            for slot in 0..(TableId::Document as usize) {
                row_counts[slot] = external[slot];
            }
        }

        let info = Arc::new(TableInfo::from_row_counts(&row_counts, heap_sizes));

        let mut locations = vec![None; TABLE_SLOTS];
        for table_id in present {
            let rows = row_counts[table_id as usize];
            let size = u64::from(rows) * u64::from(row_size(table_id, &info));
            let Ok(size) = usize::try_from(size) else {
                return Err(OutOfBounds);
            };
            let Some(end) = offset.checked_add(size) else {
                return Err(OutOfBounds);
            };
            if end > data.len() {
                return Err(OutOfBounds);
            }

            locations[table_id as usize] = Some(TableLocation { offset, rows });
            offset = end;
        }

        Ok(TablesHeader {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            info,
            data,
            locations,
        })
    }

    /// Number of tables present in this stream
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Typed view of a table, `None` if the table is absent
    ///
    /// The row type must match `table_id`; nothing checks this.
    #[must_use]
    pub fn table<T: RowReadable>(&self, table_id: TableId) -> Option<MetadataTable<'a, T>> {
        let location = self.locations.get(table_id as usize).copied().flatten()?;
        MetadataTable::new(
            &self.data[location.offset..],
            location.rows,
            self.info.clone(),
        )
        .ok()
    }

    /// True if the table is stored in this stream
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.valid & table_id.mask() != 0
    }

    /// Row count of a table stored in this stream, 0 if absent
    #[must_use]
    pub fn table_row_count(&self, table_id: TableId) -> u32 {
        self.locations
            .get(table_id as usize)
            .copied()
            .flatten()
            .map_or(0, |location| location.rows)
    }

    /// Tables stored in this stream, in id order
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        (0..TABLE_SLOTS).filter_map(|slot| {
            self.locations[slot]?;
            #[allow(clippy::cast_possible_truncation)]
            TableId::from_u8(slot as u8)
        })
    }

    /// Row counts of every stored table
    #[must_use]
    pub fn table_summary(&self) -> Vec<TableSummary> {
        self.present_tables()
            .map(|table_id| TableSummary {
                table_id,
                row_count: self.table_row_count(table_id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{DocumentRaw, MethodDefRaw, TypeDefRaw};

    fn header(valid: u64, heap_sizes: u8, rows: &[u32]) -> Vec<u8> {
        let mut data = vec![0, 0, 0, 0, 2, 0, heap_sizes, 1];
        data.extend_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        for count in rows {
            data.extend_from_slice(&count.to_le_bytes());
        }
        data
    }

    #[test]
    fn assembly_tables() {
        let valid = TableId::TypeDef.mask() | TableId::MethodDef.mask();
        let mut data = header(valid, 0, &[2, 1]);

        // TypeDef: flags, name, namespace, extends, field_list, method_list
        data.extend_from_slice(&[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 1, 0]);
        data.extend_from_slice(&[1, 0, 0, 0, 9, 0, 5, 0, 5, 0, 1, 0, 1, 0]);
        // MethodDef: rva, impl_flags, flags, name, signature, param_list
        data.extend_from_slice(&[0x50, 0x20, 0, 0, 0, 0, 0x86, 0, 0x11, 0, 0x01, 0, 1, 0]);

        let tables = TablesHeader::from(&data).unwrap();
        assert_eq!(tables.major_version, 2);
        assert_eq!(tables.table_count(), 2);
        assert_eq!(tables.table_row_count(TableId::TypeDef), 2);
        assert_eq!(tables.table_row_count(TableId::Field), 0);
        assert!(!tables.has_table(TableId::Field));

        let types = tables.table::<TypeDefRaw>(TableId::TypeDef).unwrap();
        let second = types.get(2).unwrap();
        assert_eq!(second.type_name, 9);
        assert_eq!(second.type_namespace, 5);

        let methods = tables.table::<MethodDefRaw>(TableId::MethodDef).unwrap();
        assert_eq!(methods.iter().count(), 1);
        assert_eq!(methods.get(1).unwrap().rva, 0x2050);

        assert_eq!(
            tables.table_summary(),
            vec![
                TableSummary { table_id: TableId::TypeDef, row_count: 2 },
                TableSummary { table_id: TableId::MethodDef, row_count: 1 },
            ]
        );
    }

    #[test]
    fn truncated() {
        let valid = TableId::TypeDef.mask();
        let mut data = header(valid, 0, &[2]);
        data.extend_from_slice(&[0; 14]);
        assert!(matches!(TablesHeader::from(&data), Err(OutOfBounds)));

        let data = header(0, 0, &[]);
        assert!(TablesHeader::from(&data).is_err());
    }

    #[test]
    fn pdb_tables_use_external_row_counts() {
        let valid = TableId::Document.mask();
        let mut data = header(valid, 0, &[1]);
        // Document: name, hash_algorithm, hash, language
        data.extend_from_slice(&[1, 0, 1, 0, 0, 0, 2, 0]);

        let mut external = [0u32; TABLE_SLOTS];
        external[TableId::MethodDef as usize] = 0x10000;

        let tables = TablesHeader::from_pdb(&data, &external).unwrap();
        assert!(tables.info.is_large(TableId::MethodDef));

        let documents = tables.table::<DocumentRaw>(TableId::Document).unwrap();
        let document = documents.get(1).unwrap();
        assert_eq!(document.name, 1);
        assert_eq!(document.language, 2);

        let valid = TableId::TypeDef.mask();
        let data = header(valid, 0, &[0]);
        assert!(TablesHeader::from_pdb(&data, &external).is_err());
    }
}
