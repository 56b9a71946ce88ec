//! Shared table infrastructure: ids, coded indices, index sizing, column layouts and the row
//! read/write traits every table implements.

mod codedindex;
mod schema;
mod tableid;
mod tableinfo;

use std::marker::PhantomData;

use crate::Result;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use schema::{columns, row_size, Column};
pub use tableid::TableId;
pub use tableinfo::{
    TableInfo, TableInfoRef, TableRowInfo, HEAP_LARGE_BLOB, HEAP_LARGE_GUID, HEAP_LARGE_STRINGS,
    TABLE_SLOTS,
};

/// Trait defining how a row is decoded from table bytes
pub trait RowReadable: Sized {
    /// Byte size of one row under the given sizes
    fn row_size(sizes: &TableInfoRef) -> u32;

    /// Read one row
    ///
    /// ## Arguments
    /// * 'data'   - The table data
    /// * 'offset' - Start of the row, advanced past it
    /// * 'rid'    - The 1-based row id
    /// * 'sizes'  - Index widths
    ///
    /// # Errors
    /// Returns an error if the data is too short or a column is invalid.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// Trait defining how a row is encoded into table bytes
pub trait RowWritable: RowReadable {
    /// Write one row
    ///
    /// # Errors
    /// Returns an error if the buffer is too short or a value does not fit its column.
    fn row_write(&self, data: &mut [u8], offset: &mut usize, sizes: &TableInfoRef) -> Result<()>;
}

/// Encode a whole table into `out`
///
/// # Errors
/// Returns an error if any row fails to encode.
pub fn write_rows<T: RowWritable>(rows: &[T], sizes: &TableInfoRef, out: &mut Vec<u8>) -> Result<()> {
    let row_size = T::row_size(sizes) as usize;
    let start = out.len();
    out.resize(start + row_size * rows.len(), 0);

    let mut offset = start;
    for row in rows {
        row.row_write(out, &mut offset, sizes)?;
    }

    Ok(())
}

/// Typed, lazily decoded view over the rows of one table
pub struct MetadataTable<'a, T> {
    data: &'a [u8],
    row_count: u32,
    row_size: u32,
    sizes: TableInfoRef,
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// Create a new table view
    ///
    /// ## Arguments
    /// * 'data'      - Bytes starting at the first row
    /// * 'row_count' - Number of rows
    /// * 'sizes'     - Index widths
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than the table.
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Result<Self> {
        let row_size = T::row_size(&sizes);
        let size = u64::from(row_count) * u64::from(row_size);
        if size > data.len() as u64 {
            return Err(crate::Error::OutOfBounds);
        }

        Ok(MetadataTable {
            data,
            row_count,
            row_size,
            sizes,
            _phantom: PhantomData,
        })
    }

    /// Total size of the table in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.row_count) * u64::from(self.row_size)
    }

    /// Size of one row
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Get the row with the 1-based id `index`
    #[must_use]
    pub fn get(&self, index: u32) -> Option<T> {
        if index == 0 || self.row_count < index {
            return None;
        }

        T::row_read(
            self.data,
            &mut ((index as usize - 1) * self.row_size as usize),
            index,
            &self.sizes,
        )
        .ok()
    }

    /// Iterate all rows in order
    #[must_use]
    pub fn iter(&'a self) -> TableIterator<'a, T> {
        TableIterator {
            table: self,
            current_row: 0,
            current_offset: 0,
        }
    }
}

impl<'a, T: RowReadable> IntoIterator for &'a MetadataTable<'a, T> {
    type Item = T;
    type IntoIter = TableIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the rows of a [`MetadataTable`]
pub struct TableIterator<'a, T> {
    table: &'a MetadataTable<'a, T>,
    current_row: u32,
    current_offset: usize,
}

impl<T: RowReadable> Iterator for TableIterator<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table.row_count {
            return None;
        }

        match T::row_read(
            self.table.data,
            &mut self.current_offset,
            self.current_row + 1,
            &self.table.sizes,
        ) {
            Ok(row) => {
                self.current_row += 1;
                Some(row)
            }
            Err(_) => None,
        }
    }
}
