//! Sequence points and their Portable PDB blob encoding.
//!
//! A sequence point maps an IL offset of a method to a span of source text. Portable PDBs store
//! the points of one method as a single delta-compressed blob referenced from its
//! `MethodDebugInformation` row.
//!
//! # Blob Format
//!
//! ```text
//! header:   LocalSignature (compressed uint), [InitialDocument (compressed uint)]
//! records:  δILOffset  ΔLines  ΔColumns  δStartLine  δStartColumn
//! ```
//!
//! - `δILOffset` is absolute for the first record and the distance to the previous record
//!   otherwise. A zero distance after the first record introduces a document record instead,
//!   switching the document of all following points.
//! - `ΔLines` is `end_line - start_line` (unsigned). `ΔColumns` is `end_column - start_column`,
//!   unsigned when `ΔLines` is zero and signed otherwise.
//! - `ΔLines == 0 && ΔColumns == 0` marks a hidden point, which stops the record there.
//! - `δStartLine` / `δStartColumn` are absolute unsigned values for the first visible point and
//!   signed distances to the previous visible point afterwards.
//!
//! The `InitialDocument` header field is present only when the method spans several documents
//! and its `MethodDebugInformation` row has no document.
//!
//! # Examples
//!
//! ```rust
//! use dotpdb::metadata::sequencepoints::{encode_sequence_points, parse_sequence_points, SequencePoint};
//!
//! let points = vec![
//!     SequencePoint::new(0, 1, 1, 1, 20),
//!     SequencePoint::hidden(10),
//! ];
//! let blob = encode_sequence_points(0, &points)?.unwrap();
//! assert_eq!(blob, [0, 0, 0, 19, 1, 1, 10, 0, 0]);
//!
//! let decoded = parse_sequence_points(&blob)?;
//! assert_eq!(decoded.points, points);
//! # Ok::<(), dotpdb::Error>(())
//! ```
//!
//! # References
//!
//! - [Portable PDB Format - Sequence Points Blob](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md#sequence-points-blob)
//! - ECMA-335 II.23.2 - compressed integers

use serde::{Deserialize, Serialize};

use crate::{
    file::parser::Parser,
    utils::{write_compressed_int, write_compressed_uint},
    Result,
};

/// One mapping from an IL offset to a source span.
///
/// Lines and columns are 1-based. Hidden points carry no position and are stored with all
/// positions zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePoint {
    /// Offset in the method's IL stream
    pub il_offset: u32,
    /// Marks compiler generated code the debugger should step over
    #[serde(default)]
    pub is_hidden: bool,
    /// First line of the span
    #[serde(default)]
    pub start_line: u32,
    /// First column of the span
    #[serde(default)]
    pub start_column: u16,
    /// Last line of the span
    #[serde(default)]
    pub end_line: u32,
    /// Column just past the span
    #[serde(default)]
    pub end_column: u16,
    /// Document row switched to by a preceding document record, 0 for the method's document
    #[serde(default, skip_serializing_if = "is_zero")]
    pub document: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl SequencePoint {
    /// A visible point
    #[must_use]
    pub fn new(
        il_offset: u32,
        start_line: u32,
        start_column: u16,
        end_line: u32,
        end_column: u16,
    ) -> Self {
        SequencePoint {
            il_offset,
            is_hidden: false,
            start_line,
            start_column,
            end_line,
            end_column,
            document: 0,
        }
    }

    /// A hidden point
    #[must_use]
    pub fn hidden(il_offset: u32) -> Self {
        SequencePoint {
            il_offset,
            is_hidden: true,
            start_line: 0,
            start_column: 0,
            end_line: 0,
            end_column: 0,
            document: 0,
        }
    }
}

/// A decoded sequence-point blob
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SequencePoints {
    /// `StandAloneSig` row of the method's locals, 0 for none
    pub local_signature: u32,
    /// Document of the first point when the blob carries one in its header
    pub initial_document: Option<u32>,
    /// Points in IL offset order
    pub points: Vec<SequencePoint>,
}

impl SequencePoints {
    /// Returns the point at exactly `il_offset`, if any
    #[must_use]
    pub fn find_by_il_offset(&self, il_offset: u32) -> Option<&SequencePoint> {
        self.points.iter().find(|sp| sp.il_offset == il_offset)
    }

    /// Number of points that are not hidden
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.points.iter().filter(|sp| !sp.is_hidden).count()
    }
}

/// Encode the sequence points of one method.
///
/// Returns `Ok(None)` for an empty list: such methods get no blob (blob index 0).
///
/// ## Arguments
/// * 'local_signature_row' - `StandAloneSig` row of the method's locals, 0 for none
/// * 'points'              - Points in ascending IL offset order
///
/// # Errors
/// Returns a malformed error if offsets go backwards, a span ends before it starts, a visible
/// span is empty (it would read back as hidden), or a value exceeds the compressed range.
pub fn encode_sequence_points(
    local_signature_row: u32,
    points: &[SequencePoint],
) -> Result<Option<Vec<u8>>> {
    if points.is_empty() {
        return Ok(None);
    }

    let mut writer = Vec::with_capacity(points.len() * 5 + 1);
    write_compressed_uint(local_signature_row, &mut writer)?;

    let mut previous_offset = None;
    let mut previous_start: Option<(u32, u16)> = None;

    for point in points {
        match previous_offset {
            None => write_compressed_uint(point.il_offset, &mut writer)?,
            Some(previous) if point.il_offset > previous => {
                write_compressed_uint(point.il_offset - previous, &mut writer)?;
            }
            Some(previous) => {
                return Err(malformed_error!(
                    "Sequence point offsets not ascending - 0x{:x} after 0x{:x}",
                    point.il_offset,
                    previous
                ));
            }
        }
        previous_offset = Some(point.il_offset);

        if point.is_hidden {
            writer.extend_from_slice(&[0, 0]);
            continue;
        }

        let Some(line_delta) = point.end_line.checked_sub(point.start_line) else {
            return Err(malformed_error!(
                "Sequence point at 0x{:x} ends on line {} before its start line {}",
                point.il_offset,
                point.end_line,
                point.start_line
            ));
        };
        let column_delta = i32::from(point.end_column) - i32::from(point.start_column);

        write_compressed_uint(line_delta, &mut writer)?;
        if line_delta == 0 {
            if column_delta <= 0 {
                return Err(malformed_error!(
                    "Sequence point at 0x{:x} has an empty or reversed span on line {}",
                    point.il_offset,
                    point.start_line
                ));
            }
            write_compressed_uint(column_delta.unsigned_abs(), &mut writer)?;
        } else {
            write_compressed_int(column_delta, &mut writer)?;
        }

        match previous_start {
            None => {
                write_compressed_uint(point.start_line, &mut writer)?;
                write_compressed_uint(u32::from(point.start_column), &mut writer)?;
            }
            Some((line, column)) => {
                write_compressed_int(signed_delta(point.start_line, line)?, &mut writer)?;
                write_compressed_int(
                    i32::from(point.start_column) - i32::from(column),
                    &mut writer,
                )?;
            }
        }
        previous_start = Some((point.start_line, point.start_column));
    }

    Ok(Some(writer))
}

fn signed_delta(current: u32, previous: u32) -> Result<i32> {
    let delta = i64::from(current) - i64::from(previous);
    i32::try_from(delta).map_err(|_| malformed_error!("Line delta out of range - {}", delta))
}

/// Decode a sequence-point blob whose method row names its document.
///
/// # Errors
/// Returns an error if the blob is truncated or a compressed value is invalid.
pub fn parse_sequence_points(blob: &[u8]) -> Result<SequencePoints> {
    parse_sequence_points_with(blob, false)
}

/// Decode a sequence-point blob.
///
/// ## Arguments
/// * 'blob'                 - The blob
/// * 'has_initial_document' - True when the method row has no document, so the header carries it
///
/// # Errors
/// Returns an error if the blob is truncated, a compressed value is invalid, or a decoded
/// position leaves the representable range.
pub fn parse_sequence_points_with(
    blob: &[u8],
    has_initial_document: bool,
) -> Result<SequencePoints> {
    let mut parser = Parser::new(blob);
    let mut result = SequencePoints::default();
    if !parser.has_more_data() {
        return Ok(result);
    }

    result.local_signature = parser.read_compressed_uint()?;
    if has_initial_document {
        result.initial_document = Some(parser.read_compressed_uint()?);
    }

    let mut il_offset = 0u32;
    let mut document = 0u32;
    let mut previous_start: Option<(i64, i64)> = None;

    while parser.has_more_data() {
        let offset_delta = parser.read_compressed_uint()?;
        if offset_delta == 0 && !result.points.is_empty() {
            document = parser.read_compressed_uint()?;
            continue;
        }
        il_offset = match il_offset.checked_add(offset_delta) {
            Some(offset) => offset,
            None => return Err(malformed_error!("IL offset overflow in sequence points")),
        };

        let line_delta = parser.read_compressed_uint()?;
        let column_delta = if line_delta == 0 {
            i64::from(parser.read_compressed_uint()?)
        } else {
            i64::from(parser.read_compressed_int()?)
        };

        if line_delta == 0 && column_delta == 0 {
            let mut point = SequencePoint::hidden(il_offset);
            point.document = document;
            result.points.push(point);
            continue;
        }

        let (start_line, start_column) = match previous_start {
            None => (
                i64::from(parser.read_compressed_uint()?),
                i64::from(parser.read_compressed_uint()?),
            ),
            Some((line, column)) => (
                line + i64::from(parser.read_compressed_int()?),
                column + i64::from(parser.read_compressed_int()?),
            ),
        };
        previous_start = Some((start_line, start_column));

        let end_line = start_line + i64::from(line_delta);
        let end_column = start_column + column_delta;

        let (Ok(start_line), Ok(end_line), Ok(start_column), Ok(end_column)) = (
            u32::try_from(start_line),
            u32::try_from(end_line),
            u16::try_from(start_column),
            u16::try_from(end_column),
        ) else {
            return Err(malformed_error!(
                "Sequence point at 0x{:x} decodes outside the valid range",
                il_offset
            ));
        };

        let mut point = SequencePoint::new(il_offset, start_line, start_column, end_line, end_column);
        point.document = document;
        result.points.push(point);
    }

    Ok(result)
}
