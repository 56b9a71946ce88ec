//! Metadata tokens.
//!
//! A token is a 32-bit value identifying one row in one metadata table: the high byte holds the
//! table id, the low 24 bits hold the 1-based row index. Both the assembly (MethodDef, TypeDef,
//! StandAloneSig rows) and the generated Portable PDB (Document, LocalScope, ImportScope rows)
//! refer to their records this way.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::metadata::tables::TableId;

/// A metadata token, `table << 24 | row`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Create a new token from its raw value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create a token from a table and a 1-based row index
    ///
    /// ## Arguments
    /// * 'table' - The table the row belongs to
    /// * 'row'   - The 1-based row index, truncated to 24 bits
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token((table as u32) << 24 | (row & 0x00FF_FFFF))
    }

    /// Shorthand for a `MethodDef` token
    #[must_use]
    pub fn method_def(row: u32) -> Self {
        Self::from_parts(TableId::MethodDef, row)
    }

    /// Shorthand for a `TypeDef` token
    #[must_use]
    pub fn type_def(row: u32) -> Self {
        Self::from_parts(TableId::TypeDef, row)
    }

    /// The raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table id (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The row index (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// True if this is the nil token
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// True if this token points to a concrete row of the given table
    #[must_use]
    pub fn is_table(&self, table: TableId) -> bool {
        self.table() == table as u8 && self.row() != 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Tokens are accepted either as plain integers or as `"0x06000001"` strings, which is how
/// decompiler front-ends usually print them.
impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TokenVisitor;

        impl de::Visitor<'_> for TokenVisitor {
            type Value = Token;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a metadata token as integer or hex string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Token, E> {
                u32::try_from(value)
                    .map(Token)
                    .map_err(|_| E::custom(format!("token out of range - {value}")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Token, E> {
                u32::try_from(value)
                    .map(Token)
                    .map_err(|_| E::custom(format!("token out of range - {value}")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Token, E> {
                let trimmed = value
                    .strip_prefix("0x")
                    .or_else(|| value.strip_prefix("0X"));
                let parsed = match trimmed {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => value.parse::<u32>(),
                };
                parsed
                    .map(Token)
                    .map_err(|_| E::custom(format!("invalid token - {value}")))
            }
        }

        deserializer.deserialize_any(TokenVisitor)
    }
}
