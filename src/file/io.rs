//! Little-endian primitive access on byte buffers.
//!
//! All metadata structures of both the input assembly and the generated Portable PDB are
//! little-endian (the compressed integer encoding in blobs is the single big-endian exception and
//! lives with the [`crate::file::parser::Parser`] and [`crate::utils`]). These helpers bounds-check
//! every access and return [`crate::Error::OutOfBounds`] instead of panicking.

use crate::{Error::OutOfBounds, Result};

/// Trait for primitive types that can be read from and written to raw metadata bytes
pub trait CilIO: Sized {
    /// Fixed-size byte array type for this primitive
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Read value from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Read value from big-endian bytes
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Convert value to little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_cil_io {
    ($($ty:ty),*) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Safely reads a value of type `T` in big-endian byte order at `offset`, advancing it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short.
pub fn read_be_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_be_bytes(read))
}

/// Reads either a 2-byte or a 4-byte little-endian index, as metadata table columns do.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    if is_large {
        read_le_at::<u32>(data, offset)
    } else {
        Ok(u32::from(read_le_at::<u16>(data, offset)?))
    }
}

/// Writes a value in little-endian byte order at `offset`, advancing it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit into the buffer.
pub fn write_le_at<T: CilIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let bytes = value.to_le_bytes();
    let bytes = bytes.as_ref();
    let Some(end) = offset.checked_add(bytes.len()) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    data[*offset..end].copy_from_slice(bytes);
    *offset = end;
    Ok(())
}

/// Writes a 2-byte or 4-byte index at `offset`, advancing it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is too short, or a malformed error if a
/// small index is asked to hold a value above `u16::MAX`.
pub fn write_le_at_dyn(data: &mut [u8], offset: &mut usize, value: u32, is_large: bool) -> Result<()> {
    if is_large {
        write_le_at::<u32>(data, offset, value)
    } else {
        let Ok(small) = u16::try_from(value) else {
            return Err(malformed_error!(
                "Index {} does not fit into a 2-byte column",
                value
            ));
        };
        write_le_at::<u16>(data, offset, small)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_primitives() {
        assert_eq!(read_le::<u8>(&TEST_BUFFER).unwrap(), 0x01);
        assert_eq!(read_le::<u16>(&TEST_BUFFER).unwrap(), 0x0201);
        assert_eq!(read_le::<u32>(&TEST_BUFFER).unwrap(), 0x04030201);
        assert_eq!(read_le::<u64>(&TEST_BUFFER).unwrap(), 0x0807060504030201);

        let mut offset = 2;
        assert_eq!(read_be_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0304);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_dyn() {
        let mut offset = 0;
        assert_eq!(read_le_at_dyn(&TEST_BUFFER, &mut offset, false).unwrap(), 0x0201);
        assert_eq!(read_le_at_dyn(&TEST_BUFFER, &mut offset, true).unwrap(), 0x06050403);
        assert_eq!(offset, 6);
    }

    #[test]
    fn out_of_bounds() {
        assert!(matches!(read_le::<u64>(&TEST_BUFFER[1..]), Err(OutOfBounds)));

        let mut offset = usize::MAX - 1;
        assert!(read_le_at::<u32>(&TEST_BUFFER, &mut offset).is_err());

        let mut buffer = [0u8; 3];
        let mut offset = 0;
        assert!(write_le_at::<u32>(&mut buffer, &mut offset, 1).is_err());
        assert_eq!(offset, 0);
    }

    #[test]
    fn write_dyn() {
        let mut buffer = [0u8; 6];
        let mut offset = 0;
        write_le_at_dyn(&mut buffer, &mut offset, 0x0102, false).unwrap();
        write_le_at_dyn(&mut buffer, &mut offset, 0x0304_0506, true).unwrap();
        assert_eq!(buffer, [0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);

        let mut offset = 0;
        assert!(write_le_at_dyn(&mut buffer, &mut offset, 0x10000, false).is_err());
    }
}
