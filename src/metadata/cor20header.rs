//! The CLI header (`IMAGE_COR20_HEADER`, ECMA-335 II.25.3.3).
//!
//! Locates the metadata root inside the image and carries the managed entry point, which the
//! generated PDB repeats in its `#Pdb` stream.

use bitflags::bitflags;

use crate::{
    file::parser::Parser,
    metadata::token::Token,
    Error::OutOfBounds,
    Result,
};

bitflags! {
    /// Runtime flags of the CLI header
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CorFlags: u32 {
        /// Image contains only IL
        const IL_ONLY = 0x0000_0001;
        /// Image requires a 32-bit process
        const REQUIRED_32BIT = 0x0000_0002;
        /// Image is strong name signed
        const STRONG_NAME_SIGNED = 0x0000_0008;
        /// The entry point field holds a native RVA instead of a token
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// Runtime should track debug data
        const TRACK_DEBUG_DATA = 0x0001_0000;
        /// Image prefers a 32-bit process
        const PREFERRED_32BIT = 0x0002_0000;
    }
}

/// The fields of the CLI header PDB generation reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header, 72
    pub cb: u32,
    /// Major runtime version
    pub major_runtime_version: u16,
    /// Minor runtime version
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata
    pub meta_data_size: u32,
    /// Runtime flags
    pub flags: CorFlags,
    /// Entry point token, or native RVA with [`CorFlags::NATIVE_ENTRYPOINT`]
    pub entry_point_token: u32,
}

impl Cor20Header {
    /// Parse the CLI header
    ///
    /// ## Arguments
    /// * 'data' - The bytes starting at the header
    ///
    /// # Errors
    /// Returns an error if the data is short, the size field is wrong, or there is no metadata.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < 72 {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb != 72 {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;

        let meta_data_rva = parser.read_le::<u32>()?;
        if meta_data_rva == 0 {
            return Err(malformed_error!("Metadata RVA cannot be zero"));
        }

        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_size == 0 {
            return Err(malformed_error!("Metadata size cannot be zero"));
        }

        let flags = CorFlags::from_bits_retain(parser.read_le::<u32>()?);
        let entry_point_token = parser.read_le::<u32>()?;

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
            entry_point_token,
        })
    }

    /// The managed entry point method, if the image has one
    #[must_use]
    pub fn entry_point(&self) -> Option<Token> {
        if self.flags.contains(CorFlags::NATIVE_ENTRYPOINT) {
            return None;
        }

        let token = Token::new(self.entry_point_token);
        token
            .is_table(crate::metadata::tables::TableId::MethodDef)
            .then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(flags: u32, entry_point: u32) -> Vec<u8> {
        let mut data = vec![0u8; 72];
        data[0] = 0x48;
        data[4] = 0x02;
        data[6] = 0x05;
        data[8..12].copy_from_slice(&0x2050u32.to_le_bytes());
        data[12..16].copy_from_slice(&0x1000u32.to_le_bytes());
        data[16..20].copy_from_slice(&flags.to_le_bytes());
        data[20..24].copy_from_slice(&entry_point.to_le_bytes());
        data
    }

    #[test]
    fn crafted() {
        let parsed = Cor20Header::read(&header(0x1, 0x0600_0003)).unwrap();
        assert_eq!(parsed.cb, 72);
        assert_eq!(parsed.major_runtime_version, 2);
        assert_eq!(parsed.minor_runtime_version, 5);
        assert_eq!(parsed.meta_data_rva, 0x2050);
        assert_eq!(parsed.meta_data_size, 0x1000);
        assert!(parsed.flags.contains(CorFlags::IL_ONLY));
        assert_eq!(parsed.entry_point(), Some(Token(0x0600_0003)));
    }

    #[test]
    fn entry_point_kinds() {
        let library = Cor20Header::read(&header(0x1, 0)).unwrap();
        assert_eq!(library.entry_point(), None);

        let native = Cor20Header::read(&header(0x11, 0x0000_1234)).unwrap();
        assert_eq!(native.entry_point(), None);

        // File token entry points live in another module
        let multi_module = Cor20Header::read(&header(0x1, 0x2600_0001)).unwrap();
        assert_eq!(multi_module.entry_point(), None);
    }

    #[test]
    fn invalid() {
        let mut data = header(0x1, 0);
        data[0] = 0x40;
        assert!(Cor20Header::read(&data).is_err());
        assert!(matches!(Cor20Header::read(&data[..40]), Err(OutOfBounds)));

        let mut data = header(0x1, 0);
        data[8..12].copy_from_slice(&[0; 4]);
        assert!(Cor20Header::read(&data).is_err());
    }
}
