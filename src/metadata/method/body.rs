use bitflags::bitflags;

use crate::{
    file::io::read_le,
    metadata::{tables::TableId, token::Token},
    Error::OutOfBounds,
    Result,
};

bitflags! {
    /// Flags of a method body header (ECMA-335 II.25.4.1)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// More data sections (exception tables) follow the code
        const MORE_SECTS = 0x8;
        /// Locals are zero-initialized
        const INIT_LOCALS = 0x10;
    }
}

/// The header of a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Size of the IL code in bytes
    pub size_code: usize,
    /// Size of the header in bytes
    pub size_header: usize,
    /// `StandAloneSig` token of the locals signature, 0 without locals
    pub local_var_sig_token: u32,
    /// Maximum evaluation stack depth
    pub max_stack: usize,
    /// Whether the header uses the fat format
    pub is_fat: bool,
    /// Whether locals are zero-initialized
    pub is_init_local: bool,
    /// Whether exception sections follow the code
    pub has_sections: bool,
}

impl MethodBody {
    /// Parse the body header at the start of `data`
    ///
    /// ## Arguments
    /// * 'data' - The bytes starting at the method's RVA, up to the end of its section
    ///
    /// # Errors
    /// Returns an error if the header is neither tiny nor fat, or the code runs past `data`.
    pub fn from(data: &[u8]) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(malformed_error!("Provided data for body parsing is empty"));
        }

        let first_byte = read_le::<u8>(data)?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b_00000011_u8)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if size_code + 1 > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    size_code,
                    size_header: 1,
                    local_var_sig_token: 0,
                    max_stack: 8,
                    is_fat: false,
                    is_init_local: false,
                    has_sections: false,
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                if data.len() < 12 {
                    return Err(OutOfBounds);
                }

                let first_duo = read_le::<u16>(data)?;

                let size_header = usize::from(first_duo >> 12) * 4;
                if size_header < 12 {
                    return Err(malformed_error!(
                        "Fat method header declares {} bytes",
                        size_header
                    ));
                }

                let size_code = read_le::<u32>(&data[4..])? as usize;
                match size_code.checked_add(size_header) {
                    Some(end) if end <= data.len() => {}
                    _ => return Err(OutOfBounds),
                }

                let flags_header =
                    MethodBodyFlags::from_bits_truncate(first_duo & 0b_0000111111111111_u16);

                Ok(MethodBody {
                    size_code,
                    size_header,
                    local_var_sig_token: read_le::<u32>(&data[8..])?,
                    max_stack: read_le::<u16>(&data[2..])? as usize,
                    is_fat: true,
                    is_init_local: flags_header.contains(MethodBodyFlags::INIT_LOCALS),
                    has_sections: flags_header.contains(MethodBodyFlags::MORE_SECTS),
                })
            }
            _ => Err(malformed_error!(
                "MethodHeader is neither FAT nor TINY - {}",
                first_byte
            )),
        }
    }

    /// Size of header plus code
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_code + self.size_header
    }

    /// The `StandAloneSig` row of the locals signature, 0 without locals
    #[must_use]
    pub fn local_signature_row(&self) -> u32 {
        let token = Token::new(self.local_var_sig_token);
        if token.is_table(TableId::StandAloneSig) {
            token.row()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny() {
        // ldstr, call, ret
        let data = [0x2E, 0x72, 0x01, 0x00, 0x00, 0x70, 0x28, 0x0C, 0x00, 0x00, 0x0A, 0x2A];

        let body = MethodBody::from(&data).unwrap();
        assert!(!body.is_fat);
        assert_eq!(body.size_code, 11);
        assert_eq!(body.size_header, 1);
        assert_eq!(body.size(), 12);
        assert_eq!(body.local_signature_row(), 0);
    }

    #[test]
    fn fat() {
        let mut data = vec![
            0x1B, 0x30, // flags 0x01B (fat, more sects, init locals), header 3 dwords
            0x02, 0x00, // max stack
            0x20, 0x00, 0x00, 0x00, // code size
            0x05, 0x00, 0x00, 0x11, // StandAloneSig row 5
        ];
        data.extend_from_slice(&[0x00; 0x20]);

        let body = MethodBody::from(&data).unwrap();
        assert!(body.is_fat);
        assert!(body.is_init_local);
        assert!(body.has_sections);
        assert_eq!(body.max_stack, 2);
        assert_eq!(body.size_code, 0x20);
        assert_eq!(body.size_header, 12);
        assert_eq!(body.local_signature_row(), 5);
    }

    #[test]
    fn truncated() {
        assert!(MethodBody::from(&[]).is_err());
        assert!(matches!(MethodBody::from(&[0x2E, 0x00]), Err(OutOfBounds)));

        let data = [
            0x13, 0x30, 0x02, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert!(matches!(MethodBody::from(&data), Err(OutOfBounds)));

        // low bits 0b01 are neither tiny nor fat
        assert!(MethodBody::from(&[0x01, 0x00]).is_err());
    }
}
