use crate::{
    file::parser::Parser,
    metadata::{
        customdebuginformation::types::{
            AsyncStepInfo, AwaitPoint, CustomDebugInfo, CustomDebugKind, HoistedScope,
        },
        token::Token,
    },
    utils::inflate,
    Result,
};

struct CustomDebugParser<'a> {
    parser: Parser<'a>,
    kind: CustomDebugKind,
}

impl<'a> CustomDebugParser<'a> {
    fn new(data: &'a [u8], kind: CustomDebugKind) -> Self {
        CustomDebugParser {
            parser: Parser::new(data),
            kind,
        }
    }

    fn parse_debug_info(&mut self) -> Result<CustomDebugInfo> {
        match self.kind {
            CustomDebugKind::EmbeddedSource => self.parse_embedded_source(),
            CustomDebugKind::StateMachineHoistedLocalScopes => {
                let mut scopes = Vec::with_capacity(self.parser.remaining() / 8);
                while self.parser.has_more_data() {
                    scopes.push(HoistedScope {
                        start: self.parser.read_le::<u32>()?,
                        length: self.parser.read_le::<u32>()?,
                    });
                }
                Ok(CustomDebugInfo::HoistedLocalScopes { scopes })
            }
            CustomDebugKind::AsyncMethodSteppingInformation => self.parse_async_stepping(),
            CustomDebugKind::SourceLink => Ok(CustomDebugInfo::SourceLink {
                document: self.read_utf8_string(),
            }),
            CustomDebugKind::CompilationMetadata => Ok(CustomDebugInfo::CompilationMetadata {
                metadata: self.read_utf8_string(),
            }),
            CustomDebugKind::CompilationOptions => Ok(CustomDebugInfo::CompilationOptions {
                options: self.read_utf8_string(),
            }),
            CustomDebugKind::Unknown(_) => Ok(CustomDebugInfo::Unknown {
                data: self.parser.data()[self.parser.pos()..].to_vec(),
            }),
        }
    }

    fn parse_embedded_source(&mut self) -> Result<CustomDebugInfo> {
        let length = self.parser.read_le::<i32>()?;
        let payload = &self.parser.data()[self.parser.pos()..];

        let (bytes, was_compressed) = match usize::try_from(length) {
            Ok(0) => (payload.to_vec(), false),
            Ok(expected) => (inflate(payload, expected)?, true),
            Err(_) => {
                return Err(malformed_error!(
                    "Negative embedded source length - {}",
                    length
                ))
            }
        };

        let content = String::from_utf8(bytes)
            .map_err(|_| malformed_error!("Embedded source is not valid UTF-8"))?;
        Ok(CustomDebugInfo::EmbeddedSource {
            content,
            was_compressed,
        })
    }

    fn parse_async_stepping(&mut self) -> Result<CustomDebugInfo> {
        let catch_handler = self.parser.read_le::<u32>()?;
        let mut info = AsyncStepInfo {
            catch_handler_offset: catch_handler.checked_sub(1),
            awaits: Vec::new(),
        };

        while self.parser.has_more_data() {
            info.awaits.push(AwaitPoint {
                yield_offset: self.parser.read_le::<u32>()?,
                resume_offset: self.parser.read_le::<u32>()?,
                resume_method: Token::method_def(self.parser.read_compressed_uint()?),
            });
        }

        Ok(CustomDebugInfo::AsyncMethodStepping(info))
    }

    fn read_utf8_string(&mut self) -> String {
        let remaining = &self.parser.data()[self.parser.pos()..];
        String::from_utf8_lossy(remaining).into_owned()
    }
}

/// Decode a custom debug information blob of the given kind
///
/// # Errors
/// Returns an error for truncated blobs, corrupt deflate streams or invalid UTF-8 in embedded
/// sources.
pub fn parse_custom_debug_blob(data: &[u8], kind: CustomDebugKind) -> Result<CustomDebugInfo> {
    CustomDebugParser::new(data, kind).parse_debug_info()
}
