use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use uguid::{guid, Guid};

use crate::metadata::token::Token;

/// Well-known custom debug information kinds, identified by their GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomDebugKind {
    /// Source file content, attached to a `Document`
    EmbeddedSource,
    /// Scopes of locals hoisted into state machine fields, attached to `MoveNext`
    StateMachineHoistedLocalScopes,
    /// Await yield and resume points of an async method
    AsyncMethodSteppingInformation,
    /// Source Link JSON, attached to the module
    SourceLink,
    /// Compiler metadata references
    CompilationMetadata,
    /// Compiler options
    CompilationOptions,
    /// Any other kind
    Unknown(Guid),
}

impl CustomDebugKind {
    const EMBEDDED_SOURCE: Guid = guid!("0E8A571B-6926-466E-B4AD-8AB04611F5FE");
    const HOISTED_LOCAL_SCOPES: Guid = guid!("6DA9A61E-F8C7-4874-BE62-68BC5630DF71");
    const ASYNC_STEPPING: Guid = guid!("54FD2AC5-E925-401A-9C2A-F94F171072F8");
    const SOURCE_LINK: Guid = guid!("CC110556-A091-4D38-9FEC-25AB9A351A6A");
    const COMPILATION_METADATA: Guid = guid!("B5FEEC05-8CD0-4A83-96DA-466284BB4BD8");
    const COMPILATION_OPTIONS: Guid = guid!("B1C2ABE1-8BF0-497A-A9B1-02FA8571E544");

    const KNOWN: [CustomDebugKind; 6] = [
        CustomDebugKind::EmbeddedSource,
        CustomDebugKind::StateMachineHoistedLocalScopes,
        CustomDebugKind::AsyncMethodSteppingInformation,
        CustomDebugKind::SourceLink,
        CustomDebugKind::CompilationMetadata,
        CustomDebugKind::CompilationOptions,
    ];

    /// Map a kind GUID from the `#GUID` heap
    #[must_use]
    pub fn from_guid(guid: Guid) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.guid() == guid)
            .unwrap_or(CustomDebugKind::Unknown(guid))
    }

    /// The GUID written to the `Kind` column
    #[must_use]
    pub fn guid(&self) -> Guid {
        match self {
            CustomDebugKind::EmbeddedSource => Self::EMBEDDED_SOURCE,
            CustomDebugKind::StateMachineHoistedLocalScopes => Self::HOISTED_LOCAL_SCOPES,
            CustomDebugKind::AsyncMethodSteppingInformation => Self::ASYNC_STEPPING,
            CustomDebugKind::SourceLink => Self::SOURCE_LINK,
            CustomDebugKind::CompilationMetadata => Self::COMPILATION_METADATA,
            CustomDebugKind::CompilationOptions => Self::COMPILATION_OPTIONS,
            CustomDebugKind::Unknown(guid) => *guid,
        }
    }
}

impl fmt::Display for CustomDebugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomDebugKind::EmbeddedSource => write!(f, "EmbeddedSource"),
            CustomDebugKind::StateMachineHoistedLocalScopes => {
                write!(f, "StateMachineHoistedLocalScopes")
            }
            CustomDebugKind::AsyncMethodSteppingInformation => {
                write!(f, "AsyncMethodSteppingInformation")
            }
            CustomDebugKind::SourceLink => write!(f, "SourceLink"),
            CustomDebugKind::CompilationMetadata => write!(f, "CompilationMetadata"),
            CustomDebugKind::CompilationOptions => write!(f, "CompilationOptions"),
            CustomDebugKind::Unknown(guid) => write!(f, "{guid}"),
        }
    }
}

impl Serialize for CustomDebugKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// IL range of one hoisted local, `start..start + length`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HoistedScope {
    /// First IL offset
    pub start: u32,
    /// Length in bytes
    pub length: u32,
}

/// One `await` of an async method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitPoint {
    /// IL offset of the yield
    pub yield_offset: u32,
    /// IL offset execution resumes at
    pub resume_offset: u32,
    /// The method containing the resume offset, the parent method of the blob.
    /// Nil in decompiler output means "the method itself".
    #[serde(default)]
    pub resume_method: Token,
}

/// Stepping information of an async method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncStepInfo {
    /// IL offset of the compiler generated catch handler, if any
    #[serde(default)]
    pub catch_handler_offset: Option<u32>,
    /// Awaits in IL order
    #[serde(default)]
    pub awaits: Vec<AwaitPoint>,
}

/// A decoded custom debug information blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CustomDebugInfo {
    /// Source file text
    EmbeddedSource {
        /// UTF-8 source text
        content: String,
        /// Whether the blob carried a deflate stream
        was_compressed: bool,
    },
    /// Hoisted local scopes of a state machine
    HoistedLocalScopes {
        /// One range per hoisted local
        scopes: Vec<HoistedScope>,
    },
    /// Async stepping information
    AsyncMethodStepping(AsyncStepInfo),
    /// Source Link JSON document
    SourceLink {
        /// The JSON text
        document: String,
    },
    /// Compilation metadata references
    CompilationMetadata {
        /// Raw text
        metadata: String,
    },
    /// Compilation options
    CompilationOptions {
        /// Raw text
        options: String,
    },
    /// A kind without a decoder
    Unknown {
        /// Raw blob bytes
        data: Vec<u8>,
    },
}
