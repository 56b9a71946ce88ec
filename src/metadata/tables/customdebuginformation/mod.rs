//! CustomDebugInformation table (0x37) of the Portable PDB format.
//!
//! Kind-tagged extension records attached to any `HasCustomDebugInformation` parent. Sorted by
//! the encoded parent coded index. The blob format depends on the kind GUID, see
//! [`crate::metadata::customdebuginformation`].

mod raw;

pub use raw::CustomDebugInformationRaw;
