//! This file is the root of the `taq_stream` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`decoder`, `stream`,
//!     `itch`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types most callers need, so that a typical
//!     program only imports from the crate root.
//!
//! The two entry points are `ChunkedDecoder` (fixed-width quote archives, decoded
//! into Arrow batches) and `MessageDecoder` (length-prefixed tagged binary feeds).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod archive;
pub mod config;
pub mod decoder;
pub mod error;
pub mod itch;
pub mod kernels;
pub mod layout;
pub mod stream;
pub mod types;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use config::{ArchiveFormat, DecoderConfig, FeedConfig};
pub use decoder::{
    ArchiveMetadata, ChunkedDecoder, DecodeStats, DecodedBatch, DecoderState, RawRecordBatch,
};
pub use error::TaqError;
pub use itch::{BinaryMessage, FeedStats, MessageDecoder};
pub use layout::{FieldSpec, RecordLayout};
pub use observability::init_logging;
pub use stream::{drain_into, BatchSink, BatchStreamExt, BatchTransform, ChunkBatch, TransformContext};
