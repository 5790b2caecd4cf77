//! Chunked blob transfer.
//!
//! This module provides:
//! - Chunk planning (single atomic chunk or fixed-size pieces)
//! - Destination rotation across configured channels
//! - Sequential upload with bounded fixed-delay retry
//! - Ordered download and reassembly

mod engine;
mod planner;
mod rotator;

pub use engine::{DownloadedFile, TransferEngine, TransferFailure, TransferSettings, COMBINED_FILE_NAME};
pub use planner::{
    chunk_name, chunk_stem, extension_of, plan_chunks, ChunkLimits, PlannedChunk, ATOMIC_SUFFIX,
    CHUNK_SUFFIX,
};
pub use rotator::DestinationRotator;
