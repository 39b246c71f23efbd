//! Shared utility modules.

pub mod varint;
