//! Chunk Definitions for the specialized file header and track chunks

pub mod chunk_types;
pub mod header;
pub mod track;
