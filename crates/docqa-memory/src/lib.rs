//! Documents, PDF loading, chunking, and the per-upload vector index.

pub mod document;
pub mod vector_index;

pub use document::{
    Chunk, Document, DocumentError, DocumentLoader, DocumentMetadata, PdfLoader, SplitterConfig,
    TextSplitter,
};
pub use vector_index::{IndexError, ScoredChunk, VectorIndex};
