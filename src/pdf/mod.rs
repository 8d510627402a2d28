//! PDF file structure: atoms and dictionaries (`object`), the object table
//! and xref/trailer writer (`writer`), per-page content emission
//! (`content`), and whole-document orchestration (`assemble`).

pub mod assemble;
pub mod content;
pub mod object;
pub mod writer;
