//! ETL for hierarchical CMS export JSON: load document corpora, pair
//! ordered content blocks into sections, topic links, and attachments,
//! resolve cross-references, and hand assembled records to a storage sink.

pub mod assemble;
pub mod db;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod resolve;
