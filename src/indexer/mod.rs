//! Search-index record builders
//!
//! Converts the two grounding corpora — Azure Maps HTML code samples
//! and YAML API reference documents — into flat JSON records ready for
//! upload to a search index. The chat side never reads these records
//! directly; the hosted search service does.

pub mod docs;
pub mod samples;

pub use docs::{collect_docs, process_reference_doc, ReferenceRecord};
pub use samples::{collect_samples, extract_sample_code, process_html_sample, SampleRecord};
