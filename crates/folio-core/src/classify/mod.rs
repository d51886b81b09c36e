//! Tag-driven classification into storage folders and filenames.
//!
//! - **vocabulary**: configuration-derived lookup table shared by folder and
//!   filename generation
//! - **engine**: category precedence and result construction

pub mod engine;
pub mod vocabulary;

pub use engine::{Category, ClassificationEngine, ClassificationResult, Placement, Stage};
pub use vocabulary::{VocabMatch, VocabularyTable};
