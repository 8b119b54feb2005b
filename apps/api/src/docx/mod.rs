//! Minimal OOXML wordprocessing document layer.
//!
//! Only what template substitution needs: open a `.docx` package, expose its
//! body paragraphs as text-bearing runs, and write the package back with every
//! part it arrived with. Body content that substitution never touches is
//! re-emitted byte-for-byte.

pub mod document;
pub mod error;
pub mod package;

pub use document::{Document, Paragraph, Run};
pub use error::DocxError;
pub use package::Package;
