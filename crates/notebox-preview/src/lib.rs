//! # notebox-preview — Preview Derivation
//!
//! Turns a full PDF into the public preview of a note: the first
//! [`preview_page_count`] pages, copied unchanged, followed by one sentinel
//! page telling the reader the document was truncated.
//!
//! Derivation is a pure function of the input bytes. The preview is a new
//! document holding copies of the kept pages and what they reference, so
//! the preview bytes carry none of the withheld content.

pub mod compose;
pub mod derive;
pub mod error;
pub mod rule;

pub use compose::{text_pdf, SENTINEL_TEXT};
pub use derive::{derive, page_count, PreviewGenerator};
pub use error::PreviewError;
pub use rule::{preview_page_count, MAX_PREVIEW_PAGES};
