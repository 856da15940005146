//! # notebox-pipeline — Encrypted Content Pipeline
//!
//! Orchestrates the two flows of the marketplace.
//!
//! **Publish**: format check → envelope encryption → content store →
//! ownership-token mint → metadata record. Each step runs only if the
//! previous one succeeded; a rejected upload causes no storage or chain call.
//!
//! **Retrieve**: for downloads the [`AccessGate`] must authorize the
//! requester first; then fetch the envelope, decrypt it, and for previews
//! derive the truncated document. The preview path never returns the full
//! plaintext.
//!
//! Purchases settle on chain first and are recorded only once confirmed.

pub mod access;
pub mod error;
pub mod form;
pub mod metadata;
pub mod pipeline;

pub use access::AccessGate;
pub use error::PipelineError;
pub use form::{FileUpload, ListingDetails, PublishForm, MAX_UPLOAD_BYTES};
pub use metadata::{InMemoryMetadataStore, MetadataError, MetadataStore};
pub use pipeline::{DocumentPipeline, PublishOutcome, PublishedNote};
