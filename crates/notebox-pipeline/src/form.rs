//! # Publish Request Validation
//!
//! Raw form input is parsed into typed values before the pipeline performs
//! any side effect. A [`PublishForm`] becomes [`ListingDetails`]; a
//! [`FileUpload`] must be a single, non-empty `.pdf` of at most
//! [`MAX_UPLOAD_BYTES`] that carries the PDF signature.

use notebox_core::{Price, ValidationError, WalletAddress};
use notebox_crypto::validate_format;
use serde::Deserialize;

use crate::error::PipelineError;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10_000_000;

/// Text fields of a publish request, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishForm {
    /// Display title.
    pub name: String,
    /// Author's wallet address, the owner of the minted token.
    pub author_address: String,
    /// Course the note belongs to.
    pub course_id: String,
    /// Listing price as a decimal coin amount.
    pub price: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
}

/// A validated [`PublishForm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDetails {
    /// Trimmed, non-empty title.
    pub name: String,
    /// Token owner.
    pub author_address: WalletAddress,
    /// Trimmed, non-empty course id.
    pub course_id: String,
    /// Listing price.
    pub price: Price,
    /// Trimmed description, possibly empty.
    pub description: String,
}

impl PublishForm {
    /// Validate every field and return the typed listing.
    pub fn validate(&self) -> Result<ListingDetails, ValidationError> {
        let name = required(&self.name, "name")?;
        let course_id = required(&self.course_id, "courseId")?;
        let address = required(&self.author_address, "authorAddress")?;
        let price = required(&self.price, "price")?;
        Ok(ListingDetails {
            name,
            author_address: WalletAddress::new(address)?,
            course_id,
            price: Price::parse(&price)?,
            description: self.description.trim().to_string(),
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// An uploaded file.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Client-supplied file name.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FileUpload {
    /// Create an upload.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Take the only upload out of `files`.
    ///
    /// No file is a missing field; more than one is an invalid format.
    pub fn single(mut files: Vec<FileUpload>) -> Result<Self, PipelineError> {
        match files.len() {
            0 => Err(ValidationError::MissingField("file").into()),
            1 => Ok(files.remove(0)),
            n => Err(PipelineError::InvalidFormat(format!(
                "expected exactly one file, got {n}"
            ))),
        }
    }

    /// Check name, size and signature.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let is_pdf_name = std::path::Path::new(&self.file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf_name {
            return Err(PipelineError::InvalidFormat(format!(
                "file {:?} does not have a .pdf extension",
                self.file_name
            )));
        }
        if self.bytes.is_empty() {
            return Err(PipelineError::InvalidFormat("file is empty".into()));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(PipelineError::InvalidFormat(format!(
                "file is {} bytes, limit is {MAX_UPLOAD_BYTES}",
                self.bytes.len()
            )));
        }
        validate_format(&self.bytes)?;
        Ok(())
    }
}
