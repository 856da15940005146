//! # notebox-cli — Offline Tooling
//!
//! Provides the `notebox` command-line interface for operators.
//!
//! ## Subcommands
//!
//! - `notebox keygen` — Generate a master key.
//! - `notebox seal` / `notebox open` — Envelope-encrypt or decrypt a file
//!   with the configured master key.
//! - `notebox preview` — Derive the public preview of a PDF.
//!
//! ```bash
//! export NOTEBOX_MASTER_KEY="$(notebox keygen)"
//! notebox seal lecture.pdf lecture.env
//! notebox open lecture.env roundtrip.pdf
//! notebox preview lecture.pdf lecture-preview.pdf
//! ```

pub mod envelope;
pub mod keygen;
pub mod preview;
