//! # Local Preview
//!
//! Runs the same derivation the service uses for `action=preview`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use notebox_preview::{page_count, PreviewGenerator};

/// Preview arguments.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Source PDF.
    pub input: PathBuf,
    /// Preview output path.
    pub output: PathBuf,
}

/// Execute the preview subcommand.
pub fn run_preview(args: &PreviewArgs) -> Result<u8> {
    let full = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let preview = PreviewGenerator
        .derive(&full)
        .with_context(|| format!("deriving preview of {}", args.input.display()))?;
    std::fs::write(&args.output, &preview)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let source_pages = page_count(&full)?;
    let preview_pages = page_count(&preview)?;
    println!(
        "{}: {source_pages} pages -> {} ({preview_pages} pages incl. sentinel)",
        args.input.display(),
        args.output.display()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebox_preview::text_pdf;

    #[test]
    fn writes_truncated_preview() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.pdf");
        let output = dir.path().join("preview.pdf");
        let pages: Vec<String> = (1..=10).map(|i| format!("page {i}")).collect();
        let refs: Vec<&str> = pages.iter().map(String::as_str).collect();
        std::fs::write(&input, text_pdf(&refs).unwrap()).unwrap();

        let args = PreviewArgs {
            input,
            output: output.clone(),
        };
        assert_eq!(run_preview(&args).unwrap(), 0);
        assert_eq!(page_count(&std::fs::read(&output).unwrap()).unwrap(), 4);
    }

    #[test]
    fn rejects_garbage_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.pdf");
        std::fs::write(&input, b"%PDF-1.4 but truncated").unwrap();
        let args = PreviewArgs {
            input,
            output: dir.path().join("preview.pdf"),
        };
        assert!(run_preview(&args).is_err());
    }
}
