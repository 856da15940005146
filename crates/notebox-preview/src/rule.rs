//! The preview page-count rule.

/// Upper bound on copied preview pages.
pub const MAX_PREVIEW_PAGES: u32 = 3;

/// Number of leading pages a preview of an `n`-page document keeps.
///
/// `round(n / 3)` while `n / 3 <= 2`, otherwise [`MAX_PREVIEW_PAGES`].
/// `n / 3` never has a fractional part of exactly one half, so the
/// rounding is `(n + 1) / 3` in integer arithmetic.
pub fn preview_page_count(n: u32) -> u32 {
    if n <= 6 {
        (n + 1) / 3
    } else {
        MAX_PREVIEW_PAGES
    }
}
