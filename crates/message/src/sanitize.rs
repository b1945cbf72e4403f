//! Composer-safe text sanitation.
//!
//! The WhatsApp Web composer, driven through CDP key events, corrupts or
//! rejects code points outside the Basic Multilingual Plane (emoji, rare
//! scripts). Everything above U+FFFF is stripped and the remainder is
//! NFKC-normalized so a partial garbled send never happens.

use tracing::warn;
use unicode_normalization::UnicodeNormalization;

const BMP_MAX: u32 = 0xFFFF;

/// Restricts `input` to NFKC-normalized BMP text. Total: never fails.
/// Logs when the transformation was lossy so the caller knows.
pub fn sanitize(input: &str) -> String {
    let bmp: String = input.chars().filter(|c| (*c as u32) <= BMP_MAX).collect();
    // NFKC may compose new code points; filter again so nothing re-enters
    // the supplementary planes.
    let out: String = bmp.nfkc().filter(|c| (*c as u32) <= BMP_MAX).collect();

    if out != input {
        warn!("Message contained characters the composer cannot accept; they were removed");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emoji() {
        assert_eq!(sanitize("hello 👋 there 🎉"), "hello  there ");
    }

    #[test]
    fn ascii_passes_through_unchanged() {
        let input = "Hello, World! 123\nSecond line.";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn bmp_text_is_kept() {
        assert_eq!(sanitize("olá señora Ω"), "olá señora Ω");
    }

    #[test]
    fn output_is_always_bmp_only() {
        let nasty = "a😀b𝔘c\u{10FFFF}d漢字é";
        let out = sanitize(nasty);
        assert!(out.chars().all(|c| (c as u32) <= 0xFFFF));
        assert!(out.contains("漢字"));
    }

    #[test]
    fn normalizes_compatibility_forms() {
        // NFKC folds the ﬁ ligature (U+FB01) into "fi".
        assert_eq!(sanitize("ﬁle"), "file");
    }
}
