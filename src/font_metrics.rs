// src/font_metrics.rs
//
// Width tables for the two standard PDF fonts the exporter uses, plus the
// WinAnsi text encoder. Widths are the Adobe AFM values in 1/1000 em for the
// ASCII range; everything outside it uses a flat fallback width, which is
// close enough for column sizing.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Helvetica advance widths for chars 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for chars 0x20..=0x7E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, //
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, //
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, //
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK: u16 = 556;
const FALLBACK_BOLD: u16 = 611;

/// Code points WinAnsi maps into the 0x80..0x9F range (the CP1252 extras).
static CP1252_EXTRAS: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    [
        ('\u{20AC}', 0x80),
        ('\u{201A}', 0x82),
        ('\u{0192}', 0x83),
        ('\u{201E}', 0x84),
        ('\u{2026}', 0x85),
        ('\u{2020}', 0x86),
        ('\u{2021}', 0x87),
        ('\u{02C6}', 0x88),
        ('\u{2030}', 0x89),
        ('\u{0160}', 0x8A),
        ('\u{2039}', 0x8B),
        ('\u{0152}', 0x8C),
        ('\u{017D}', 0x8E),
        ('\u{2018}', 0x91),
        ('\u{2019}', 0x92),
        ('\u{201C}', 0x93),
        ('\u{201D}', 0x94),
        ('\u{2022}', 0x95),
        ('\u{2013}', 0x96),
        ('\u{2014}', 0x97),
        ('\u{02DC}', 0x98),
        ('\u{2122}', 0x99),
        ('\u{0161}', 0x9A),
        ('\u{203A}', 0x9B),
        ('\u{0153}', 0x9C),
        ('\u{017E}', 0x9E),
        ('\u{0178}', 0x9F),
    ]
    .into_iter()
    .collect()
});

/// WinAnsi byte for a char; unencodable chars become '?'.
fn winansi_byte(c: char) -> u8 {
    let code = c as u32;
    match code {
        0x20..=0x7E => code as u8,
        0xA0..=0xFF => code as u8,
        _ => CP1252_EXTRAS.get(&c).copied().unwrap_or(b'?'),
    }
}

/// Encodes text for a Tj operand with a WinAnsi-encoded standard font.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(winansi_byte).collect()
}

/// Number of chars in `text` with no WinAnsi byte. Each of them prints as
/// '?' in the exported document.
pub fn unencodable_count(text: &str) -> usize {
    text.chars()
        .filter(|&c| c != '?' && winansi_byte(c) == b'?')
        .count()
}

/// Advance width of one char in 1/1000 em.
///
/// Chars without a WinAnsi byte measure as the flat fallback, so widths for
/// scripts outside WinAnsi (Arabic, CJK and so on) are rough at best. The
/// drawn output degrades the same way; `unencodable_count` lets callers
/// detect the loss up front.
pub fn glyph_width(c: char, bold: bool) -> u16 {
    let byte = winansi_byte(c);
    match byte {
        0x20..=0x7E => {
            let idx = (byte - 0x20) as usize;
            if bold {
                HELVETICA_BOLD[idx]
            } else {
                HELVETICA[idx]
            }
        }
        _ if bold => FALLBACK_BOLD,
        _ => FALLBACK,
    }
}

/// Rendered width of a string in points at the given font size.
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, bold) as u32).sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(encode_winansi("Table 1"), b"Table 1".to_vec());
    }

    #[test]
    fn latin1_and_cp1252_extras_encode() {
        assert_eq!(encode_winansi("é"), vec![0xE9]);
        assert_eq!(encode_winansi("€"), vec![0x80]);
        assert_eq!(encode_winansi("\u{2019}"), vec![0x92]);
    }

    #[test]
    fn unencodable_chars_become_question_marks() {
        assert_eq!(encode_winansi("\u{2192}"), vec![b'?']);
    }

    #[test]
    fn counts_chars_without_a_winansi_byte() {
        assert_eq!(unencodable_count("Counted 12 crates"), 0);
        assert_eq!(unencodable_count("café €5"), 0);
        assert_eq!(unencodable_count("مرحبا"), 5);
        assert_eq!(unencodable_count("Qty ☺?"), 1);
    }

    #[test]
    fn widths_scale_with_size() {
        let narrow = text_width("iii", 10.0, false);
        let wide = text_width("mmm", 10.0, false);
        assert!(narrow < wide);
        assert!((text_width("x", 20.0, false) - 2.0 * text_width("x", 10.0, false)).abs() < 1e-4);
    }

    #[test]
    fn bold_runs_wider() {
        assert!(text_width("Count", 12.0, true) > text_width("Count", 12.0, false));
    }
}
