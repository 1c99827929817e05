//! # Standard Font Metrics
//!
//! Only the four Helvetica faces are used, so no fonts are embedded and
//! measuring text needs nothing more than the AFM advance widths below.
//! Oblique faces share the widths of their upright counterparts.

use crate::model::FontStyle;

/// Advance widths (1/1000 em) for ASCII 0x20..=0x7E, Helvetica.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance widths (1/1000 em) for ASCII 0x20..=0x7E, Helvetica-Bold.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

const DEFAULT_WIDTH: u16 = 556;

/// Helvetica ascender, in 1/1000 em.
pub const ASCENT: f64 = 0.718;

/// PDF base font name for a style.
pub fn base_font(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Normal => "Helvetica",
        FontStyle::Bold => "Helvetica-Bold",
        FontStyle::Italic => "Helvetica-Oblique",
        FontStyle::BoldItalic => "Helvetica-BoldOblique",
    }
}

/// Resource name the encoder registers each face under.
pub fn resource_name(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Normal => "F1",
        FontStyle::Bold => "F2",
        FontStyle::Italic => "F3",
        FontStyle::BoldItalic => "F4",
    }
}

pub const ALL_STYLES: [FontStyle; 4] = [
    FontStyle::Normal,
    FontStyle::Bold,
    FontStyle::Italic,
    FontStyle::BoldItalic,
];

/// Advance width of one character in points.
pub fn char_width(ch: char, style: FontStyle, font_size: f64) -> f64 {
    let table = match style {
        FontStyle::Bold | FontStyle::BoldItalic => &HELVETICA_BOLD_WIDTHS,
        FontStyle::Normal | FontStyle::Italic => &HELVETICA_WIDTHS,
    };
    let cp = ch as u32;
    let w = if (0x20..=0x7E).contains(&cp) {
        table[(cp - 0x20) as usize]
    } else {
        DEFAULT_WIDTH
    };
    w as f64 / 1000.0 * font_size
}

/// Width of a string in points.
pub fn measure(text: &str, style: FontStyle, font_size: f64) -> f64 {
    text.chars().map(|ch| char_width(ch, style, font_size)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_space() {
        assert!((char_width(' ', FontStyle::Normal, 1000.0) - 278.0).abs() < 1e-9);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = measure("Hello World", FontStyle::Normal, 12.0);
        let bold = measure("Hello World", FontStyle::Bold, 12.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_italic_shares_widths() {
        assert_eq!(
            measure("abc", FontStyle::Italic, 10.0),
            measure("abc", FontStyle::Normal, 10.0)
        );
    }

    #[test]
    fn test_non_ascii_falls_back() {
        assert!((char_width('é', FontStyle::Normal, 1000.0) - 556.0).abs() < 1e-9);
    }
}
