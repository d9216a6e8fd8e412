//! Paragraph text assembly.
//!
//! OCR output stores one `<line>` per printed line. Lines are joined with a
//! single space, except that a trailing hyphen or soft hyphen (`¬`) marks a
//! word broken across lines, in which case the mark is dropped and the next
//! line is appended directly.

use unicode_normalization::UnicodeNormalization;

/// Characters ABBYY uses for end-of-line hyphenation.
const LINE_HYPHENS: [char; 2] = ['-', '¬'];

/// Join the texts of a paragraph's lines.
pub fn join_lines<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut text = String::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.strip_suffix(LINE_HYPHENS) {
            Some(stem) => text.push_str(stem.trim_end()),
            None => {
                text.push_str(line);
                text.push(' ');
            }
        }
    }
    text.trim().to_string()
}

/// Unicode cleanup applied to every extracted paragraph.
pub struct TextCleaner {
    enabled: bool,
    ligature_map: Vec<(char, &'static str)>,
}

impl TextCleaner {
    /// Create a cleaner; a disabled cleaner returns text unchanged.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ligature_map: vec![
                ('\u{FB00}', "ff"),  // ﬀ
                ('\u{FB01}', "fi"),  // ﬁ
                ('\u{FB02}', "fl"),  // ﬂ
                ('\u{FB03}', "ffi"), // ﬃ
                ('\u{FB04}', "ffl"), // ﬄ
                ('\u{FB05}', "st"),  // ﬅ (long s + t)
                ('\u{FB06}', "st"),  // ﬆ
            ],
        }
    }

    /// Normalize to NFC, expand ligatures and drop replacement characters.
    pub fn clean(&self, text: String) -> String {
        if !self.enabled {
            return text;
        }
        let mut result: String = text.nfc().collect();
        if result.contains(|c: char| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
            for (ligature, replacement) in &self.ligature_map {
                result = result.replace(*ligature, replacement);
            }
        }
        if result.contains('\u{FFFD}') {
            result = result.replace('\u{FFFD}', "");
        }
        result
    }
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new(true)
    }
}
