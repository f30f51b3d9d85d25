//! Glyph widths for the two standard fonts, line wrapping and WinAnsi encoding.
//!
//! Widths come from the Adobe core-14 AFM files and are in 1/1000 em.
//! `HELVETICA*` cover ASCII 0x20..=0x7E (index `c - 0x20`), `LATIN1*` cover
//! 0xA0..=0xFF (index `c - 0xA0`). The WinAnsi extras in 0x80..=0x9F are
//! matched by hand. Anything else is printed as `?` and measured as one.

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // 0..9
    278, 278, 584, 584, 584, 556, 1015,                                             // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // N..Z
    278, 278, 278, 469, 556, 333,                                                   // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // n..z
    334, 260, 334, 584,                                                             // {..~
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
const LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,  // nbsp..macron
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,  // degree..questiondown
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // À..Ï
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,  // Ð..ß
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,  // à..ï
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,  // ð..ÿ
];

#[rustfmt::skip]
const LATIN1_BOLD: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// Advance width of one character in 1/1000 em.
pub fn char_width(c: char, bold: bool) -> u16 {
    let pick = |regular: u16, heavy: u16| if bold { heavy } else { regular };
    match c {
        ' '..='~' => {
            let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
            table[c as usize - 0x20]
        }
        '\u{00A0}'..='\u{00FF}' => {
            let table = if bold { &LATIN1_BOLD } else { &LATIN1 };
            table[c as usize - 0xA0]
        }
        '€' | '–' | 'ƒ' | '†' | '‡' => 556,
        '—' | '…' | '‰' | '™' | 'Œ' => 1000,
        'œ' => 944,
        'Š' | 'Ÿ' => 667,
        'Ž' => 611,
        'ž' => 500,
        'š' => pick(500, 556),
        'ˆ' | '˜' | '‹' | '›' => 333,
        '‘' | '’' | '‚' => pick(222, 278),
        '“' | '”' | '„' => pick(333, 500),
        '•' => 350,
        '\t' => char_width(' ', bold),
        _ => char_width('?', bold),
    }
}

/// Width of `text` in points at `size`.
pub fn text_width(text: &str, bold: bool, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, bold))).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap to `max_width` points.
///
/// Words wider than a whole line are broken between characters. Returns no
/// lines for whitespace-only input.
pub fn wrap_text(text: &str, max_width: f32, bold: bool, size: f32) -> Vec<String> {
    let space = text_width(" ", bold, size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_width = text_width(word, bold, size);

        if word_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = break_word(word, max_width, bold, size);
            // The tail of a broken word may still share a line with what follows.
            let tail = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            current_width = text_width(&tail, bold, size);
            current = tail;
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, max_width: f32, bold: bool, size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;
    for c in word.chars() {
        let w = f32::from(char_width(c, bold)) * size / 1000.0;
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Shorten `text` with a trailing `...` until it fits in `max_width`.
pub fn elide(text: &str, max_width: f32, bold: bool, size: f32) -> String {
    if text_width(text, bold, size) <= max_width {
        return text.to_string();
    }
    let ellipsis = "...";
    let budget = max_width - text_width(ellipsis, bold, size);
    let mut out = String::new();
    let mut width = 0.0_f32;
    for c in text.chars() {
        let w = f32::from(char_width(c, bold)) * size / 1000.0;
        if width + w > budget {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push_str(ellipsis);
    out
}

/// Encode `text` for a simple font using `WinAnsiEncoding`.
///
/// Characters outside the code page become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        '\t' => b' ',
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        assert_eq!(char_width('A', false), 667);
        assert_eq!(char_width('A', true), 722);
        assert_eq!(char_width('i', false), 222);
        assert_eq!(char_width('é', false), char_width('e', false));
        assert!((text_width("Hello", false, 10.0) - 22.78).abs() < 0.01);
    }

    #[test]
    fn latin1_and_ligature_widths() {
        assert_eq!(char_width('Æ', false), 1000);
        assert_eq!(char_width('æ', false), 889);
        assert_eq!(char_width('Œ', false), 1000);
        assert_eq!(char_width('œ', true), 944);
        assert_eq!(char_width('ß', false), 611);
        assert_eq!(char_width('©', false), 737);
        assert_eq!(char_width('¿', true), 611);
        // Accented i is wider than plain i in the regular face.
        assert_eq!(char_width('i', false), 222);
        assert_eq!(char_width('í', false), 278);
        assert_eq!(char_width('ñ', true), 611);
        assert_eq!(char_width('日', false), char_width('?', false));
    }

    #[test]
    fn wide_latin1_text_stays_inside_the_line() {
        let text = "Æ".repeat(200);
        let lines = wrap_text(&text, 495.28, false, 11.0);
        assert!(lines.len() >= 4);
        for line in &lines {
            assert!(text_width(line, false, 11.0) <= 495.28, "{} chars too wide", line.chars().count());
        }
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn wrap_respects_width() {
        let text = "The ocean covers more than seventy percent of the surface of our planet";
        let lines = wrap_text(text, 120.0, false, 11.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, false, 11.0) <= 120.0, "{line:?} too wide");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_breaks_overlong_words() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 100.0, false, 11.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, false, 11.0) <= 100.0);
        }
    }

    #[test]
    fn wrap_of_blank_is_empty() {
        assert!(wrap_text("   ", 100.0, false, 11.0).is_empty());
    }

    #[test]
    fn elide_fits_and_marks_truncation() {
        let uri = format!("https://example.com/{}", "a".repeat(300));
        let short = elide(&uri, 200.0, false, 9.0);
        assert!(short.ends_with("..."));
        assert!(text_width(&short, false, 9.0) <= 200.0);
        assert_eq!(elide("short", 200.0, false, 9.0), "short");
    }

    #[test]
    fn win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Olá – “x”"), vec![
            b'O', b'l', 0xE1, b' ', 0x96, b' ', 0x93, b'x', 0x94
        ]);
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }
}
