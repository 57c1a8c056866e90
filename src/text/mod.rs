//! # Text Layout
//!
//! Plain-text line breaking and measurement helpers on top of a
//! [`Canvas`]. All widths are measured in the canvas's current font, in
//! millimetres.

use crate::canvas::Canvas;

/// Greedy word wrap of `text` to `max_width`.
///
/// Explicit newlines always start a new line. A word wider than the whole
/// line is split between characters. Blank source lines are kept as empty
/// strings so vertical spacing survives.
pub fn wrap_text<C: Canvas + ?Sized>(canvas: &C, text: &str, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for source_line in text.split('\n') {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if canvas.text_width(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if canvas.text_width(word) <= max_width {
                current = word.to_string();
            } else {
                // Overlong word: hard-split, keep the tail as the open line.
                let mut pieces = split_word(canvas, word, max_width);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }

    lines
}

/// Break a single word into pieces that each fit `max_width`.
/// Every piece holds at least one character.
pub(crate) fn split_word<C: Canvas + ?Sized>(
    canvas: &C,
    word: &str,
    max_width: f64,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if canvas.text_width(&current) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::replace(&mut current, ch.to_string()));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Split text into alternating word and whitespace tokens, keeping every
/// character. `"a  b"` becomes `["a", "  ", "b"]`.
pub fn split_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (i, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != is_space => {
                tokens.push(&text[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Cut `text` so it fits in `max_width`. Never wraps.
pub fn truncate_to_width<C: Canvas + ?Sized>(canvas: &C, text: &str, max_width: f64) -> String {
    if canvas.text_width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if canvas.text_width(&out) > max_width {
            out.pop();
            break;
        }
    }
    out
}

/// Replace each tab with four spaces.
pub fn expand_tabs(line: &str) -> String {
    line.replace('\t', "    ")
}
