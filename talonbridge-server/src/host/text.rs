//! Conversions between logical positions and text offsets
//!
//! Offsets here are in chars, not bytes. Columns count Unicode scalar
//! values with no tab expansion, matching [`Cursor`].

use talonbridge_protocol::Cursor;

use super::Caret;

/// Number of lines (an empty text has one line)
pub fn line_count(text: &str) -> u32 {
    text.split('\n').count() as u32
}

/// Char offset of `cursor`, clamped into the text
pub fn offset_of(text: &str, cursor: Cursor) -> usize {
    let mut offset = 0;
    let mut lines = text.split('\n').peekable();
    let mut line_no = 0;

    while let Some(line) = lines.next() {
        let len = line.chars().count();
        if line_no == cursor.line || lines.peek().is_none() {
            return offset + len.min(cursor.column as usize);
        }
        offset += len + 1;
        line_no += 1;
    }
    offset
}

/// Logical position of a char offset, clamped to the end of the text
pub fn cursor_at(text: &str, offset: usize) -> Cursor {
    let mut line = 0;
    let mut column = 0;
    for (i, ch) in text.chars().enumerate() {
        if i == offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    Cursor::new(line, column)
}

/// Byte index of a char offset
pub fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Char offset of a byte index
pub fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte.min(text.len())].chars().count()
}

/// Clamp a cursor onto an existing position
pub fn clamp(text: &str, cursor: Cursor) -> Cursor {
    cursor_at(text, offset_of(text, cursor))
}

/// Replace every caret's selection (or insert at the caret) with `insert`
///
/// Returns the new text and one caret per input caret, placed after the
/// inserted text, in the original caret order.
pub fn insert_at_carets(text: &str, carets: &[Caret], insert: &str) -> (String, Vec<Caret>) {
    let insert_len = insert.chars().count();

    let mut ranges: Vec<(usize, usize, usize)> = carets
        .iter()
        .enumerate()
        .map(|(i, caret)| {
            let (start, end) = caret.range();
            (offset_of(text, start), offset_of(text, end), i)
        })
        .collect();
    ranges.sort();

    let mut out = String::with_capacity(text.len() + insert.len() * carets.len());
    let mut out_len = 0;
    let mut consumed = 0;
    let mut offsets = vec![0; carets.len()];

    for (start, end, i) in ranges {
        // Overlapping selections collapse onto the previous edit
        let start = start.max(consumed);
        let end = end.max(start);

        out.push_str(&text[byte_index(text, consumed)..byte_index(text, start)]);
        out_len += start - consumed;
        out.push_str(insert);
        out_len += insert_len;

        offsets[i] = out_len;
        consumed = end;
    }
    out.push_str(&text[byte_index(text, consumed)..]);

    let carets = offsets
        .into_iter()
        .map(|offset| Caret::at(cursor_at(&out, offset)))
        .collect();
    (out, carets)
}
