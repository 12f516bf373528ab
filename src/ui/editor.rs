//! Plain-text editor buffers for the two source panes.
//!
//! Deliberately minimal: a line vector, a cursor, and the handful of edit
//! operations the inspector needs. Mutating operations return `true` when
//! the text changed so the coordinator knows to fire an edit event.

/// An editable text buffer with a cursor.
#[derive(Debug, Clone)]
pub struct EditorBuffer {
    lines: Vec<String>,
    pub cursor_line: usize,
    /// Cursor column in characters (not bytes).
    pub cursor_col: usize,
    pub scroll: usize,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        EditorBuffer {
            lines,
            cursor_line: 0,
            cursor_col: 0,
            scroll: 0,
        }
    }

    /// The buffer contents joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines[line].chars().count()
    }

    /// Byte offset of the character column in `line`.
    fn byte_col(&self, line: usize, col: usize) -> usize {
        self.lines[line]
            .char_indices()
            .nth(col)
            .map(|(idx, _)| idx)
            .unwrap_or(self.lines[line].len())
    }

    pub fn insert_char(&mut self, c: char) -> bool {
        let at = self.byte_col(self.cursor_line, self.cursor_col);
        self.lines[self.cursor_line].insert(at, c);
        self.cursor_col += 1;
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        let at = self.byte_col(self.cursor_line, self.cursor_col);
        let rest = self.lines[self.cursor_line].split_off(at);
        self.lines.insert(self.cursor_line + 1, rest);
        self.cursor_line += 1;
        self.cursor_col = 0;
        true
    }

    /// Delete the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) -> bool {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
            let at = self.byte_col(self.cursor_line, self.cursor_col);
            self.lines[self.cursor_line].remove(at);
            true
        } else if self.cursor_line > 0 {
            let tail = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
            self.lines[self.cursor_line].push_str(&tail);
            true
        } else {
            false
        }
    }

    /// Delete the character under the cursor, joining lines at end of line.
    pub fn delete(&mut self) -> bool {
        if self.cursor_col < self.line_len(self.cursor_line) {
            let at = self.byte_col(self.cursor_line, self.cursor_col);
            self.lines[self.cursor_line].remove(at);
            true
        } else if self.cursor_line + 1 < self.lines.len() {
            let tail = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&tail);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.line_len(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_line));
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_line));
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.line_len(self.cursor_line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_text_round_trip() {
        let mut buffer = EditorBuffer::from_text("ab");
        buffer.move_right();
        buffer.insert_char('x');
        assert_eq!(buffer.text(), "axb");
        assert_eq!(buffer.cursor_col, 2);
    }

    #[test]
    fn newline_splits_the_current_line() {
        let mut buffer = EditorBuffer::from_text("hello");
        buffer.cursor_col = 2;
        buffer.insert_newline();
        assert_eq!(buffer.text(), "he\nllo");
        assert_eq!((buffer.cursor_line, buffer.cursor_col), (1, 0));
    }

    #[test]
    fn backspace_joins_lines_at_column_zero() {
        let mut buffer = EditorBuffer::from_text("he\nllo");
        buffer.cursor_line = 1;
        buffer.cursor_col = 0;
        assert!(buffer.backspace());
        assert_eq!(buffer.text(), "hello");
        assert_eq!((buffer.cursor_line, buffer.cursor_col), (0, 2));
    }

    #[test]
    fn backspace_at_start_of_buffer_is_a_no_op() {
        let mut buffer = EditorBuffer::from_text("x");
        assert!(!buffer.backspace());
        assert_eq!(buffer.text(), "x");
    }

    #[test]
    fn delete_joins_lines_at_end_of_line() {
        let mut buffer = EditorBuffer::from_text("he\nllo");
        buffer.cursor_col = 2;
        assert!(buffer.delete());
        assert_eq!(buffer.text(), "hello");
    }

    #[test]
    fn vertical_movement_clamps_the_column() {
        let mut buffer = EditorBuffer::from_text("long line\nhi");
        buffer.cursor_col = 7;
        buffer.move_down();
        assert_eq!((buffer.cursor_line, buffer.cursor_col), (1, 2));
    }

    #[test]
    fn multibyte_characters_edit_cleanly() {
        let mut buffer = EditorBuffer::from_text("héllo");
        buffer.cursor_col = 2;
        assert!(buffer.backspace());
        assert_eq!(buffer.text(), "hllo");
    }
}
