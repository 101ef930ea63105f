//! Indentation-aware source text buffer.
//!
//! `SourceWriter` keeps a stack of indentation levels, each with two bits of
//! blank-line bookkeeping:
//!
//! - `pending`: a blank separator was requested at this level,
//! - `wrote`: this level produced output, or a deeper level requested a
//!   separator.
//!
//! A blank line is emitted before a write only when both are set, so a
//! requested separator never produces a leading blank at the top of a scope
//! and consecutive separator requests never stack.

const INDENT_WIDTH: usize = 4;

#[derive(Default)]
struct Level {
    pending: bool,
    wrote: bool,
}

/// An output buffer that renders indented C# source.
pub struct SourceWriter {
    out: String,
    levels: Vec<Level>,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            levels: vec![Level::default()],
        }
    }

    /// Push a fresh indentation level.
    pub fn indent(&mut self) {
        self.levels.push(Level::default());
    }

    /// Pop back to the enclosing level. The root level is never popped.
    pub fn outdent(&mut self) {
        if self.levels.len() > 1 {
            self.levels.pop();
        }
    }

    /// Request a blank separator line before the next write at this level.
    ///
    /// Also marks every enclosing level as having produced output, so a
    /// separator requested by the enclosing scope later takes effect.
    pub fn pad(&mut self) {
        let top = self.levels.len() - 1;
        self.levels[top].pending = true;
        for level in &mut self.levels[..top] {
            level.wrote = true;
        }
    }

    /// Emit a raw newline, bypassing indentation and separator bookkeeping.
    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    /// Write a block at the current indentation and terminate it with a
    /// newline.
    pub fn write_line(&mut self, text: &str) {
        self.render(0, text, true);
        self.out.push('\n');
    }

    /// Like [`write_line`](Self::write_line) with `extra` additional
    /// indentation levels.
    pub fn write_line_indented(&mut self, extra: usize, text: &str) {
        self.render(extra, text, true);
        self.out.push('\n');
    }

    /// Write a block at the current indentation without a trailing newline.
    pub fn write(&mut self, text: &str) {
        self.render(0, text, true);
    }

    /// Like [`write`](Self::write) with `extra` additional indentation
    /// levels.
    pub fn write_indented(&mut self, extra: usize, text: &str) {
        self.render(extra, text, true);
    }

    /// Write a block without indenting its first line, continuing the
    /// current output line.
    pub fn append(&mut self, text: &str) {
        self.render(0, text, false);
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Core write: emits the pending separator if due, right-trims each line,
    /// indents non-empty lines, right-trims the block, and preserves a single
    /// trailing newline when the input ended with one.
    fn render(&mut self, extra: usize, text: &str, indent_first: bool) {
        let indent = (self.levels.len() - 1 + extra) * INDENT_WIDTH;
        let top = self.levels.last_mut().expect("root level always present");

        if top.pending && top.wrote {
            self.out.push('\n');
        }
        top.pending = false;
        top.wrote = true;

        let mut block = String::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                block.push('\n');
            }
            let line = line.trim_end();
            if (i > 0 || indent_first) && !line.is_empty() {
                block.extend(std::iter::repeat_n(' ', indent));
            }
            block.push_str(line);
        }

        self.out.push_str(block.trim_end());
        if text.ends_with('\n') {
            self.out.push('\n');
        }
    }
}

impl Default for SourceWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_indented_per_level() {
        let mut w = SourceWriter::new();
        w.write_line("namespace Demo");
        w.write_line("{");
        w.indent();
        w.write_line("class A");
        w.indent();
        w.write_line("int x;");
        w.outdent();
        w.outdent();
        w.write_line("}");
        assert_eq!(
            w.into_string(),
            "namespace Demo\n{\n    class A\n        int x;\n}\n"
        );
    }

    #[test]
    fn pad_before_any_output_is_ignored() {
        let mut w = SourceWriter::new();
        w.pad();
        w.write_line("first");
        assert_eq!(w.into_string(), "first\n");
    }

    #[test]
    fn pad_between_writes_emits_a_single_blank() {
        let mut w = SourceWriter::new();
        w.write_line("a");
        w.pad();
        w.pad();
        w.write_line("b");
        assert_eq!(w.into_string(), "a\n\nb\n");
    }

    #[test]
    fn child_pad_marks_enclosing_levels_as_written() {
        let mut w = SourceWriter::new();
        w.indent();
        w.pad();
        w.outdent();
        w.pad();
        w.write_line("x");
        // The root never wrote, but the child's separator request counts.
        assert_eq!(w.into_string(), "\nx\n");
    }

    #[test]
    fn raw_newline_leaves_separator_state_untouched() {
        let mut w = SourceWriter::new();
        w.write_line("a");
        w.pad();
        w.newline();
        w.write_line("b");
        assert_eq!(w.into_string(), "a\n\n\nb\n");
    }

    #[test]
    fn lines_are_right_trimmed_and_blank_lines_stay_unindented() {
        let mut w = SourceWriter::new();
        w.indent();
        w.write_line("one   \n\ntwo");
        assert_eq!(w.into_string(), "    one\n\n    two\n");
    }

    #[test]
    fn trailing_newline_of_input_is_preserved_once() {
        let mut w = SourceWriter::new();
        w.write("block\n\n\n");
        assert_eq!(w.as_str(), "block\n");

        let mut w = SourceWriter::new();
        w.write("block");
        assert_eq!(w.as_str(), "block");
    }

    #[test]
    fn append_does_not_indent_the_first_line() {
        let mut w = SourceWriter::new();
        w.indent();
        w.write("int X");
        w.append(" { get; }\nint Y;");
        assert_eq!(w.as_str(), "    int X { get; }\n    int Y;");
    }

    #[test]
    fn extra_indent_applies_on_top_of_the_level() {
        let mut w = SourceWriter::new();
        w.indent();
        w.write_line_indented(1, "deep");
        assert_eq!(w.into_string(), "        deep\n");
    }
}
