/// Line-oriented text buffer with a stack of indents.
#[derive(Debug, Default)]
pub struct CodeWriter {
    buffer: String,
    indents: Vec<&'static str>,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indent. Empty lines are never indented.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for indent in &self.indents {
                self.buffer.push_str(indent);
            }
            self.buffer.push_str(text);
        }
        self.buffer.push('\n');
    }

    pub fn blank(&mut self) {
        self.buffer.push('\n');
    }

    pub fn push_indent(&mut self, indent: &'static str) {
        self.indents.push(indent);
    }

    pub fn pop_indent(&mut self) {
        self.indents.pop();
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_stack_and_skip_blank_lines() {
        let mut w = CodeWriter::new();
        w.line("a {");
        w.push_indent("  ");
        w.line("b");
        w.push_indent("  ");
        w.line("");
        w.line("c");
        w.pop_indent();
        w.pop_indent();
        w.line("}");
        assert_eq!(w.finish(), "a {\n  b\n\n    c\n}\n");
    }
}
