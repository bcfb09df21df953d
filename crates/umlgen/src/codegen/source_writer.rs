//! Line-oriented source text builder shared by every emitter

/// Builds indented source text one line at a time
#[derive(Debug, Clone)]
pub struct SourceWriter {
    indent_unit: &'static str,
    level: usize,
    out: String,
}

impl SourceWriter {
    /// A writer indenting with `indent_unit` per level
    pub fn new(indent_unit: &'static str) -> Self {
        Self {
            indent_unit,
            level: 0,
            out: String::new(),
        }
    }

    /// Write one line at the current indentation; empty text writes a blank line
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.level {
                self.out.push_str(self.indent_unit);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
        self
    }

    /// Write a blank line unless the previous line is already blank
    pub fn blank(&mut self) -> &mut Self {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
        self
    }

    /// Write each line at the current indentation
    pub fn lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.line(line);
        }
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// `header {`, the indented body, then `}`
    pub fn block(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(format!("{} {{", header.as_ref()));
        self.indent();
        body(self);
        self.trim_trailing_blank();
        self.dedent();
        self.line("}")
    }

    /// Like [`block`](Self::block) with the opening brace on its own line
    pub fn braced(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(header);
        self.line("{");
        self.indent();
        body(self);
        self.trim_trailing_blank();
        self.dedent();
        self.line("}")
    }

    /// `header` followed by an indented body, for indentation-scoped languages
    pub fn suite(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(header);
        self.indent();
        body(self);
        self.trim_trailing_blank();
        self.dedent();
        self
    }

    fn trim_trailing_blank(&mut self) {
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
    }

    /// The finished text, ending in exactly one newline
    pub fn finish(mut self) -> String {
        self.trim_trailing_blank();
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_blocks() {
        let mut w = SourceWriter::new("    ");
        w.line("package demo;").blank();
        w.block("public class A", |w| {
            w.line("private int x;").blank();
            w.block("public int getX()", |w| {
                w.line("return x;");
            });
            w.blank();
        });
        assert_eq!(
            w.finish(),
            "package demo;\n\npublic class A {\n    private int x;\n\n    public int getX() {\n        return x;\n    }\n}\n"
        );
    }

    #[test]
    fn test_braced_block() {
        let mut w = SourceWriter::new("    ");
        w.braced("public class A", |w| {
            w.line("public int X { get; set; }");
        });
        assert_eq!(w.finish(), "public class A\n{\n    public int X { get; set; }\n}\n");
    }

    #[test]
    fn test_suite_and_blank_collapsing() {
        let mut w = SourceWriter::new("    ");
        w.suite("class A:", |w| {
            w.line("x = 1").blank().blank().line("y = 2");
        });
        assert_eq!(w.finish(), "class A:\n    x = 1\n\n    y = 2\n");
    }
}
