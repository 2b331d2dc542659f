// ── AST types ──────────────────────────────────────────────────────────────

/// One stage of a pipeline.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Command {
    /// Program followed by its arguments. Never empty once parsed.
    pub argv: Vec<String>,
    /// `< file`
    pub input: Option<String>,
    /// `> file` or `>> file`
    pub output: Option<String>,
    /// True for `>>`.
    pub append: bool,
}

impl Command {
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn has_redirects(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }
}

/// Commands connected by `|`, sharing one process group.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
    pub commands: Vec<Command>, // length ≥ 1
    pub background: bool,
    /// The line as typed (after substitution); shown as the job label.
    pub text: String,
}

/// Lexical tokens of one line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Word(String),
    /// `|`
    Pipe,
    /// `<`
    Input,
    /// `>`
    Output,
    /// `>>`
    Append,
    /// `&`
    Background,
}
