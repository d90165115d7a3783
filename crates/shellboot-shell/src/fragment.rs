use std::path::Path;

use crate::activation::write_atomically;
use crate::prompt::PromptError;
use crate::shell::ShellKind;

pub const MAX_FRAGMENT_BYTES: usize = 512 * 1024;

/// Prompt initialization code that passed validation and may be executed.
///
/// Produced only by [`CompiledPrompt::compile`]. Execution happens by writing
/// it to a file that the activation script sources; the raw text is never
/// handed to a string evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrompt {
    shell: ShellKind,
    source: String,
}

impl CompiledPrompt {
    pub fn compile(shell: ShellKind, text: &str) -> Result<Self, PromptError> {
        if text.trim().is_empty() {
            return Err(PromptError::rejected("output is empty"));
        }
        if text.len() > MAX_FRAGMENT_BYTES {
            return Err(PromptError::rejected(format!(
                "output is {} bytes, limit is {MAX_FRAGMENT_BYTES}",
                text.len()
            )));
        }
        if text.contains('\0') {
            return Err(PromptError::rejected("output contains NUL bytes"));
        }

        Scanner::new(shell, text)
            .run()
            .map_err(PromptError::rejected)?;

        let mut source = text.replace("\r\n", "\n");
        if !source.ends_with('\n') {
            source.push('\n');
        }
        Ok(Self { shell, source })
    }

    #[must_use]
    pub fn shell(&self) -> ShellKind {
        self.shell
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Persist the compiled code so it can be sourced.
    pub fn write_to(&self, path: &Path) -> Result<(), PromptError> {
        write_atomically(path, &self.source).map_err(|source| PromptError::Io {
            context: "write compiled prompt",
            source,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    Single,
    /// bash/zsh `$'...'`, where backslash escapes apply.
    AnsiC,
    Double,
    /// PowerShell `@'`/`@"` here-string, closed by the quote + `@` at a line start.
    HereString(char),
}

struct Scanner {
    shell: ShellKind,
    chars: Vec<char>,
    pos: usize,
    mode: Mode,
    open: Vec<usize>,
}

impl Scanner {
    fn new(shell: ShellKind, text: &str) -> Self {
        Self {
            shell,
            chars: text.chars().collect(),
            pos: 0,
            mode: Mode::Code,
            open: Vec::new(),
        }
    }

    fn escape_char(&self) -> char {
        match self.shell {
            ShellKind::PowerShell => '`',
            ShellKind::Bash | ShellKind::Zsh | ShellKind::Fish => '\\',
        }
    }

    // Parentheses are not tracked for bash/zsh: `case` patterns close them
    // without opening.
    fn closing_for(&self, c: char) -> Option<char> {
        match (c, self.shell) {
            ('{', _) => Some('}'),
            ('(', ShellKind::PowerShell | ShellKind::Fish) => Some(')'),
            ('[', ShellKind::PowerShell | ShellKind::Fish) => Some(']'),
            _ => None,
        }
    }

    fn is_closer(&self, c: char) -> bool {
        match self.shell {
            ShellKind::PowerShell | ShellKind::Fish => matches!(c, '}' | ')' | ']'),
            ShellKind::Bash | ShellKind::Zsh => c == '}',
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn line_of(&self, index: usize) -> usize {
        self.chars[..index.min(self.chars.len())]
            .iter()
            .filter(|c| **c == '\n')
            .count()
            + 1
    }

    fn starts_word(&self) -> bool {
        self.pos == 0 || matches!(self.chars[self.pos - 1], ' ' | '\t' | '\n' | ';')
    }

    fn rest_of_line_is_blank(&self, from: usize) -> bool {
        self.chars[from.min(self.chars.len())..]
            .iter()
            .take_while(|c| **c != '\n')
            .all(|c| c.is_whitespace())
    }

    fn skip_to_line_end(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
            self.pos += 1;
        }
    }

    fn run(mut self) -> Result<(), String> {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match self.mode {
                Mode::Code => self.code(c)?,
                Mode::Single => self.single(c),
                Mode::AnsiC => {
                    if c == '\\' {
                        self.pos += 1;
                    } else if c == '\'' {
                        self.mode = Mode::Code;
                    }
                }
                Mode::Double => {
                    if c == self.escape_char() {
                        self.pos += 1;
                    } else if c == '"' {
                        if self.shell == ShellKind::PowerShell && self.peek(1) == Some('"') {
                            self.pos += 1;
                        } else {
                            self.mode = Mode::Code;
                        }
                    }
                }
                Mode::HereString(quote) => {
                    if c == '\n' && self.peek(1) == Some(quote) && self.peek(2) == Some('@') {
                        self.pos += 2;
                        self.mode = Mode::Code;
                    }
                }
            }
            self.pos += 1;
        }

        match self.mode {
            Mode::Code => {}
            Mode::HereString(_) => return Err("unterminated here-string".to_string()),
            Mode::Single | Mode::AnsiC | Mode::Double => {
                return Err("unterminated quoted string".to_string());
            }
        }

        if let Some(index) = self.open.pop() {
            return Err(format!(
                "unclosed '{}' opened on line {}",
                self.chars[index],
                self.line_of(index)
            ));
        }
        Ok(())
    }

    fn code(&mut self, c: char) -> Result<(), String> {
        if c == self.escape_char() {
            self.pos += 1;
            return Ok(());
        }

        if c == '#' && self.starts_word() {
            self.skip_to_line_end();
            // Leave the newline for the main loop.
            self.pos -= 1;
            return Ok(());
        }

        if self.shell == ShellKind::PowerShell {
            if c == '<' && self.peek(1) == Some('#') {
                return self.block_comment();
            }
            if c == '@'
                && let Some(quote @ ('\'' | '"')) = self.peek(1)
                && self.rest_of_line_is_blank(self.pos + 2)
            {
                self.mode = Mode::HereString(quote);
                self.pos += 1;
                return Ok(());
            }
        }

        if c == '\'' {
            let ansi_c = matches!(self.shell, ShellKind::Bash | ShellKind::Zsh)
                && self.pos > 0
                && self.chars[self.pos - 1] == '$';
            self.mode = if ansi_c { Mode::AnsiC } else { Mode::Single };
        } else if c == '"' {
            self.mode = Mode::Double;
        } else if self.closing_for(c).is_some() {
            self.open.push(self.pos);
        } else if self.is_closer(c) {
            let matched = self
                .open
                .pop()
                .is_some_and(|index| self.closing_for(self.chars[index]) == Some(c));
            if !matched {
                return Err(format!(
                    "unexpected '{c}' on line {}",
                    self.line_of(self.pos)
                ));
            }
        }
        Ok(())
    }

    fn single(&mut self, c: char) {
        match self.shell {
            ShellKind::PowerShell => {
                if c == '\'' {
                    if self.peek(1) == Some('\'') {
                        self.pos += 1;
                    } else {
                        self.mode = Mode::Code;
                    }
                }
            }
            ShellKind::Fish => {
                if c == '\\' {
                    self.pos += 1;
                } else if c == '\'' {
                    self.mode = Mode::Code;
                }
            }
            ShellKind::Bash | ShellKind::Zsh => {
                if c == '\'' {
                    self.mode = Mode::Code;
                }
            }
        }
    }

    fn block_comment(&mut self) -> Result<(), String> {
        let start = self.pos;
        self.pos += 2;
        while self.pos + 1 < self.chars.len() {
            if self.chars[self.pos] == '#' && self.chars[self.pos + 1] == '>' {
                self.pos += 1;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(format!(
            "unterminated block comment opened on line {}",
            self.line_of(start)
        ))
    }
}
