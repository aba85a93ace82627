use crate::commands::CHAT_COMMANDS;
use crate::config::Config;
use crate::core::error::{Result, TchatError};

use is_terminal::IsTerminal;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config as EditorConfig, Context, EditMode, Editor, Helper};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Source of user input lines.
pub trait Prompter {
    /// Shows `prompt` and reads one line without its newline. `None` means
    /// the input stream was closed.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Called once before the process exits.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Completes the in-chat slash commands.
pub struct ChatHelper {
    hinter: HistoryHinter,
}

impl ChatHelper {
    pub fn new() -> Self {
        Self {
            hinter: HistoryHinter {},
        }
    }
}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if !line.starts_with('/') {
            return Ok((pos, Vec::new()));
        }

        let typed = &line[..pos];
        let matches = CHAT_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(typed))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ChatHelper {}

impl Validator for ChatHelper {}

impl Helper for ChatHelper {}

/// rustyline-backed prompter used when stdin is a terminal.
pub struct LineEditor {
    editor: Editor<ChatHelper, FileHistory>,
    history_path: PathBuf,
}

impl LineEditor {
    pub fn new(history_path: PathBuf) -> Result<Self> {
        let config = EditorConfig::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)
            .map_err(|e| TchatError::Input(format!("Failed to create line editor: {}", e)))?;
        editor.set_helper(Some(ChatHelper::new()));

        if let Err(e) = editor.load_history(&history_path) {
            debug!(path = %history_path.display(), error = %e, "no input history loaded");
        }

        Ok(Self {
            editor,
            history_path,
        })
    }
}

impl Prompter for LineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(parent) = self.history_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Err(e) = self.editor.save_history(&self.history_path) {
            warn!(path = %self.history_path.display(), error = %e, "failed to save input history");
        }
        Ok(())
    }
}

/// Reads lines from any buffered reader, used when stdin is piped.
pub struct PlainPrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PlainPrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> Prompter for PlainPrompter<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.writer, "{}", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}

/// Interactive editor on a terminal, plain line reads otherwise.
pub fn create_prompter() -> Result<Box<dyn Prompter>> {
    if io::stdin().is_terminal() {
        Ok(Box::new(LineEditor::new(Config::history_path())?))
    } else {
        debug!("stdin is not a terminal, using plain line reader");
        Ok(Box::new(PlainPrompter::new(io::stdin().lock(), io::stdout())))
    }
}
