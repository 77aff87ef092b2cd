//! Interactive question loop and demo run
//!
//! Everything user-facing goes to the session's writer (stdout in the binary);
//! logs go to stderr through `tracing`.

use std::io::{self, BufRead, Write};

use domain_vector::display::RULE_WIDTH;
use domain_vector::{QaFinder, TextResolver, VectorRepository, write_results};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

pub const PROMPT: &str = "Your question: ";
pub const FAREWELL: &str = "Thanks for using Smart Q&A Finder!";
pub const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "How do I learn Python programming?",
    "What is machine learning?",
    "How to start a business?",
    "What are the best books to read?",
    "How do I invest in stocks?",
];

/// What the loop does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn is_quit(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    QUIT_WORDS.contains(&line.as_str())
}

/// Add a non-blank line to the editor history; failures are only logged
fn remember(editor: &mut DefaultEditor, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    if let Err(e) = editor.add_history_entry(line) {
        debug!(error = %e, "Could not record history entry");
    }
}

pub struct Session<'a, R, W> {
    finder: &'a QaFinder<R>,
    resolver: &'a TextResolver,
    out: W,
}

impl<'a, R: VectorRepository, W: Write> Session<'a, R, W> {
    pub fn new(finder: &'a QaFinder<R>, resolver: &'a TextResolver, out: W) -> Self {
        Self {
            finder,
            resolver,
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn welcome(&mut self) -> io::Result<()> {
        writeln!(self.out, "Interactive Smart Q&A Finder")?;
        writeln!(self.out, "{}", "=".repeat(50))?;
        writeln!(
            self.out,
            "Ask any question and find semantically similar questions from the index!"
        )?;
        writeln!(self.out, "Type 'quit' to exit")?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// A single status line
    pub fn notice(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    pub fn farewell(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", FAREWELL)?;
        self.out.flush()
    }

    /// Handle one line of user input
    pub async fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let question = line.trim();

        if is_quit(question) {
            self.farewell()?;
            return Ok(Flow::Quit);
        }

        if question.is_empty() {
            writeln!(self.out, "Please enter a question.")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.out, "\nSearching...")?;
        self.out.flush()?;
        let hits = self.finder.find_similar_or_empty(question).await;
        debug!(hits = hits.len(), "Search finished");

        writeln!(self.out)?;
        write_results(&mut self.out, question, &hits, self.resolver)?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    /// Run each question through search and display, with numbered banners
    pub async fn run_demo(&mut self, questions: &[&str]) -> io::Result<()> {
        writeln!(self.out, "Smart Q&A Finder Demo")?;
        writeln!(self.out, "{}", "=".repeat(50))?;
        writeln!(self.out, "Demonstrating semantic question similarity search...")?;
        writeln!(self.out)?;

        for (i, question) in questions.iter().enumerate() {
            writeln!(self.out, "Demo {}/{}", i + 1, questions.len())?;
            writeln!(self.out, "{}", "-".repeat(30))?;

            let hits = self.finder.find_similar_or_empty(question).await;
            write_results(&mut self.out, question, &hits, self.resolver)?;

            writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Read questions line by line until a quit word or end of input.
    ///
    /// Returns the number of lines read.
    pub async fn run_lines<B: BufRead>(&mut self, input: B) -> io::Result<usize> {
        let mut count = 0;
        for line in input.lines() {
            let line = line?;
            count += 1;
            if self.handle_line(&line).await? == Flow::Quit {
                return Ok(count);
            }
        }

        if count > 0 {
            self.farewell()?;
        }
        Ok(count)
    }

    /// Line-editing prompt on a terminal. Ctrl-C and Ctrl-D end the session.
    pub async fn run_terminal(&mut self) -> eyre::Result<()> {
        let mut editor = DefaultEditor::new()?;
        self.welcome()?;

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    remember(&mut editor, &line);
                    if self.handle_line(&line).await? == Flow::Quit {
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    writeln!(self.out)?;
                    self.farewell()?;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
