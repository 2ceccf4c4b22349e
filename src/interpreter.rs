use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::config::Settings;
use crate::env::Environment;
use crate::error::ShellError;
use crate::parser::{self, ParsedCommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const PROMPT: &str = "> ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// One line of terminal input, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl+C at the prompt.
    Interrupted,
    /// End of input (Ctrl+D or a closed stream).
    Closed,
}

/// Where the session reads its lines from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Closed),
            Err(err) => Err(err.into()),
        }
    }
}

/// Prints the goodbye message at most once per session.
///
/// Clones share one flag, so the session loop and the Ctrl+C handler can both
/// hold a copy and whichever says goodbye first is the only one heard.
#[derive(Debug, Clone)]
pub struct Farewell {
    user_name: String,
    said: Arc<AtomicBool>,
}

impl Farewell {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            said: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Print the goodbye unless some copy of this guard already did.
    pub fn say(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.said.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        writeln!(
            out,
            "Thank you for using File Manager, {}, goodbye!",
            self.user_name
        )?;
        out.flush()
    }
}

/// The file manager: command table, execution engine and session loop.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to turn a parsed line into a command.
/// [`Interpreter::with_env`] builds the table of built-in commands.
///
/// Example
/// ```
/// use file_manager::Interpreter;
/// use file_manager::env::Environment;
///
/// let dir = std::env::temp_dir();
/// let mut fm = Interpreter::with_env(Environment::with_dirs("Guest", dir.clone(), dir));
/// let mut out = Vec::new();
/// fm.process_line("frobnicate", &mut out);
/// assert!(String::from_utf8(out).unwrap().starts_with("Invalid input\n"));
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    /// Create an interpreter with the built-in commands: `.exit`, `ls`, `up`, `cd`,
    /// `cat`, `add`, `rn`, `cp`, `mv`, `rm`, `os`, `hash`, `compress` and `decompress`.
    pub fn with_env(env: Environment) -> Self {
        Self::new(env, default_commands())
    }

    /// Create an interpreter for the process, using the startup settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_env(Environment::new(settings.user_name.clone()))
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Find the command for a parsed line.
    ///
    /// Returns `None` for an unknown name, a wrong argument count, or arguments
    /// the parser couldn't normalize. Callers can't tell these apart.
    pub fn resolve(&self, parsed: &ParsedCommand) -> Option<Box<dyn ExecutableCommand>> {
        let args = parsed.arg_refs()?;
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, &parsed.cmd, &args))
    }

    /// Run a resolved command once, normalizing any failure.
    pub fn execute(
        &mut self,
        command: Option<Box<dyn ExecutableCommand>>,
        stdout: &mut dyn Write,
    ) -> Result<Flow, ShellError> {
        let command = command.ok_or(ShellError::InvalidInput { detail: None })?;
        Ok(command.execute(stdout, &mut self.env)?)
    }

    /// Parse, resolve and execute one input line, then report.
    ///
    /// A failure prints its fixed message. Unless the command ended the session,
    /// exactly one working-directory line follows.
    pub fn process_line(&mut self, line: &str, stdout: &mut dyn Write) -> Flow {
        let parsed = parser::parse_line(line);
        let command = self.resolve(&parsed);
        if command.is_none() {
            log::debug!("no command for {:?} with args {:?}", parsed.cmd, parsed.args);
        }

        let flow = match self.execute(command, stdout) {
            Ok(flow) => flow,
            Err(err) => {
                if let Some(detail) = err.detail() {
                    log::debug!("{}: {}", parsed.cmd, detail);
                }
                report(stdout, format_args!("{err}"));
                Flow::Continue
            }
        };

        if flow == Flow::Continue {
            self.print_current_dir(stdout);
        }
        flow
    }

    /// Run the interactive session on the terminal.
    ///
    /// Ctrl+C while a command is running is caught by a signal handler that shares
    /// the session's farewell guard, says goodbye and exits with code 0.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let farewell = Farewell::new(self.env.user_name.clone());
        let on_interrupt = farewell.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            let _ = on_interrupt.say(&mut io::stdout());
            std::process::exit(0);
        }) {
            log::warn!("can't install Ctrl+C handler: {err}");
        }

        let mut rl = DefaultEditor::new()?;
        self.run_session(&mut rl, &mut io::stdout(), &farewell)
    }

    /// Greet, move to the home directory, then process lines until `.exit`,
    /// Ctrl+C, end of input or a read error. Every way out says goodbye once.
    pub fn run_session(
        &mut self,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        farewell: &Farewell,
    ) -> anyhow::Result<()> {
        writeln!(stdout, "Welcome to the File Manager, {}!", self.env.user_name)?;
        let home = self.env.home_dir.clone();
        if let Err(err) = self.env.change_dir(&home) {
            log::warn!("can't move to home directory {}: {}", home.display(), err);
        }
        self.print_current_dir(stdout);

        loop {
            match input.read_line(PROMPT) {
                Ok(Input::Line(line)) => {
                    if self.process_line(&line, stdout) == Flow::Exit {
                        break;
                    }
                }
                Ok(Input::Interrupted) | Ok(Input::Closed) => break,
                Err(err) => {
                    log::error!("terminal error: {err}");
                    break;
                }
            }
        }

        farewell.say(stdout)?;
        Ok(())
    }

    fn print_current_dir(&self, stdout: &mut dyn Write) {
        report(
            stdout,
            format_args!("You are currently in: {}", self.env.current_dir().display()),
        );
    }
}

/// Write a status line. Failing to write status output must not end the session.
fn report(stdout: &mut dyn Write, line: std::fmt::Arguments<'_>) {
    if let Err(err) = writeln!(stdout, "{line}") {
        log::warn!("can't write to output: {err}");
    }
}

fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Ls>::default()),
        Box::new(Factory::<Up>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Cat>::default()),
        Box::new(Factory::<Add>::default()),
        Box::new(Factory::<Rn>::default()),
        Box::new(Factory::<Cp>::default()),
        Box::new(Factory::<Mv>::default()),
        Box::new(Factory::<Rm>::default()),
        Box::new(Factory::<Os>::default()),
        Box::new(Factory::<Hash>::default()),
        Box::new(Factory::<Compress>::default()),
        Box::new(Factory::<Decompress>::default()),
    ]
}
