//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::config::ReplConfig;
use crate::output::console::ConsoleFormatter;
use crate::progress::{StreamReporter, drive_stream, interrupt_signal};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use vibe_application::{RunGenerationError, RunGenerationInput, RunGenerationUseCase, SessionStore};
use vibe_domain::GenerationResult;

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Print the current artifact
    Code,
    /// Print the diff of the latest version
    Diff,
    /// List all versions
    Versions,
    /// Write the current artifact to a file
    Save(PathBuf),
    /// Start over in a fresh session
    New,
    Help,
    Quit,
    MissingArgument(&'static str),
    Unknown(String),
}

impl ReplCommand {
    /// Parse a line starting with `/`.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        match name {
            "/code" | "/c" => ReplCommand::Code,
            "/diff" | "/d" => ReplCommand::Diff,
            "/versions" | "/v" => ReplCommand::Versions,
            "/save" | "/s" if arg.is_empty() => ReplCommand::MissingArgument("/save <path>"),
            "/save" | "/s" => ReplCommand::Save(PathBuf::from(arg)),
            "/new" => ReplCommand::New,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown(name.to_string()),
        }
    }
}

/// Result of a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Print this and keep going
    Continue(String),
    Exit,
}

/// Interactive chat REPL over one session at a time
pub struct ChatRepl {
    use_case: RunGenerationUseCase,
    store: Arc<dyn SessionStore>,
    session_id: String,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a REPL with a fresh session
    pub async fn new(
        use_case: RunGenerationUseCase,
        store: Arc<dyn SessionStore>,
        config: ReplConfig,
    ) -> Self {
        let session = store.create().await;
        Self {
            use_case,
            store,
            session_id: session.id().to_string(),
            config,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(path) = &self.config.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    if line.starts_with('/') {
                        match self.handle_command(ReplCommand::parse(line)).await {
                            CommandOutcome::Continue(output) => println!("{}\n", output),
                            CommandOutcome::Exit => {
                                println!("Bye!");
                                break;
                            }
                        }
                        continue;
                    }

                    println!();
                    match self.process_message(line).await {
                        Ok(result) => {
                            println!("{}", ConsoleFormatter::summary_line(&result).dimmed());
                        }
                        Err(e) if e.is_cancelled() => {
                            println!("{}", "Cancelled; nothing was saved.".yellow());
                        }
                        Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e)),
                    }
                    println!();
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(path) = &self.config.history_file {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           vibe-coding - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "Models: {}",
            self.use_case
                .provider()
                .list_models()
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Describe the page you want, then keep refining it.");
        println!("Press Ctrl-C while generating to cancel.");
        println!();
        println!("{}", Self::help_text());
        println!();
    }

    fn help_text() -> String {
        [
            "Commands:",
            "  /code, /c          - Show the current page",
            "  /diff, /d          - Show the latest changes",
            "  /versions, /v      - List versions",
            "  /save, /s <path>   - Write the current page to a file",
            "  /new               - Start a new session",
            "  /help, /h, /?      - Show this help",
            "  /quit, /exit, /q   - Exit chat",
        ]
        .join("\n")
    }

    /// Execute a slash command against the current session
    pub async fn handle_command(&mut self, command: ReplCommand) -> CommandOutcome {
        debug!(session_id = %self.session_id, ?command, "REPL command");
        let output = match command {
            ReplCommand::Quit => return CommandOutcome::Exit,
            ReplCommand::Help => Self::help_text(),
            ReplCommand::Code => match self.store.get_artifact(&self.session_id).await {
                Ok(artifact) if artifact.is_empty() => "No page yet.".dimmed().to_string(),
                Ok(artifact) => artifact,
                Err(e) => format!("Error: {}", e),
            },
            ReplCommand::Diff => match self.store.list_versions(&self.session_id).await {
                Ok(versions) => match versions.last() {
                    Some(latest) => format!(
                        "{}\n{}",
                        format!("v{}", latest.version).yellow().bold(),
                        ConsoleFormatter::format_diff(&latest.diff)
                    ),
                    None => "No versions yet.".dimmed().to_string(),
                },
                Err(e) => format!("Error: {}", e),
            },
            ReplCommand::Versions => match self.store.list_versions(&self.session_id).await {
                Ok(versions) => ConsoleFormatter::format_versions(&versions),
                Err(e) => format!("Error: {}", e),
            },
            ReplCommand::Save(path) => self.save_artifact(path).await,
            ReplCommand::New => {
                let session = self.store.create().await;
                self.session_id = session.id().to_string();
                "Started a new session.".to_string()
            }
            ReplCommand::MissingArgument(usage) => format!("Usage: {}", usage),
            ReplCommand::Unknown(name) => {
                format!("Unknown command: {}\nType /help for available commands", name)
            }
        };
        CommandOutcome::Continue(output)
    }

    async fn save_artifact(&self, path: PathBuf) -> String {
        let session = match self.store.get(&self.session_id).await {
            Ok(session) => session,
            Err(e) => return format!("Error: {}", e),
        };
        let Some(artifact) = session.artifact().filter(|a| !a.is_empty()) else {
            return "Nothing to save yet.".dimmed().to_string();
        };
        match tokio::fs::write(&path, artifact).await {
            Ok(()) => format!(
                "Saved v{} to {}",
                session.current_version(),
                path.display()
            ),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not save artifact");
                format!("Error: could not write {}: {}", path.display(), e)
            }
        }
    }

    /// Run one generation turn in the current session
    pub async fn process_message(
        &self,
        message: &str,
    ) -> Result<GenerationResult, RunGenerationError> {
        let input = RunGenerationInput::new(&self.session_id, message);

        if !self.config.stream {
            return self.use_case.execute(input).await;
        }

        let stream = self.use_case.spawn_stream(input, 64);
        if self.config.show_progress {
            let label = self
                .use_case
                .provider()
                .list_models()
                .first()
                .map(|m| m.to_string())
                .unwrap_or_default();
            let mut reporter = StreamReporter::stderr(&label);
            drive_stream(stream, &mut reporter, interrupt_signal()).await
        } else {
            let mut reporter = StreamReporter::quiet(std::io::sink());
            drive_stream(stream, &mut reporter, interrupt_signal()).await
        }
    }
}
