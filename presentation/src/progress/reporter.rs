//! Progress reporting for streamed generations

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tracing::warn;
use vibe_application::{GenerationStream, RunGenerationError};
use vibe_domain::{GenerationEvent, GenerationResult};

/// Renders generation events: a spinner until the first token, then the
/// tokens themselves as they arrive.
pub struct StreamReporter<W: Write> {
    out: W,
    spinner: ProgressBar,
    show_tokens: bool,
    tokens: usize,
}

impl StreamReporter<io::Stderr> {
    /// Spinner and tokens on stderr, keeping stdout for the result
    pub fn stderr(label: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_message(format!("Generating with {}", label.bold()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self::new(io::stderr(), spinner, true)
    }
}

impl<W: Write> StreamReporter<W> {
    pub fn new(out: W, spinner: ProgressBar, show_tokens: bool) -> Self {
        Self {
            out,
            spinner,
            show_tokens,
            tokens: 0,
        }
    }

    /// Keep the spinner but choose whether tokens are echoed
    pub fn with_tokens(mut self, show: bool) -> Self {
        self.show_tokens = show;
        self
    }

    /// No spinner, no tokens
    pub fn quiet(out: W) -> Self {
        Self::new(out, ProgressBar::hidden(), false)
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Number of non-empty tokens seen so far
    pub fn token_count(&self) -> usize {
        self.tokens
    }

    pub fn into_inner(self) -> W {
        self.spinner.finish_and_clear();
        self.out
    }

    pub fn on_event(&mut self, event: &GenerationEvent) -> io::Result<()> {
        match event {
            GenerationEvent::Token { text } => {
                if self.tokens == 0 {
                    self.spinner.finish_and_clear();
                }
                self.tokens += 1;
                if self.show_tokens {
                    self.out.write_all(text.as_bytes())?;
                    self.out.flush()?;
                }
            }
            GenerationEvent::AssistantComplete { .. } => {
                if self.show_tokens && self.tokens > 0 {
                    writeln!(self.out)?;
                }
            }
            GenerationEvent::Artifact { .. } | GenerationEvent::Diff { .. } => {}
            GenerationEvent::Done => {
                self.spinner.finish_and_clear();
            }
            GenerationEvent::Error { detail } => {
                self.spinner.finish_and_clear();
                if self.show_tokens {
                    if self.tokens > 0 {
                        writeln!(self.out)?;
                    }
                    writeln!(self.out, "{} {}", "x".red(), detail)?;
                }
            }
        }
        Ok(())
    }
}

/// Pump `stream` into `reporter` until it ends.
///
/// When `interrupt` resolves the generation is cancelled; the stream then
/// ends with an `error` event and [`RunGenerationError::Cancelled`].
pub async fn drive_stream<W, F>(
    mut stream: GenerationStream,
    reporter: &mut StreamReporter<W>,
    interrupt: F,
) -> Result<GenerationResult, RunGenerationError>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        tokio::select! {
            biased;
            () = &mut interrupt, if !interrupted => {
                interrupted = true;
                stream.cancel();
            }
            event = stream.recv() => {
                let Some(event) = event else { break };
                if let Err(e) = reporter.on_event(&event) {
                    warn!(error = %e, "Could not render generation event");
                }
                if event.is_terminal() {
                    break;
                }
            }
        }
    }

    stream.finish().await
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
pub async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
