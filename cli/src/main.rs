//! CLI entrypoint for vibe-coding
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use vibe_application::{RunGenerationInput, RunGenerationUseCase, SessionStore};
use vibe_domain::{GenerationResult, Model};
use vibe_infrastructure::config::FileModelList;
use vibe_infrastructure::{
    ConfigLoader, FileConfig, InMemorySessionStore, JsonlConversationLogger, OpenRouterGateway,
};
use vibe_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormat, ReplConfig, StreamReporter, drive_stream,
    interrupt_signal,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let _log_guard = init_logging(&cli)?;

    info!("Starting vibe-coding");

    let mut config = if cli.no_config {
        ConfigLoader::load_env_only()
    } else {
        ConfigLoader::load(cli.config.as_deref())
    }
    .context("Failed to load configuration")?;

    apply_model_overrides(&mut config, &cli);

    let issues = config.validate();
    if !issues.is_empty() {
        let list = issues
            .iter()
            .map(|issue| format!("  - {}", issue))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Invalid configuration:\n{}", list);
    }
    if !config.provider.has_api_key() {
        bail!("No API key configured. Set OPENROUTER_API_KEY or provider.api_key.");
    }

    // === Dependency Injection ===
    let store = Arc::new(InMemorySessionStore::new());
    let gateway = Arc::new(
        OpenRouterGateway::new(config.openrouter_config())
            .context("Failed to create OpenRouter client")?,
    );
    let params = config.generation_params();
    info!(models = ?params.list_models(), "Model priority");

    let mut use_case = RunGenerationUseCase::new(store.clone(), gateway, params);
    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::new(path) {
            Some(logger) => {
                info!(path = %path.display(), "Writing conversation log");
                use_case = use_case.with_conversation_logger(Arc::new(logger));
            }
            None => warn!(path = %path.display(), "Conversation log disabled"),
        }
    }

    // Chat mode
    if cli.chat {
        let repl_config = ReplConfig::default()
            .with_progress(!cli.quiet)
            .with_stream(!cli.no_stream);
        let mut repl = ChatRepl::new(use_case, store, repl_config).await;
        repl.run().await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Single message mode - message is required
    let message = match cli.message.as_deref() {
        Some(m) if !m.trim().is_empty() => m,
        _ => bail!("A description is required. Use --chat for interactive mode."),
    };

    let session = store.create().await;
    let input = RunGenerationInput::new(session.id(), message);

    let outcome = if cli.no_stream {
        use_case.execute(input).await
    } else {
        let stream = use_case.spawn_stream(input, 64);
        let label = use_case
            .provider()
            .list_models()
            .first()
            .map(|m| m.to_string())
            .unwrap_or_default();
        let mut reporter = if cli.quiet {
            StreamReporter::quiet(std::io::stderr())
        } else {
            // Echo tokens unless the artifact itself is headed for stdout
            let echo = cli.out.is_some() || cli.output != OutputFormat::Artifact;
            StreamReporter::stderr(&label).with_tokens(echo)
        };
        drive_stream(stream, &mut reporter, interrupt_signal()).await
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => {
            eprintln!("Cancelled; nothing was saved.");
            return Ok(ExitCode::from(130));
        }
        Err(e) => {
            eprintln!("{}", ConsoleFormatter::format_error(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    write_output(&cli, &result)?;
    Ok(ExitCode::SUCCESS)
}

/// `-v` beats `RUST_LOG`; `--log-file` sends everything to a file.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = if cli.verbose > 0 {
        EnvFilter::new(cli.log_level())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()))
    };

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn apply_model_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.models.primary = model.clone();
    }
    if !cli.fallbacks.is_empty() {
        config.models.fallbacks = FileModelList::List(cli.fallbacks.clone());
    }
}

fn write_output(cli: &Cli, result: &GenerationResult) -> Result<()> {
    if let Some(path) = &cli.out {
        std::fs::write(path, &result.artifact)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("Saved v{} to {}", result.version, path.display());
        }
        if cli.output == OutputFormat::Artifact {
            return Ok(());
        }
    }

    let output = ConsoleFormatter::format(result, cli.output);
    println!("{}", output);

    if !cli.quiet && cli.output == OutputFormat::Artifact {
        let tried: Vec<&str> = result.attempted_models.iter().map(Model::as_str).collect();
        if tried.len() > 1 {
            eprintln!("Fell back through: {}", tried.join(" -> "));
        }
    }

    Ok(())
}
