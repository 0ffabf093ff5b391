use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ClassificationSession, HttpClassifier, ImagePreviewAllocator, ResponseOutcome,
    WorkflowPhase,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod render;

use commands::{parse_command, ReplCommand, HELP_TEXT};
use input::load_image;
use render::render_workflow;

#[derive(Parser, Debug)]
#[command(about = "Send an image to a classification service and show the label it returns")]
struct Args {
    /// Settings file; defaults to ./classify.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured classification endpoint.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Classify one image and exit.
    Classify { path: PathBuf },
    /// Select, submit and reset from a prompt.
    Interactive,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.request_timeout_secs = timeout_secs;
    }

    let classifier = HttpClassifier::new(&settings)?;
    tracing::info!(endpoint = %classifier.endpoint(), "using classification endpoint");
    let allocator = Arc::new(ImagePreviewAllocator::new());
    let mut session = ClassificationSession::new(Arc::new(classifier), allocator.clone());

    let exit = match args.mode {
        Mode::Classify { path } => run_once(&mut session, path).await?,
        Mode::Interactive => {
            run_interactive(&mut session).await?;
            ExitCode::SUCCESS
        }
    };

    drop(session);
    tracing::debug!(stats = ?allocator.stats(), "previews at exit");
    Ok(exit)
}

async fn run_once(session: &mut ClassificationSession, path: PathBuf) -> Result<ExitCode> {
    let image = load_image(&path).await?;
    let phase = session.classify(image).await?;
    println!("{}", render_workflow(session.workflow()));
    Ok(if phase == WorkflowPhase::Succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_interactive(session: &mut ClassificationSession) -> Result<()> {
    println!("{HELP_TEXT}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if handle_command(session, command).await == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => println!("{message}"),
                }
            }
            Some(outcome) = session.next_completion(), if session.has_outstanding() => {
                if let ResponseOutcome::Applied(_) = outcome {
                    println!("{}", render_workflow(session.workflow()));
                }
            }
        }
    }

    Ok(())
}

async fn handle_command(session: &mut ClassificationSession, command: ReplCommand) -> Flow {
    match command {
        ReplCommand::Select { path } => match load_image(&path).await {
            Ok(image) => match session.select(image) {
                Ok(()) => println!("{}", render_workflow(session.workflow())),
                Err(err) => println!("Cannot use that file: {err}"),
            },
            Err(err) => println!("{err:#}"),
        },
        ReplCommand::Submit => {
            let workflow = session.workflow();
            match workflow.phase() {
                WorkflowPhase::Idle => println!("Select an image first."),
                WorkflowPhase::Submitting => println!("Still processing the current image."),
                WorkflowPhase::Succeeded | WorkflowPhase::Failed => {
                    println!("Select an image again to classify it.")
                }
                WorkflowPhase::Ready => {
                    if session.submit().is_some() {
                        println!("{}", render_workflow(session.workflow()));
                    }
                }
            }
        }
        ReplCommand::Reset => {
            session.reset();
            println!("{}", render_workflow(session.workflow()));
        }
        ReplCommand::Status => println!("{}", render_workflow(session.workflow())),
        ReplCommand::Help => println!("{HELP_TEXT}"),
        ReplCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}
