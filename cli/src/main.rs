//! CLI entrypoint for docschat
//!
//! Wires the layers together: configuration, the HTTP gateway, a chat
//! session, and a readline loop that prints streamed responses as they
//! arrive.

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use docschat_application::{ChatSession, ConversationSnapshot, SessionConfig, SessionError};
use docschat_domain::{AgentId, AgentProfile, DocumentContext, Role, TurnId};
use docschat_infrastructure::{ConfigLoader, HttpAssistantGateway, JsonlChatLogger};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docschat", about = "Chat with the portal documentation assistant")]
struct Cli {
    /// Agent to talk to (defaults to the configured agent)
    #[arg(long)]
    agent: Option<String>,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Portal URL path of the document being viewed, e.g.
    /// /docs/default/component/website/getting-started
    #[arg(long)]
    doc: Option<String>,

    /// Raw hidden context string (mutually exclusive with --doc)
    #[arg(long, conflicts_with = "doc")]
    context: Option<String>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting docschat");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };

    let agent_id = AgentId::new(cli.agent.unwrap_or_else(|| config.agent.default.clone()));
    let base_url = cli
        .base_url
        .unwrap_or_else(|| config.backend.base_url.clone());

    // Resolve the hidden context: a portal doc path beats a raw string
    let document = match &cli.doc {
        Some(path) => match DocumentContext::from_url_path(path) {
            Some(document) => Some(document),
            None => bail!("'{path}' is not a documentation page path"),
        },
        None => None,
    };

    let mut session_config =
        SessionConfig::new(agent_id.clone()).with_event_timeout(config.backend.idle_timeout());
    if let Some(ref document) = document {
        session_config = session_config.with_document(document);
    } else if let Some(context) = cli.context {
        session_config = session_config.with_hidden_context(context);
    }

    // === Dependency Injection ===
    let gateway = Arc::new(
        HttpAssistantGateway::new(&base_url, config.backend.connect_timeout())
            .context("invalid backend configuration")?,
    );

    let mut session = ChatSession::new(gateway, session_config);
    if let Some(ref dir) = config.logging.conversation_dir
        && let Some(logger) = JsonlChatLogger::for_session(dir, &agent_id)
    {
        info!("Conversation log: {}", logger.path().display());
        session = session.with_logger(Arc::new(logger));
    }
    let session = Arc::new(session);

    print_welcome(
        &agent_id,
        &base_url,
        &config.agent.profile(),
        document.as_ref(),
    );

    // Printer task: renders streamed content from published snapshots
    let printer = tokio::spawn(render_stream(session.subscribe()));

    run_repl(Arc::clone(&session)).await?;

    drop(session);
    let _ = printer.await;
    Ok(())
}

fn print_welcome(
    agent_id: &AgentId,
    base_url: &str,
    profile: &AgentProfile,
    document: Option<&DocumentContext>,
) {
    println!();
    println!(
        "{}",
        profile
            .description
            .as_deref()
            .unwrap_or("Start chatting!")
            .bold()
    );
    println!(
        "{}",
        profile.welcome_message.as_deref().unwrap_or(
            "This assistant can answer questions for you, \
             type a message below to get started."
        )
    );
    println!();
    println!("Agent: {agent_id} @ {base_url}");
    if let Some(document) = document {
        println!(
            "Asking about: {} - {}",
            document.entity_ref.to_string().bold(),
            document.document_path
        );
    }
    println!();
    println!("Commands:");
    println!("  /clear  - Reset the conversation");
    println!("  /quit   - Exit");
    println!("  Ctrl-C  - Cancel an in-flight request");
    println!();
}

/// Read-eval loop. Returns on /quit or EOF.
async fn run_repl(session: Arc<ChatSession>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let history_path = dirs::data_dir().map(|p| p.join("docschat").join("history.txt"));
    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline(">>> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if line.starts_with('/') {
                    match line {
                        "/quit" | "/exit" | "/q" => break,
                        "/clear" => match session.clear() {
                            Ok(()) => println!("{}", "Conversation cleared.".dimmed()),
                            Err(SessionError::Busy) => {
                                println!("{}", "Cancel the current request first.".yellow());
                            }
                        },
                        _ => println!("{}", format!("Unknown command: {line}").yellow()),
                    }
                    continue;
                }

                let _ = rl.add_history_entry(line);
                ask(&session, line).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
    println!("Bye!");
    Ok(())
}

/// Submit one message; Ctrl-C cancels instead of killing the process.
async fn ask(session: &Arc<ChatSession>, line: &str) {
    let mut request = {
        let session = Arc::clone(session);
        let line = line.to_string();
        tokio::spawn(async move { session.submit(&line).await })
    };

    tokio::select! {
        result = &mut request => {
            if let Ok(Err(SessionError::Busy)) = result {
                println!("{}", "A request is already in flight.".yellow());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            session.cancel();
            // The submit task observes the token and finishes cleanly
            let _ = request.await;
        }
    }
}

/// Print assistant output incrementally as snapshots arrive.
async fn render_stream(mut snapshots: watch::Receiver<ConversationSnapshot>) {
    let mut current: Option<TurnId> = None;
    let mut printed = 0usize;

    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let Some(turn) = snapshot.turns.last() else {
            continue;
        };
        if turn.role == Role::User {
            continue;
        }

        if current != Some(turn.id) {
            current = Some(turn.id);
            printed = 0;
        }

        if turn.content.len() > printed {
            let suffix = &turn.content[printed..];
            if turn.role == Role::Error {
                print!("{}", suffix.red());
            } else {
                print!("{suffix}");
            }
            let _ = std::io::stdout().flush();
            printed = turn.content.len();
        }

        if !turn.is_in_flight() && !snapshot.busy && current == Some(turn.id) {
            if !turn.tools.is_empty() {
                let names: Vec<&str> =
                    turn.tools.iter().map(|t| t.tool_name.as_str()).collect();
                println!();
                print!("{}", format!("(used {})", names.join(", ")).dimmed());
            }
            println!();
            println!();
            // Stop re-printing this turn on later snapshots
            current = None;
            printed = 0;
        }
    }
}
