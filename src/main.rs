use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use governance_assistant::{
    config::{Config, LogFormat},
    error::IngestError,
    llm::OpenAiClient,
    retrieval::Retriever,
    AgentChoice, Assistant, ComplianceFramework, IngestOutcome, Ingestor, RiskTolerance,
    Session, TurnRequest,
};

const EXIT_PARTIAL: i32 = 2;
const EXIT_EMPTY_CORPUS: i32 = 3;

#[derive(Parser)]
#[command(name = "governance-assistant", version, about = "Multi-agent data governance assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the vector store from the documents directory
    Ingest,
    /// Print the fragments closest to a query
    Search {
        query: String,
        /// Number of fragments (defaults to TOP_K_RESULTS)
        #[arg(long)]
        k: Option<usize>,
    },
    /// Answer a single question
    Ask {
        question: String,
        #[command(flatten)]
        turn: TurnArgs,
    },
    /// Interactive conversation on stdin
    Chat {
        #[command(flatten)]
        turn: TurnArgs,
    },
}

#[derive(Args, Clone)]
struct TurnArgs {
    /// auto, knowledge (rag), summary, compliance, governance, deliverable (generator)
    #[arg(long, default_value = "auto")]
    agent: AgentChoice,
    /// eu-ai-act, gdpr, nist-ai-rmf, iso-42001, general
    #[arg(long, default_value = "general")]
    framework: ComplianceFramework,
    /// low, medium, high
    #[arg(long, default_value = "medium")]
    risk: RiskTolerance,
}

impl TurnArgs {
    fn request(&self, text: impl Into<String>) -> TurnRequest {
        TurnRequest::new(text)
            .with_choice(self.agent)
            .with_framework(self.framework)
            .with_risk(self.risk)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        chat_model = %config.models.chat,
        embedding_model = %config.models.embedding,
        "Governance assistant starting..."
    );
    if let Some(missing) = config.missing_credentials() {
        warn!(error = %missing, "Model calls will fail until the credential is set");
    }

    match cli.command {
        Command::Ingest => {
            let code = run_ingest(&config).await;
            std::process::exit(code);
        }
        Command::Search { query, k } => run_search(&config, &query, k).await,
        Command::Ask { question, turn } => run_ask(&config, turn.request(question)).await,
        Command::Chat { turn } => run_chat(&config, turn).await,
    }
}

fn model_client(config: &Config) -> anyhow::Result<Arc<OpenAiClient>> {
    Ok(Arc::new(OpenAiClient::new(
        &config.openai,
        &config.models,
        config.request.clone(),
    )?))
}

async fn run_ingest(config: &Config) -> i32 {
    let client = match model_client(config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to initialize model client");
            return 1;
        }
    };

    match Ingestor::new(config, client).run().await {
        Ok(report) => {
            println!(
                "Indexed {} fragment(s) from {}/{} file(s), {} page(s).",
                report.fragments_indexed,
                report.files_loaded,
                report.files_found,
                report.pages_loaded
            );
            for failure in &report.failures {
                println!("  skipped {}: {}", failure.filename, failure.message);
            }
            match report.outcome() {
                IngestOutcome::Complete => 0,
                IngestOutcome::Partial => EXIT_PARTIAL,
            }
        }
        Err(e @ IngestError::EmptyCorpus { .. }) => {
            error!(error = %e, "Nothing to index, store left untouched");
            EXIT_EMPTY_CORPUS
        }
        Err(e) => {
            error!(error = %e, "Ingestion failed");
            1
        }
    }
}

async fn run_search(config: &Config, query: &str, k: Option<usize>) -> anyhow::Result<()> {
    let retriever = Retriever::from_config(config, model_client(config)?);
    let hits = retriever
        .search_scored(query, k.unwrap_or(config.retrieval.top_k))
        .await?;

    if hits.is_empty() {
        println!("No fragment matched.");
    }
    for (rank, hit) in hits.iter().enumerate() {
        let page = hit
            .fragment
            .page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{}. [{:.3}] {} (page {})\n{}\n",
            rank + 1,
            hit.score,
            hit.fragment.source,
            page,
            hit.fragment.text
        );
    }
    Ok(())
}

async fn run_ask(config: &Config, request: TurnRequest) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config)?;
    let mut session = Session::new();
    let cancel = cancel_on_ctrl_c();

    let reply = assistant.handle_turn(&mut session, request, &cancel).await?;
    print_reply(&reply.agent_label, &reply.answer_text, &reply.sources_summary);
    Ok(())
}

async fn run_chat(config: &Config, args: TurnArgs) -> anyhow::Result<()> {
    let assistant = Assistant::from_config(config)?;
    let mut session = Session::new();

    if let Some(welcome) = session.turns().first() {
        print_reply(welcome.agent.as_deref().unwrap_or_default(), &welcome.text, "");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        // Ctrl-C while idle ends the conversation; during a turn it only cancels the turn.
        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let text = match next_input(&mut lines, interrupt).await? {
            ChatInput::Empty => continue,
            ChatInput::Exit => break,
            ChatInput::Reset => {
                session.reset();
                println!("Conversation cleared.");
                continue;
            }
            ChatInput::Message(text) => text,
        };

        let cancel = cancel_on_ctrl_c();
        let result = assistant
            .handle_turn(&mut session, args.request(text), &cancel)
            .await;
        cancel.cancel();

        match result {
            Ok(reply) => print_reply(&reply.agent_label, &reply.answer_text, &reply.sources_summary),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    info!(session_id = %session.id, turns = session.turns().len(), "Chat ended");
    Ok(())
}

/// One line of chat input, classified.
#[derive(Debug, PartialEq)]
enum ChatInput {
    Message(String),
    Reset,
    Exit,
    Empty,
}

/// Read the next chat line. End of input and `interrupt` both mean exit.
async fn next_input<R>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> std::io::Result<ChatInput>
where
    R: AsyncBufRead + Unpin,
{
    let line = tokio::select! {
        biased;
        _ = interrupt => {
            println!();
            return Ok(ChatInput::Exit);
        }
        line = lines.next_line() => line?,
    };

    let Some(line) = line else {
        return Ok(ChatInput::Exit);
    };
    Ok(match line.trim() {
        "" => ChatInput::Empty,
        "/exit" | "/quit" => ChatInput::Exit,
        "/reset" => ChatInput::Reset,
        text => ChatInput::Message(text.to_string()),
    })
}

/// Token cancelled on Ctrl-C, or when cancelled by the caller.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let watched = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = watched.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    warn!("Interrupted, cancelling the current turn");
                    watched.cancel();
                }
            }
        }
    });
    token
}

fn print_reply(label: &str, answer: &str, sources: &str) {
    println!("\n[{}]\n{}", label, answer);
    if !sources.is_empty() {
        println!("\nSources :\n{}", sources);
    }
    println!();
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
