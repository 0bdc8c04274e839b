use anyhow::{Context, Result};
use clap::Parser;
use docuquery::chat_session::{AskOutcome, ChatSession, StatusKind, StatusMessage};
use docuquery::document_processor::{check_accepted, DocumentProcessor, UploadedFile};
use docuquery::{QueryClient, RetryPolicy, RetryingFetcher, DEFAULT_MODEL};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Ask questions about a PDF, DOCX or TXT document through the generation proxy.
#[derive(Parser, Debug)]
#[command(name = "docuquery", version)]
struct Args {
    /// Document to load
    file: PathBuf,

    /// Full URL of the proxy's generate endpoint
    #[arg(long, env = "DOCUQUERY_PROXY_URL", default_value = "http://127.0.0.1:3000/api/generate")]
    proxy_url: String,

    /// Attempts per question before giving up on a busy or failing proxy
    #[arg(long, env = "DOCUQUERY_MAX_RETRIES", default_value_t = 5)]
    max_retries: u32,

    #[arg(long, env = "DOCUQUERY_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
}

fn print_status(status: &StatusMessage) {
    let icon = match status.kind {
        StatusKind::Success => "✅",
        StatusKind::Warning => "⚠️",
        StatusKind::Error => "❌",
    };
    println!("{} {}", icon, status.text);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let file_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| args.file.display().to_string());
    if let Err(err) = check_accepted(&file_name) {
        println!("❌ {}", err);
        std::process::exit(1);
    }

    let file = UploadedFile::from_path(&args.file)
        .await
        .with_context(|| format!("failed to read {}", file_name))?;

    let mut session = ChatSession::new();
    let processor = DocumentProcessor::new();

    println!("📄 Processing file: {} ({:.2} MB)...", file.name, file.size_mb());
    if session.load_file(&processor, file).await.is_err() {
        print_status(session.status());
        std::process::exit(1);
    }
    print_status(session.status());

    let fetcher = RetryingFetcher::new(
        reqwest::Client::new(),
        RetryPolicy::with_max_attempts(args.max_retries),
    );
    let client = QueryClient::new(fetcher, args.proxy_url, args.model);

    println!("Ask a question about the document (\"exit\" to quit).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        if !line.trim().is_empty() {
            println!("Thinking...");
        }
        match session.ask(&client, &line).await {
            AskOutcome::Ignored => {}
            AskOutcome::NoDocument => print_status(session.status()),
            AskOutcome::Replied(_) => {
                if let Some(answer) = session.transcript().last() {
                    println!("\n{}\n", answer.text);
                }
            }
        }
    }

    Ok(())
}
