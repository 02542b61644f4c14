//! Stream one chat answer to stdout
//!
//! Run with: CHAT_API_URL=http://localhost:5001 CHAT_API_KEY=app-... cargo run --example chat -- "your question"

use std::io::Write;

use chatstream::{ChatClient, ChatRequest, ClientConfig, EventKind, StreamError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let base_url = std::env::var("CHAT_API_URL")?;
    let api_key = std::env::var("CHAT_API_KEY")?;
    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("Hello!"));

    let client = ChatClient::new(ClientConfig::new(base_url, api_key));
    let mut stream = client
        .open_stream(ChatRequest::new(query, "chatstream-demo"))
        .await?;

    // ctrl-c stops the stream, the driver reports it as a cancellation
    let token = stream.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    while let Some(outcome) = stream.recv().await {
        match outcome {
            Ok(event) => match event.event {
                EventKind::Message | EventKind::AgentMessage => {
                    print!("{}", event.answer);
                    stdout.flush()?;
                }
                EventKind::MessageEnd => {
                    println!();
                    if let Some(usage) = event.usage() {
                        println!(
                            "--- {} tokens, {} {}, {:.2}s",
                            usage.total_tokens, usage.total_price, usage.currency, usage.latency
                        );
                    }
                }
                _ => {}
            },
            Err(StreamError::Cancelled) => {
                eprintln!("\ncancelled");
                break;
            }
            Err(e) => {
                eprintln!("\nError: {e}");
                break;
            }
        }
    }

    Ok(())
}
