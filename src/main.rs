use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use mail_triage::agent::HttpTriageAgent;
use mail_triage::mailstore::{HttpAutomationHook, HttpMailStore};
use mail_triage::model::{Direction, Tier};
use mail_triage::pipeline::TriageController;
use mail_triage::source::HttpMessageSource;
use mail_triage::TriageConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = TriageConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    eprintln!("📬 Mail Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mail store: {}", config.mail_store_url);
    eprintln!("   Agent: {}", config.agent_url);
    eprintln!(
        "   Working set: {} (pages of {}, refill below {})",
        config.working_set_capacity, config.page_size, config.low_buffer_threshold
    );
    eprintln!("   Commands: counts | list <tier> | next/prev <tier> | read <tier> <id>");
    eprintln!("             delete <tier> <id> | summarize <tier> <id> | refresh | quit\n");

    let source = Arc::new(HttpMessageSource::new(
        &config.mail_store_url,
        config.page_size,
    ));
    let agent = Arc::new(HttpTriageAgent::new(&config.agent_url));
    let store = Arc::new(HttpMailStore::new(&config.mail_store_url));
    let automation = Arc::new(HttpAutomationHook::new(&config.automation_url));

    let controller = TriageController::new(&config, source, agent, store, automation);

    // Log pipeline events as they happen
    {
        let mut events = controller.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                tracing::debug!(?event, "Pipeline event");
            }
        });
    }

    controller.refresh().await;
    if let Some(err) = controller.last_error().await {
        eprintln!("   Warning: {}", err);
    }
    print_counts(&controller).await;

    // ── Command loop ─────────────────────────────────────────────────────
    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => continue,
            ["quit"] | ["q"] => break,
            ["counts"] => print_counts(&controller).await,
            ["refresh"] => {
                controller.refresh().await;
                print_counts(&controller).await;
            }
            ["list", tier] => match Tier::parse(tier) {
                Some(tier) => {
                    for (i, m) in controller.messages(tier).await.iter().enumerate() {
                        println!("  [{}] {} — {} ({})", i, m.id, m.subject, m.sender);
                    }
                }
                None => eprintln!("Unknown tier: {}", tier),
            },
            [cmd @ ("next" | "prev"), tier] => match Tier::parse(tier) {
                Some(tier) => {
                    let direction = if *cmd == "next" {
                        Direction::Next
                    } else {
                        Direction::Prev
                    };
                    controller.navigate(tier, direction).await;
                    match controller.current(tier).await {
                        Some((cursor, m)) => {
                            println!("  [{}] {} — {}", cursor, m.id, m.subject)
                        }
                        None => println!("  (empty)"),
                    }
                }
                None => eprintln!("Unknown tier: {}", tier),
            },
            [cmd @ ("read" | "delete"), tier, id] => match Tier::parse(tier) {
                Some(tier) => {
                    let outcome = if *cmd == "read" {
                        controller.mark_read(tier, id).await
                    } else {
                        controller.delete(tier, id).await
                    };
                    match outcome {
                        Ok(()) => print_counts(&controller).await,
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                None => eprintln!("Unknown tier: {}", tier),
            },
            ["summarize", tier, id] => match Tier::parse(tier) {
                Some(tier) => match controller.summarize(tier, id).await {
                    Some(summary) => println!("  {}", summary),
                    None => println!("  (no summary available)"),
                },
                None => eprintln!("Unknown tier: {}", tier),
            },
            _ => eprintln!("Unknown command: {}", line.trim()),
        }
    }

    Ok(())
}

async fn print_counts(controller: &TriageController) {
    let counts = controller.tier_counts().await;
    let total = controller.total_count().await;
    let buffered = controller.buffer_len().await;
    println!(
        "  {} held ({} buffered) — {}",
        total,
        buffered,
        counts
            .iter()
            .map(|(tier, n)| format!("{}: {}", tier, n))
            .collect::<Vec<_>>()
            .join(", ")
    );
}
