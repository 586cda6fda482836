use srt_bank_assistant::{
    audit::build_interaction_log,
    classifier::{load_classifier, ClassifierHandle},
    config::AppConfig,
    ledger::Ledger,
    responses::ResponseStore,
    Assistant, DialogueState,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing (quiet by default so replies stay readable)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!("Bank assistant starting in terminal mode");

    // Create components
    let responses = Arc::new(ResponseStore::open(&config.training_csv).await?);
    let classifier = load_classifier(config.nlu_url.as_deref(), &config.training_csv);
    let log = build_interaction_log(config.database_url.as_deref());
    let ledger = Arc::new(Ledger::demo());

    let assistant = Assistant::new(
        Arc::new(ClassifierHandle::new(classifier)),
        responses,
        ledger.clone(),
        log,
    )
    .with_threshold(config.confidence_threshold);

    let profile = ledger.profile().await;
    println!("\n=== SRT BANK ASSISTANT ===");
    println!("Signed in as {} ({} account)", profile.name, profile.account_type);
    println!("Type a message, or 'quit' to exit.\n");

    let mut state = DialogueState::Idle;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.eq_ignore_ascii_case("quit") || message.eq_ignore_ascii_case("exit") {
            break;
        }

        let turn = assistant.handle(&mut state, message).await;
        println!("bot> {}  [{} · {}]", turn.reply, turn.intent, state.name());
    }

    println!("\nFinal balance: ₹{:.2}", ledger.balance().await);
    Ok(())
}
