use crate::chat::{ChatRequest, ChatService};
use crate::completion::{CompletionClient, ResponseSource};
use crate::config::Config;
use crate::error::Result;
use crate::storage::ConversationStore;
use colored::Colorize;

/// Run one message through the chat pipeline and print the reply
pub async fn run_ask(
    config: Config,
    message: String,
    user_id: Option<String>,
    no_store: bool,
) -> Result<()> {
    let store = ConversationStore::open(&config.storage)?;
    let completion = if config.completion.enabled {
        Some(CompletionClient::from_config(&config.completion)?)
    } else {
        None
    };
    let service = ChatService::new(store, completion);

    let request = ChatRequest {
        message,
        user_id,
        context: None,
    };
    let reply = if no_store {
        service.reply(&request).await?
    } else {
        service.respond(request).await?
    };

    println!("{}", reply.response);
    let source = match reply.source {
        ResponseSource::Live => reply.source.to_string().green(),
        ResponseSource::Fallback => reply.source.to_string().yellow(),
    };
    println!();
    println!(
        "{} {}  {} {}",
        "source:".dimmed(),
        source,
        "category:".dimmed(),
        reply.category.to_string().cyan()
    );
    if let Some(id) = reply.message_id {
        println!("{} {}", "stored as:".dimmed(), id);
    }

    Ok(())
}
