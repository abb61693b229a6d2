use super::truncate_cell;
use crate::config::Config;
use crate::error::Result;
use crate::storage::{ChatExchange, ConversationStore, ExchangeFilter, ListLimits};
use colored::Colorize;
use prettytable::{format, Table};

/// Print the most recent chat exchanges as a table
pub fn show_history(config: &Config, user_id: Option<String>, limit: usize) -> Result<()> {
    let limit = ListLimits::from(&config.storage).resolve(Some(limit))?;
    let store = ConversationStore::open(&config.storage)?;
    let exchanges = store.list_exchanges(limit, &ExchangeFilter::for_user(user_id))?;

    if exchanges.is_empty() {
        println!("{}", "No chat history found.".yellow());
        return Ok(());
    }

    println!("\nRecent exchanges:");
    history_table(&exchanges).printstd();
    println!();
    Ok(())
}

fn history_table(exchanges: &[ChatExchange]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "When".bold(),
        "User".bold(),
        "Category".bold(),
        "Source".bold(),
        "Message".bold(),
        "Response".bold()
    ]);

    for exchange in exchanges {
        // ULID tails are the random part, so they tell rows apart
        let id_short = exchange
            .id
            .get(exchange.id.len().saturating_sub(8)..)
            .unwrap_or(&exchange.id);
        let when = exchange.timestamp.format("%Y-%m-%d %H:%M").to_string();
        let user = exchange.user_id.clone().unwrap_or_else(|| "-".to_string());

        table.add_row(prettytable::row![
            id_short.cyan(),
            when,
            user,
            exchange.category,
            exchange.source,
            truncate_cell(&exchange.message, 40),
            truncate_cell(&exchange.response, 50)
        ]);
    }

    table
}
