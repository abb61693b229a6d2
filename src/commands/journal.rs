use super::truncate_cell;
use crate::cli::JournalCommand;
use crate::config::Config;
use crate::error::Result;
use crate::journal::{split_tags, JournalService, JournalSubmission};
use crate::storage::{ConversationStore, JournalEntry, JournalFilter, ListLimits};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle journal commands
pub async fn handle_journal(config: &Config, command: JournalCommand) -> Result<()> {
    match command {
        JournalCommand::Add {
            content,
            mood,
            user_id,
            tags,
            activities,
        } => {
            let service = JournalService::new(ConversationStore::open(&config.storage)?);
            let entry = service
                .submit(JournalSubmission {
                    content: Some(content),
                    mood: Some(mood),
                    user_id,
                    tags,
                    activities,
                })
                .await?;
            println!(
                "{}",
                format!("Recorded journal entry {} (mood {}/5)", entry.id, entry.mood).green()
            );
        }
        JournalCommand::List {
            user_id,
            tags,
            limit,
        } => {
            let limit = ListLimits::from(&config.storage).resolve(Some(limit))?;
            let service = JournalService::new(ConversationStore::open(&config.storage)?);
            let filter = JournalFilter {
                user_id,
                tags: tags.as_deref().map(split_tags).unwrap_or_default(),
                ..Default::default()
            };
            let entries = service.list(&filter, limit)?;

            if entries.is_empty() {
                println!("{}", "No journal entries found.".yellow());
                return Ok(());
            }

            println!("\nJournal:");
            journal_table(&entries).printstd();
            println!();
        }
    }

    Ok(())
}

fn journal_table(entries: &[JournalEntry]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "When".bold(),
        "Mood".bold(),
        "Tags".bold(),
        "Activities".bold(),
        "Entry".bold()
    ]);

    for entry in entries {
        let mood = match entry.mood {
            1 | 2 => entry.mood.to_string().red(),
            3 => entry.mood.to_string().yellow(),
            _ => entry.mood.to_string().green(),
        };
        table.add_row(prettytable::row![
            entry.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            mood,
            entry.tags.join(", "),
            entry.activities.join(", "),
            truncate_cell(&entry.content, 60)
        ]);
    }

    table
}
