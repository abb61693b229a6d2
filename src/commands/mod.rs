/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `serve`   — Run the HTTP API
- `ask`     — Send one message through the chat pipeline
- `history` — Show recent chat exchanges
- `journal` — Add and list journal entries

Handlers receive the validated configuration and open the store themselves,
so each invocation holds exactly one store handle.
*/

pub mod ask;
pub mod history;
pub mod journal;
pub mod serve;

/// Shorten `text` to at most `max` characters for table cells
pub(crate) fn truncate_cell(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
