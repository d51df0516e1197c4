//! Language model collaborator used when the grammar understands nothing.

use crate::catalog::CatalogSnapshot;
use crate::error::Result;
use crate::session::Turn;
use async_trait::async_trait;

/// Phrases a model uses when its reply carries an itemized order.
const ORDER_MARKERS: &[&str] = &[
    "order includes",
    "i'll place an order for",
    "i will place an order for",
    "placing an order for",
    "your order:",
];

/// A chat completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produces the assistant's next reply for the conversation so far.
    async fn complete(&self, system_prompt: &str, turns: &[Turn]) -> Result<String>;
}

/// System prompt describing the current menu.
pub fn menu_prompt(catalog: &CatalogSnapshot, currency_symbol: &str) -> String {
    let mut prompt = String::from(
        "You take room-service orders for hotel guests. Only offer items from the menu below. \
         When the guest has decided, answer with \"Your order:\" followed by one line per item \
         in the form \"<quantity> <item name>\".\n\nMenu:\n",
    );
    for item in catalog.items() {
        prompt.push_str(&format!("- {} ({currency_symbol}{})\n", item.name, item.price));
    }
    prompt
}

/// Returns the part of `reply` after the first order marker, if any.
pub fn order_section(reply: &str) -> Option<&str> {
    // ASCII lowering keeps byte offsets aligned with `reply`
    let lowered = reply.to_ascii_lowercase();
    ORDER_MARKERS
        .iter()
        .filter_map(|marker| lowered.find(marker).map(|pos| pos + marker.len()))
        .min()
        .map(|start| reply[start..].trim())
        .filter(|section| !section.is_empty())
}
