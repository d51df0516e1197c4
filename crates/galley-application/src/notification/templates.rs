//! Message templates keyed by `"<status>.<audience>[.follow_up]"`.

use galley_core::notification::NotificationIntent;
use minijinja::{Environment, context};
use std::collections::HashMap;

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        "pending.guest",
        "Thanks! We received order {{ order_id }}: {{ items }}. Total {{ currency }}{{ total }}. We'll confirm shortly.",
    ),
    (
        "pending.management",
        "New order {{ order_id }} for room {{ room }}: {{ items }} ({{ currency }}{{ total }}). Awaiting confirmation.",
    ),
    ("confirmed.guest", "Your order {{ order_id }} is confirmed."),
    (
        "confirmed.kitchen",
        "Order {{ order_id }} for room {{ room }}: {{ items }}.{% if instructions %} Note: {{ instructions }}{% endif %}",
    ),
    ("preparing.guest", "The kitchen is preparing your order {{ order_id }}."),
    (
        "ready.guest",
        "Your order {{ order_id }} is ready and on its way to room {{ room }}.",
    ),
    (
        "ready.delivery",
        "Pick up order {{ order_id }} for room {{ room }}: {{ items }}.",
    ),
    ("delivered.guest", "Your order {{ order_id }} has been delivered. Enjoy!"),
    (
        "delivered.guest.follow_up",
        "How was everything with order {{ order_id }}? Reply here if there is anything else we can do.",
    ),
    ("cancelled.guest", "Your order {{ order_id }} has been cancelled."),
    (
        "cancelled.kitchen",
        "Order {{ order_id }} for room {{ room }} was cancelled. Stop preparation.",
    ),
    (
        "cancelled.management",
        "Order {{ order_id }} for room {{ room }} ({{ currency }}{{ total }}) was cancelled.",
    ),
    (
        "cancelled.delivery",
        "Order {{ order_id }} for room {{ room }} was cancelled. Do not deliver.",
    ),
];

const GENERIC_TEMPLATE: &str = "Order {{ order_id }} for room {{ room }} is now {{ status }}.";

/// Renders notification messages.
///
/// Built-in templates can be overridden per key from configuration. A
/// template that fails to render falls back to a plain status line.
pub struct MessageTemplates {
    env: Environment<'static>,
    overrides: HashMap<String, String>,
    currency_symbol: String,
}

impl MessageTemplates {
    pub fn new(overrides: HashMap<String, String>, currency_symbol: impl Into<String>) -> Self {
        Self {
            env: Environment::new(),
            overrides,
            currency_symbol: currency_symbol.into(),
        }
    }

    fn source_for(&self, key: &str) -> &str {
        self.overrides
            .get(key)
            .map(String::as_str)
            .or_else(|| {
                DEFAULT_TEMPLATES
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, source)| *source)
            })
            .unwrap_or(GENERIC_TEMPLATE)
    }

    pub fn render(&self, intent: &NotificationIntent) -> String {
        let key = intent.template_key();
        let order = &intent.order;
        let ctx = context! {
            order_id => order.short_id(),
            room => &order.room_number,
            total => order.total.to_string(),
            currency => &self.currency_symbol,
            items => order.item_summary(),
            instructions => order.special_instructions.as_deref().unwrap_or(""),
            status => intent.status.to_string(),
        };

        match self.env.render_str(self.source_for(&key), ctx) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("[MessageTemplates] failed to render '{key}': {e}");
                format!(
                    "Order {} for room {} is now {}.",
                    order.short_id(),
                    order.room_number,
                    intent.status
                )
            }
        }
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self::new(HashMap::new(), "$")
    }
}
