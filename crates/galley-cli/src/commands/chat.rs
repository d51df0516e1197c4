//! Terminal simulator: guest messages in, replies and outbound notifications out.
//!
//! Lines starting with `/` are staff commands:
//!
//! ```text
//! /orders                       list active orders
//! /status <order-id> <status>   move an order (id prefix is enough)
//! /order <room> <id>x<qty>...   place an order directly
//! /refresh                      reload the catalog
//! /quit
//! ```

use super::utils::{channel, load_config};
use anyhow::{Context, Result, anyhow, bail};
use galley_application::{Collaborators, OrderIntakeService, Utterance};
use galley_core::catalog::ItemId;
use galley_core::llm::LanguageModel;
use galley_core::order::{Order, OrderStatus};
use galley_execution::Workers;
use galley_infrastructure::{InMemoryStore, LoggingMessenger, TomlCatalogRepository};
use galley_interaction::OpenAiChatModel;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(catalog: &Path, config: Option<&Path>, voice: bool, from: &str) -> Result<()> {
    let config = load_config(config)?;
    let catalog = Arc::new(TomlCatalogRepository::new(catalog));
    let store = Arc::new(InMemoryStore::new());
    let messenger = Arc::new(LoggingMessenger::new());

    let language_model: Option<Arc<dyn LanguageModel>> = if config.llm.enabled {
        Some(Arc::new(OpenAiChatModel::from_config(&config.llm)?))
    } else {
        None
    };

    let service = Arc::new(OrderIntakeService::new(
        &config,
        Collaborators {
            catalog: catalog.clone(),
            rooms: catalog,
            orders: store.clone(),
            notification_log: store,
            messenger: messenger.clone(),
            language_model,
        },
    ));
    let items = service
        .refresh_catalog()
        .await
        .context("Failed to load catalog")?;
    let workers = Workers::start(service.clone(), &config.session);

    println!("{items} items on the menu. Type a message, or /quit.");
    let channel = channel(voice);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{from}> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        let outcome = if let Some(command) = line.strip_prefix('/') {
            staff_command(&service, command).await
        } else {
            let utterance = Utterance::new(from, channel, line).with_sender(from);
            service
                .handle_utterance(utterance)
                .await
                .map(|reply| {
                    println!("galley: {}", reply.reply);
                    if reply.handoff {
                        println!("  (handed off to staff)");
                    }
                })
                .map_err(|e| anyhow!("Sorry, something went wrong on our side: {e}"))
        };
        if let Err(e) = outcome {
            println!("error: {e}");
        }

        for entry in messenger.drain().await {
            println!("  -> {}: {}", entry.recipient, entry.message);
        }
    }

    workers.shutdown().await;
    Ok(())
}

async fn staff_command(service: &OrderIntakeService, command: &str) -> Result<()> {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("orders") => {
            let orders = service.active_orders().await?;
            if orders.is_empty() {
                println!("no active orders");
            }
            for order in orders {
                print_order(&order);
            }
        }
        Some("status") => {
            let (Some(id), Some(status)) = (parts.next(), parts.next()) else {
                bail!("usage: /status <order-id> <status>");
            };
            let status = OrderStatus::from_str(status)
                .map_err(|_| anyhow!("unknown status '{status}'"))?;
            let order_id = resolve_order_id(service, id).await?;
            let order = service.set_order_status(&order_id, status).await?;
            print_order(&order);
        }
        Some("order") => {
            let room = parts.next().context("usage: /order <room> <id>x<qty>...")?;
            let items = parts.map(parse_item).collect::<Result<Vec<_>>>()?;
            let order = service.create_order_direct(room, &items, None).await?;
            print_order(&order);
        }
        Some("refresh") => {
            let items = service.refresh_catalog().await?;
            println!("{items} items on the menu");
        }
        _ => bail!("unknown command '/{command}'"),
    }
    Ok(())
}

/// Accepts a full order id or a unique prefix of an active one.
async fn resolve_order_id(service: &OrderIntakeService, id: &str) -> Result<String> {
    let matches: Vec<String> = service
        .active_orders()
        .await?
        .into_iter()
        .map(|order| order.id)
        .filter(|order_id| order_id.starts_with(id))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.clone()),
        [] => Ok(id.to_string()),
        _ => bail!("order id '{id}' is ambiguous"),
    }
}

/// Parses `12x2` (item 12, quantity 2) or `12` (quantity 1).
fn parse_item(token: &str) -> Result<(ItemId, u32)> {
    let (id, quantity) = token.split_once('x').unwrap_or((token, "1"));
    let id = id
        .parse()
        .with_context(|| format!("invalid item id in '{token}'"))?;
    let quantity = quantity
        .parse()
        .with_context(|| format!("invalid quantity in '{token}'"))?;
    Ok((id, quantity))
}

fn print_order(order: &Order) {
    println!(
        "  {} room {} [{}] {} total {}",
        order.short_id(),
        order.room_number,
        order.status,
        order.item_summary(),
        order.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_defaults_quantity_to_one() {
        assert_eq!(parse_item("12x3").unwrap(), (12, 3));
        assert_eq!(parse_item("7").unwrap(), (7, 1));
        assert!(parse_item("x2").is_err());
        assert!(parse_item("3xmany").is_err());
    }
}
