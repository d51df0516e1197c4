use super::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use galley_core::catalog::CatalogItem;
use galley_core::notification::DeliveryOutcome;
use galley_infrastructure::{InMemoryStore, LoggingMessenger};
use rust_decimal::Decimal;
use std::sync::Mutex;

const GUEST_PHONE: &str = "+15550100412";
const MANAGER_PHONE: &str = "+15559990000";
const KITCHEN_PHONE: &str = "+15558880000";

fn menu() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(1, "Caesar Salad", Decimal::new(1299, 2)),
        CatalogItem::new(2, "Club Sandwich", Decimal::new(1450, 2)),
        CatalogItem::new(8, "Coffee", Decimal::new(399, 2)),
    ]
}

fn config() -> GalleyConfig {
    let mut config = GalleyConfig::default();
    config.notifications.management = vec![MANAGER_PHONE.to_string()];
    config.notifications.kitchen = vec![KITCHEN_PHONE.to_string()];
    config
}

struct Harness {
    service: OrderIntakeService,
    store: Arc<InMemoryStore>,
    messenger: Arc<LoggingMessenger>,
}

fn harness_with(
    config: GalleyConfig,
    language_model: Option<Arc<dyn LanguageModel>>,
    orders: Option<Arc<dyn OrderRepository>>,
) -> Harness {
    let store = Arc::new(InMemoryStore::seeded(
        menu(),
        vec![Room::new("412").with_phone(GUEST_PHONE).with_guest("Ada")],
    ));
    let messenger = Arc::new(LoggingMessenger::new());
    let service = OrderIntakeService::new(
        &config,
        Collaborators {
            catalog: store.clone(),
            rooms: store.clone(),
            orders: orders.unwrap_or_else(|| store.clone() as Arc<dyn OrderRepository>),
            notification_log: store.clone(),
            messenger: messenger.clone(),
            language_model,
        },
    );
    Harness {
        service,
        store,
        messenger,
    }
}

fn harness() -> Harness {
    harness_with(config(), None, None)
}

fn text_from_guest(text: &str) -> Utterance {
    Utterance::new(GUEST_PHONE, Channel::Text, text).with_sender(GUEST_PHONE)
}

fn quantities(order: &Order) -> Vec<(ItemId, u32)> {
    order.lines.iter().map(|l| (l.item_id, l.quantity)).collect()
}

// Mock LanguageModel with a canned reply that records what it was asked
struct MockModel {
    reply: Result<String>,
    calls: Mutex<Vec<(String, Vec<Turn>)>>,
}

impl MockModel {
    fn replying(reply: Result<String>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, system_prompt: &str, turns: &[Turn]) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), turns.to_vec()));
        self.reply.clone()
    }
}

// OrderRepository whose writes always fail
struct FailingOrders;

#[async_trait]
impl OrderRepository for FailingOrders {
    async fn create(&self, _order: &Order) -> Result<()> {
        Err(GalleyError::storage("database is read-only"))
    }

    async fn update_status(
        &self,
        _order_id: &str,
        _status: OrderStatus,
        _updated_at: DateTime<Utc>,
    ) -> Result<()> {
        Err(GalleyError::storage("database is read-only"))
    }

    async fn find_by_id(&self, _order_id: &str) -> Result<Option<Order>> {
        Ok(None)
    }

    async fn list_by_status(&self, _status: OrderStatus) -> Result<Vec<Order>> {
        Ok(Vec::new())
    }
}

// CatalogRepository that is always down
struct UnavailableCatalog;

#[async_trait]
impl CatalogRepository for UnavailableCatalog {
    async fn available_items(&self) -> Result<Vec<CatalogItem>> {
        Err(GalleyError::storage("menu service unreachable"))
    }
}

#[tokio::test]
async fn test_texted_order_is_placed_and_announced() {
    let h = harness();

    let reply = h
        .service
        .handle_utterance(text_from_guest("Two coffees and a Caesar salad"))
        .await
        .unwrap();

    let order = reply.order.expect("order placed");
    assert_eq!(quantities(&order), vec![(8, 2), (1, 1)]);
    assert_eq!(order.total, Decimal::new(2097, 2));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.room_number, "412");
    assert!(!reply.handoff);
    assert!(reply.reply.contains("Total $20.97"));

    let sent = h.messenger.drain().await;
    let recipients: Vec<_> = sent.iter().map(|e| e.recipient.as_str()).collect();
    assert_eq!(recipients, vec![GUEST_PHONE, MANAGER_PHONE]);

    let session = h.service.sessions().get(GUEST_PHONE).await.unwrap();
    assert_eq!(session.turn_count(), 2);
    assert_eq!(session.order_ids, vec![order.id.clone()]);
    assert_eq!(session.room_number(), Some("412"));
}

#[tokio::test]
async fn test_unknown_room_keeps_draft_until_room_is_given() {
    let h = harness();

    let first = h
        .service
        .handle_utterance(Utterance::new(
            "call-1",
            Channel::Voice,
            "two coffees and a caesar salad",
        ))
        .await
        .unwrap();
    assert!(first.order.is_none());
    assert_eq!(
        first.reply,
        "Got it: 2 x Coffee, 1 x Caesar Salad. What room number should we deliver to?"
    );
    let session = h.service.sessions().get("call-1").await.unwrap();
    assert_eq!(session.draft.len(), 2);

    let second = h
        .service
        .handle_utterance(Utterance::new("call-1", Channel::Voice, "room 412"))
        .await
        .unwrap();
    let order = second.order.expect("draft placed");
    assert_eq!(quantities(&order), vec![(8, 2), (1, 1)]);
    assert_eq!(order.room_number, "412");
    assert_eq!(
        order.source,
        OrderSource::Conversation {
            session_key: "call-1".to_string()
        }
    );

    let session = h.service.sessions().get("call-1").await.unwrap();
    assert!(session.draft.is_empty());
    assert_eq!(session.turn_count(), 4);
}

#[tokio::test]
async fn test_room_phrase_in_same_message_is_not_an_item() {
    let h = harness();
    h.store
        .set_items(vec![
            CatalogItem::new(5, "Room Service Breakfast", Decimal::new(2400, 2)),
            CatalogItem::new(8, "Coffee", Decimal::new(399, 2)),
        ])
        .await;

    let reply = h
        .service
        .handle_utterance(Utterance::new(
            "+15550000001",
            Channel::Text,
            "2 coffees please, room 412",
        ))
        .await
        .unwrap();

    let order = reply.order.expect("order placed");
    assert_eq!(quantities(&order), vec![(8, 2)]);
    assert_eq!(order.room_number, "412");
}

#[tokio::test]
async fn test_room_only_message_asks_for_order() {
    let h = harness();
    let reply = h
        .service
        .handle_utterance(Utterance::new("call-9", Channel::Voice, "this is room 412"))
        .await
        .unwrap();
    assert_eq!(reply.reply, "Thanks, room 412. What would you like to order?");
    assert!(!reply.handoff);
}

#[tokio::test]
async fn test_repeated_misunderstanding_hands_off() {
    let h = harness();

    let first = h.service.handle_utterance(text_from_guest("hmm")).await.unwrap();
    assert!(!first.handoff);
    assert_eq!(first.reply, CLARIFY_REPLY);

    let second = h
        .service
        .handle_utterance(text_from_guest("uh, what?"))
        .await
        .unwrap();
    assert!(second.handoff);
    assert_eq!(second.reply, HANDOFF_REPLY);
    assert!(second.order.is_none());
}

#[tokio::test]
async fn test_understood_turn_resets_miss_counter() {
    let h = harness();
    h.service.handle_utterance(text_from_guest("hmm")).await.unwrap();
    h.service
        .handle_utterance(text_from_guest("a coffee"))
        .await
        .unwrap();
    let after = h.service.handle_utterance(text_from_guest("hmm")).await.unwrap();
    assert!(!after.handoff);
}

#[tokio::test]
async fn test_unknown_item_is_named_in_reply() {
    let h = harness();
    let reply = h
        .service
        .handle_utterance(text_from_guest("3 lobsters"))
        .await
        .unwrap();
    assert!(reply.order.is_none());
    assert!(reply.reply.contains("I couldn't find lobsters on the menu."));
}

#[tokio::test]
async fn test_language_model_order_is_extracted() {
    let model = MockModel::replying(Ok(
        "Great choice! Your order:\n- 1 Club Sandwich".to_string()
    ));
    let h = harness_with(config(), Some(model.clone()), None);

    let reply = h
        .service
        .handle_utterance(text_from_guest("something filling for lunch"))
        .await
        .unwrap();

    let order = reply.order.expect("order from model reply");
    assert_eq!(quantities(&order), vec![(2, 1)]);

    let calls = model.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains("- Club Sandwich ($14.50)"));
    assert_eq!(calls[0].1.last().unwrap().text, "something filling for lunch");
}

#[tokio::test]
async fn test_language_model_order_that_does_not_resolve_is_not_confirmed() {
    let model = MockModel::replying(Ok("Lovely. Your order:\n- 2 Lobster Thermidor".to_string()));
    let h = harness_with(config(), Some(model), None);

    let reply = h
        .service
        .handle_utterance(text_from_guest("something fancy for dinner"))
        .await
        .unwrap();

    assert!(reply.order.is_none());
    assert_eq!(reply.reply, CLARIFY_REPLY);
    assert!(h.service.active_orders().await.unwrap().is_empty());
    assert!(h.messenger.drain().await.is_empty());
}

#[tokio::test]
async fn test_language_model_itemized_reply_with_total_places_every_line() {
    let model = MockModel::replying(Ok(
        "Your order:\n- 2 Coffee, 1 Caesar Salad. Total $20.97".to_string()
    ));
    let h = harness_with(config(), Some(model), None);

    let reply = h
        .service
        .handle_utterance(text_from_guest("the usual, please"))
        .await
        .unwrap();

    let order = reply.order.expect("order from model reply");
    assert_eq!(quantities(&order), vec![(8, 2), (1, 1)]);
    assert_eq!(order.total, Decimal::new(2097, 2));
}

#[tokio::test]
async fn test_language_model_chat_still_counts_toward_handoff() {
    let model = MockModel::replying(Ok("Could you tell me more?".to_string()));
    let h = harness_with(config(), Some(model), None);

    let first = h
        .service
        .handle_utterance(text_from_guest("hmm"))
        .await
        .unwrap();
    assert_eq!(first.reply, "Could you tell me more?");
    assert!(!first.handoff);

    let second = h
        .service
        .handle_utterance(text_from_guest("not sure"))
        .await
        .unwrap();
    assert!(second.handoff);
    assert_eq!(second.reply, HANDOFF_REPLY);
}

#[tokio::test]
async fn test_language_model_chat_is_the_reply() {
    let model = MockModel::replying(Ok("We have a Caesar salad or a club sandwich.".to_string()));
    let h = harness_with(config(), Some(model), None);

    let reply = h
        .service
        .handle_utterance(text_from_guest("what do you have for lunch?"))
        .await
        .unwrap();

    assert_eq!(reply.reply, "We have a Caesar salad or a club sandwich.");
    assert!(reply.order.is_none());
    assert!(!reply.handoff);
}

#[tokio::test]
async fn test_language_model_failure_degrades_to_clarification() {
    let model = MockModel::replying(Err(GalleyError::LanguageModel("HTTP 503".into())));
    let h = harness_with(config(), Some(model), None);

    let reply = h.service.handle_utterance(text_from_guest("hmm")).await.unwrap();
    assert_eq!(reply.reply, CLARIFY_REPLY);
}

#[tokio::test]
async fn test_storage_failure_propagates_after_session_commit() {
    let h = harness_with(config(), None, Some(Arc::new(FailingOrders)));

    let err = h
        .service
        .handle_utterance(text_from_guest("two coffees"))
        .await
        .unwrap_err();
    assert!(err.is_storage());
    assert!(err.needs_staff());

    let session = h.service.sessions().get(GUEST_PHONE).await.unwrap();
    assert_eq!(session.turn_count(), 1);
    assert_eq!(session.draft.len(), 1);
    assert!(h.messenger.drain().await.is_empty());
}

#[tokio::test]
async fn test_catalog_outage_degrades_to_clarification() {
    let store = Arc::new(InMemoryStore::new());
    let service = OrderIntakeService::new(
        &config(),
        Collaborators {
            catalog: Arc::new(UnavailableCatalog),
            rooms: store.clone(),
            orders: store.clone(),
            notification_log: store.clone(),
            messenger: Arc::new(LoggingMessenger::new()),
            language_model: None,
        },
    );

    let reply = service
        .handle_utterance(text_from_guest("two coffees"))
        .await
        .unwrap();
    assert!(reply.order.is_none());
    assert_eq!(reply.reply, CLARIFY_REPLY);

    let err = service.refresh_catalog().await.unwrap_err();
    assert!(matches!(err, GalleyError::CatalogUnavailable(_)));
}

#[tokio::test]
async fn test_staff_drive_order_to_delivery() {
    let h = harness();
    let order = h
        .service
        .create_order_direct("412", &[(8, 2)], Some("extra sugar".to_string()))
        .await
        .unwrap();
    assert_eq!(order.special_instructions.as_deref(), Some("extra sugar"));
    h.messenger.drain().await;

    let confirmed = h
        .service
        .set_order_status(&order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    let sent = h.messenger.drain().await;
    let kitchen = sent.iter().find(|e| e.recipient == KITCHEN_PHONE).unwrap();
    assert!(kitchen.message.contains("Note: extra sugar"));

    h.service
        .set_order_status(&order.id, OrderStatus::Preparing)
        .await
        .unwrap();
    h.messenger.drain().await;

    // No delivery staff configured: only the guest hears about it
    h.service
        .set_order_status(&order.id, OrderStatus::Ready)
        .await
        .unwrap();
    let sent = h.messenger.drain().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, GUEST_PHONE);
    let unresolved = h
        .store
        .list_for_order(&order.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.outcome == DeliveryOutcome::RecipientUnresolved)
        .count();
    assert_eq!(unresolved, 1);

    let err = h
        .service
        .set_order_status(&order.id, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(err.is_invalid_transition());
    assert_eq!(
        h.service.find_order(&order.id).await.unwrap().status,
        OrderStatus::Ready
    );
}

#[tokio::test]
async fn test_direct_order_rejects_unknown_item() {
    let h = harness();
    let err = h
        .service
        .create_order_direct("412", &[(8, 1), (99, 1)], None)
        .await
        .unwrap_err();
    assert!(matches!(err, GalleyError::InvalidOrder(_)));
    assert!(h.service.active_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_picks_up_catalog_changes() {
    let h = harness();
    assert_eq!(h.service.refresh_catalog().await.unwrap(), 3);

    let mut items = menu();
    items[2].available = false;
    items.push(CatalogItem::new(9, "Tomato Soup", Decimal::new(650, 2)));
    h.store.set_items(items).await;

    assert_eq!(h.service.refresh_catalog().await.unwrap(), 3);
    assert!(h.service.catalog().lookup_exact("coffee").is_none());
    assert!(h.service.catalog().lookup_exact("tomato soup").is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_messages_from_one_guest_keep_every_turn() {
    let h = harness();
    let service = Arc::new(h.service);

    let handles: Vec<_> = ["a coffee", "a club sandwich", "hmm", "2 coffees"]
        .into_iter()
        .map(|text| {
            let service = service.clone();
            tokio::spawn(async move { service.handle_utterance(text_from_guest(text)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let session = service.sessions().get(GUEST_PHONE).await.unwrap();
    assert_eq!(session.turn_count(), 8);
    assert_eq!(session.order_ids.len(), 3);
}

#[tokio::test]
async fn test_time_clause_keeps_stated_quantity() {
    let h = harness();
    let reply = h
        .service
        .handle_utterance(text_from_guest("2 coffees at 7pm"))
        .await
        .unwrap();
    let order = reply.order.expect("order placed");
    assert_eq!(quantities(&order), vec![(8, 2)]);
}

#[tokio::test]
async fn test_with_clauses_reach_the_kitchen() {
    let h = harness();

    let first = h
        .service
        .handle_utterance(Utterance::new(
            "call-7",
            Channel::Voice,
            "one club sandwich with extra mayo and a coffee without sugar",
        ))
        .await
        .unwrap();
    assert!(first.order.is_none());

    let second = h
        .service
        .handle_utterance(Utterance::new("call-7", Channel::Voice, "room 412"))
        .await
        .unwrap();
    let order = second.order.expect("draft placed");
    assert_eq!(quantities(&order), vec![(2, 1), (8, 1)]);
    assert_eq!(
        order.special_instructions.as_deref(),
        Some("extra mayo; no sugar")
    );
    let session = h.service.sessions().get("call-7").await.unwrap();
    assert!(session.draft_instructions.is_empty());

    h.messenger.drain().await;
    h.service
        .set_order_status(&order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    let sent = h.messenger.drain().await;
    let kitchen = sent.iter().find(|e| e.recipient == KITCHEN_PHONE).unwrap();
    assert!(kitchen.message.contains("Note: extra mayo; no sugar"));
}
