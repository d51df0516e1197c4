use super::*;
use async_trait::async_trait;
use galley_core::error::{GalleyError, Result};
use galley_core::order::{Order, OrderLine, OrderSource, OrderStatus};
use galley_core::room::Room;
use galley_infrastructure::InMemoryStore;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Mutex;

// Mock OutboundMessenger recording sends and failing for chosen recipients
#[derive(Default)]
struct MockMessenger {
    sent: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl MockMessenger {
    fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutboundMessenger for MockMessenger {
    async fn send(&self, recipient: &str, message: &str) -> Result<()> {
        if self.failing.contains(recipient) {
            return Err(GalleyError::messaging(recipient, "gateway timeout"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), message.to_string()));
        Ok(())
    }
}

fn order(status: OrderStatus) -> Order {
    let now = Utc::now();
    Order {
        id: "7d1e4b2a-1111-4000-8000-000000000000".to_string(),
        room_number: "412".to_string(),
        lines: vec![OrderLine {
            item_id: 8,
            name: "Coffee".to_string(),
            quantity: 2,
            unit_price: Decimal::new(399, 2),
        }],
        total: Decimal::new(798, 2),
        status,
        special_instructions: None,
        source: OrderSource::Direct,
        created_at: now,
        updated_at: now,
    }
}

fn setup(
    messenger: MockMessenger,
    config: NotificationConfig,
) -> (NotificationDispatcher, Arc<MockMessenger>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::seeded(
        vec![],
        vec![Room::new("412").with_phone("+15550100412")],
    ));
    let messenger = Arc::new(messenger);
    let dispatcher = NotificationDispatcher::new(
        messenger.clone(),
        store.clone(),
        store.clone(),
        config,
        "$",
    );
    (dispatcher, messenger, store)
}

#[tokio::test]
async fn test_ready_with_unresolved_delivery_sends_only_to_guest() {
    let (dispatcher, messenger, store) =
        setup(MockMessenger::default(), NotificationConfig::default());
    let ready = order(OrderStatus::Ready);

    let reports = dispatcher
        .dispatch_all(vec![
            NotificationIntent::immediate(&ready, Audience::Guest),
            NotificationIntent::immediate(&ready, Audience::Delivery),
        ])
        .await;

    assert_eq!(messenger.sent().len(), 1);
    assert_eq!(messenger.sent()[0].0, "+15550100412");

    let log = store.list_for_order(&ready.id).await.unwrap();
    assert_eq!(log.len(), 2);
    let unresolved: Vec<_> = log
        .iter()
        .filter(|r| r.outcome == DeliveryOutcome::RecipientUnresolved)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].audience, Audience::Delivery);
    assert_eq!(unresolved[0].recipient, None);

    assert!(reports.iter().all(|r| r.failed() == 0));
}

#[tokio::test]
async fn test_fan_out_isolates_failing_recipient() {
    let config = NotificationConfig {
        kitchen: vec!["+1001".into(), "+1002".into(), "+1003".into()],
        ..Default::default()
    };
    let (dispatcher, messenger, store) = setup(MockMessenger::failing_for(&["+1002"]), config);
    let confirmed = order(OrderStatus::Confirmed);

    let report = dispatcher
        .dispatch(&NotificationIntent::immediate(&confirmed, Audience::Kitchen))
        .await;

    assert_eq!(report.sent(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(messenger.sent().len(), 2);

    let log = store.list_for_order(&confirmed.id).await.unwrap();
    assert_eq!(log.len(), 3);
    let failed = log
        .iter()
        .find(|r| r.recipient.as_deref() == Some("+1002"))
        .unwrap();
    assert!(matches!(failed.outcome, DeliveryOutcome::Failed(_)));
}

#[tokio::test]
async fn test_guest_without_phone_is_unresolved() {
    let (dispatcher, messenger, store) =
        setup(MockMessenger::default(), NotificationConfig::default());
    store.add_room(Room::new("500")).await;
    let mut no_phone = order(OrderStatus::Preparing);
    no_phone.room_number = "500".to_string();

    let report = dispatcher
        .dispatch(&NotificationIntent::immediate(&no_phone, Audience::Guest))
        .await;

    assert_eq!(report.unresolved(), 1);
    assert!(messenger.sent().is_empty());
}

#[tokio::test]
async fn test_rendered_message_is_sent_and_logged() {
    let (dispatcher, messenger, store) =
        setup(MockMessenger::default(), NotificationConfig::default());
    let ready = order(OrderStatus::Ready);

    let report = dispatcher
        .dispatch(&NotificationIntent::immediate(&ready, Audience::Guest))
        .await;

    assert_eq!(
        report.message,
        "Your order 7d1e4b2a is ready and on its way to room 412."
    );
    assert_eq!(messenger.sent()[0].1, report.message);
    assert_eq!(store.notification_log().await[0].message, report.message);
}

#[tokio::test]
async fn test_delayed_follow_up_is_sent_after_delay() {
    let (dispatcher, messenger, _) =
        setup(MockMessenger::default(), NotificationConfig::default());
    let delivered = order(OrderStatus::Delivered);

    let reports = dispatcher
        .dispatch_all(vec![NotificationIntent::follow_up(
            &delivered,
            Audience::Guest,
            Duration::from_millis(20),
        )])
        .await;
    assert!(reports.is_empty());
    assert!(messenger.sent().is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(messenger.sent().len(), 1);
    assert!(messenger.sent()[0].1.starts_with("How was everything"));
}

#[tokio::test]
async fn test_shutdown_cancels_pending_follow_up() {
    let (dispatcher, messenger, store) =
        setup(MockMessenger::default(), NotificationConfig::default());
    let delivered = order(OrderStatus::Delivered);

    dispatcher.schedule_delayed(
        NotificationIntent::follow_up(&delivered, Audience::Guest, Duration::from_millis(200)),
        Duration::from_millis(200),
    );
    dispatcher.shutdown();
    assert!(dispatcher.is_shut_down());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(messenger.sent().is_empty());
    assert!(store.notification_log().await.is_empty());
}

#[tokio::test]
async fn test_empty_audience_resolves_to_recipient_unresolved() {
    let (dispatcher, _, _) = setup(MockMessenger::default(), NotificationConfig::default());
    let ready = order(OrderStatus::Ready);

    let err = dispatcher
        .resolve_recipients(&NotificationIntent::immediate(&ready, Audience::Delivery))
        .await
        .unwrap_err();
    assert!(err.is_recipient_unresolved());

    let guest = dispatcher
        .resolve_recipients(&NotificationIntent::immediate(&ready, Audience::Guest))
        .await
        .unwrap();
    assert_eq!(guest, vec!["+15550100412".to_string()]);
}
