//! Conversational order intake.
//!
//! `OrderIntakeService` is the engine's public surface: inbound channel
//! adapters hand it utterances, staff tools drive status changes through it.

use crate::notification::NotificationDispatcher;
use galley_core::catalog::{CatalogIndex, CatalogRepository, CatalogSnapshot, FuzzyMatcher, ItemId};
use galley_core::config::{GalleyConfig, IntakeConfig};
use galley_core::error::{GalleyError, Result};
use galley_core::extraction::{Channel, OrderExtractor};
use galley_core::llm::{LanguageModel, menu_prompt, order_section};
use galley_core::notification::{NotificationLogRepository, OutboundMessenger};
use galley_core::order::{
    NewOrder, Order, OrderLifecycle, OrderLine, OrderRepository, OrderSource, OrderStatus,
    Transition, merge_lines, summarize_lines,
};
use galley_core::room::{Room, RoomRepository};
use galley_core::session::{ConversationSession, SessionStore, Turn, TurnRole};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static ROOM_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:room|rm)\.?\s*(?:number\s*|no\.?\s*|#\s*)?(\d{1,5}[a-z]?)\b")
        .expect("room phrase pattern is valid")
});

const CLARIFY_REPLY: &str =
    "Sorry, I didn't catch that. Could you tell me which items you'd like, for example \"two coffees and a Caesar salad\"?";
const HANDOFF_REPLY: &str =
    "I'm having trouble understanding. Let me connect you with a member of our staff.";

/// One inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Call identifier (voice) or phone number (text).
    pub session_key: String,
    pub channel: Channel,
    /// Transcribed or typed text.
    pub text: String,
    /// Caller identity, when the channel knows it.
    pub sender: Option<String>,
}

impl Utterance {
    pub fn new(session_key: impl Into<String>, channel: Channel, text: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            channel,
            text: text.into(),
            sender: None,
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }
}

/// What to say back, and what happened.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceReply {
    pub reply: String,
    /// The order placed on this turn, if any.
    pub order: Option<Order>,
    /// The conversation should be taken over by staff.
    pub handoff: bool,
}

impl UtteranceReply {
    fn say(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            order: None,
            handoff: false,
        }
    }
}

/// External collaborators the service is wired with.
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub notification_log: Arc<dyn NotificationLogRepository>,
    pub messenger: Arc<dyn OutboundMessenger>,
    pub language_model: Option<Arc<dyn LanguageModel>>,
}

enum ModelReply {
    Order(Vec<OrderLine>),
    Chat(String),
}

/// Order intake and fulfillment facade.
pub struct OrderIntakeService {
    catalog: Arc<CatalogIndex>,
    extractor: OrderExtractor,
    sessions: Arc<SessionStore>,
    lifecycle: Arc<OrderLifecycle>,
    dispatcher: NotificationDispatcher,
    rooms: Arc<dyn RoomRepository>,
    language_model: Option<Arc<dyn LanguageModel>>,
    intake: IntakeConfig,
}

impl OrderIntakeService {
    pub fn new(config: &GalleyConfig, collaborators: Collaborators) -> Self {
        let dispatcher = NotificationDispatcher::new(
            collaborators.messenger,
            collaborators.rooms.clone(),
            collaborators.notification_log,
            config.notifications.clone(),
            &config.intake.currency_symbol,
        );

        Self {
            catalog: Arc::new(CatalogIndex::new(collaborators.catalog)),
            extractor: OrderExtractor::new(FuzzyMatcher::new(&config.matching)),
            sessions: Arc::new(SessionStore::new(config.session.max_history)),
            lifecycle: Arc::new(OrderLifecycle::new(
                collaborators.orders,
                config.notifications.follow_up_delay(),
            )),
            dispatcher,
            rooms: collaborators.rooms,
            language_model: collaborators.language_model,
            intake: config.intake.clone(),
        }
    }

    /// Shared session store, for the background sweeper.
    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    pub fn catalog(&self) -> Arc<CatalogIndex> {
        self.catalog.clone()
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Handles one guest message.
    ///
    /// The session is committed even when order creation fails; storage
    /// errors are returned after that so the caller can apologize.
    pub async fn handle_utterance(&self, utterance: Utterance) -> Result<UtteranceReply> {
        let mut lease = self
            .sessions
            .checkout(&utterance.session_key, utterance.channel)
            .await;
        lease
            .session_mut()
            .push_turn(TurnRole::User, utterance.text.clone());

        let result = self.converse(lease.session_mut(), &utterance).await;

        match &result {
            Ok(reply) => lease
                .session_mut()
                .push_turn(TurnRole::Assistant, reply.reply.clone()),
            Err(e) => tracing::warn!(
                key = %utterance.session_key,
                "[OrderIntakeService] utterance failed: {e}"
            ),
        }
        self.sessions.commit(lease).await;
        result
    }

    /// Places an order without a conversation (front desk, room tablet).
    ///
    /// # Errors
    ///
    /// - `InvalidOrder` for unknown or unavailable items, zero quantities or no items
    /// - `Storage` if the order could not be stored
    pub async fn create_order_direct(
        &self,
        room_number: &str,
        items: &[(ItemId, u32)],
        special_instructions: Option<String>,
    ) -> Result<Order> {
        let snapshot = self.current_catalog().await;
        let lines = items
            .iter()
            .map(|&(item_id, quantity)| {
                snapshot
                    .get(item_id)
                    .map(|item| OrderLine::from_item(item, quantity))
                    .ok_or_else(|| {
                        GalleyError::invalid_order(format!("item {item_id} is not on the menu"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let Transition { order, intents, .. } = self
            .lifecycle
            .create(NewOrder {
                room_number: room_number.to_string(),
                lines,
                special_instructions,
                source: OrderSource::Direct,
            })
            .await?;
        self.dispatcher.dispatch_all(intents).await;
        Ok(order)
    }

    /// Moves an order to `status` and notifies the affected audiences.
    pub async fn set_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        let Transition { order, intents, .. } = self.lifecycle.transition(order_id, status).await?;
        self.dispatcher.dispatch_all(intents).await;
        Ok(order)
    }

    /// Reloads the catalog; returns the number of available items.
    pub async fn refresh_catalog(&self) -> Result<usize> {
        Ok(self.catalog.load().await?.len())
    }

    pub async fn find_order(&self, order_id: &str) -> Result<Order> {
        self.lifecycle.find(order_id).await
    }

    /// Orders not yet delivered or cancelled, grouped by status.
    pub async fn active_orders(&self) -> Result<Vec<Order>> {
        let mut active = Vec::new();
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            active.extend(self.lifecycle.list_by_status(status).await?);
        }
        Ok(active)
    }

    /// Cancels pending delayed notifications.
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }

    async fn converse(
        &self,
        session: &mut ConversationSession,
        utterance: &Utterance,
    ) -> Result<UtteranceReply> {
        let room_stated = self.resolve_room(session, utterance).await;
        let snapshot = self.current_catalog().await;

        let text = ROOM_PHRASE.replace_all(&utterance.text, " ");
        let report = self
            .extractor
            .extract_detailed(&text, utterance.channel, &snapshot);
        let note = unresolved_note(&report.unresolved);
        let mut lines = report.lines;
        let mut instructions = report.instructions;

        if lines.is_empty() {
            if room_stated {
                if session.draft.is_empty() {
                    let number = session.room_number().unwrap_or_default();
                    return Ok(UtteranceReply::say(format!(
                        "Thanks, room {number}. What would you like to order?"
                    )));
                }
            } else {
                match self.ask_language_model(session, &snapshot).await {
                    Some(ModelReply::Order(model_lines)) => {
                        lines = model_lines;
                        instructions.clear();
                    }
                    // Conversation without an order still counts toward handoff
                    Some(ModelReply::Chat(reply)) => {
                        return Ok(self
                            .record_miss(session)
                            .unwrap_or_else(|| UtteranceReply::say(reply)));
                    }
                    None => return Ok(self.clarify(session, &note)),
                }
            }
        }

        session.misunderstood_turns = 0;
        self.place_or_hold(session, lines, instructions, &note).await
    }

    /// Resolves the room once per session. Returns whether this utterance
    /// stated the room.
    async fn resolve_room(&self, session: &mut ConversationSession, utterance: &Utterance) -> bool {
        if session.room.is_some() {
            return false;
        }

        if let Some(number) = ROOM_PHRASE
            .captures(&utterance.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        {
            let room = match self.rooms.find_by_phone_or_number(&number).await {
                Ok(Some(room)) => room,
                Ok(None) => {
                    tracing::debug!(room = %number, "[OrderIntakeService] stated room not on file");
                    Room::new(number)
                }
                Err(e) => {
                    tracing::warn!(room = %number, "[OrderIntakeService] room lookup failed: {e}");
                    Room::new(number)
                }
            };
            session.room = Some(room);
            return true;
        }

        let identity = utterance
            .sender
            .as_deref()
            .unwrap_or(utterance.session_key.as_str());
        match self.rooms.find_by_phone_or_number(identity).await {
            Ok(Some(room)) => {
                tracing::debug!(
                    key = %session.key,
                    room = %room.number,
                    "[OrderIntakeService] room resolved from caller"
                );
                session.room = Some(room);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("[OrderIntakeService] room lookup failed: {e}"),
        }
        false
    }

    /// Current snapshot, loading the catalog on first use.
    async fn current_catalog(&self) -> Arc<CatalogSnapshot> {
        if !self.catalog.is_loaded() {
            // Failure is logged by the index; extraction degrades to nothing
            let _ = self.catalog.load().await;
        }
        self.catalog.snapshot()
    }

    async fn ask_language_model(
        &self,
        session: &ConversationSession,
        snapshot: &CatalogSnapshot,
    ) -> Option<ModelReply> {
        let model = self.language_model.as_ref()?;
        let turns: Vec<Turn> = session.turns().cloned().collect();
        let prompt = menu_prompt(snapshot, &self.intake.currency_symbol);

        match model.complete(&prompt, &turns).await {
            Ok(reply) => {
                let Some(section) = order_section(&reply) else {
                    return Some(ModelReply::Chat(reply.trim().to_string()));
                };
                let lines = self.extractor.extract(section, Channel::Text, snapshot);
                if lines.is_empty() {
                    // Never relay an order confirmation that was not placed
                    tracing::warn!(
                        key = %session.key,
                        "[OrderIntakeService] model reply names an order that did not resolve"
                    );
                    return None;
                }
                tracing::debug!(
                    key = %session.key,
                    lines = lines.len(),
                    "[OrderIntakeService] order taken from model reply"
                );
                Some(ModelReply::Order(lines))
            }
            Err(e) => {
                tracing::warn!("[OrderIntakeService] language model unavailable: {e}");
                None
            }
        }
    }

    fn clarify(&self, session: &mut ConversationSession, note: &str) -> UtteranceReply {
        if let Some(handoff) = self.record_miss(session) {
            return handoff;
        }
        if note.is_empty() {
            UtteranceReply::say(CLARIFY_REPLY)
        } else {
            UtteranceReply::say(format!("Sorry!{note} Could you choose something else?"))
        }
    }

    /// Counts a turn that placed nothing. Returns the handoff reply once
    /// `max_clarifications` consecutive misses are reached.
    fn record_miss(&self, session: &mut ConversationSession) -> Option<UtteranceReply> {
        session.misunderstood_turns += 1;
        if session.misunderstood_turns < self.intake.max_clarifications.max(1) {
            return None;
        }
        tracing::info!(
            key = %session.key,
            misses = session.misunderstood_turns,
            "[OrderIntakeService] handing conversation off to staff"
        );
        session.misunderstood_turns = 0;
        Some(UtteranceReply {
            reply: HANDOFF_REPLY.to_string(),
            order: None,
            handoff: true,
        })
    }

    /// Creates the order when the room is known, otherwise keeps the lines
    /// and instructions as a draft and asks for the room.
    async fn place_or_hold(
        &self,
        session: &mut ConversationSession,
        lines: Vec<OrderLine>,
        instructions: Vec<String>,
        note: &str,
    ) -> Result<UtteranceReply> {
        let mut combined = std::mem::take(&mut session.draft);
        combined.extend(lines);
        let combined = merge_lines(combined);
        session.draft_instructions.extend(instructions);

        let Some(room_number) = session.room_number().map(str::to_string) else {
            let reply = format!(
                "Got it: {}.{note} What room number should we deliver to?",
                summarize_lines(&combined)
            );
            session.draft = combined;
            return Ok(UtteranceReply::say(reply));
        };

        let created = self
            .lifecycle
            .create(NewOrder {
                room_number,
                lines: combined.clone(),
                special_instructions: (!session.draft_instructions.is_empty())
                    .then(|| session.draft_instructions.join("; ")),
                source: OrderSource::Conversation {
                    session_key: session.key.clone(),
                },
            })
            .await;
        let Transition { order, intents, .. } = match created {
            Ok(transition) => transition,
            Err(e) => {
                // Keep the lines so the guest does not have to repeat them
                session.draft = combined;
                return Err(e);
            }
        };

        session.order_ids.push(order.id.clone());
        session.draft_instructions.clear();
        self.dispatcher.dispatch_all(intents).await;

        let reply = format!(
            "Thanks! Order {} for room {}: {}. Total {}{}.{note}",
            order.short_id(),
            order.room_number,
            order.item_summary(),
            self.intake.currency_symbol,
            order.total
        );
        Ok(UtteranceReply {
            reply,
            order: Some(order),
            handoff: false,
        })
    }
}

fn unresolved_note(unresolved: &[String]) -> String {
    if unresolved.is_empty() {
        String::new()
    } else {
        format!(" I couldn't find {} on the menu.", unresolved.join(", "))
    }
}

#[cfg(test)]
#[path = "intake_service_test.rs"]
mod tests;
