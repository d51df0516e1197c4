//! Order domain module.
//!
//! - `model`: `Order`, `OrderLine`, `OrderStatus`
//! - `repository`: persistence contract (`OrderRepository`)
//! - `lifecycle`: status state machine emitting notification intents

mod lifecycle;
mod model;
mod repository;

pub use lifecycle::{NewOrder, OrderLifecycle, Transition, audiences_for};
pub use model::{
    Order, OrderId, OrderLine, OrderSource, OrderStatus, lines_total, merge_lines, summarize_lines,
};
pub use repository::OrderRepository;
