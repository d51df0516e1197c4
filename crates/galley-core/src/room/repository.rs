//! Room repository trait.

use super::model::Room;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Finds a room by guest phone number or by room number.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Room))`: a room matched either key
    /// - `Ok(None)`: nothing matched
    /// - `Err(_)`: storage failure
    async fn find_by_phone_or_number(&self, phone_or_number: &str) -> Result<Option<Room>>;
}
