//! Room (guest identity) domain module.

mod model;
mod repository;

pub use model::Room;
pub use repository::RoomRepository;
