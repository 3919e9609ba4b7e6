pub mod events;
pub mod manager;
pub mod messages;
pub mod models;
pub mod users;

pub use events::EventRepository;
pub use manager::{connect, health_check, migrate};
pub use messages::MessageRepository;
pub use users::{UserChanges, UserRepository};
