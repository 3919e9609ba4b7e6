pub mod event;
pub mod message;
pub mod user;

pub use event::Event;
pub use message::Message;
pub use user::User;
