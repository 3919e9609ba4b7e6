use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Event, Message, User};

/// Outward account shape. Never carries the credential hash; roles are an
/// ordered sequence of string tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        let mut roles = user.roles;
        roles.sort();
        roles.dedup();
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            roles,
            created_at: user.created_at,
        }
    }
}

/// Outward event shape; also the unit stored in cached feed pages, so a
/// cache hit reproduces exactly what was serialized at cache-write time.
/// The author is carried by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDto {
    pub event_id: Uuid,
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    pub photo: Option<String>,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventDto {
    fn from(event: Event) -> Self {
        Self {
            event_id: event.event_id,
            title: event.title,
            text: event.text,
            author_id: event.author_id,
            photo: event.photo,
            likes: event.likes,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.message_id,
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            text: message.text,
            created_at: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn user_dto_never_exposes_credential_and_sorts_roles() {
        let user = User {
            user_id: Uuid::new_v4(),
            name: "n".into(),
            email: "e@example.com".into(),
            hashed_password: "$argon2id$secret".into(),
            roles: vec![
                "ROLE_PORTAL_USER".into(),
                "ROLE_PORTAL_ADMIN".into(),
                "ROLE_PORTAL_USER".into(),
            ],
            created_at: Utc::now(),
        };

        let dto = UserDto::from(user);
        assert_eq!(
            dto.roles,
            vec!["ROLE_PORTAL_ADMIN".to_string(), "ROLE_PORTAL_USER".to_string()]
        );

        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("hashed_password"));
    }
}
