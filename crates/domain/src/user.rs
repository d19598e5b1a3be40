use serde::Serialize;

use crate::value_objects::{PasswordHash, Timestamp, UserEmail, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: UserEmail,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub created_at: Timestamp,
}

impl User {
    pub fn register(id: UserId, email: UserEmail, password: PasswordHash, now: Timestamp) -> Self {
        Self {
            id,
            email,
            password,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn serialized_user_hides_password() {
        let user = User::register(
            UserId::from(Uuid::new_v4()),
            UserEmail::parse("alice@example.com").unwrap(),
            PasswordHash::new("$2b$10$hash").unwrap(),
            chrono::Utc::now(),
        );

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password").is_none());
        assert!(json.get("createdAt").is_some());
    }
}
