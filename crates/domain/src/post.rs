use serde::{Deserialize, Serialize};

use crate::value_objects::{PostContent, PostId, Timestamp, UserId};

/// 帖子实体，JSON 字段沿用客户端约定的 camelCase。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub post_content: PostContent,
    pub created_at: Timestamp,
}

impl Post {
    pub fn new(id: PostId, user_id: UserId, post_content: PostContent, now: Timestamp) -> Self {
        Self {
            id,
            user_id,
            post_content,
            created_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn edit(&mut self, content: PostContent) {
        self.post_content = content;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn post_serializes_with_camel_case_fields() {
        let author = UserId::from(Uuid::new_v4());
        let post = Post::new(
            PostId::from(Uuid::new_v4()),
            author,
            PostContent::parse("hello").unwrap(),
            chrono::Utc::now(),
        );

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["postContent"], "hello");
        assert_eq!(json["userId"], author.to_string());
        assert!(json.get("createdAt").is_some());
        assert!(post.is_owned_by(author));
        assert!(!post.is_owned_by(UserId::from(Uuid::new_v4())));
    }
}
