//! Message registry persistence

use sqlx::sqlite::SqlitePool;
use voiceboard_common::protocol::Message;

use crate::db::sql;

/// Row type for message queries
type MessageRow = (i64, String, String);

fn message_from_row(row: MessageRow) -> Message {
    Message {
        id: row.0 as u64,
        author: row.1,
        created_at: row.2,
    }
}

/// Database access for the message registry
#[derive(Debug, Clone)]
pub struct MessageDb {
    pool: SqlitePool,
}

impl MessageDb {
    /// Create a new MessageDb instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all messages ordered by id (oldest first)
    pub async fn get_all_messages(&self) -> Result<Vec<Message>, sqlx::Error> {
        let rows: Vec<MessageRow> = sqlx::query_as(sql::SQL_SELECT_ALL_MESSAGES)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(message_from_row).collect())
    }

    /// Insert a message with its already-assigned id
    pub async fn insert_message(&self, message: &Message) -> Result<(), sqlx::Error> {
        sqlx::query(sql::SQL_INSERT_MESSAGE)
            .bind(message.id as i64)
            .bind(&message.author)
            .bind(&message.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    fn message(id: u64, author: &str) -> Message {
        Message {
            id,
            author: author.to_string(),
            created_at: "2026-10-18T09:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_in_id_order() {
        let dir = TempDir::new().unwrap();
        let db = MessageDb::new(init_db(&dir.path().join("test.db")).await.unwrap());

        db.insert_message(&message(2, "bob")).await.unwrap();
        db.insert_message(&message(1, "alice")).await.unwrap();

        let all = db.get_all_messages().await.unwrap();
        assert_eq!(all, vec![message(1, "alice"), message(2, "bob")]);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let dir = TempDir::new().unwrap();
        let db = MessageDb::new(init_db(&dir.path().join("test.db")).await.unwrap());

        db.insert_message(&message(1, "alice")).await.unwrap();
        assert!(db.insert_message(&message(1, "mallory")).await.is_err());
        assert_eq!(db.get_all_messages().await.unwrap().len(), 1);
    }
}
