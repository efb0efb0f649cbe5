//! Identity types for Agora entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation
/// time — which is what makes the id tie-break in ranking deterministic.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Identifier aliases for the main entity kinds. All are UUIDv7.
pub type UserId = EntityId;
pub type CommunityId = EntityId;
pub type PostId = EntityId;
pub type CommentId = EntityId;
pub type MessageId = EntityId;
pub type NotificationId = EntityId;
pub type ReportId = EntityId;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_v7() {
        let id = new_entity_id();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_entity_ids_are_sortable() {
        let id1 = new_entity_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = new_entity_id();
        // UUIDv7 is lexicographically sortable by creation time
        assert!(id1.to_string() < id2.to_string());
    }
}
