//! Common type aliases for entity identifiers.
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability at call
//! sites: a function taking a [`GardenId`] and a [`PlantId`] is much harder
//! to call with the arguments swapped by accident when the signature says so.

use uuid::Uuid;

pub type UserId = Uuid;
pub type GardenId = Uuid;
pub type PlantId = Uuid;
pub type NoteId = Uuid;
pub type PostId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs.
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviates_to_eight_chars() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
