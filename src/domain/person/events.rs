//! Person event keys, payloads and envelope constructors.

use serde::{Deserialize, Serialize};

use super::PersonId;
use crate::domain::foundation::{Envelope, EventKey};

/// Emitted when a client asks for a person to be created.
pub const CREATE_PERSON_EVENT: &str = "CreatePersonEvent";

/// Emitted when a client updates an existing person.
pub const UPDATE_PERSON_EVENT: &str = "UpdatePersonEvent";

/// Emitted when a client deletes a person. The payload is the bare id.
pub const DELETE_PERSON_EVENT: &str = "DeletePersonEvent";

/// Payload of [`CREATE_PERSON_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePersonData {
    pub name: String,
    pub age: u32,
}

/// Payload of [`UPDATE_PERSON_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePersonData {
    pub id: PersonId,
    pub name: String,
    pub age: u32,
}

pub fn create_person_event(data: CreatePersonData) -> Envelope<CreatePersonData> {
    Envelope::with_key(EventKey::from_static(CREATE_PERSON_EVENT), data)
}

pub fn update_person_event(data: UpdatePersonData) -> Envelope<UpdatePersonData> {
    Envelope::with_key(EventKey::from_static(UPDATE_PERSON_EVENT), data)
}

pub fn delete_person_event(id: PersonId) -> Envelope<PersonId> {
    Envelope::with_key(EventKey::from_static(DELETE_PERSON_EVENT), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_person_payload_matches_wire_shape() {
        let data: CreatePersonData =
            serde_json::from_value(json!({"name": "John", "age": 31})).unwrap();
        assert_eq!(
            data,
            CreatePersonData {
                name: "John".to_string(),
                age: 31
            }
        );
    }

    #[test]
    fn update_person_payload_requires_uuid_id() {
        let bad = serde_json::from_value::<UpdatePersonData>(
            json!({"id": "abc", "name": "Jane", "age": 22}),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn constructors_use_matching_keys() {
        let create = create_person_event(CreatePersonData {
            name: "John".to_string(),
            age: 31,
        });
        assert_eq!(create.event_key().as_str(), CREATE_PERSON_EVENT);

        let id = PersonId::new();
        let update = update_person_event(UpdatePersonData {
            id,
            name: "Jane".to_string(),
            age: 22,
        });
        assert_eq!(update.event_key().as_str(), UPDATE_PERSON_EVENT);

        let delete = delete_person_event(id);
        assert_eq!(delete.event_key().as_str(), DELETE_PERSON_EVENT);
        assert_eq!(delete.payload(), &id);
    }
}
