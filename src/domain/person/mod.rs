//! Person events - the vocabulary exchanged between the person API and the
//! person cache service.

mod events;
mod ids;

pub use events::{
    create_person_event, delete_person_event, update_person_event, CreatePersonData,
    UpdatePersonData, CREATE_PERSON_EVENT, DELETE_PERSON_EVENT, UPDATE_PERSON_EVENT,
};
pub use ids::PersonId;
