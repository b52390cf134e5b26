//! Person cache handlers.
//!
//! Keep the person cache in step with the person events published by the
//! API side: creates and updates write the person under
//! `persons:#<id>`, deletes invalidate that key.

mod create_person;
mod delete_person;
mod update_person;

pub use create_person::CreatePersonHandler;
pub use delete_person::DeletePersonHandler;
pub use update_person::UpdatePersonHandler;
