//! Cache key conventions.

use std::fmt::Display;

/// Key a person is cached under: `"persons:#<id>"`.
pub fn person_key(id: impl Display) -> String {
    format!("persons:#{}", id)
}
