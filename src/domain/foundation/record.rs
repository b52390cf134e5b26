//! Log records on both sides of the broker.

use std::fmt;

/// A record as read from the log by a consumer.
///
/// Partition and offset are diagnostic only; application logic routes on
/// `key` and decodes `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Option<String>,
    pub value: Option<Vec<u8>>,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl Record {
    /// Routing key, or an empty string for keyless records.
    pub fn key_str(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    /// Value as UTF-8 text, replacing invalid sequences.
    pub fn value_str(&self) -> Option<std::borrow::Cow<'_, str>> {
        self.value.as_deref().map(String::from_utf8_lossy)
    }

    /// True when the value is absent or only whitespace.
    ///
    /// Such records are treated as no-ops rather than errors.
    pub fn is_tombstone(&self) -> bool {
        match &self.value {
            None => true,
            Some(bytes) => bytes.iter().all(|b| b.is_ascii_whitespace()),
        }
    }

    /// Where this record lives in the log.
    pub fn coordinates(&self) -> RecordCoordinates {
        RecordCoordinates {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }
}

/// Topic/partition/offset triple, used for logging and delivery reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordCoordinates {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl fmt::Display for RecordCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.topic, self.partition, self.offset)
    }
}

/// A record handed to a producer client: key plus JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerRecord {
    pub topic: String,
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Option<&str>) -> Record {
        Record {
            key: Some("CreatePersonEvent".to_string()),
            value: value.map(|v| v.as_bytes().to_vec()),
            topic: "app-global-topic".to_string(),
            partition: 2,
            offset: 41,
        }
    }

    #[test]
    fn missing_or_blank_values_are_tombstones() {
        assert!(record(None).is_tombstone());
        assert!(record(Some("")).is_tombstone());
        assert!(record(Some("  \n\t")).is_tombstone());
        assert!(!record(Some("{}")).is_tombstone());
    }

    #[test]
    fn keyless_record_has_empty_key() {
        let mut r = record(Some("{}"));
        r.key = None;
        assert_eq!(r.key_str(), "");
    }

    #[test]
    fn coordinates_display_as_topic_partition_offset() {
        assert_eq!(record(None).coordinates().to_string(), "app-global-topic/2@41");
    }
}
