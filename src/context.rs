//! # Saga Execution Context
//!
//! The mutable data bag and positional cursor shared by a saga and all of
//! its steps during one execution. The context is mutated in place and never
//! replaced wholesale; `current_step_index` records the index last started
//! and never decreases during forward execution.
//!
//! All steps share one key namespace. The engine enforces no isolation;
//! steps avoid collisions by convention, typically by prefixing keys with
//! the step name (see [`SagaContext::step_key`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-execution mutable state shared across a saga's steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaContext {
    pub saga_id: Uuid,
    pub aggregate_id: Uuid,
    /// Index of the step last started; `None` until the first step begins
    pub current_step_index: Option<usize>,
    pub start_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
    /// Open string-keyed accumulator passed step to step
    pub data: HashMap<String, Value>,
    pub error: Option<String>,
    pub compensation_reason: Option<String>,
}

impl SagaContext {
    pub fn new(saga_id: Uuid, aggregate_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            saga_id,
            aggregate_id,
            current_step_index: None,
            start_time: now,
            last_update_time: now,
            data: HashMap::new(),
            error: None,
            compensation_reason: None,
        }
    }

    /// Merge caller-supplied input into the data bag (execute semantics:
    /// incoming entries overwrite existing keys)
    pub fn merge_data(&mut self, data: HashMap<String, Value>) {
        self.data.extend(data);
        self.touch();
    }

    /// Insert a single value under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
        self.touch();
    }

    /// Fetch a raw value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Fetch and deserialize a value by key
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Conventional collision-free key for step-scoped data
    pub fn step_key(step_name: &str, key: &str) -> String {
        format!("{step_name}.{key}")
    }

    /// Advance the positional cursor. The cursor only moves forward; a stale
    /// index from a racing reader can never rewind it.
    pub fn advance_to_step(&mut self, index: usize) {
        match self.current_step_index {
            Some(current) if index < current => {}
            _ => self.current_step_index = Some(index),
        }
        self.touch();
    }

    /// Refresh `last_update_time`
    pub fn touch(&mut self) {
        self.last_update_time = Utc::now();
    }

    /// Record a failure message on the context
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> SagaContext {
        SagaContext::new(Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_merge_overwrites_existing_keys() {
        let mut ctx = context();
        ctx.insert("order_id", json!("A-1"));
        ctx.insert("amount", json!(10));

        ctx.merge_data(HashMap::from([
            ("amount".to_string(), json!(25)),
            ("currency".to_string(), json!("EUR")),
        ]));

        assert_eq!(ctx.get("order_id"), Some(&json!("A-1")));
        assert_eq!(ctx.get("amount"), Some(&json!(25)));
        assert_eq!(ctx.get("currency"), Some(&json!("EUR")));
    }

    #[test]
    fn test_cursor_never_decreases() {
        let mut ctx = context();
        ctx.advance_to_step(0);
        ctx.advance_to_step(2);
        ctx.advance_to_step(1);
        assert_eq!(ctx.current_step_index, Some(2));
    }

    #[test]
    fn test_typed_accessor() {
        let mut ctx = context();
        ctx.insert("reservation_count", json!(7));
        assert_eq!(ctx.get_as::<u32>("reservation_count"), Some(7));
        assert_eq!(ctx.get_as::<String>("reservation_count"), None);
    }

    #[test]
    fn test_step_key_convention() {
        assert_eq!(
            SagaContext::step_key("reserve_inventory", "items"),
            "reserve_inventory.items"
        );
    }
}
