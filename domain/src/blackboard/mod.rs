//! Per-request shared workspace
//!
//! A string-keyed map of JSON values that plan steps read from and write
//! to. Every mutation goes through one re-entrant lock and is recorded in an
//! append-only history.

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// Kind of mutation recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackboardOp {
    Set,
    Update,
    Append,
}

/// One history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackboardEntry {
    pub sequence: usize,
    pub op: BlackboardOp,
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Default)]
struct State {
    values: HashMap<String, Value>,
    history: Vec<BlackboardEntry>,
}

impl State {
    fn record(&mut self, op: BlackboardOp, key: &str, value: Value) {
        let sequence = self.history.len();
        self.history.push(BlackboardEntry {
            sequence,
            op,
            key: key.to_string(),
            value,
        });
    }
}

/// Thread-safe key/value workspace scoped to one request
#[derive(Debug, Default)]
pub struct Blackboard {
    state: ReentrantMutex<RefCell<State>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.values.insert(key.to_string(), value.clone());
        state.record(BlackboardOp::Set, key, value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.values.get(key).cloned()
    }

    /// String value stored under `key`, if it is one
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn contains(&self, key: &str) -> bool {
        let guard = self.state.lock();
        let contains = guard.borrow().values.contains_key(key);
        contains
    }

    /// Replace the value under `key` with `f(current)`.
    ///
    /// The lock is held for the whole read-modify-write; `f` may read the
    /// blackboard again but must not mutate it.
    pub fn update<F>(&self, key: &str, f: F) -> Value
    where
        F: FnOnce(Option<Value>) -> Value,
    {
        let guard = self.state.lock();
        let current = guard.borrow().values.get(key).cloned();
        let next = f(current);
        let mut state = guard.borrow_mut();
        state.values.insert(key.to_string(), next.clone());
        state.record(BlackboardOp::Update, key, next.clone());
        next
    }

    /// Push `item` onto the list under `key`, creating the list if needed.
    ///
    /// A non-list value already stored there becomes the first element.
    pub fn append(&self, key: &str, item: impl Into<Value>) -> usize {
        let item = item.into();
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let slot = state
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            let previous = slot.take();
            *slot = Value::Array(vec![previous]);
        }
        let len = match slot {
            Value::Array(items) => {
                items.push(item.clone());
                items.len()
            }
            _ => 0,
        };
        state.record(BlackboardOp::Append, key, item);
        len
    }

    /// Point-in-time copy of every value, ordered by key
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn history(&self) -> Vec<BlackboardEntry> {
        let guard = self.state.lock();
        let history = guard.borrow().history.clone();
        history
    }
}
