use serde::{Deserialize, Serialize};

use crate::{KeyValue, ModelError};

/// Environment overrides applied on top of the orchestrator's own environment.
///
/// Stored as an ordered list of key–value pairs and serialized as a transparent array.
/// Later entries override earlier ones with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobEnv(Vec<KeyValue>);

impl JobEnv {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Create an environment containing a single key–value pair.
    pub fn single<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(vec![KeyValue::new(key, value)])
    }

    /// Iterate over all entries in insertion order, overridden ones included.
    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Value for a key, resolved from the last matching entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    /// Append an entry. Later entries win when queried via [`JobEnv::get`].
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Effective key–value pairs: one per key, ordered by first appearance, carrying the last value.
    pub fn resolved(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::with_capacity(self.0.len());
        for kv in &self.0 {
            match out.iter_mut().find(|(k, _)| *k == kv.key()) {
                Some(slot) => slot.1 = kv.value(),
                None => out.push((kv.key(), kv.value())),
            }
        }
        out
    }

    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        for kv in &self.0 {
            if kv.key().is_empty() || kv.key().contains('=') {
                return Err(ModelError::InvalidEnvKey(kv.key().to_string()));
            }
            if kv.key().contains('\0') || kv.value().contains('\0') {
                return Err(ModelError::NulByte { field: "env" });
            }
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for JobEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| KeyValue::new(k, v)).collect())
    }
}
