//! Parameter bag for bulk substitution

use super::binding::{EntityBindings, SqlEntity};
use super::error::{MapperError, Result};
use super::value::SqlValue;

/// Named values applied to a query in one lenient pass
///
/// Keys are case-sensitive and kept in insertion order. [`SqlParameters::add`] keeps the
/// first value written for a key, [`SqlParameters::set`] overwrites.
///
/// Placeholders match names case-insensitively, so a bag holding both `Name` and `name`
/// fills `{name}` from whichever of the two was inserted first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlParameters {
    values: Vec<(String, SqlValue)>,
}

impl SqlParameters {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bag holding a single parameter
    pub fn single(key: impl Into<String>, value: impl Into<SqlValue>) -> Result<Self> {
        let mut params = Self::new();
        params.add(key, value)?;
        Ok(params)
    }

    /// Build a bag from the non-ignored bindings of an entity, keyed by column name
    ///
    /// Fails with [`MapperError::NotNullViolation`] if a required or not-null property
    /// holds null.
    pub fn from_entity<T: SqlEntity>(entity: &T) -> Result<Self> {
        let bindings = EntityBindings::<T>::resolve()?;
        let mut params = Self::new();
        for binding in bindings.active() {
            let value = binding.read(entity);
            if value.is_null() && (binding.is_not_null() || binding.is_required()) {
                return Err(MapperError::not_null(
                    bindings.entity_name(),
                    binding.column_name(),
                ));
            }
            params.add(binding.column_name(), value)?;
        }
        Ok(params)
    }

    /// Add a parameter unless the key is already present
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<SqlValue>) -> Result<&mut Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(MapperError::empty_argument("key"));
        }
        if !self.contains(&key) {
            self.values.push((key, value.into()));
        }
        Ok(self)
    }

    /// Insert or overwrite a parameter; an overwritten key keeps its position
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SqlValue>) -> Result<&mut Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(MapperError::empty_argument("key"));
        }
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value.into(),
            None => self.values.push((key, value.into())),
        }
        Ok(self)
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.values.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First value, in insertion order, whose key equals `name` ignoring ASCII case
    pub fn get_ignore_case(&self, name: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Remove a parameter
    pub fn remove(&mut self, key: &str) -> Option<SqlValue> {
        let index = self.values.iter().position(|(k, _)| k == key)?;
        Some(self.values.remove(index).1)
    }

    /// Check if the key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.iter().any(|(k, _)| k == key)
    }

    /// Iterate over all parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the bag has no parameters
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for SqlParameters {
    /// Collects pairs with first-write-wins semantics; empty keys are skipped
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            let key = key.into();
            if !key.is_empty() && !params.contains(&key) {
                params.values.push((key, value.into()));
            }
        }
        params
    }
}
