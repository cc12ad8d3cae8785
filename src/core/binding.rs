//! Column binding metadata for destination types
//!
//! Rust has no runtime reflection, so every mapped type declares an explicit binding
//! table through [`SqlEntity::bind`]. The table is built once per type and cached for the
//! lifetime of the process.
//!
//! ```rust
//! use sql_data_mapper::prelude::*;
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: Option<String>,
//!     cache: Vec<u8>,
//! }
//!
//! impl SqlEntity for User {
//!     fn bind(b: &mut BindingBuilder<Self>) {
//!         b.field("id", |u| &u.id, |u| &mut u.id).not_null();
//!         b.field("name", |u| &u.name, |u| &mut u.name).alias("user_name");
//!         b.field("cache", |u| &u.cache, |u| &mut u.cache).ignore();
//!     }
//! }
//! ```

use super::error::{MapperError, Result};
use super::value::{FromSqlValue, SqlRow, SqlValue};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A plain data type that can be filled from a result row and read as parameters
pub trait SqlEntity: Default + Send + Sync + 'static {
    /// Declare the column bindings of this type
    fn bind(builder: &mut BindingBuilder<Self>);

    /// Development hook invoked with the raw row before it is mapped
    fn debug_row(_row: &SqlRow) {}
}

type Reader<T> = Box<dyn Fn(&T) -> SqlValue + Send + Sync>;
type Writer<T> =
    Box<dyn Fn(&mut T, &SqlValue) -> std::result::Result<(), &'static str> + Send + Sync>;

/// Binding of one property to one result column
pub struct ColumnBinding<T> {
    property: String,
    column: String,
    ignore: bool,
    required: bool,
    not_null: bool,
    reader: Reader<T>,
    writer: Writer<T>,
}

impl<T> ColumnBinding<T> {
    /// Map the property to a differently named column; an empty alias keeps the property name
    pub fn alias(&mut self, column: impl Into<String>) -> &mut Self {
        let column = column.into();
        if !column.is_empty() {
            self.column = column;
        }
        self
    }

    /// The column must be present in the result
    pub fn required(&mut self) -> &mut Self {
        self.required = true;
        self
    }

    /// The column must be present and must not be null
    pub fn not_null(&mut self) -> &mut Self {
        self.not_null = true;
        self
    }

    /// Exclude the property from mapping in both directions
    pub fn ignore(&mut self) -> &mut Self {
        self.ignore = true;
        self
    }

    pub fn property_name(&self) -> &str {
        &self.property
    }

    pub fn column_name(&self) -> &str {
        &self.column
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    /// Read the property as a value
    pub fn read(&self, entity: &T) -> SqlValue {
        (self.reader)(entity)
    }

    /// Assign a value to the property; on mismatch returns the expected type name
    pub(crate) fn write(
        &self,
        entity: &mut T,
        value: &SqlValue,
    ) -> std::result::Result<(), &'static str> {
        (self.writer)(entity, value)
    }
}

impl<T> fmt::Debug for ColumnBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBinding")
            .field("property", &self.property)
            .field("column", &self.column)
            .field("ignore", &self.ignore)
            .field("required", &self.required)
            .field("not_null", &self.not_null)
            .finish()
    }
}

/// Collects the bindings declared by [`SqlEntity::bind`]
pub struct BindingBuilder<T> {
    columns: Vec<ColumnBinding<T>>,
}

impl<T: 'static> BindingBuilder<T> {
    fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Bind a property through a getter and a mutable getter
    ///
    /// The column name defaults to the property name.
    pub fn field<F, G, S>(&mut self, property: &str, get: G, get_mut: S) -> &mut ColumnBinding<T>
    where
        F: FromSqlValue + Into<SqlValue> + Clone + 'static,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let reader: Reader<T> = Box::new(move |entity: &T| get(entity).clone().into());
        let writer: Writer<T> = Box::new(move |entity: &mut T, value: &SqlValue| {
            let converted = F::from_sql_value(value).ok_or(std::any::type_name::<F>())?;
            *get_mut(entity) = converted;
            Ok(())
        });

        self.columns.push(ColumnBinding {
            property: property.to_string(),
            column: property.to_string(),
            ignore: false,
            required: false,
            not_null: false,
            reader,
            writer,
        });
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }
}

/// The resolved binding table of one destination type
pub struct EntityBindings<T> {
    entity: &'static str,
    columns: Vec<ColumnBinding<T>>,
}

type BindingCache = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

fn binding_cache() -> &'static RwLock<BindingCache> {
    static CACHE: OnceLock<RwLock<BindingCache>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

impl<T: SqlEntity> EntityBindings<T> {
    /// Get the cached bindings of `T`, building them on first use
    pub fn resolve() -> Result<Arc<Self>> {
        let key = TypeId::of::<T>();

        if let Some(cached) = binding_cache().read().get(&key).cloned() {
            if let Ok(bindings) = cached.downcast::<Self>() {
                return Ok(bindings);
            }
        }

        // Built outside the lock; `bind` may resolve other entity types.
        let computed: Arc<dyn Any + Send + Sync> = Arc::new(Self::build()?);

        let stored = {
            let mut cache = binding_cache().write();
            Arc::clone(cache.entry(key).or_insert(computed))
        };

        stored
            .downcast::<Self>()
            .map_err(|_| {
                MapperError::other(format!(
                    "binding cache holds a foreign entry for {}",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// Build the bindings without touching the cache
    pub fn build() -> Result<Self> {
        let mut builder = BindingBuilder::new();
        T::bind(&mut builder);

        let entity = std::any::type_name::<T>();
        let mut seen = HashSet::new();
        for column in &builder.columns {
            if column.property.is_empty() {
                return Err(MapperError::invalid_argument(
                    entity,
                    "binding with an empty property name",
                ));
            }
            if !seen.insert(column.property.as_str()) {
                return Err(MapperError::invalid_argument(
                    entity,
                    format!("property '{}' is bound more than once", column.property),
                ));
            }
        }

        tracing::trace!(entity, columns = builder.columns.len(), "column bindings built");

        Ok(Self {
            entity,
            columns: builder.columns,
        })
    }
}

impl<T> EntityBindings<T> {
    /// Full type name of the entity
    pub fn entity_name(&self) -> &'static str {
        self.entity
    }

    /// All declared bindings, ignored ones included
    pub fn columns(&self) -> &[ColumnBinding<T>] {
        &self.columns
    }

    /// Bindings that take part in mapping
    pub fn active(&self) -> impl Iterator<Item = &ColumnBinding<T>> {
        self.columns.iter().filter(|column| !column.ignore)
    }
}
