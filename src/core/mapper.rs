//! Result row mapping
//!
//! Fills destination values from [`SqlRow`]s using the cached column bindings of the
//! destination type. Column lookup is case-insensitive.

use super::binding::{EntityBindings, SqlEntity};
use super::error::{MapperError, Result};
use super::value::{FromSqlValue, SqlRow};

/// Build a `T` from one result row
///
/// Absent columns leave the property at its default value unless the binding is required
/// or not-null. A null value on a not-null binding is rejected.
///
/// # Errors
///
/// - [`MapperError::MissingColumn`] if a required or not-null column is absent
/// - [`MapperError::NotNullViolation`] if a not-null column holds null
/// - [`MapperError::TypeMismatch`] if a value cannot be converted to the property type
pub fn map_row<T: SqlEntity>(row: &SqlRow) -> Result<T> {
    T::debug_row(row);

    let bindings = EntityBindings::<T>::resolve()?;
    let entity = bindings.entity_name();
    let mut target = T::default();

    for binding in bindings.active() {
        let column = binding.column_name();
        match row.get(column) {
            Some(value) if value.is_null() && binding.is_not_null() => {
                return Err(MapperError::not_null(entity, column));
            }
            Some(value) => {
                binding
                    .write(&mut target, value)
                    .map_err(|expected| {
                        MapperError::type_mismatch(entity, column, expected, value.type_name())
                    })?;
            }
            None if binding.is_required() || binding.is_not_null() => {
                return Err(MapperError::missing_column(entity, column));
            }
            None => {}
        }
    }

    tracing::trace!(entity, columns = row.len(), "row mapped");
    Ok(target)
}

/// Convert the first column of a row to a scalar
pub fn map_scalar<S: FromSqlValue>(row: &SqlRow) -> Result<S> {
    let value = row
        .get_index(0)
        .ok_or_else(|| MapperError::missing_column("scalar", "0"))?;

    S::from_sql_value(value).ok_or_else(|| {
        MapperError::type_mismatch("scalar", "0", std::any::type_name::<S>(), value.type_name())
    })
}

/// Map every row of a result set, stopping at the first failure
pub fn map_rows<T: SqlEntity>(rows: &[SqlRow]) -> Result<Vec<T>> {
    rows.iter().map(map_row).collect()
}
