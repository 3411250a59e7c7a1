use scylla::statement::prepared::PreparedStatement;
use scylla::value::CqlValue;

use super::Values;
use crate::errors::BindError;

/// A prepared statement together with one value per placeholder.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    prepared: PreparedStatement,
    values: Values,
}

impl BoundStatement {
    /// The prepared statement the values are bound to.
    pub fn prepared(&self) -> &PreparedStatement {
        &self.prepared
    }

    /// The bound values, in placeholder order.
    pub fn values(&self) -> &[Option<CqlValue>] {
        &self.values
    }

    /// Splits into the prepared statement and its values.
    pub fn into_parts(self) -> (PreparedStatement, Values) {
        (self.prepared, self.values)
    }
}

/// Binds values positionally to a prepared statement.
///
/// Values must follow the placeholder order; names are never matched. Exactly one
/// value per placeholder is required, use `None` for `null`.
pub fn bind(prepared: &PreparedStatement, values: Values) -> Result<BoundStatement, BindError> {
    check_value_count(prepared.get_variable_col_specs().len(), values.len())?;
    Ok(BoundStatement {
        prepared: prepared.clone(),
        values,
    })
}

fn check_value_count(expected: usize, provided: usize) -> Result<(), BindError> {
    if expected == provided {
        Ok(())
    } else {
        Err(BindError::ValueCountMismatch { expected, provided })
    }
}
