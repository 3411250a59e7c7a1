//! Results of executed statements and their conversion into application values.
//!
//! An execution yields a [`RawResult`] holding every page the server returned.
//! A [`ResultTranslator`] turns it into the value handed to the caller.

use std::fmt;
use std::marker::PhantomData;

use scylla::deserialize::row::DeserializeRow;
use scylla::response::query_result::{IntoRowsResultError, QueryResult};
use scylla::value::Row;
use uuid::Uuid;

use crate::errors::TranslationError;

/// All pages returned by one execution, in order.
#[derive(Debug, Clone, Default)]
pub struct RawResult {
    pages: Vec<QueryResult>,
}

impl RawResult {
    pub(crate) fn new(pages: Vec<QueryResult>) -> Self {
        RawResult { pages }
    }

    /// The pages, a single one for unpaged executions.
    pub fn pages(&self) -> &[QueryResult] {
        &self.pages
    }

    /// Consumes the result, returning its pages.
    pub fn into_pages(self) -> Vec<QueryResult> {
        self.pages
    }

    /// Whether the server answered with rows (as opposed to e.g. a `Void` result).
    pub fn is_rows(&self) -> bool {
        self.pages.first().is_some_and(QueryResult::is_rows)
    }

    /// Tracing session ids, for executions with tracing enabled.
    pub fn tracing_ids(&self) -> Vec<Uuid> {
        self.pages.iter().filter_map(QueryResult::tracing_id).collect()
    }

    /// Deserializes the rows of every page.
    ///
    /// Results that carry no rows yield an empty vector.
    pub fn into_rows<R>(self) -> Result<Vec<R>, TranslationError>
    where
        R: for<'frame> DeserializeRow<'frame, 'frame>,
    {
        let mut rows = Vec::new();
        for page in self.pages {
            let page = match page.into_rows_result() {
                Ok(page) => page,
                Err(IntoRowsResultError::ResultNotRows(_)) => continue,
                Err(err) => return Err(TranslationError::new(err)),
            };
            rows.reserve(page.rows_num());
            for row in page.rows::<R>().map_err(TranslationError::new)? {
                rows.push(row.map_err(TranslationError::new)?);
            }
        }
        Ok(rows)
    }
}

/// Converts the result of an execution into an application value.
///
/// Any `Fn(RawResult) -> Result<T, TranslationError>` is a translator.
pub trait ResultTranslator: Send + Sync {
    /// Value produced from a result.
    type Output;

    /// Performs the conversion.
    fn translate(&self, result: RawResult) -> Result<Self::Output, TranslationError>;
}

impl<F, T> ResultTranslator for F
where
    F: Fn(RawResult) -> Result<T, TranslationError> + Send + Sync,
{
    type Output = T;

    fn translate(&self, result: RawResult) -> Result<T, TranslationError> {
        self(result)
    }
}

/// Default translator: rows as untyped [`Row`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowsTranslator;

impl ResultTranslator for RowsTranslator {
    type Output = Vec<Row>;

    fn translate(&self, result: RawResult) -> Result<Vec<Row>, TranslationError> {
        result.into_rows()
    }
}

/// Rows deserialized into `R`, e.g. a tuple or a type deriving `DeserializeRow`.
pub struct TypedRowsTranslator<R> {
    _row: PhantomData<fn() -> R>,
}

impl<R> TypedRowsTranslator<R> {
    /// Creates the translator.
    pub fn new() -> Self {
        TypedRowsTranslator { _row: PhantomData }
    }
}

impl<R> Default for TypedRowsTranslator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for TypedRowsTranslator<R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for TypedRowsTranslator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRowsTranslator")
            .field("row", &std::any::type_name::<R>())
            .finish()
    }
}

impl<R> ResultTranslator for TypedRowsTranslator<R>
where
    R: for<'frame> DeserializeRow<'frame, 'frame>,
{
    type Output = Vec<R>;

    fn translate(&self, result: RawResult) -> Result<Vec<R>, TranslationError> {
        result.into_rows()
    }
}

/// Hands the result over untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTranslator;

impl ResultTranslator for RawTranslator {
    type Output = RawResult;

    fn translate(&self, result: RawResult) -> Result<RawResult, TranslationError> {
        Ok(result)
    }
}
