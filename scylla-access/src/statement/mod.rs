//! Normalization of everything that can be executed into one [`CqlStatement`].
//!
//! Inputs come in several shapes, all captured by [`StatementInput`]:
//! - plain CQL text,
//! - a structured query rendered by a [`StatementProducer`],
//! - a driver [`Statement`] configured by the caller,
//! - a [`BoundStatement`] produced by [`bind`].

use std::fmt;
use std::sync::Arc;

use scylla::statement::prepared::PreparedStatement;
use scylla::statement::unprepared::Statement;
use scylla::value::CqlValue;

use crate::errors::{QueryBuildError, StatementError};

pub mod bound;
pub mod options;

pub use bound::{bind, BoundStatement};
pub use options::ExecutionOptions;

/// Positional values of a statement. `None` is a CQL `null`.
pub type Values = Vec<Option<CqlValue>>;

/// CQL text and its positional values, as produced by a query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    /// CQL text with `?` placeholders.
    pub text: String,
    /// One value per placeholder, in order.
    pub values: Values,
}

impl RenderedQuery {
    /// Query without values.
    pub fn new(text: impl Into<String>) -> Self {
        RenderedQuery {
            text: text.into(),
            values: Vec::new(),
        }
    }

    /// Query with positional values.
    pub fn with_values(text: impl Into<String>, values: Values) -> Self {
        RenderedQuery {
            text: text.into(),
            values,
        }
    }
}

/// A structured query representation that renders to CQL text and values.
pub trait StatementProducer: Send + Sync {
    /// Renders the query. Malformed queries are reported as [`QueryBuildError`].
    fn render(&self) -> Result<RenderedQuery, QueryBuildError>;
}

impl StatementProducer for RenderedQuery {
    fn render(&self) -> Result<RenderedQuery, QueryBuildError> {
        Ok(self.clone())
    }
}

/// Anything that can be prepared or executed.
#[derive(Clone)]
pub enum StatementInput {
    /// CQL text without values.
    Text(String),
    /// Structured query, rendered when the statement is built.
    Query(Arc<dyn StatementProducer>),
    /// Driver statement, used as is.
    Unprepared(Statement),
    /// Prepared statement with its bound values.
    Bound(BoundStatement),
}

impl StatementInput {
    /// Structured query input.
    pub fn query(producer: impl StatementProducer + 'static) -> Self {
        StatementInput::Query(Arc::new(producer))
    }
}

impl From<&str> for StatementInput {
    fn from(text: &str) -> Self {
        StatementInput::Text(text.to_owned())
    }
}

impl From<String> for StatementInput {
    fn from(text: String) -> Self {
        StatementInput::Text(text)
    }
}

impl From<Statement> for StatementInput {
    fn from(statement: Statement) -> Self {
        StatementInput::Unprepared(statement)
    }
}

impl From<BoundStatement> for StatementInput {
    fn from(bound: BoundStatement) -> Self {
        StatementInput::Bound(bound)
    }
}

impl From<RenderedQuery> for StatementInput {
    fn from(query: RenderedQuery) -> Self {
        StatementInput::query(query)
    }
}

impl fmt::Debug for StatementInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementInput::Text(text) => f.debug_tuple("Text").field(text).finish(),
            StatementInput::Query(_) => f.write_str("Query(..)"),
            StatementInput::Unprepared(statement) => {
                f.debug_tuple("Unprepared").field(&statement.contents).finish()
            }
            StatementInput::Bound(bound) => f.debug_tuple("Bound").field(bound).finish(),
        }
    }
}

/// Canonical executable form of a statement.
#[derive(Clone)]
pub enum CqlStatement {
    /// Sent as text, together with its values.
    Unprepared {
        /// The statement.
        statement: Statement,
        /// Positional values.
        values: Values,
    },
    /// Executed by id.
    Prepared {
        /// The statement.
        statement: PreparedStatement,
        /// Positional values.
        values: Values,
    },
}

impl CqlStatement {
    /// CQL text of the statement.
    pub fn text(&self) -> &str {
        match self {
            CqlStatement::Unprepared { statement, .. } => &statement.contents,
            CqlStatement::Prepared { statement, .. } => statement.get_statement(),
        }
    }

    /// Positional values sent with the statement.
    pub fn values(&self) -> &[Option<CqlValue>] {
        match self {
            CqlStatement::Unprepared { values, .. } | CqlStatement::Prepared { values, .. } => {
                values
            }
        }
    }

    /// Applies per-call options to this statement instance.
    pub fn apply_options(&mut self, options: &ExecutionOptions) {
        match self {
            CqlStatement::Unprepared { statement, .. } => options.apply_to(statement),
            CqlStatement::Prepared { statement, .. } => options.apply_to(statement),
        }
    }
}

impl fmt::Debug for CqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            CqlStatement::Unprepared { .. } => "Unprepared",
            CqlStatement::Prepared { .. } => "Prepared",
        };
        f.debug_struct(kind)
            .field("text", &self.text())
            .field("values", &self.values())
            .finish()
    }
}

/// Normalizes an input into its canonical form.
///
/// Structured queries are rendered here; a rendering failure is the only error.
pub fn build(input: StatementInput) -> Result<CqlStatement, StatementError> {
    let statement = match input {
        StatementInput::Text(text) => CqlStatement::Unprepared {
            statement: Statement::new(text),
            values: Vec::new(),
        },
        StatementInput::Query(producer) => {
            let RenderedQuery { text, values } = producer.render()?;
            CqlStatement::Unprepared {
                statement: Statement::new(text),
                values,
            }
        }
        StatementInput::Unprepared(statement) => CqlStatement::Unprepared {
            statement,
            values: Vec::new(),
        },
        StatementInput::Bound(bound) => {
            let (statement, values) = bound.into_parts();
            CqlStatement::Prepared { statement, values }
        }
    };
    Ok(statement)
}
