mod query;
mod template;
mod where_clause;

pub use query::{JoinKind, QueryBuilder};
pub use template::{SqlTemplate, BIND_MARKER};
pub use where_clause::{Conjunction, WhereClause};
