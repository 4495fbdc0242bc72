use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Active filter criterion for the point layer.
///
/// Definition expressions reach the service as text. Keeping the criterion
/// structured until it crosses that boundary means user-provided region names
/// cannot break out of the quoted literal, and an empty identifier set can be
/// rendered as a predicate that matches nothing instead of malformed SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterPredicate {
    /// No filtering; every feature is visible.
    None,
    /// Exact, case-sensitive match on a string attribute.
    AttributeEquals { field: String, value: String },
    /// Feature identifier is one of the listed values.
    IdIn { field: String, ids: Vec<u64> },
}

impl FilterPredicate {
    pub fn attribute_equals(field: &str, value: &str) -> Self {
        Self::AttributeEquals {
            field: field.to_owned(),
            value: value.to_owned(),
        }
    }

    pub fn id_in(field: &str, ids: Vec<u64>) -> Self {
        Self::IdIn {
            field: field.to_owned(),
            ids,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Render to the service's where-clause dialect.
    ///
    /// `None` renders as `1=1` (the service rejects an empty where string),
    /// an empty id set as `1=0`.
    pub fn to_where_clause(&self) -> String {
        match self {
            Self::None => "1=1".to_owned(),
            Self::AttributeEquals { field, value } => {
                format!("{field} = '{}'", escape_literal(value))
            }
            Self::IdIn { field, ids } => {
                if ids.is_empty() {
                    return "1=0".to_owned();
                }
                let mut clause = format!("{field} IN (");
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        clause.push(',');
                    }
                    let _ = write!(clause, "{id}");
                }
                clause.push(')');
                clause
            }
        }
    }
}

/// Double embedded single quotes, the escaping the service dialect expects.
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
