use crate::dialect::validate_identifier;
use crate::error::SqlManagerError;
use crate::types::RowValues;

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Like,
    GreaterThan,
    LessThan,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Like => "LIKE",
            CompareOp::GreaterThan => ">",
            CompareOp::LessThan => "<",
        }
    }
}

/// A WHERE predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: RowValues,
    },
    Between {
        column: String,
        low: RowValues,
        high: RowValues,
        negated: bool,
    },
    In {
        column: String,
        values: Vec<RowValues>,
        negated: bool,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Append SQL to `out` and the matching parameters to `params`, left to right.
    ///
    /// A child combinator of a different kind is parenthesized, so the rendered text
    /// groups exactly as the tree does.
    pub fn render(&self, out: &mut String, params: &mut Vec<RowValues>) {
        match self {
            Predicate::Compare { column, op, value } => {
                out.push_str(column);
                out.push(' ');
                out.push_str(op.as_sql());
                out.push_str(" ?");
                params.push(value.clone());
            }
            Predicate::Between {
                column,
                low,
                high,
                negated,
            } => {
                out.push_str(column);
                out.push_str(if *negated { " NOT BETWEEN ? AND ?" } else { " BETWEEN ? AND ?" });
                params.push(low.clone());
                params.push(high.clone());
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                out.push_str(column);
                out.push_str(if *negated { " NOT IN (" } else { " IN (" });
                out.push_str(&vec!["?"; values.len()].join(", "));
                out.push(')');
                params.extend(values.iter().cloned());
            }
            Predicate::IsNull { column, negated } => {
                out.push_str(column);
                out.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::And(left, right) => {
                render_child(left, self, out, params);
                out.push_str(" AND ");
                render_child(right, self, out, params);
            }
            Predicate::Or(left, right) => {
                render_child(left, self, out, params);
                out.push_str(" OR ");
                render_child(right, self, out, params);
            }
        }
    }

    /// Columns referenced by the tree, left to right.
    pub fn columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::Between { column, .. }
            | Predicate::In { column, .. }
            | Predicate::IsNull { column, .. } => out.push(column),
            Predicate::And(left, right) | Predicate::Or(left, right) => {
                left.columns(out);
                right.columns(out);
            }
        }
    }

    fn same_kind(&self, other: &Predicate) -> bool {
        matches!(
            (self, other),
            (Predicate::And(..), Predicate::And(..)) | (Predicate::Or(..), Predicate::Or(..))
        )
    }

    fn is_combinator(&self) -> bool {
        matches!(self, Predicate::And(..) | Predicate::Or(..))
    }
}

fn render_child(child: &Predicate, parent: &Predicate, out: &mut String, params: &mut Vec<RowValues>) {
    if child.is_combinator() && !child.same_kind(parent) {
        out.push('(');
        child.render(out, params);
        out.push(')');
    } else {
        child.render(out, params);
    }
}

/// Accumulates predicates in call order.
///
/// `and` attaches to everything accumulated so far; `or` makes everything accumulated so
/// far its left operand. So `a.or(b).and(c)` means `(a OR b) AND c`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    root: Option<Predicate>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[must_use]
    pub fn root(&self) -> Option<&Predicate> {
        self.root.as_ref()
    }

    /// Check every referenced column is a plain identifier.
    ///
    /// # Errors
    /// Returns `SqlManagerError::ValidationError` naming the first offending column.
    pub fn validate(&self) -> Result<(), SqlManagerError> {
        let mut columns = Vec::new();
        if let Some(root) = &self.root {
            root.columns(&mut columns);
        }
        columns.into_iter().try_for_each(validate_identifier)
    }

    #[must_use]
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.root = Some(match self.root.take() {
            None => predicate,
            Some(existing) => Predicate::And(Box::new(existing), Box::new(predicate)),
        });
        self
    }

    #[must_use]
    pub fn or(mut self, predicate: Predicate) -> Self {
        self.root = Some(match self.root.take() {
            None => predicate,
            Some(existing) => Predicate::Or(Box::new(existing), Box::new(predicate)),
        });
        self
    }

    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<RowValues>) -> Self {
        self.and(compare(column, CompareOp::Eq, value))
    }

    #[must_use]
    pub fn where_not_eq(self, column: &str, value: impl Into<RowValues>) -> Self {
        self.and(compare(column, CompareOp::NotEq, value))
    }

    #[must_use]
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.and(compare(column, CompareOp::Like, pattern))
    }

    #[must_use]
    pub fn where_greater_than(self, column: &str, value: impl Into<RowValues>) -> Self {
        self.and(compare(column, CompareOp::GreaterThan, value))
    }

    #[must_use]
    pub fn where_less_than(self, column: &str, value: impl Into<RowValues>) -> Self {
        self.and(compare(column, CompareOp::LessThan, value))
    }

    #[must_use]
    pub fn where_between(
        self,
        column: &str,
        low: impl Into<RowValues>,
        high: impl Into<RowValues>,
    ) -> Self {
        self.and(Predicate::Between {
            column: column.to_string(),
            low: low.into(),
            high: high.into(),
            negated: false,
        })
    }

    #[must_use]
    pub fn where_not_between(
        self,
        column: &str,
        low: impl Into<RowValues>,
        high: impl Into<RowValues>,
    ) -> Self {
        self.and(Predicate::Between {
            column: column.to_string(),
            low: low.into(),
            high: high.into(),
            negated: true,
        })
    }

    /// `column IN (...)`. An empty value list leaves the filter unchanged.
    #[must_use]
    pub fn where_in(self, column: &str, values: Vec<RowValues>) -> Self {
        if values.is_empty() {
            return self;
        }
        self.and(Predicate::In {
            column: column.to_string(),
            values,
            negated: false,
        })
    }

    /// `column NOT IN (...)`. An empty value list leaves the filter unchanged.
    #[must_use]
    pub fn where_not_in(self, column: &str, values: Vec<RowValues>) -> Self {
        if values.is_empty() {
            return self;
        }
        self.and(Predicate::In {
            column: column.to_string(),
            values,
            negated: true,
        })
    }

    #[must_use]
    pub fn where_null(self, column: &str) -> Self {
        self.and(Predicate::IsNull {
            column: column.to_string(),
            negated: false,
        })
    }

    #[must_use]
    pub fn where_not_null(self, column: &str) -> Self {
        self.and(Predicate::IsNull {
            column: column.to_string(),
            negated: true,
        })
    }

    #[must_use]
    pub fn or_where(self, column: &str, value: impl Into<RowValues>) -> Self {
        self.or(compare(column, CompareOp::Eq, value))
    }

    #[must_use]
    pub fn or_where_like(self, column: &str, pattern: &str) -> Self {
        self.or(compare(column, CompareOp::Like, pattern))
    }

    /// AND a parenthesized sub-filter. An empty group is ignored.
    #[must_use]
    pub fn where_group(self, build: impl FnOnce(Filter) -> Filter) -> Self {
        match build(Filter::new()).root {
            Some(group) => self.and(group),
            None => self,
        }
    }

    /// OR a parenthesized sub-filter. An empty group is ignored.
    #[must_use]
    pub fn or_where_group(self, build: impl FnOnce(Filter) -> Filter) -> Self {
        match build(Filter::new()).root {
            Some(group) => self.or(group),
            None => self,
        }
    }

    /// Render the condition (without the `WHERE` keyword), appending parameters in order.
    pub fn render(&self, out: &mut String, params: &mut Vec<RowValues>) {
        if let Some(root) = &self.root {
            root.render(out, params);
        }
    }
}

fn compare(column: &str, op: CompareOp, value: impl Into<RowValues>) -> Predicate {
    Predicate::Compare {
        column: column.to_string(),
        op,
        value: value.into(),
    }
}
