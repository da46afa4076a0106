//! Column predicates evaluated against row-group statistics and decoded records.
//!
//! Null semantics follow the columnar filter API: `eq(col, Null)` selects null values,
//! `not_eq(col, Null)` selects non-null values, ordering comparisons never match a null,
//! and `not_eq(col, v)` matches a null.

use std::cmp::Ordering;

use taps_common::{Result, StructDescriptor, TapError, ThriftStruct, ThriftType, ThriftValue};

use crate::stats::ColumnStats;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Literal {
    fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "integer",
            Literal::Double(_) => "double",
            Literal::Str(_) => "string",
            Literal::Bytes(_) => "binary",
        }
    }

    fn compatible_with(&self, ty: ThriftType) -> bool {
        matches!(
            (self, ty),
            (Literal::Null, _)
                | (Literal::Bool(_), ThriftType::Bool)
                | (
                    Literal::Int(_),
                    ThriftType::Byte | ThriftType::I16 | ThriftType::I32 | ThriftType::I64
                )
                | (Literal::Double(_), ThriftType::Double)
                | (Literal::Str(_), ThriftType::String)
                | (Literal::Bytes(_), ThriftType::Binary | ThriftType::String)
        )
    }

    /// Orders two non-null literals of comparable kinds; strings and binaries compare
    /// byte-wise, matching how column statistics are kept.
    pub fn compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Bool(a), Literal::Bool(b)) => Some(a.cmp(b)),
            (Literal::Int(a), Literal::Int(b)) => Some(a.cmp(b)),
            (Literal::Double(a), Literal::Double(b)) => a.partial_cmp(b),
            (Literal::Str(a), Literal::Str(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Literal::Str(a), Literal::Bytes(b)) => Some(a.as_bytes().cmp(b.as_slice())),
            (Literal::Bytes(a), Literal::Str(b)) => Some(a.as_slice().cmp(b.as_bytes())),
            (Literal::Bytes(a), Literal::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&ThriftValue> for Literal {
    fn from(v: &ThriftValue) -> Self {
        match v {
            ThriftValue::Bool(b) => Literal::Bool(*b),
            ThriftValue::Byte(i) => Literal::Int(i64::from(*i)),
            ThriftValue::I16(i) => Literal::Int(i64::from(*i)),
            ThriftValue::I32(i) => Literal::Int(i64::from(*i)),
            ThriftValue::I64(i) => Literal::Int(*i),
            ThriftValue::Double(d) => Literal::Double(*d),
            ThriftValue::String(s) => Literal::Str(s.clone()),
            ThriftValue::Binary(b) => Literal::Bytes(b.clone()),
        }
    }
}

macro_rules! literal_from {
    ($($t:ty => $variant:ident via $conv:expr),* $(,)?) => {
        $(
            impl From<$t> for Literal {
                fn from(v: $t) -> Self {
                    Literal::$variant($conv(v))
                }
            }
        )*
    };
}

literal_from!(
    bool => Bool via |v| v,
    i8 => Int via i64::from,
    i16 => Int via i64::from,
    i32 => Int via i64::from,
    i64 => Int via |v| v,
    f64 => Double via |v| v,
    String => Str via |v| v,
    &str => Str via |v: &str| v.to_string(),
    Vec<u8> => Bytes via |v| v,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CmpOp {
    fn inverse(self) -> Self {
        match self {
            CmpOp::Eq => CmpOp::NotEq,
            CmpOp::NotEq => CmpOp::Eq,
            CmpOp::Lt => CmpOp::GtEq,
            CmpOp::LtEq => CmpOp::Gt,
            CmpOp::Gt => CmpOp::LtEq,
            CmpOp::GtEq => CmpOp::Lt,
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::NotEq => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::LtEq => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::GtEq => ord != Ordering::Less,
        }
    }
}

/// Boolean expression over struct fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    Compare {
        column: String,
        op: CmpOp,
        value: Literal,
    },
    And(Box<FilterPredicate>, Box<FilterPredicate>),
    Or(Box<FilterPredicate>, Box<FilterPredicate>),
    Not(Box<FilterPredicate>),
}

fn compare(column: impl Into<String>, op: CmpOp, value: impl Into<Literal>) -> FilterPredicate {
    FilterPredicate::Compare {
        column: column.into(),
        op,
        value: value.into(),
    }
}

pub fn eq(column: impl Into<String>, value: impl Into<Literal>) -> FilterPredicate {
    compare(column, CmpOp::Eq, value)
}

pub fn not_eq(column: impl Into<String>, value: impl Into<Literal>) -> FilterPredicate {
    compare(column, CmpOp::NotEq, value)
}

pub fn lt(column: impl Into<String>, value: impl Into<Literal>) -> FilterPredicate {
    compare(column, CmpOp::Lt, value)
}

pub fn lt_eq(column: impl Into<String>, value: impl Into<Literal>) -> FilterPredicate {
    compare(column, CmpOp::LtEq, value)
}

pub fn gt(column: impl Into<String>, value: impl Into<Literal>) -> FilterPredicate {
    compare(column, CmpOp::Gt, value)
}

pub fn gt_eq(column: impl Into<String>, value: impl Into<Literal>) -> FilterPredicate {
    compare(column, CmpOp::GtEq, value)
}

pub fn is_null(column: impl Into<String>) -> FilterPredicate {
    compare(column, CmpOp::Eq, Literal::Null)
}

pub fn not(p: FilterPredicate) -> FilterPredicate {
    FilterPredicate::Not(Box::new(p))
}

impl FilterPredicate {
    pub fn and(self, other: FilterPredicate) -> FilterPredicate {
        FilterPredicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: FilterPredicate) -> FilterPredicate {
        FilterPredicate::Or(Box::new(self), Box::new(other))
    }

    /// Checks column names and literal types against the record descriptor.
    pub fn validate(&self, descriptor: &StructDescriptor) -> Result<()> {
        match self {
            FilterPredicate::Compare { column, op, value } => {
                let (_, field) = descriptor.field(column).ok_or_else(|| {
                    TapError::InvalidConfig(format!(
                        "filter column '{column}' not found in '{}'",
                        descriptor.name
                    ))
                })?;
                if *value == Literal::Null && !matches!(op, CmpOp::Eq | CmpOp::NotEq) {
                    return Err(TapError::InvalidConfig(format!(
                        "filter on '{column}' orders against null"
                    )));
                }
                if !value.compatible_with(field.ty) {
                    return Err(TapError::InvalidConfig(format!(
                        "filter on '{column}' compares {} column with {} literal",
                        field.ty,
                        value.kind()
                    )));
                }
                Ok(())
            }
            FilterPredicate::And(l, r) | FilterPredicate::Or(l, r) => {
                l.validate(descriptor)?;
                r.validate(descriptor)
            }
            FilterPredicate::Not(p) => p.validate(descriptor),
        }
    }

    /// Exact per-record evaluation.
    pub fn matches(&self, record: &ThriftStruct) -> bool {
        match self {
            FilterPredicate::Compare { column, op, value } => {
                let actual = record.get(column).map(Literal::from);
                match (actual, value) {
                    (None, Literal::Null) => *op == CmpOp::Eq,
                    (Some(_), Literal::Null) => *op == CmpOp::NotEq,
                    (None, _) => *op == CmpOp::NotEq,
                    (Some(a), v) => a.compare(v).is_some_and(|ord| op.holds(ord)),
                }
            }
            FilterPredicate::And(l, r) => l.matches(record) && r.matches(record),
            FilterPredicate::Or(l, r) => l.matches(record) || r.matches(record),
            FilterPredicate::Not(p) => !p.matches(record),
        }
    }

    /// Logical inverse with `Not` pushed down to the comparisons.
    fn negate(&self) -> FilterPredicate {
        match self {
            FilterPredicate::Compare { column, op, value } => FilterPredicate::Compare {
                column: column.clone(),
                op: op.inverse(),
                value: value.clone(),
            },
            FilterPredicate::And(l, r) => {
                FilterPredicate::Or(Box::new(l.negate()), Box::new(r.negate()))
            }
            FilterPredicate::Or(l, r) => {
                FilterPredicate::And(Box::new(l.negate()), Box::new(r.negate()))
            }
            FilterPredicate::Not(p) => (**p).clone(),
        }
    }

    fn columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterPredicate::Compare { column, .. } => out.push(column),
            FilterPredicate::And(l, r) | FilterPredicate::Or(l, r) => {
                l.columns(out);
                r.columns(out);
            }
            FilterPredicate::Not(p) => p.columns(out),
        }
    }

    fn compares_doubles(&self) -> bool {
        match self {
            FilterPredicate::Compare { value, .. } => matches!(value, Literal::Double(_)),
            FilterPredicate::And(l, r) | FilterPredicate::Or(l, r) => {
                l.compares_doubles() || r.compares_doubles()
            }
            FilterPredicate::Not(p) => p.compares_doubles(),
        }
    }

    /// True when the statistics prove no row of the group can match.
    ///
    /// `stats` returns `None` for columns without usable statistics, which never allows a
    /// drop on their own.
    pub fn can_drop<F>(&self, stats: &F) -> bool
    where
        F: Fn(&str) -> Option<ColumnStats>,
    {
        match self {
            FilterPredicate::Compare { column, op, value } => match stats(column) {
                Some(s) => compare_can_drop(*op, value, &s),
                None => false,
            },
            FilterPredicate::And(l, r) => l.can_drop(stats) || r.can_drop(stats),
            FilterPredicate::Or(l, r) => l.can_drop(stats) && r.can_drop(stats),
            FilterPredicate::Not(p) => {
                // Inverting a comparison changes how nulls and NaN match, and NaN never
                // shows up in min/max. Only null-free groups without double comparisons
                // are pruned through a negation.
                if p.compares_doubles() {
                    return false;
                }
                let mut cols = Vec::new();
                p.columns(&mut cols);
                let null_free = cols
                    .iter()
                    .all(|c| stats(c).is_some_and(|s| s.null_count == Some(0)));
                null_free && p.negate().can_drop(stats)
            }
        }
    }
}

fn compare_can_drop(op: CmpOp, value: &Literal, s: &ColumnStats) -> bool {
    let all_null = s.null_count == Some(s.num_rows);
    if *value == Literal::Null {
        return match op {
            CmpOp::Eq => s.null_count == Some(0),
            CmpOp::NotEq => all_null,
            _ => false,
        };
    }
    if all_null {
        // Only nulls: nothing but `not_eq` can match.
        return op != CmpOp::NotEq;
    }
    let min = s.min.as_ref().and_then(|m| m.compare(value));
    let max = s.max.as_ref().and_then(|m| m.compare(value));
    match op {
        CmpOp::Eq => min == Some(Ordering::Greater) || max == Some(Ordering::Less),
        CmpOp::NotEq => {
            s.null_count == Some(0)
                && min == Some(Ordering::Equal)
                && max == Some(Ordering::Equal)
        }
        CmpOp::Lt => matches!(min, Some(Ordering::Greater | Ordering::Equal)),
        CmpOp::LtEq => min == Some(Ordering::Greater),
        CmpOp::Gt => matches!(max, Some(Ordering::Less | Ordering::Equal)),
        CmpOp::GtEq => max == Some(Ordering::Less),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use taps_common::{FieldDescriptor, StructDescriptor, ThriftStruct, ThriftType};

    use super::{Literal, eq, gt, gt_eq, is_null, lt, not, not_eq};
    use crate::stats::ColumnStats;

    fn descriptor() -> Arc<StructDescriptor> {
        Arc::new(StructDescriptor::new(
            "test.Row",
            vec![
                FieldDescriptor::required(1, "id", ThriftType::I64),
                FieldDescriptor::optional(2, "tag", ThriftType::String),
            ],
        ))
    }

    fn row(id: i64, tag: Option<&str>) -> ThriftStruct {
        let mut r = ThriftStruct::new(descriptor());
        r.set("id", id).expect("id");
        if let Some(t) = tag {
            r.set("tag", t).expect("tag");
        }
        r
    }

    fn ints(min: i64, max: i64, nulls: u64, rows: u64) -> ColumnStats {
        ColumnStats {
            min: Some(Literal::Int(min)),
            max: Some(Literal::Int(max)),
            null_count: Some(nulls),
            num_rows: rows,
        }
    }

    #[test]
    fn record_evaluation_follows_null_semantics() {
        let with_tag = row(1, Some("a"));
        let without_tag = row(2, None);

        assert!(is_null("tag").matches(&without_tag));
        assert!(!is_null("tag").matches(&with_tag));
        assert!(not_eq("tag", "b").matches(&without_tag));
        assert!(!lt("tag", "z").matches(&without_tag));
        assert!(not(lt("tag", "z")).matches(&without_tag));
        assert!(gt("id", 1_i64).or(eq("tag", "a")).matches(&with_tag));
        assert!(!gt("id", 1_i64).and(eq("tag", "a")).matches(&with_tag));
    }

    #[test]
    fn statistics_prune_only_impossible_groups() {
        let stats = |col: &str| (col == "id").then(|| ints(10, 19, 0, 10));

        assert!(gt_eq("id", 20_i64).can_drop(&stats));
        assert!(!gt_eq("id", 19_i64).can_drop(&stats));
        assert!(lt("id", 10_i64).can_drop(&stats));
        assert!(eq("id", 25_i64).can_drop(&stats));
        assert!(!eq("id", 15_i64).can_drop(&stats));
        assert!(is_null("id").can_drop(&stats));
        assert!(eq("id", 25_i64).and(eq("tag", "x")).can_drop(&stats));
        assert!(!eq("id", 25_i64).or(eq("tag", "x")).can_drop(&stats));
        assert!(not(lt("id", 20_i64)).can_drop(&stats));
    }

    #[test]
    fn negation_keeps_groups_with_nulls() {
        let stats = |_: &str| Some(ints(10, 19, 3, 10));
        assert!(!not(lt("id", 20_i64)).can_drop(&stats));

        let all_null = |_: &str| {
            Some(ColumnStats {
                min: None,
                max: None,
                null_count: Some(5),
                num_rows: 5,
            })
        };
        assert!(gt("id", 0_i64).can_drop(&all_null));
        assert!(!not_eq("id", 0_i64).can_drop(&all_null));
        assert!(!is_null("id").can_drop(&all_null));
    }

    #[test]
    fn negated_double_comparisons_never_prune() {
        // A NaN row is left out of min/max but matches `not(lt(..))`.
        let doubles = |_: &str| {
            Some(ColumnStats {
                min: Some(Literal::Double(1.0)),
                max: Some(Literal::Double(1.0)),
                null_count: Some(0),
                num_rows: 2,
            })
        };
        assert!(!not(lt("score", 10.0)).can_drop(&doubles));
        assert!(!not(eq("score", 1.0)).can_drop(&doubles));
        assert!(lt("score", 0.5).can_drop(&doubles));

        let mut nan = ThriftStruct::new(Arc::new(StructDescriptor::new(
            "test.Score",
            vec![FieldDescriptor::optional(1, "score", ThriftType::Double)],
        )));
        nan.set("score", f64::NAN).expect("score");
        assert!(not(lt("score", 10.0)).matches(&nan));
        assert!(!lt("score", 0.5).matches(&nan));
    }

    #[test]
    fn validation_rejects_unknown_columns_and_bad_literals() {
        let d = descriptor();
        assert!(eq("missing", 1_i64).validate(&d).is_err());
        assert!(eq("id", "one").validate(&d).is_err());
        assert!(lt("tag", Literal::Null).validate(&d).is_err());
        eq("id", 1_i32).and(is_null("tag")).validate(&d).expect("valid");
    }
}
