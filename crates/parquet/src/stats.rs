use parquet::file::metadata::RowGroupMetaData;
use parquet::file::statistics::Statistics;

use crate::predicate::Literal;

/// Min/max/null summary of one column chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub min: Option<Literal>,
    pub max: Option<Literal>,
    pub null_count: Option<u64>,
    pub num_rows: u64,
}

/// Statistics for `column` in a row group, if the writer recorded any.
pub fn row_group_stats(row_group: &RowGroupMetaData, column: &str) -> Option<ColumnStats> {
    let chunk = row_group
        .columns()
        .iter()
        .find(|c| c.column_path().string() == column)?;
    let stats = chunk.statistics()?;
    let (min, max) = bounds(stats);
    Some(ColumnStats {
        min,
        max,
        null_count: stats.null_count_opt(),
        num_rows: u64::try_from(row_group.num_rows()).unwrap_or(0),
    })
}

fn bounds(stats: &Statistics) -> (Option<Literal>, Option<Literal>) {
    match stats {
        Statistics::Boolean(s) => (
            s.min_opt().map(|v| Literal::Bool(*v)),
            s.max_opt().map(|v| Literal::Bool(*v)),
        ),
        Statistics::Int32(s) => (
            s.min_opt().map(|v| Literal::Int(i64::from(*v))),
            s.max_opt().map(|v| Literal::Int(i64::from(*v))),
        ),
        Statistics::Int64(s) => (
            s.min_opt().map(|v| Literal::Int(*v)),
            s.max_opt().map(|v| Literal::Int(*v)),
        ),
        Statistics::Float(s) => (
            s.min_opt().map(|v| Literal::Double(f64::from(*v))),
            s.max_opt().map(|v| Literal::Double(f64::from(*v))),
        ),
        Statistics::Double(s) => (
            s.min_opt().map(|v| Literal::Double(*v)),
            s.max_opt().map(|v| Literal::Double(*v)),
        ),
        Statistics::ByteArray(s) => (
            s.min_opt().map(|v| Literal::Bytes(v.data().to_vec())),
            s.max_opt().map(|v| Literal::Bytes(v.data().to_vec())),
        ),
        // Int96 and fixed-length arrays never back a supported field type.
        _ => (None, None),
    }
}
