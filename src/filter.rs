//! SQL filtering through the Polars SQL context.

use std::fs;
use std::path::Path;

use polars::sql::SQLContext;
use tracing::debug;

use crate::error::Result;
use crate::loader::Dataset;

/// A query argument is either a path to a `.sql` file or the SQL itself.
pub fn resolve_query(query: &str) -> Result<String> {
    let path = Path::new(query);
    if path.is_file() {
        return Ok(fs::read_to_string(path)?);
    }
    Ok(query.to_string())
}

/// Run `sql` against `data` registered as `table_name`.
pub fn filter_by_sql(data: &Dataset, table_name: &str, sql: &str, eager: bool) -> Result<Dataset> {
    debug!(table_name, sql, eager, "running sql query");
    let mut ctx = SQLContext::new();
    ctx.register(table_name, data.lazy());
    let lf = ctx.execute(sql)?;
    if eager {
        Ok(Dataset::Eager(lf.collect()?))
    } else {
        Ok(Dataset::Lazy(lf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use polars::prelude::*;

    fn movies() -> Result<DataFrame> {
        Ok(df! {
            "title" => ["The Godfather", "The Dark Knight", "Schindler's List", "Pulp Fiction", "The Shawshank Redemption"],
            "release_year" => [1972, 2008, 1993, 1994, 1994],
            "budget" => [6_000_000i64, 185_000_000, 22_000_000, 8_000_000, 25_000_000],
            "imdb_score" => [9.2, 9.0, 8.9, 8.9, 9.3],
        }?)
    }

    #[test]
    fn test_filter_by_sql_query() -> Result<()> {
        let sql = "SELECT title, release_year, imdb_score FROM data \
                   WHERE release_year > 1990 ORDER BY imdb_score DESC";
        for eager in [true, false] {
            let data = Dataset::Eager(movies()?);
            let filtered = filter_by_sql(&data, "data", sql, eager)?;
            assert_eq!(filtered.is_lazy(), !eager);

            let df = filtered.collect()?;
            assert_eq!(df.shape(), (4, 3));
            let first = df.column("title")?.get(0)?;
            assert_eq!(first, AnyValue::String("The Shawshank Redemption"));
        }
        Ok(())
    }

    #[test]
    fn test_resolve_query_from_file() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("query.sql");
        fs::write(&path, "SELECT * FROM t")?;

        assert_eq!(resolve_query(path.to_str().unwrap())?, "SELECT * FROM t");
        assert_eq!(resolve_query("SELECT 1")?, "SELECT 1");
        Ok(())
    }
}
