use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MOVIES: &str = "\
title,year,rating,genre
The Shawshank Redemption,1994,9.3,Drama
The Godfather,1972,9.2,Crime
The Dark Knight,2008,9.0,Action
Pulp Fiction,1994,8.9,Crime
Forrest Gump,1994,8.8,Drama
Inception,2010,8.8,Action
";

fn write_movies(dir: &TempDir) -> Result<PathBuf> {
    let path = dir.path().join("movies.csv");
    fs::write(&path, MOVIES)?;
    Ok(path)
}

fn metagen() -> Result<Command> {
    let mut cmd = Command::cargo_bin("metagen")?;
    cmd.env_remove("METAGEN_MODE")
        .env_remove("METAGEN_OUTPUT")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap_or_default()
}

#[test]
fn test_metadata_to_csv_and_json() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;
    let output = dir.path().join("meta.csv");

    metagen()?
        .args(["metadata", "-i", arg(&input), "-o", arg(&output)])
        .args(["--extra-formats", ".json"])
        .assert()
        .success();

    let csv = fs::read_to_string(&output)?;
    let header = csv.lines().next().unwrap_or_default();
    assert!(header.starts_with("Name,Long Name,Type,Description,Min,Max"));
    assert_eq!(csv.lines().count(), 5);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(
        dir.path().join("meta.json"),
    )?)?;
    assert_eq!(json["fields"]["year"]["Type"], "integer");
    assert_eq!(json["fields"]["genre"]["# unique"], 3);
    Ok(())
}

#[test]
fn test_metadata_prints_without_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;

    metagen()?
        .args(["metadata", "-i", arg(&input), "-m", "lazy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Metadata:"))
        .stdout(predicate::str::contains("rating"));
    Ok(())
}

#[test]
fn test_metadata_with_descriptions() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;
    let descriptions = dir.path().join("descriptions.json");
    fs::write(
        &descriptions,
        r#"{"descriptions": {"title": {"description": "Movie title", "long_name": "Title"}}}"#,
    )?;
    let output = dir.path().join("meta.json");

    metagen()?
        .args(["metadata", "-i", arg(&input), "-o", arg(&output)])
        .args(["-d", arg(&descriptions), "--warning-description"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Column without Descriptions:"))
        .stdout(predicate::str::contains("genre"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(json["fields"]["title"]["Description"], "Movie title");
    assert_eq!(json["fields"]["title"]["Long Name"], "Title");
    Ok(())
}

#[test]
fn test_metadata_unsupported_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;
    let output = dir.path().join("meta.txt");

    metagen()?
        .args(["metadata", "-i", arg(&input), "-o", arg(&output)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("txt"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_unsupported_input() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("data.txt");
    fs::write(&input, "a,b\n1,2\n")?;

    metagen()?
        .args(["inspect", "-i", arg(&input)])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn test_inspect_tail() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;

    metagen()?
        .args(["inspect", "-i", arg(&input), "-n", "2", "--inspection-mode", "tail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inception"))
        .stdout(predicate::str::contains("Forrest Gump"))
        .stdout(predicate::str::contains("Godfather").not());
    Ok(())
}

#[test]
fn test_inspect_rejects_unknown_mode() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;

    metagen()?
        .args(["inspect", "-i", arg(&input), "--inspection-mode", "middle"])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn test_extracts_writes_each_mode() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;
    let output = dir.path().join("extract.csv");

    metagen()?
        .args(["extracts", "-i", arg(&input), "-o", arg(&output), "-n", "3"])
        .args(["--random-seed", "42", "--extra-formats", ".parquet"])
        .assert()
        .success();

    for mode in ["head", "tail", "sample"] {
        let csv = dir.path().join(format!("extract-{mode}.csv"));
        assert!(csv.is_file(), "missing {}", csv.display());
        assert_eq!(fs::read_to_string(&csv)?.lines().count(), 4);
        assert!(dir.path().join(format!("extract-{mode}.parquet")).is_file());
    }
    Ok(())
}

#[test]
fn test_extracts_ignores_modes() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;
    let output = dir.path().join("extract.json");

    metagen()?
        .args(["extract", "-i", arg(&input), "-o", arg(&output)])
        .args(["--ignore-inspection-modes", "head,sample"])
        .assert()
        .success();

    assert!(dir.path().join("extract-tail.json").is_file());
    assert!(!dir.path().join("extract-head.json").exists());
    assert!(!dir.path().join("extract-sample.json").exists());
    Ok(())
}

#[test]
fn test_filter_to_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;
    let output = dir.path().join("filtered.csv");

    metagen()?
        .args(["filter", "-i", arg(&input), "-o", arg(&output)])
        .args(["-q", "SELECT title, year FROM movies WHERE year = 1994"])
        .assert()
        .success();

    let csv = fs::read_to_string(&output)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "title,year");
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "The Shawshank Redemption,1994");
    Ok(())
}

#[test]
fn test_filter_query_from_file_with_table_name() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_movies(&dir)?;
    let query = dir.path().join("query.sql");
    fs::write(&query, "SELECT title FROM films WHERE genre = 'Action'")?;

    metagen()?
        .args(["filter", "-i", arg(&input), "-t", "films", "-q", arg(&query)])
        .args(["--eager", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Dark Knight"))
        .stdout(predicate::str::contains("Pulp Fiction").not());
    Ok(())
}

#[test]
fn test_inspect_shows_every_column() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("wide.csv");
    let header: Vec<String> = (1..=25).map(|i| format!("col_{i:02}")).collect();
    let row: Vec<String> = (1..=25).map(|i| i.to_string()).collect();
    fs::write(&input, format!("{}\n{}\n", header.join(","), row.join(",")))?;

    metagen()?
        .args(["inspect", "-i", arg(&input)])
        .env_remove("POLARS_FMT_MAX_COLS")
        .assert()
        .success()
        .stdout(predicate::str::contains("col_01"))
        .stdout(predicate::str::contains("col_13"))
        .stdout(predicate::str::contains("col_25"));
    Ok(())
}
