//! JSON output of a finished run

use std::path::Path;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::types::{HarvestReport, TagOutcome, TaskFailure};

/// Write the `{artist, song, tags}` array to `path`
pub async fn write_outcomes(path: &Path, outcomes: &[TagOutcome]) -> Result<()> {
    let json = serde_json::to_vec(outcomes)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Write failure records to `path`
pub async fn write_failures(path: &Path, failures: &[TaskFailure]) -> Result<()> {
    let json = serde_json::to_vec_pretty(failures)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Write every output file `config` asks for
pub async fn write_report(config: &OutputConfig, report: &HarvestReport) -> Result<()> {
    write_outcomes(&config.path, &report.outcomes).await?;
    tracing::info!(
        path = %config.path.display(),
        outcomes = report.outcomes.len(),
        "Wrote results"
    );

    if let Some(failures_path) = &config.failures_path {
        write_failures(failures_path, &report.failures).await?;
        tracing::info!(
            path = %failures_path.display(),
            failures = report.failures.len(),
            "Wrote failure records"
        );
    }

    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Song;
    use tempfile::TempDir;

    fn sample_report() -> HarvestReport {
        let song = Song::new(1, "Queen", "Innuendo");
        HarvestReport {
            outcomes: vec![TagOutcome::new(&song, vec!["rock".into()])],
            failures: vec![TaskFailure {
                row: 2,
                artist: "Nobody".into(),
                song: "Nothing".into(),
                url: None,
                error: "HTTP 404".into(),
            }],
            submitted: 2,
        }
    }

    #[tokio::test]
    async fn writes_outcomes_as_json_array() {
        let temp_dir = TempDir::new().unwrap();
        let config = OutputConfig {
            path: temp_dir.path().join("results.json"),
            failures_path: None,
        };

        write_report(&config, &sample_report()).await.unwrap();

        let written = std::fs::read_to_string(&config.path).unwrap();
        assert_eq!(
            written,
            r#"[{"artist":"Queen","song":"Innuendo","tags":["rock"]}]"#
        );
    }

    #[tokio::test]
    async fn writes_failures_when_path_set() {
        let temp_dir = TempDir::new().unwrap();
        let config = OutputConfig {
            path: temp_dir.path().join("results.json"),
            failures_path: Some(temp_dir.path().join("failures.json")),
        };

        write_report(&config, &sample_report()).await.unwrap();

        let failures: Vec<TaskFailure> = serde_json::from_str(
            &std::fs::read_to_string(temp_dir.path().join("failures.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].row, 2);
    }

    #[tokio::test]
    async fn unwritable_path_is_io_error() {
        let config = OutputConfig {
            path: "/nonexistent-dir/results.json".into(),
            failures_path: None,
        };

        let result = write_report(&config, &sample_report()).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
