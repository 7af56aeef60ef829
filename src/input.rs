//! CSV input loading and range selection

use crate::error::{Error, Result};
use crate::types::Song;
use std::path::Path;

/// Number of columns every input row must have
const FIELDS_PER_ROW: usize = 4;

/// Load every row of `path` as a [`Song`]
///
/// Rows are `artist,song,link,text`. No header handling is done here: a header
/// line becomes row 0, which the default range skips.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is not valid CSV, or has a
/// row with fewer than four fields.
pub fn load_songs(path: &Path) -> Result<Vec<Song>> {
    let file = std::fs::File::open(path)?;
    parse_songs(file, path)
}

/// Parse songs from any reader; `origin` is only used in error messages.
pub fn parse_songs<R: std::io::Read>(reader: R, origin: &Path) -> Result<Vec<Song>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut songs = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() < FIELDS_PER_ROW {
            return Err(Error::InvalidRow {
                path: origin.to_path_buf(),
                line: record.position().map_or(row as u64 + 1, |p| p.line()),
                reason: format!(
                    "expected {FIELDS_PER_ROW} fields, found {}",
                    record.len()
                ),
            });
        }

        songs.push(Song {
            row,
            artist: record[0].to_string(),
            song: record[1].to_string(),
            link: record[2].to_string(),
            text: record[3].to_string(),
        });
    }

    Ok(songs)
}

/// Keep songs `from..to` (zero-based, end exclusive)
///
/// # Errors
///
/// Returns [`Error::InvalidRange`] if `from > to` or `to` is past the end.
pub fn select_range(songs: Vec<Song>, from: usize, to: usize) -> Result<Vec<Song>> {
    let total = songs.len();
    if from > to || to > total {
        return Err(Error::InvalidRange { from, to, total });
    }

    Ok(songs.into_iter().skip(from).take(to - from).collect())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_with_rows(count: usize) -> String {
        let mut data = String::from("artist,song,link,text\n");
        for i in 1..count {
            data.push_str(&format!("Artist {i},Song {i},/a/{i}.html,\"line one\nline two\"\n"));
        }
        data
    }

    #[test]
    fn parses_rows_including_header_line() {
        let songs = parse_songs(csv_with_rows(3).as_bytes(), Path::new("mem.csv")).unwrap();

        assert_eq!(songs.len(), 3);
        assert_eq!(songs[0].artist, "artist");
        assert_eq!(songs[1].row, 1);
        assert_eq!(songs[1].artist, "Artist 1");
        assert_eq!(songs[1].song, "Song 1");
        assert_eq!(songs[1].link, "/a/1.html");
        assert_eq!(songs[1].text, "line one\nline two", "quoted multi-line text survives");
    }

    #[test]
    fn short_row_is_rejected_with_line_number() {
        let data = "a,b,c,d\nonly,two\n";

        match parse_songs(data.as_bytes(), Path::new("songs.csv")) {
            Err(Error::InvalidRow { line, path, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(path, Path::new("songs.csv"));
            }
            other => panic!("expected InvalidRow, got {other:?}"),
        }
    }

    #[test]
    fn load_songs_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(csv_with_rows(5).as_bytes()).unwrap();

        let songs = load_songs(file.path()).unwrap();
        assert_eq!(songs.len(), 5);
        assert_eq!(songs[4].artist, "Artist 4");
    }

    #[test]
    fn load_songs_missing_file_is_io_error() {
        let result = load_songs(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn range_of_twenty_rows_selects_five() {
        let songs = parse_songs(csv_with_rows(20).as_bytes(), Path::new("mem.csv")).unwrap();
        assert_eq!(songs.len(), 20);

        let selected = select_range(songs, 5, 10).unwrap();

        assert_eq!(selected.len(), 5);
        let rows: Vec<usize> = selected.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn empty_range_is_allowed() {
        let songs = vec![Song::new(0, "a", "b")];
        assert!(select_range(songs, 1, 1).unwrap().is_empty());
    }

    #[test]
    fn range_past_end_is_rejected() {
        let songs = (0..3).map(|i| Song::new(i, "a", "b")).collect();

        match select_range(songs, 1, 20) {
            Err(Error::InvalidRange { from, to, total }) => {
                assert_eq!((from, to, total), (1, 20, 3));
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let songs = (0..10).map(|i| Song::new(i, "a", "b")).collect();
        assert!(matches!(
            select_range(songs, 6, 2),
            Err(Error::InvalidRange { .. })
        ));
    }
}
