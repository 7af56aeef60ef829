//! Fixtures: CSV inputs, track pages, mock last.fm server

use std::path::{Path, PathBuf};

use tag_harvest::config::{Config, FetchConfig, InputConfig, OutputConfig, PoolConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Header line of the usual songdata.csv dump
pub const CSV_HEADER: &str = "artist,song,link,text";

/// Write a CSV with a header line followed by `rows` as `artist,song,link,text`
pub fn write_songs_csv(dir: &Path, rows: &[(&str, &str)]) -> PathBuf {
    let mut data = format!("{CSV_HEADER}\n");
    for (artist, song) in rows {
        data.push_str(&format!(
            "{artist},{song},/{artist}/{song}.html,\"Some lyrics\nspanning lines\"\n"
        ));
    }
    let path = dir.join("songdata.csv");
    std::fs::write(&path, data).expect("failed to write CSV fixture");
    path
}

/// Track page with tags laid out where the last.fm markup has them
pub fn track_page(tags: &[&str]) -> String {
    let items: String = tags
        .iter()
        .map(|t| format!("<li class=\"tag\"><a href=\"/tag/{t}\">{t}</a></li>"))
        .collect();
    format!(
        "<!DOCTYPE html><html><body><div id=\"mantle_skin\">\
         <div></div><div></div><div></div>\
         <div><div><div><section><ul>{items}</ul></section></div></div></div>\
         </div></body></html>"
    )
}

/// Serve `tags` for `/music/{artist}/_/{song}`
pub async fn mount_track(server: &MockServer, artist: &str, song: &str, tags: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/music/{artist}/_/{song}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(track_page(tags)))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer `/music/{artist}/_/{song}` with `status`
pub async fn mount_status(server: &MockServer, artist: &str, song: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/music/{artist}/_/{song}")))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

/// Configuration pointing at `server`, reading `input` and writing into `out_dir`
pub fn config_for(server: &MockServer, input: PathBuf, out_dir: &Path) -> Config {
    Config {
        input: InputConfig {
            path: input,
            ..InputConfig::default()
        },
        output: OutputConfig {
            path: out_dir.join("results.json"),
            failures_path: Some(out_dir.join("failures.json")),
        },
        fetch: FetchConfig {
            base_url: format!("{}/music", server.uri()),
            ..FetchConfig::default()
        },
        pool: PoolConfig {
            workers: 4,
            ..PoolConfig::default()
        },
    }
}
