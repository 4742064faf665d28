//! End-to-end orchestration tests over a scripted fetcher
//!
//! The executor takes the fetch seam as an injected trait object, so the
//! full pipeline — mode decision, both fan-outs, persistence, logging —
//! runs here without a network.

use async_trait::async_trait;
use docket_downloader::downloader::{
    DownloadError, HarvestConfig, HarvestExecutor, RunMode,
};
use docket_downloader::fetcher::{FetchOutcome, FetcherError, FetcherResult, PageFetcher};
use docket_downloader::shutdown::Shutdown;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Maps exact URLs to scripted outcomes and records every call.
struct ScriptedFetcher {
    outcomes: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

#[derive(Clone)]
enum Script {
    Page(String),
    Empty,
    Unavailable,
    /// Fails fatally after a short delay so sibling tasks can finish first.
    Fatal,
}

impl ScriptedFetcher {
    fn new(outcomes: Vec<(String, Script)>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: outcomes.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, url: &str) -> FetcherResult<FetchOutcome> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.outcomes.get(url) {
            Some(Script::Page(body)) => Ok(FetchOutcome::Page(body.clone())),
            Some(Script::Empty) | None => Ok(FetchOutcome::Empty),
            Some(Script::Unavailable) => Ok(FetchOutcome::Unavailable),
            Some(Script::Fatal) => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Err(FetcherError::InvalidRequest("scripted failure".into()))
            }
        }
    }
}

fn test_config(root: &Path, start_id: u32, end_id: u32) -> HarvestConfig {
    HarvestConfig {
        start_id,
        end_id,
        defendant_dir: root.join("defendants"),
        docket_dir: root.join("dockets"),
        log_path: root.join("log.txt"),
        failed_urls_path: Some(root.join("failed_urls.json")),
        ..HarvestConfig::default()
    }
}

fn defendant_body(cases: &[&str]) -> String {
    let anchors: String = cases
        .iter()
        .map(|case| format!(r#"<a href="666666.php?&docase={case}">case {case}</a>"#))
        .collect();
    format!("<html><body>{anchors}</body></html>")
}

/// Sorted (name, bytes) listing of a directory.
fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<(String, Vec<u8>)> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.file_name().to_string_lossy().into_owned(),
                std::fs::read(entry.path()).unwrap(),
            )
        })
        .collect();
    entries.sort();
    entries
}

#[tokio::test]
async fn full_run_stores_pages_and_deduped_sheets() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path(), 100, 103);

    let sheet_a = "666666.php?&docase=111111";
    let sheet_b = "666666.php?&docase=222222";
    let fetcher = ScriptedFetcher::new(vec![
        (
            config.defendant_url(100),
            Script::Page(defendant_body(&["111111"])),
        ),
        (
            config.defendant_url(101),
            Script::Page(defendant_body(&["111111", "222222"])),
        ),
        (config.defendant_url(102), Script::Empty),
        (config.sheet_url(sheet_a), Script::Page("sheet one".into())),
        (config.sheet_url(sheet_b), Script::Page("sheet two".into())),
    ]);

    let executor = HarvestExecutor::with_fetcher(config.clone(), fetcher.clone()).unwrap();
    let report = executor.run().await.unwrap();

    assert_eq!(report.mode, RunMode::Full);
    assert_eq!(report.defendants_requested, 3);
    assert_eq!(report.defendants_stored, 2);
    assert_eq!(report.sheets_discovered, 2);
    assert_eq!(report.sheets_stored, 2);
    assert!(report.failed_urls.is_empty());

    assert!(config.defendant_dir.join("defendant100.html").exists());
    assert!(config.defendant_dir.join("defendant101.html").exists());
    // The empty page is still touched, marking the ID attempted.
    let touched = config.defendant_dir.join("defendant102.html");
    assert_eq!(std::fs::metadata(&touched).unwrap().len(), 0);

    assert_eq!(
        std::fs::read_to_string(config.docket_dir.join("docket111111.html")).unwrap(),
        "sheet one"
    );
    assert!(config.docket_dir.join("docket222222.html").exists());

    // The shared sheet was fetched once despite two referring defendants.
    let sheet_calls = fetcher
        .calls()
        .iter()
        .filter(|url| url.contains("666666.php"))
        .count();
    assert_eq!(sheet_calls, 2);

    let log = std::fs::read_to_string(&config.log_path).unwrap();
    assert!(log.contains("harvest complete"));
}

#[tokio::test]
async fn fatal_error_cancels_before_sheet_phase() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path(), 100, 105);

    let mut outcomes = vec![(config.defendant_url(102), Script::Fatal)];
    for id in [100, 101, 103, 104] {
        outcomes.push((
            config.defendant_url(id),
            Script::Page(defendant_body(&["111111"])),
        ));
    }
    let fetcher = ScriptedFetcher::new(outcomes);

    let executor = HarvestExecutor::with_fetcher(config.clone(), fetcher.clone()).unwrap();
    let result = executor.run().await;
    assert!(result.is_err());

    // No sheet fetch was attempted: the barrier was never crossed.
    assert!(fetcher.calls().iter().all(|url| !url.contains("666666.php")));

    // Completed siblings' pages are still on disk.
    for id in [100u32, 101, 103, 104] {
        let path = config.defendant_dir.join(format!("defendant{id}.html"));
        assert!(path.exists(), "defendant {id} page should have survived");
    }

    // A cancelled run still flushes the log.
    let log = std::fs::read_to_string(&config.log_path).unwrap();
    assert!(log.contains("harvest cancelled"));
}

#[tokio::test]
async fn resumed_run_fetches_only_missing_ids() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path(), 100, 110);
    std::fs::create_dir_all(&config.defendant_dir).unwrap();
    for id in [100, 103, 107] {
        std::fs::write(
            config.defendant_dir.join(format!("defendant{id}.html")),
            "cached",
        )
        .unwrap();
    }

    let fetcher = ScriptedFetcher::new(vec![]);
    let executor = HarvestExecutor::with_fetcher(config.clone(), fetcher.clone()).unwrap();
    let report = executor.run().await.unwrap();

    assert_eq!(report.mode, RunMode::MissingOnly);
    assert_eq!(report.defendants_requested, 7);

    let mut calls = fetcher.calls();
    calls.sort();
    let mut expected: Vec<String> = [101u32, 102, 104, 105, 106, 108, 109]
        .iter()
        .map(|&id| config.defendant_url(id))
        .collect();
    expected.sort();
    assert_eq!(calls, expected);

    // Pre-existing pages were not refetched or rewritten.
    assert_eq!(
        std::fs::read_to_string(config.defendant_dir.join("defendant100.html")).unwrap(),
        "cached"
    );
}

#[tokio::test]
async fn second_run_is_a_no_op_and_leaves_files_identical() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path(), 200, 203);

    let sheet = "666666.php?&docase=333333";
    let outcomes = vec![
        (
            config.defendant_url(200),
            Script::Page(defendant_body(&["333333"])),
        ),
        (
            config.defendant_url(201),
            Script::Page(defendant_body(&["333333"])),
        ),
        (
            config.defendant_url(202),
            Script::Page("<html><body>no cases</body></html>".into()),
        ),
        (config.sheet_url(sheet), Script::Page("sheet body".into())),
    ];

    let first = ScriptedFetcher::new(outcomes.clone());
    HarvestExecutor::with_fetcher(config.clone(), first)
        .unwrap()
        .run()
        .await
        .unwrap();
    let defendants_before = snapshot(&config.defendant_dir);
    let dockets_before = snapshot(&config.docket_dir);

    let second = ScriptedFetcher::new(outcomes);
    let report = HarvestExecutor::with_fetcher(config.clone(), second.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.mode, RunMode::MissingOnly);
    assert_eq!(report.defendants_requested, 0);
    assert!(second.calls().is_empty());

    assert_eq!(snapshot(&config.defendant_dir), defendants_before);
    assert_eq!(snapshot(&config.docket_dir), dockets_before);
}

#[tokio::test]
async fn transient_failures_are_recorded_not_fatal() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path(), 300, 303);

    let fetcher = ScriptedFetcher::new(vec![
        (
            config.defendant_url(300),
            Script::Page("<html><body>no cases</body></html>".into()),
        ),
        (config.defendant_url(301), Script::Unavailable),
        (config.defendant_url(302), Script::Empty),
    ]);

    let executor = HarvestExecutor::with_fetcher(config.clone(), fetcher).unwrap();
    let report = executor.run().await.unwrap();

    assert_eq!(report.defendants_stored, 1);
    assert_eq!(report.failed_urls, vec![config.defendant_url(301)]);

    // The unavailable item left no file behind, so a later run retries it.
    assert!(!config.defendant_dir.join("defendant301.html").exists());

    // The failed-URL list was persisted for operability.
    let persisted: Vec<String> = serde_json::from_slice(
        &std::fs::read(config.failed_urls_path.as_ref().unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(persisted, vec![config.defendant_url(301)]);
}

#[tokio::test]
async fn pre_triggered_shutdown_cancels_the_run() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path(), 400, 405);

    let shutdown = Shutdown::shared();
    shutdown.trigger();

    let fetcher = ScriptedFetcher::new(vec![]);
    let executor = HarvestExecutor::with_fetcher(config.clone(), fetcher)
        .unwrap()
        .with_shutdown(shutdown);
    let result = executor.run().await;

    assert!(matches!(result, Err(DownloadError::Interrupted)));
    let log = std::fs::read_to_string(&config.log_path).unwrap();
    assert!(log.contains("harvest cancelled"));
}
