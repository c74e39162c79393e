//! Live watcher tests.
//!
//! Tests verify:
//! - A file created in the watched directory is shrunk in place
//! - Files with unsupported extensions are never touched
//! - Shutdown returns the counters of the run

use std::fs;
use std::time::Duration;

use image::DynamicImage;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};

use shrinkwatch::pipeline::WatchService;
use shrinkwatch::watch::DirectoryWatcher;

use super::test_utils::{fast_settings, file_size, rgb_jpeg, textured_rgb};

const MAX_SIZE_KB: u64 = 3;

/// Whether `path` now holds a grayscale image within the test budget.
fn is_shrunk(path: &std::path::Path) -> bool {
    let Ok(data) = fs::read(path) else {
        return false;
    };
    if data.len() as u64 > MAX_SIZE_KB * 1024 {
        return false;
    }
    matches!(
        image::load_from_memory(&data),
        Ok(DynamicImage::ImageLuma8(_))
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_file_is_shrunk_in_place() {
    let dir = TempDir::new().unwrap();
    let settings = fast_settings(&dir, MAX_SIZE_KB);

    let (watcher, events) = DirectoryWatcher::start(dir.path(), settings.queue_capacity).unwrap();
    assert_eq!(watcher.directory(), dir.path());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let service = tokio::spawn(WatchService::new(&settings).run(events, async move {
        let _ = stop_rx.await;
    }));

    let image_path = dir.path().join("camera.jpg");
    let notes_path = dir.path().join("notes.txt");
    let source = rgb_jpeg(&textured_rgb(128, 128, 9), 95);
    assert!(source.len() as u64 > MAX_SIZE_KB * 1024);
    fs::write(&notes_path, b"not an image").unwrap();
    fs::write(&image_path, &source).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !is_shrunk(&image_path) {
        assert!(
            Instant::now() < deadline,
            "camera.jpg was not shrunk in time ({} bytes)",
            file_size(&image_path)
        );
        sleep(Duration::from_millis(50)).await;
    }

    stop_tx.send(()).unwrap();
    let stats = service.await.unwrap();
    drop(watcher);

    assert!(stats.replaced >= 1);
    assert_eq!(stats.failed, 0);
    assert!(file_size(&image_path) <= MAX_SIZE_KB * 1024);
    assert_eq!(fs::read(&notes_path).unwrap(), b"not an image");
}
