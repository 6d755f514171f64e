#[cfg(test)]
use std::io::Cursor;
#[cfg(test)]
use std::path::Path;
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use axum_test::TestServer;
#[cfg(test)]
use chrono::{TimeZone, Utc};

#[cfg(test)]
use crate::core::config::{ReportConfig, StorageConfig, TrackerConfig};
#[cfg(test)]
use crate::features::rca::dtos::SubmissionDto;
#[cfg(test)]
use crate::features::rca::models::{StoredAttachment, UploadedFile};
#[cfg(test)]
use crate::features::rca::{routes, IssueService, RcaService, RcaState};
#[cfg(test)]
use crate::modules::pdf::ReportComposer;
#[cfg(test)]
use crate::modules::storage::{FixedClock, LocalDiskStore};

#[cfg(test)]
pub const TEST_SECRET: &str = "test-secret";

#[cfg(test)]
pub const TEST_BASE_URL: &str = "http://localhost:5000";

/// The example submission used across tests
#[cfg(test)]
pub fn sample_submission() -> SubmissionDto {
    SubmissionDto {
        site_name: "Plant A".to_string(),
        date: "2024-01-01".to_string(),
        heading: "Conveyor Jam".to_string(),
        description: "Belt stopped at 10am".to_string(),
        rca_by: "J. Doe".to_string(),
    }
}

#[cfg(test)]
pub fn sample_attachments() -> Vec<StoredAttachment> {
    vec![
        StoredAttachment {
            original_name: "photo.jpg".to_string(),
            display_name: "photo.jpg".to_string(),
            stored_name: "photo_20240101103015000042.jpg".to_string(),
            is_image: true,
            url: format!("{}/uploads/photo_20240101103015000042.jpg", TEST_BASE_URL),
        },
        StoredAttachment {
            original_name: "log.txt".to_string(),
            display_name: "log.txt".to_string(),
            stored_name: "log_20240101103015000042.txt".to_string(),
            is_image: false,
            url: format!("{}/uploads/log_20240101103015000042.txt", TEST_BASE_URL),
        },
    ]
}

#[cfg(test)]
pub fn uploaded(filename: &str, bytes: &[u8]) -> UploadedFile {
    UploadedFile {
        filename: filename.to_string(),
        bytes: bytes.to_vec(),
    }
}

/// Tracker config pointing at `api_base_url` with both credentials set
#[cfg(test)]
pub fn tracker_config(api_base_url: &str) -> TrackerConfig {
    TrackerConfig {
        token: Some("tok".to_string()),
        repo: Some("acme/rca".to_string()),
        api_base_url: api_base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

/// PNG-encoded gradient image
#[cfg(test)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// RCA service storing into `upload_dir` at a fixed instant, with no
/// tracker configured and no logo
#[cfg(test)]
pub async fn test_rca_service(upload_dir: &Path) -> RcaService {
    let mut tracker = tracker_config("http://127.0.0.1:9");
    tracker.token = None;

    test_rca_service_with_tracker(upload_dir, &tracker).await
}

/// Same as [`test_rca_service`] but filing issues through `tracker`
#[cfg(test)]
pub async fn test_rca_service_with_tracker(
    upload_dir: &Path,
    tracker: &TrackerConfig,
) -> RcaService {
    let clock = Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 15).unwrap();
    let store = LocalDiskStore::new(
        &StorageConfig {
            upload_dir: upload_dir.to_path_buf(),
        },
        Arc::new(FixedClock(clock)),
    )
    .await
    .unwrap();

    let composer = ReportComposer::new(&ReportConfig {
        logo_path: upload_dir.join("missing-logo.jpeg"),
    });

    RcaService::new(
        Arc::new(store),
        IssueService::new(tracker).unwrap(),
        Arc::new(composer),
    )
}

#[cfg(test)]
fn server_for(rca_service: RcaService) -> TestServer {
    let state = RcaState {
        rca_service: Arc::new(rca_service),
        secret_key: Arc::from(TEST_SECRET),
        public_base_url: Some(Arc::from(TEST_BASE_URL)),
    };

    TestServer::new(routes(state, 10 * 1024 * 1024)).unwrap()
}

/// In-process server for the RCA routes
#[cfg(test)]
pub async fn test_server(upload_dir: &Path) -> TestServer {
    server_for(test_rca_service(upload_dir).await)
}

/// In-process server whose issues go to `tracker`
#[cfg(test)]
pub async fn test_server_with_tracker(upload_dir: &Path, tracker: &TrackerConfig) -> TestServer {
    server_for(test_rca_service_with_tracker(upload_dir, tracker).await)
}
