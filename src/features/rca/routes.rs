use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::rca::handlers::{self, RcaState};

/// Create routes for the RCA feature
pub fn routes(state: RcaState, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/uploads/{name}", get(handlers::uploaded_file))
        .route(
            "/generate",
            post(handlers::generate).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};

    use crate::shared::constants::{FLASH_COOKIE_NAME, REQUIRED_FIELDS_MESSAGE};
    use crate::shared::flash;
    use crate::shared::test_helpers::{
        png_bytes, test_server, test_server_with_tracker, tracker_config, TEST_SECRET,
    };

    fn form(site_name: &str) -> MultipartForm {
        MultipartForm::new()
            .add_text("site_name", site_name)
            .add_text("date", "2024-01-01")
            .add_text("heading", "Conveyor Jam")
            .add_text("description", "Belt stopped at 10am")
            .add_text("rca_by", "J. Doe")
    }

    fn with_files(form: MultipartForm) -> MultipartForm {
        form.add_part(
            "files",
            Part::bytes(png_bytes(40, 30))
                .file_name("photo.png")
                .mime_type("image/png"),
        )
        .add_part(
            "files",
            Part::bytes(b"line one".to_vec())
                .file_name("log.txt")
                .mime_type("text/plain"),
        )
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;

        let response = server.get("/").await;

        response.assert_status_ok();
        assert!(response.text().contains("action=\"/generate\""));
    }

    #[tokio::test]
    async fn test_index_shows_and_clears_flash() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let cookie = format!(
            "{}={}",
            FLASH_COOKIE_NAME,
            flash::encode(TEST_SECRET, REQUIRED_FIELDS_MESSAGE).unwrap()
        );

        let response = server.get("/").add_header(header::COOKIE, cookie).await;

        response.assert_status_ok();
        assert!(response.text().contains(REQUIRED_FIELDS_MESSAGE));
        let set_cookie = response.header(header::SET_COOKIE);
        assert!(set_cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_generate_missing_field_redirects_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;

        let response = server
            .post("/generate")
            .multipart(with_files(form("   ")))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/");
        let set_cookie = response.header(header::SET_COOKIE);
        let value = set_cookie
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, v)| v.to_string())
            .unwrap();
        assert_eq!(
            flash::decode(TEST_SECRET, &value).as_deref(),
            Some(REQUIRED_FIELDS_MESSAGE)
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_generate_missing_field_never_calls_tracker() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = mockito::Server::new_async().await;
        let issues = tracker
            .mock("POST", "/repos/acme/rca/issues")
            .with_status(201)
            .with_body(r#"{"html_url": "https://github.com/acme/rca/issues/1"}"#)
            .expect(0)
            .create_async()
            .await;
        let server = test_server_with_tracker(dir.path(), &tracker_config(&tracker.url())).await;

        let response = server
            .post("/generate")
            .multipart(with_files(form("")))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        issues.assert_async().await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_generate_files_one_issue_when_valid() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = mockito::Server::new_async().await;
        let issues = tracker
            .mock("POST", "/repos/acme/rca/issues")
            .with_status(201)
            .with_body(r#"{"html_url": "https://github.com/acme/rca/issues/1"}"#)
            .expect(1)
            .create_async()
            .await;
        let server = test_server_with_tracker(dir.path(), &tracker_config(&tracker.url())).await;

        let response = server
            .post("/generate")
            .multipart(with_files(form("Plant A")))
            .await;

        response.assert_status_ok();
        issues.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_returns_pdf_download() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;

        let response = server
            .post("/generate")
            .multipart(with_files(form("Plant A")))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
        assert_eq!(
            response.header(header::CONTENT_DISPOSITION),
            "attachment; filename=\"Plant_A_2024-01-01_RCA.pdf\""
        );
        assert!(response.as_bytes().starts_with(b"%PDF"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_generate_skips_disallowed_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;

        let response = server
            .post("/generate")
            .multipart(
                form("Plant A")
                    .add_part("files", Part::bytes(b"MZ".to_vec()).file_name("tool.exe"))
                    .add_part("files", Part::bytes(b"notes".to_vec()).file_name("README")),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_uploaded_file_served_inline() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        server
            .post("/generate")
            .multipart(with_files(form("Plant A")))
            .await
            .assert_status_ok();
        let stored = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .find(|name| name.starts_with("log_"))
            .unwrap();

        let response = server.get(&format!("/uploads/{}", stored)).await;

        response.assert_status_ok();
        assert_eq!(
            response.header(header::CONTENT_TYPE),
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.text(), "line one");
    }

    #[tokio::test]
    async fn test_uploaded_file_unknown_or_traversal_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(&dir.path().join("uploads")).await;
        std::fs::write(dir.path().join("secret.txt"), b"nope").unwrap();

        server
            .get("/uploads/missing.txt")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/uploads/..%2Fsecret.txt")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
