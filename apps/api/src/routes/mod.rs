pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::jobseekers::{handlers, options};
use crate::state::AppState;

/// Room for the text fields sent next to the resume in a registration.
const FORM_FIELDS_ALLOWANCE: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.resumes.max_bytes() + FORM_FIELDS_ALLOWANCE;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/options", get(options::handle_options))
        .route(
            "/api/jobseekers",
            get(handlers::handle_list).post(handlers::handle_create),
        )
        .route(
            "/api/jobseekers/:id",
            get(handlers::handle_get)
                .put(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        .route(
            "/api/jobseekers/:id/resume",
            get(handlers::handle_download_resume),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::models::{Jobseeker, JobseekerFilter, JobseekerPatch, NewJobseeker};
    use crate::resumes::ResumeStore;
    use crate::storage::{JobseekerStore, MemoryStore, SqliteStore, StorageError};

    const BOUNDARY: &str = "jobseeker-test-boundary";
    const PDF: &[u8] = b"%PDF-1.4\n1 0 obj << >> endobj\n%%EOF";

    struct TestApp {
        router: Router,
        uploads: std::path::PathBuf,
        _tmp: tempfile::TempDir,
    }

    impl TestApp {
        fn with_store(store: Arc<dyn JobseekerStore>, tmp: tempfile::TempDir) -> Self {
            Self::build(store, tmp, true, 1024 * 1024)
        }

        fn build(
            store: Arc<dyn JobseekerStore>,
            tmp: tempfile::TempDir,
            allow_duplicates: bool,
            max_bytes: usize,
        ) -> Self {
            let uploads = tmp.path().join("uploads");
            let mut config = Config::from_lookup(|_| None).unwrap();
            config.allow_duplicate_registrations = allow_duplicates;
            let state = AppState {
                store,
                resumes: ResumeStore::new(&uploads, max_bytes),
                config,
            };
            Self {
                router: build_router(state),
                uploads,
                _tmp: tmp,
            }
        }

        fn memory() -> Self {
            Self::with_store(Arc::new(MemoryStore::new()), tempfile::tempdir().unwrap())
        }

        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn register(&self, fields: &[(&str, &str)]) -> Response {
            self.send(multipart(fields, Some(("cv.pdf", "application/pdf", PDF))))
                .await
        }

        fn stored_files(&self) -> usize {
            std::fs::read_dir(&self.uploads)
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    fn candidate<'a>(
        name: &'a str,
        email: &'a str,
        skill: &'a str,
        location: &'a str,
    ) -> Vec<(&'a str, &'a str)> {
        vec![
            ("fullName", name),
            ("contactNumber", "5551234567"),
            ("email", email),
            ("gender", "female"),
            ("age", "34"),
            ("skill", skill),
            ("experience", "3-5"),
            ("location", location),
        ]
    }

    fn ada() -> Vec<(&'static str, &'static str)> {
        candidate("Ada Lovelace", "ada@example.com", "web-developer", "Austin")
    }

    fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\n\
                     Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
                     {value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\n\
                     Content-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/jobseekers")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn list(app: &TestApp, query: &str) -> Vec<Value> {
        let response = app.get(&format!("/api/jobseekers{query}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await.as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_create_then_get_returns_the_submission() {
        let app = TestApp::memory();

        let response = app.register(&ada()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;

        assert!(created["id"].as_i64().is_some());
        assert!(created["createdAt"].as_str().is_some());
        assert_eq!(created["fullName"], "Ada Lovelace");
        assert_eq!(created["age"], 34);
        assert_eq!(created["status"], "active");
        assert_eq!(created["resumeFileName"], "cv.pdf");
        assert!(created.get("resumeFilePath").is_none());

        let id = created["id"].as_i64().unwrap();
        let response = app.get(&format!("/api/jobseekers/{id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, created);
        assert_eq!(app.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_create_without_resume_is_rejected_and_not_persisted() {
        let app = TestApp::memory();

        let response = app.send(multipart(&ada(), None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["message"], "Resume file is required");

        assert!(list(&app, "").await.is_empty());
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_rejected() {
        let app = TestApp::memory();

        let response = app
            .send(multipart(&ada(), Some(("cv.png", "image/png", b"\x89PNG"))))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "UNSUPPORTED_FILE");

        assert!(list(&app, "").await.is_empty());
        assert_eq!(app.stored_files(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let app = TestApp::build(
            Arc::new(MemoryStore::new()),
            tempfile::tempdir().unwrap(),
            true,
            16,
        );

        let response = app
            .send(multipart(&ada(), Some(("cv.pdf", "application/pdf", &[b'x'; 64]))))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "UNSUPPORTED_FILE");
        assert_eq!(app.stored_files(), 0);
    }

    #[tokio::test]
    async fn test_upload_past_the_body_limit_is_an_oversized_resume() {
        let app = TestApp::build(
            Arc::new(MemoryStore::new()),
            tempfile::tempdir().unwrap(),
            true,
            16,
        );
        let data = vec![b'x'; 16 + FORM_FIELDS_ALLOWANCE + 200 * 1024];

        let response = app
            .send(multipart(&ada(), Some(("cv.pdf", "application/pdf", &data))))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FILE");
        assert_eq!(
            body["error"]["message"],
            "Resume exceeds the maximum size of 16 bytes"
        );

        assert_eq!(app.stored_files(), 0);
        assert!(list(&app, "").await.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_reports_fields_and_writes_nothing() {
        let app = TestApp::memory();
        let mut fields = ada();
        fields.retain(|(k, _)| *k != "age" && *k != "email");
        fields.push(("age", "17"));
        fields.push(("email", "not-an-email"));

        let response = app.register(&fields).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let cited: Vec<&str> = body["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["field"].as_str())
            .collect();
        assert!(cited.contains(&"age"));
        assert!(cited.contains(&"email"));

        assert_eq!(app.stored_files(), 0);
        assert!(list(&app, "").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_applies_every_filter() {
        let app = TestApp::memory();
        for fields in [
            ada(),
            candidate("Alan Turing", "alan@example.com", "web-developer", "Seattle"),
            candidate("Grace Hopper", "grace@example.com", "accountant", "Austin"),
        ] {
            assert_eq!(app.register(&fields).await.status(), StatusCode::CREATED);
        }

        let rows = list(&app, "?skill=web-developer&location=Austin").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["fullName"], "Ada Lovelace");

        let rows = list(&app, "?search=GRACE&skill=all&experience=all&location=all").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["email"], "grace@example.com");

        let names: Vec<String> = list(&app, "")
            .await
            .iter()
            .map(|r| r["fullName"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Grace Hopper", "Alan Turing", "Ada Lovelace"]);
    }

    #[tokio::test]
    async fn test_download_streams_pdf_and_404s_when_file_is_gone() {
        let app = TestApp::memory();
        let created = body_json(app.register(&ada()).await).await;
        let id = created["id"].as_i64().unwrap();

        let response = app.get(&format!("/api/jobseekers/{id}/resume")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"cv.pdf\""
        );
        assert_eq!(body_bytes(response).await, PDF);

        for entry in std::fs::read_dir(&app.uploads).unwrap() {
            std::fs::remove_file(entry.unwrap().path()).unwrap();
        }
        let response = app.get(&format!("/api/jobseekers/{id}/resume")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["message"], "Resume file not found");

        let response = app.get("/api/jobseekers/9999/resume").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_changes_only_the_supplied_field() {
        let app = TestApp::memory();
        let before = body_json(app.register(&ada()).await).await;
        let id = before["id"].as_i64().unwrap();

        let response = app
            .send(json_request(
                "PUT",
                &format!("/api/jobseekers/{id}"),
                json!({ "location": "Seattle", "createdAt": "1999-01-01T00:00:00Z" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let after = body_json(response).await;

        let mut expected = before.clone();
        expected["location"] = json!("Seattle");
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_values_and_unknown_ids() {
        let app = TestApp::memory();
        let created = body_json(app.register(&ada()).await).await;
        let id = created["id"].as_i64().unwrap();

        let response = app
            .send(json_request(
                "PUT",
                &format!("/api/jobseekers/{id}"),
                json!({ "age": 66 }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["fields"][0]["field"], "age");

        let response = app
            .send(json_request(
                "PUT",
                "/api/jobseekers/4242",
                json!({ "location": "Seattle" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_twice_returns_404_and_removes_resume() {
        let app = TestApp::memory();
        let created = body_json(app.register(&ada()).await).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(app.stored_files(), 1);

        let delete = || {
            Request::delete(format!("/api/jobseekers/{id}"))
                .body(Body::empty())
                .unwrap()
        };

        let response = app.send(delete()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Jobseeker deleted successfully"
        );
        assert_eq!(app.stored_files(), 0);

        assert_eq!(app.send(delete()).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            app.get(&format!("/api/jobseekers/{id}")).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_duplicates_rejected_when_disallowed() {
        let app = TestApp::build(
            Arc::new(MemoryStore::new()),
            tempfile::tempdir().unwrap(),
            false,
            1024 * 1024,
        );
        assert_eq!(app.register(&ada()).await.status(), StatusCode::CREATED);

        let again = candidate("Ada King", "ADA@example.com", "accountant", "London");
        let response = app.register(&again).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(list(&app, "").await.len(), 1);
        assert_eq!(app.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_allowed_by_default() {
        let app = TestApp::memory();
        assert_eq!(app.register(&ada()).await.status(), StatusCode::CREATED);
        assert_eq!(app.register(&ada()).await.status(), StatusCode::CREATED);
        assert_eq!(list(&app, "").await.len(), 2);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_a_client_error() {
        let app = TestApp::memory();
        assert_eq!(
            app.get("/api/jobseekers/abc").await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_health_and_options() {
        let app = TestApp::memory();
        let health = body_json(app.get("/health").await).await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["storage"], "memory");

        let options = body_json(app.get("/api/options").await).await;
        assert_eq!(options["skills"][1]["value"], "web-developer");
        assert_eq!(options["gender"][3]["label"], "Prefer not to say");
    }

    #[tokio::test]
    async fn test_full_lifecycle_on_sqlite() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&tmp.path().join("api.db"), 2)
            .await
            .unwrap();
        let app = TestApp::with_store(Arc::new(store), tmp);

        let created = body_json(app.register(&ada()).await).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(
            body_json(app.get(&format!("/api/jobseekers/{id}")).await).await,
            created
        );

        let rows = list(&app, "?location=aus").await;
        assert_eq!(rows.len(), 1);

        let response = app
            .send(json_request(
                "PUT",
                &format!("/api/jobseekers/{id}"),
                json!({ "status": "hired" }),
            ))
            .await;
        assert_eq!(body_json(response).await["status"], "hired");

        let response = app
            .send(
                Request::delete(format!("/api/jobseekers/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(list(&app, "").await.is_empty());
    }

    #[tokio::test]
    async fn test_memory_and_sqlite_agree_on_non_ascii_search() {
        let tmp = tempfile::tempdir().unwrap();
        let sqlite = SqliteStore::connect(&tmp.path().join("api.db"), 2)
            .await
            .unwrap();
        let apps = [
            TestApp::with_store(Arc::new(sqlite), tmp),
            TestApp::memory(),
        ];

        for app in &apps {
            let emile = candidate("Émile Zola", "emile@example.com", "accountant", "Besançon");
            assert_eq!(app.register(&emile).await.status(), StatusCode::CREATED);
            assert_eq!(app.register(&ada()).await.status(), StatusCode::CREATED);

            let rows = list(app, "?search=%C3%89MILE").await;
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["fullName"], "Émile Zola");
            assert_eq!(list(app, "?location=BESAN%C3%87ON").await.len(), 1);
        }
    }

    /// Store whose writes always fail, for exercising cleanup paths.
    struct UnavailableStore;

    #[async_trait]
    impl JobseekerStore for UnavailableStore {
        fn backend(&self) -> &'static str {
            "unavailable"
        }

        async fn create(&self, _new: &NewJobseeker) -> Result<Jobseeker, StorageError> {
            Err(sqlx::Error::PoolClosed.into())
        }

        async fn get(&self, _id: i64) -> Result<Option<Jobseeker>, StorageError> {
            Err(sqlx::Error::PoolClosed.into())
        }

        async fn list(&self, _filter: &JobseekerFilter) -> Result<Vec<Jobseeker>, StorageError> {
            Err(sqlx::Error::PoolClosed.into())
        }

        async fn update(
            &self,
            _id: i64,
            _patch: &JobseekerPatch,
        ) -> Result<Option<Jobseeker>, StorageError> {
            Err(sqlx::Error::PoolClosed.into())
        }

        async fn delete(&self, _id: i64) -> Result<bool, StorageError> {
            Err(sqlx::Error::PoolClosed.into())
        }

        async fn find_duplicate(
            &self,
            _email: &str,
            _contact_number: &str,
        ) -> Result<Option<Jobseeker>, StorageError> {
            Err(sqlx::Error::PoolClosed.into())
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_failed_insert_removes_the_uploaded_file() {
        let app = TestApp::with_store(Arc::new(UnavailableStore), tempfile::tempdir().unwrap());

        let response = app.register(&ada()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "STORAGE_ERROR");
        assert!(!body.to_string().contains("pool"));
        assert_eq!(app.stored_files(), 0);

        let response = app.get("/api/jobseekers").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
