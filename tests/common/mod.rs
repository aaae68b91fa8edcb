use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use ragdesk::auth::jwt::JwtService;
use ragdesk::auth::password::hash_password;
use ragdesk::catalog::{Catalog, NewUser};
use ragdesk::chat::{CannedResponse, ConsoleRegistry, ResponseMode, ResponsePicker};
use ragdesk::config::AppConfig;
use ragdesk::models::Role;
use ragdesk::routes;
use ragdesk::seed;
use ragdesk::state::AppState;
use ragdesk::storage::ObjectStorage;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex, Notify};
use tower::util::ServiceExt;
use uuid::Uuid;

/// In-memory storage. While uploads are held, `put_object` parks after
/// writing until `release_uploads` is called.
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    held: watch::Sender<bool>,
    parked: Notify,
}

impl Default for FakeStorage {
    fn default() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            held: watch::channel(false).0,
            parked: Notify::new(),
        }
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put_object(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        {
            let mut guard = self.objects.lock().await;
            guard.insert(key.to_string(), bytes);
        }
        if *self.held.borrow() {
            let mut released = self.held.subscribe();
            self.parked.notify_one();
            released
                .wait_for(|held| !*held)
                .await
                .map_err(|err| anyhow!("upload gate closed: {err}"))?;
        }
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let guard = self.objects.lock().await;
        guard
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("object {key} missing"))
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let mut guard = self.objects.lock().await;
        guard.remove(key);
        Ok(())
    }
}

impl FakeStorage {
    #[allow(dead_code)]
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let guard = self.objects.lock().await;
        guard.get(key).cloned()
    }

    #[allow(dead_code)]
    pub async fn object_count(&self) -> usize {
        let guard = self.objects.lock().await;
        guard.len()
    }

    #[allow(dead_code)]
    pub async fn clear(&self) {
        self.objects.lock().await.clear();
    }

    #[allow(dead_code)]
    pub fn hold_uploads(&self) {
        self.held.send_replace(true);
    }

    #[allow(dead_code)]
    pub fn release_uploads(&self) {
        self.held.send_replace(false);
    }

    /// Resolves once an upload has written its bytes and is parked.
    #[allow(dead_code)]
    pub async fn upload_parked(&self) {
        self.parked.notified().await;
    }
}

/// Always answers with the first canned response after a fixed delay.
/// Fast replies report 0.5s, every other mode 1.5s.
pub struct ScriptedPicker {
    delay: Duration,
}

impl ResponsePicker for ScriptedPicker {
    fn pick(&self, _mode: ResponseMode, _candidates: &[CannedResponse]) -> usize {
        0
    }

    fn delay(&self, _mode: ResponseMode) -> Duration {
        self.delay
    }

    fn response_time(&self, mode: ResponseMode) -> f64 {
        match mode {
            ResponseMode::Fast => 0.5,
            _ => 1.5,
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    storage: Arc<FakeStorage>,
}

impl TestApp {
    /// Fixture-seeded app whose chat replies arrive immediately.
    pub async fn new() -> Result<Self> {
        Self::with_chat_delay(Duration::ZERO).await
    }

    pub async fn with_chat_delay(delay: Duration) -> Result<Self> {
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".to_string()),
            "JWT_ISSUER" => Some("test-issuer".to_string()),
            "JWT_AUDIENCE" => Some("test-audience".to_string()),
            "UPLOAD_MAX_BYTES" => Some((64 * 1024).to_string()),
            _ => None,
        })?;

        let mut catalog = Catalog::new(Uuid::new_v4());
        seed::seed_fixtures(&mut catalog).context("failed to seed fixtures")?;

        let storage = Arc::new(FakeStorage::default());
        let storage_for_state: Arc<dyn ObjectStorage> = storage.clone();
        let jwt = JwtService::from_config(&config)?;
        let consoles = ConsoleRegistry::new(Arc::new(ScriptedPicker { delay }));
        let state = AppState::new(config, catalog, storage_for_state, jwt, consoles);
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            router,
            storage,
        })
    }

    #[allow(dead_code)]
    pub fn storage(&self) -> Arc<FakeStorage> {
        self.storage.clone()
    }

    #[allow(dead_code)]
    pub async fn department_id(&self, name: &str) -> Result<Uuid> {
        let catalog = self.state.catalog.read().await;
        catalog
            .departments
            .find(|department| department.name == name)
            .map(|department| department.id)
            .ok_or_else(|| anyhow!("department {name} missing"))
    }

    pub async fn insert_user(&self, email: &str, password: &str, role: Role) -> Result<Uuid> {
        let password_hash = hash_password(password)?;
        let department_id = self.department_id("IT").await?;
        let mut catalog = self.state.catalog.write().await;
        let user = catalog
            .register_user(NewUser {
                email: email.to_string(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                nickname: None,
                department_id: Some(department_id),
                position: "사원".to_string(),
                role,
                password_hash: Some(password_hash),
            })
            .map_err(|err| anyhow!("failed to insert user: {err}"))?;
        Ok(user.id)
    }

    pub async fn login_token(&self, email: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json("/api/auth/login", &LoginPayload { email, password }, None)
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_vec(response.into_body()).await?;
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            access_token: String,
        }
        let parsed: LoginResponse = serde_json::from_slice(&body)?;
        Ok(parsed.access_token)
    }

    /// Creates a user with `role` and returns a bearer token for them.
    #[allow(dead_code)]
    pub async fn token_for(&self, email: &str, role: Role) -> Result<String> {
        self.insert_user(email, "password123", role).await?;
        self.login_token(email, "password123").await
    }

    async fn send(&self, request: Request<Body>) -> hyper::Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response")
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.json_request(Method::POST, path, payload, token).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.json_request(Method::PATCH, path, payload, token).await
    }

    async fn json_request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self.send(request).await)
    }

    #[allow(dead_code)]
    pub async fn post_empty(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.empty_request(Method::POST, path, token).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.empty_request(Method::GET, path, token).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.empty_request(Method::DELETE, path, token).await
    }

    async fn empty_request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self.send(request).await)
    }

    #[allow(dead_code)]
    pub async fn upload_document(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
        fields: &[(&str, &str)],
        token: &str,
    ) -> Result<hyper::Response<Body>> {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();
        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend(data);
        body.extend(b"\r\n");

        for (name, value) in fields {
            body.extend(format!("--{boundary}\r\n").as_bytes());
            body.extend(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            );
            body.extend(value.as_bytes());
            body.extend(b"\r\n");
        }

        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/documents")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body))?;
        Ok(self.send(request).await)
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn json_body<T: DeserializeOwned>(response: hyper::Response<Body>) -> Result<T> {
    let body = body_to_vec(response.into_body()).await?;
    serde_json::from_slice(&body).with_context(|| {
        format!(
            "unexpected response body: {}",
            String::from_utf8_lossy(&body)
        )
    })
}
