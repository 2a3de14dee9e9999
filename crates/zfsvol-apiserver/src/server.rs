use crate::activation::{self, Activation};
use crate::handlers::*;
use crate::AppState;
use axum::routing::post;
use axum::Router;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UnixListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Well-known socket Docker discovers plugins through
pub const DEFAULT_SOCKET_PATH: &str = "/run/docker/plugins/docker-zfs-plugin.sock";

/// API server configuration
#[derive(Clone)]
pub struct Config {
    /// Socket path used when no listener was passed by the service manager
    pub socket_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
        }
    }
}

/// Plugin API server
pub struct ApiServer {
    config: Config,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: Config, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/Plugin.Activate", post(activate))
            .route("/VolumeDriver.Create", post(create_volume))
            .route("/VolumeDriver.List", post(list_volumes))
            .route("/VolumeDriver.Get", post(get_volume))
            .route("/VolumeDriver.Remove", post(remove_volume))
            .route("/VolumeDriver.Path", post(volume_path))
            .route("/VolumeDriver.Mount", post(mount_volume))
            .route("/VolumeDriver.Unmount", post(unmount_volume))
            .route("/VolumeDriver.Capabilities", post(capabilities))
            // Add tracing and state
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured socket path, replacing a stale socket file
    pub fn bind(&self) -> std::io::Result<UnixListener> {
        let path = &self.config.socket_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::remove_file(path) {
            Ok(()) => debug!("Removed stale socket {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        UnixListener::bind(path)
    }

    /// Run the server until `shutdown` resolves
    ///
    /// Serves on a socket-activated listener when exactly one was passed,
    /// otherwise on the configured socket path. Several activated listeners
    /// are not supported: a warning is logged and nothing is served.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = match activation::from_env()? {
            Activation::None => {
                let listener = self.bind()?;
                info!("Serving volume plugin on {}", self.config.socket_path.display());
                listener
            }
            Activation::Single(std_listener) => {
                let listener = UnixListener::from_std(std_listener)?;
                info!(
                    "Serving volume plugin on activated listener {:?}",
                    listener.local_addr().ok()
                );
                listener
            }
            Activation::Multiple(count) => {
                warn!("Driver does not support multiple sockets ({} passed)", count);
                return Ok(());
            }
        };

        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: UnixListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PLUGIN_CONTENT_TYPE;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tower::ServiceExt;
    use zfsvol_driver::{DriverConfig, MockPool, VolumeManager};

    async fn app_state(dir: &Path) -> (Arc<MockPool>, Arc<AppState>) {
        let pool = Arc::new(MockPool::new());
        pool.insert_dataset("pool/docker").await;
        let manager = VolumeManager::open(
            DriverConfig::new("pool/docker", dir.join("base")),
            pool.clone(),
        )
        .await
        .unwrap();
        (pool, Arc::new(AppState::new(Arc::new(manager))))
    }

    fn server_at(socket_path: PathBuf, state: Arc<AppState>) -> ApiServer {
        ApiServer::new(Config { socket_path }, state)
    }

    async fn setup() -> (TempDir, Arc<MockPool>, Router) {
        let dir = tempdir().unwrap();
        let (pool, state) = app_state(dir.path()).await;
        let router = server_at(dir.path().join("plugin.sock"), state).build_router();
        (dir, pool, router)
    }

    async fn call(router: &Router, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_activate() {
        let (_dir, _pool, router) = setup().await;
        let (status, body) = call(&router, "/Plugin.Activate", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"Implements": ["VolumeDriver"]}));
    }

    #[tokio::test]
    async fn test_capabilities_accepts_empty_body() {
        let (_dir, _pool, router) = setup().await;
        let request = Request::builder()
            .method("POST")
            .uri("/VolumeDriver.Capabilities")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PLUGIN_CONTENT_TYPE
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"Capabilities": {"Scope": "local"}}));
    }

    #[tokio::test]
    async fn test_volume_lifecycle_over_http() {
        let (dir, pool, router) = setup().await;
        let mountpoint = dir.path().join("base").join("volumes").join("data");
        let mountpoint = mountpoint.to_str().unwrap();

        let (status, body) = call(
            &router,
            "/VolumeDriver.Create",
            json!({"Name": "data", "Opts": {"driver_zfsAutosnapshot": "true"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"Err": ""}));
        let props = pool.properties("pool/docker/volumes/data").await.unwrap();
        assert_eq!(props.get("com.sun:auto-snapshot").map(String::as_str), Some("true"));

        let (_, body) = call(&router, "/VolumeDriver.List", json!({})).await;
        assert_eq!(body["Volumes"].as_array().unwrap().len(), 1);
        assert_eq!(body["Volumes"][0]["Name"], "data");
        assert_eq!(body["Err"], "");

        let (_, body) = call(&router, "/VolumeDriver.Get", json!({"Name": "data"})).await;
        assert_eq!(body["Volume"]["Mountpoint"], mountpoint);
        assert!(body["Volume"]["CreatedAt"].is_string());

        let (_, body) = call(&router, "/VolumeDriver.Path", json!({"Name": "data"})).await;
        assert_eq!(body["Mountpoint"], mountpoint);

        let (_, body) = call(
            &router,
            "/VolumeDriver.Mount",
            json!({"Name": "data", "ID": "c1"}),
        )
        .await;
        assert_eq!(body["Mountpoint"], mountpoint);

        let (status, body) = call(
            &router,
            "/VolumeDriver.Unmount",
            json!({"Name": "data", "ID": "c1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"Err": ""}));

        let (status, _) = call(&router, "/VolumeDriver.Remove", json!({"Name": "data"})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&router, "/VolumeDriver.Get", json!({"Name": "data"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["Err"], "Volume not found: data");
    }

    #[tokio::test]
    async fn test_create_with_mountpoint_is_bad_request() {
        let (_dir, pool, router) = setup().await;
        let (status, body) = call(
            &router,
            "/VolumeDriver.Create",
            json!({"Name": "data", "Opts": {"mountpoint": "/srv"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["Err"].as_str().unwrap().contains("mountpoint"));
        assert!(!pool.contains("pool/docker/volumes/data").await);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_conflict() {
        let (_dir, _pool, router) = setup().await;
        call(&router, "/VolumeDriver.Create", json!({"Name": "data"})).await;
        let (status, body) = call(&router, "/VolumeDriver.Create", json!({"Name": "data"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(!body["Err"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (_dir, _pool, router) = setup().await;
        let request = Request::builder()
            .method("POST")
            .uri("/VolumeDriver.Get")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket() {
        let dir = tempdir().unwrap();
        let (_pool, state) = app_state(dir.path()).await;
        let socket_path = dir.path().join("run").join("plugin.sock");
        std::fs::create_dir_all(socket_path.parent().unwrap()).unwrap();
        std::fs::write(&socket_path, b"stale").unwrap();

        let server = server_at(socket_path.clone(), state);
        let _listener = server.bind().unwrap();
        assert!(socket_path.exists());
        assert!(std::os::unix::net::UnixStream::connect(&socket_path).is_ok());
    }

    #[tokio::test]
    async fn test_serve_over_unix_socket() {
        let dir = tempdir().unwrap();
        let (_pool, state) = app_state(dir.path()).await;
        let socket_path = dir.path().join("plugin.sock");
        let server = server_at(socket_path.clone(), state);

        let listener = server.bind().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async move {
            let _ = rx.await;
        }));

        let mut stream = tokio::net::UnixStream::connect(&socket_path).await.unwrap();
        stream
            .write_all(
                b"POST /Plugin.Activate HTTP/1.1\r\nHost: plugin\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            )
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200"));
        assert!(raw.contains(r#"{"Implements":["VolumeDriver"]}"#));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
