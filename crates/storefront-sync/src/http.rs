//! # HTTP Catalog Backend
//!
//! `reqwest` client for the product CRUD service.
//!
//! ## Response Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  2xx ─────────────────────────► body decoded as JSON                   │
//! │  404 ─────────────────────────► SyncError::NotFound                    │
//! │  other status ────────────────► SyncError::Remote { status, message }  │
//! │                                  message = body.error, else the status  │
//! │  connect / timeout / TLS ─────► SyncError::Transport                   │
//! │  2xx with an undecodable body ► SyncError::Decode                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use storefront_core::{NewProduct, ProductId, ProductPatch};

use crate::backend::CatalogBackend;
use crate::config::StorefrontConfig;
use crate::error::{SyncError, SyncResult};

/// CRUD backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogBackend {
    client: Client,
    base: Url,
}

impl HttpCatalogBackend {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> SyncResult<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(SyncError::InvalidConfig(format!(
                "Backend URL cannot be used as a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        Ok(HttpCatalogBackend { client, base })
    }

    pub fn from_config(config: &StorefrontConfig) -> SyncResult<Self> {
        Self::new(config.backend_url(), config.request_timeout())
    }

    fn products_url(&self) -> SyncResult<Url> {
        self.url_with(&["products"])
    }

    fn product_url(&self, id: &ProductId) -> SyncResult<Url> {
        self.url_with(&["products", id.as_str()])
    }

    fn url_with(&self, segments: &[&str]) -> SyncResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidConfig("Backend URL cannot be used as a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and maps non-success statuses to errors.
    async fn send(&self, request: RequestBuilder, subject: &str) -> SyncResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), subject, "Backend responded");

        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        if status == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(subject.to_string()));
        }

        Err(SyncError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json(&self, request: RequestBuilder, subject: &str) -> SyncResult<Value> {
        let response = self.send(request, subject).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }
}

/// Extracts `{"error": "..."}` from a failed response, falling back to the
/// status reason.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string();

    match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}

#[async_trait]
impl CatalogBackend for HttpCatalogBackend {
    async fn list(&self) -> SyncResult<Vec<Value>> {
        let url = self.products_url()?;
        match self.send_json(self.client.get(url), "products").await? {
            Value::Array(records) => Ok(records),
            other => Err(SyncError::Decode(format!(
                "expected a JSON array of products, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn get(&self, id: &ProductId) -> SyncResult<Value> {
        let url = self.product_url(id)?;
        self.send_json(self.client.get(url), id.as_str()).await
    }

    async fn create(&self, product: &NewProduct) -> SyncResult<Value> {
        let url = self.products_url()?;
        self.send_json(self.client.post(url).json(product), &product.name)
            .await
    }

    async fn update(&self, id: &ProductId, patch: &ProductPatch) -> SyncResult<Value> {
        let url = self.product_url(id)?;
        self.send_json(self.client.put(url).json(patch), id.as_str())
            .await
    }

    async fn delete(&self, id: &ProductId) -> SyncResult<()> {
        let url = self.product_url(id)?;
        self.send(self.client.delete(url), id.as_str()).await?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use storefront_core::Money;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn backend(base: &str) -> HttpCatalogBackend {
        HttpCatalogBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    async fn get_product(Path(id): Path<String>) -> (AxumStatus, Json<Value>) {
        if id == "p1" {
            (
                AxumStatus::OK,
                Json(json!({"id": "p1", "name": "Fan", "price": 35.25, "stock": 10, "category": "misc"})),
            )
        } else {
            (
                AxumStatus::NOT_FOUND,
                Json(json!({"error": "Producto no encontrado"})),
            )
        }
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let router = Router::new()
            .route(
                "/api/products",
                get(|| async { Json(json!([{"id": "p1"}, {"id": "p2"}])) }),
            )
            .route("/api/products/{id}", get(get_product));
        let base = serve(router).await;
        let backend = backend(&base);

        assert_eq!(backend.list().await.unwrap().len(), 2);

        let record = backend.get(&ProductId::from("p1")).await.unwrap();
        assert_eq!(record["name"], "Fan");

        let err = backend.get(&ProductId::from("nope")).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_remote_error_carries_body_message() {
        let router = Router::new().route(
            "/api/products",
            get(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Error interno del servidor"})),
                )
            }),
        );
        let backend = backend(&serve(router).await);

        match backend.list().await.unwrap_err() {
            SyncError::Remote { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Error interno del servidor");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_array_listing_is_decode_error() {
        let router = Router::new().route(
            "/api/products",
            get(|| async { Json(json!({"products": []})) }),
        );
        let backend = backend(&serve(router).await);

        let err = backend.list().await.unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_create_posts_decimal_price() {
        let router = Router::new().route(
            "/api/products",
            axum::routing::post(|Json(body): Json<Value>| async move {
                let mut stored = body;
                stored["id"] = json!("new-1");
                (AxumStatus::CREATED, Json(stored))
            }),
        );
        let backend = backend(&serve(router).await);

        let product = NewProduct::new("Fan", "Pedestal fan", Money::from_cents(3525), "misc");
        let record = backend.create(&product).await.unwrap();

        assert_eq!(record["id"], "new-1");
        assert_eq!(record["price"], json!(35.25));
        assert_eq!(record["stock"], json!(0));
        assert_eq!(record["image"], json!("/placeholder.svg"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = backend(&format!("http://{}/api", addr));
        let err = backend.list().await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }

    #[test]
    fn test_urls_keep_base_path() {
        let backend = backend("http://localhost:3000/api/");
        assert_eq!(
            backend.product_url(&ProductId::from("a b")).unwrap().as_str(),
            "http://localhost:3000/api/products/a%20b"
        );
        assert!(HttpCatalogBackend::new("mailto:x@y", Duration::from_secs(1)).is_err());
    }
}
