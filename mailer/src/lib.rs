use futures::{future, Future as StdFuture, FutureExt, TryFutureExt};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    redirect, Method, RequestBuilder, Url,
};
use serde::Serialize;
use std::{pin::Pin, time::Duration};
use tokio::task::JoinHandle;

/// A type alias for `Future` that may return `crate::error::Error`
pub type Future<T> = Pin<Box<dyn StdFuture<Output = Result<T>> + Send>>;

mod error;

pub mod expired;

pub use error::{Error, Result};

/// The default timeout for requests to the email service, in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;
/// Maximum number of redirects followed per request
pub const MAX_REDIRECTS: usize = 5;

/// A message the email service knows how to deliver.
pub trait Notification: Serialize {
    /// Path of the email service endpoint, relative to its base url.
    const PATH: &'static str;
}

/// Client for the email dispatch service.
#[derive(Clone, Debug)]
pub struct Client {
    endpoint: Url,
    client: reqwest::Client,
}

impl Client {
    /// Create a new client for the service at `base_url` using the default
    /// timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::new_with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client for the service at `base_url` with the given
    /// request timeout in seconds.
    pub fn new_with_timeout(base_url: &str, timeout: u64) -> Result<Self> {
        let endpoint = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { endpoint, client })
    }

    /// Appends `path` to the base url, keeping any path the base url already
    /// carries.
    pub fn to_request_url(&self, path: &str) -> Result<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}")).map_err(Error::from)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.to_request_url(path)?;

        let mut headers = HeaderMap::new();
        headers.append(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(self.client.request(method, url).headers(headers))
    }

    pub fn submit<T>(&self, method: Method, path: &str, json: &T) -> Future<()>
    where
        T: Serialize + ?Sized,
    {
        let body = match serde_json::to_vec(json) {
            Ok(body) => body,
            Err(e) => return future::err(Error::from(e)).boxed(),
        };
        match self.request(method, path) {
            Ok(builder) => builder
                .body(body)
                .send()
                .map_err(Error::from)
                .and_then(|response| match response.error_for_status() {
                    Ok(_) => future::ok(()).boxed(),
                    Err(e) => future::err(Error::from(e)).boxed(),
                })
                .boxed(),
            Err(e) => future::err(e).boxed(),
        }
    }

    pub fn post<T>(&self, path: &str, json: &T) -> Future<()>
    where
        T: Serialize + ?Sized,
    {
        self.submit(Method::POST, path, json)
    }

    pub fn send<N: Notification>(&self, notification: &N) -> Future<()> {
        self.post(N::PATH, notification)
    }

    /// Posts the notification on a detached task and discards the outcome.
    ///
    /// The returned handle never carries the request error; dropping it leaves
    /// the request running.
    pub fn dispatch<N: Notification>(&self, notification: &N) -> JoinHandle<()> {
        let request = self.send(notification);
        tokio::spawn(async move {
            let _ = request.await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::Uri, Json, Router};
    use tokio::sync::mpsc;

    type Captured = (String, Option<String>, serde_json::Value);

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    async fn capture() -> (String, mpsc::UnboundedReceiver<Captured>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new().fallback(
            move |uri: Uri, headers: axum::http::HeaderMap, Json(body): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let content_type = headers
                        .get(CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    let _ = tx.send((uri.path().to_string(), content_type, body));
                    "ok"
                }
            },
        );
        (serve(app).await, rx)
    }

    #[derive(Serialize)]
    struct Ping {
        message: &'static str,
    }

    impl Notification for Ping {
        const PATH: &'static str = "/ping";
    }

    #[test]
    fn request_url_keeps_base_path() {
        let client = Client::new("http://mail.local/email/").unwrap();
        assert_eq!(
            client.to_request_url("/send-shift-expired").unwrap().as_str(),
            "http://mail.local/email/send-shift-expired"
        );
        let client = Client::new("http://mail.local").unwrap();
        assert_eq!(
            client.to_request_url("send-shift-expired").unwrap().as_str(),
            "http://mail.local/send-shift-expired"
        );
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(
            Client::new("not a url"),
            Err(Error::MalformedUrl(_))
        ));
    }

    #[tokio::test]
    async fn send_posts_json() {
        let (url, mut rx) = capture().await;
        let client = Client::new(&url).unwrap();
        client.send(&Ping { message: "hi" }).await.unwrap();

        let (path, content_type, body) = rx.recv().await.unwrap();
        assert_eq!(path, "/ping");
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, serde_json::json!({ "message": "hi" }));
    }

    #[tokio::test]
    async fn send_fails_on_error_status() {
        let app = Router::new().fallback(|| async {
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "down")
        });
        let client = Client::new(&serve(app).await).unwrap();
        assert!(matches!(
            client.send(&Ping { message: "hi" }).await,
            Err(Error::Request(_))
        ));
    }

    #[tokio::test]
    async fn send_times_out() {
        let app = Router::new().fallback(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "late"
        });
        let client = Client::new_with_timeout(&serve(app).await, 1).unwrap();
        let err = client.send(&Ping { message: "hi" }).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn dispatch_swallows_failures() {
        // nothing listens on the discard port
        let client = Client::new("http://127.0.0.1:9").unwrap();
        client.dispatch(&Ping { message: "hi" }).await.unwrap();
    }

    #[tokio::test]
    async fn dispatch_delivers() {
        let (url, mut rx) = capture().await;
        let client = Client::new(&url).unwrap();
        client.dispatch(&Ping { message: "hi" }).await.unwrap();
        let (path, _, _) = rx.recv().await.unwrap();
        assert_eq!(path, "/ping");
    }
}
