use crate::core::materializer;
use crate::domain::model::{ApiContext, ResponseEnvelope};
use crate::domain::ports::Storage;
use crate::utils::error::{CallerError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::time::Duration;
use url::Url;

/// What a paginated call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSummary {
    pub requests: usize,
    pub files_written: Vec<String>,
    pub records_written: usize,
}

/// Issues JSON calls against the configured URL and follows pages.
pub struct ApiCaller {
    pub(crate) client: Client,
    pub(crate) context: ApiContext,
}

impl ApiCaller {
    pub fn new(context: ApiContext) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = context.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            context,
        })
    }

    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.context.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Sends one request and decodes the response envelope.
    pub async fn fetch_page(
        &self,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
    ) -> Result<ResponseEnvelope> {
        tracing::info!("{}: {}", method, url);

        let mut request = self
            .client
            .request(method, url.clone())
            .header(CONTENT_TYPE, "application/json");
        request = self.authorize(request);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        tracing::debug!("API response status: {}", response.status());
        let bytes = response.bytes().await?;

        match serde_json::from_slice::<ResponseEnvelope>(&bytes) {
            Ok(envelope) => {
                tracing::debug!("Response >>> {}", String::from_utf8_lossy(&bytes));
                Ok(envelope)
            }
            Err(source) => {
                let body = String::from_utf8_lossy(&bytes).into_owned();
                tracing::error!("Response >>> {}", body);
                Err(CallerError::ResponseParse { source, body })
            }
        }
    }

    /// Runs the call and keeps fetching with `GET ?page=N` while the
    /// envelope reports `totalPage > page`. Each page lands in its own file.
    pub async fn run<S: Storage>(
        &self,
        method: Method,
        body: Option<Vec<u8>>,
        output: &S,
    ) -> Result<CallSummary> {
        let mut summary = CallSummary::default();
        let mut url = self.context.url.clone();
        let mut method = method;
        let mut body = body;
        let mut file_name = materializer::page_file_name(None);

        loop {
            let envelope = self.fetch_page(method, &url, body.take()).await?;
            summary.requests += 1;

            if !envelope.success {
                return Err(CallerError::Remote {
                    message: envelope.message.unwrap_or_default(),
                });
            }

            match materializer::save_records(output, &envelope.data, &file_name).await {
                Ok(count) => {
                    summary.records_written += count;
                    summary.files_written.push(file_name.clone());
                }
                Err(e) if !e.is_fatal() => tracing::warn!("{}", e),
                Err(e) => return Err(e),
            }

            let Some(next_page) = envelope.meta.next_page() else {
                break;
            };

            if let Some(max_pages) = self.context.max_pages {
                if summary.requests >= max_pages {
                    tracing::warn!(
                        "Stopping after {} pages, server reports {} in total",
                        summary.requests,
                        envelope.meta.total_page
                    );
                    break;
                }
            }

            tracing::info!("fetching page {} of {}...", next_page, envelope.meta.total_page);
            set_page(&mut url, next_page);
            method = Method::GET;
            file_name = materializer::page_file_name(Some(next_page));
        }

        Ok(summary)
    }
}

/// Sets the `page` query parameter, replacing any existing one. The query
/// is re-encoded with keys in sorted order.
pub fn set_page(url: &mut Url, page: i64) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.push(("page".to_string(), page.to_string()));
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    url.query_pairs_mut().clear().extend_pairs(pairs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn context(url: &str) -> ApiContext {
        ApiContext {
            url: Url::parse(url).unwrap(),
            input_path: String::new(),
            output_path: String::new(),
            token: None,
            debug: false,
            max_pages: None,
            timeout_seconds: None,
        }
    }

    fn page_body(page: i64, total: i64, value: i64) -> serde_json::Value {
        json!({
            "success": true,
            "data": [{"id": value}],
            "meta": {"page": page, "totalPage": total}
        })
    }

    #[test]
    fn test_set_page_replaces_existing() {
        let mut url = Url::parse("https://api.example.com/items?size=20&page=1&cat=a").unwrap();
        set_page(&mut url, 2);
        assert_eq!(url.as_str(), "https://api.example.com/items?cat=a&page=2&size=20");

        let mut url = Url::parse("https://api.example.com/items").unwrap();
        set_page(&mut url, 5);
        assert_eq!(url.as_str(), "https://api.example.com/items?page=5");
    }

    #[tokio::test]
    async fn test_follows_pages_until_total() {
        let server = MockServer::start();
        let mocks: Vec<_> = (1..=3)
            .map(|page| {
                let page_param = page.to_string();
                server.mock(|when, then| {
                    when.method(GET)
                        .path("/items")
                        .query_param("page", page_param.as_str());
                    then.status(200)
                        .header("Content-Type", "application/json")
                        .json_body(page_body(page, 3, page * 10));
                })
            })
            .collect();

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let caller = ApiCaller::new(context(&server.url("/items?page=1"))).unwrap();

        let summary = caller.run(Method::GET, None, &output).await.unwrap();

        for mock in &mocks {
            mock.assert_hits(1);
        }
        assert_eq!(summary.requests, 3);
        assert_eq!(
            summary.files_written,
            vec!["output.csv", "output_2.csv", "output_3.csv"]
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("output_3.csv")).unwrap(),
            "id\n30\n"
        );
    }

    #[tokio::test]
    async fn test_single_page() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(200).json_body(json!({
                "success": true,
                "data": [{"a": 1}, {"a": 2}],
                "meta": {"page": 1, "totalPage": 1}
            }));
        });

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let caller = ApiCaller::new(context(&server.url("/items"))).unwrap();

        let summary = caller.run(Method::GET, None, &output).await.unwrap();

        mock.assert_hits(1);
        assert_eq!(summary.files_written, vec!["output.csv"]);
        assert_eq!(summary.records_written, 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("output.csv")).unwrap(),
            "a\n1\n2\n"
        );
        assert!(!dir.path().join("output_2.csv").exists());
    }

    #[tokio::test]
    async fn test_null_meta_is_a_single_page() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(200)
                .header("Content-Type", "application/json")
                .body(r#"{"success":true,"data":[{"a":1}],"meta":null}"#);
        });

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let caller = ApiCaller::new(context(&server.url("/items"))).unwrap();

        let summary = caller.run(Method::GET, None, &output).await.unwrap();

        mock.assert_hits(1);
        assert_eq!(summary.files_written, vec!["output.csv"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("output.csv")).unwrap(),
            "a\n1\n"
        );
    }

    #[tokio::test]
    async fn test_max_pages_caps_runaway_pagination() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET).path("/items").query_param("page", "1");
            then.status(200).json_body(page_body(1, 100, 1));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/items").query_param("page", "2");
            then.status(200).json_body(page_body(2, 100, 2));
        });

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let mut ctx = context(&server.url("/items?page=1"));
        ctx.max_pages = Some(2);
        let caller = ApiCaller::new(ctx).unwrap();

        let summary = caller.run(Method::GET, None, &output).await.unwrap();

        first.assert_hits(1);
        second.assert_hits(1);
        assert_eq!(summary.requests, 2);
    }

    #[tokio::test]
    async fn test_remote_failure_writes_nothing() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(401)
                .json_body(json!({"success": false, "message": "bad token"}));
        });

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let caller = ApiCaller::new(context(&server.url("/items"))).unwrap();

        let err = caller.run(Method::GET, None, &output).await.unwrap_err();

        mock.assert_hits(1);
        assert!(matches!(err, CallerError::Remote { ref message } if message == "bad token"));
        assert!(!dir.path().join("output.csv").exists());
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(200).body("<html>gateway error</html>");
        });

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let caller = ApiCaller::new(context(&server.url("/items"))).unwrap();

        let err = caller.run(Method::GET, None, &output).await.unwrap_err();
        match err {
            CallerError::ResponseParse { body, .. } => {
                assert_eq!(body, "<html>gateway error</html>")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_page_is_not_fatal() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET).path("/items").query_param("page", "1");
            then.status(200).json_body(json!({
                "success": true,
                "data": [],
                "meta": {"page": 1, "totalPage": 2}
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/items").query_param("page", "2");
            then.status(200).json_body(page_body(2, 2, 5));
        });

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let caller = ApiCaller::new(context(&server.url("/items?page=1"))).unwrap();

        let summary = caller.run(Method::GET, None, &output).await.unwrap();

        first.assert_hits(1);
        second.assert_hits(1);
        assert_eq!(summary.files_written, vec!["output_2.csv"]);
        assert!(!dir.path().join("output.csv").exists());
    }

    #[tokio::test]
    async fn test_post_sends_body_and_token_then_pages_with_get() {
        let server = MockServer::start();
        let post = server.mock(|when, then| {
            when.method(POST)
                .path("/orders")
                .header("content-type", "application/json")
                .header("authorization", "Bearer secret")
                .json_body(json!([{"key1": "value1"}]));
            then.status(200).json_body(page_body(1, 2, 1));
        });
        let get = server.mock(|when, then| {
            when.method(GET)
                .path("/orders")
                .query_param("page", "2")
                .header("authorization", "Bearer secret");
            then.status(200).json_body(page_body(2, 2, 2));
        });

        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let mut ctx = context(&server.url("/orders"));
        ctx.token = Some("secret".to_string());
        let caller = ApiCaller::new(ctx).unwrap();

        let body = br#"[{"key1":"value1"}]"#.to_vec();
        let summary = caller.run(Method::POST, Some(body), &output).await.unwrap();

        post.assert_hits(1);
        get.assert_hits(1);
        assert_eq!(summary.files_written, vec!["output.csv", "output_2.csv"]);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let dir = TempDir::new().unwrap();
        let output = LocalStorage::new(dir.path().to_str().unwrap());
        let caller = ApiCaller::new(context("http://127.0.0.1:1/items")).unwrap();

        let err = caller.run(Method::GET, None, &output).await.unwrap_err();
        assert!(matches!(err, CallerError::Network(_)));
    }
}
