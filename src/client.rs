use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde_json::{json, Value};

pub struct ApiClient {
    client: Client,
    root_url: String,
}

/// Outcome of a single API call. Every call produces one of these, whether
/// the server answered 2xx, answered with an error status, or never answered
/// at all. Success is a matter of the status code, never of an `Err`.
#[derive(Debug)]
pub struct CallOutcome {
    pub status: u16,
    pub body: Value,
}

impl CallOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_created(&self) -> bool {
        self.status == 201
    }

    /// The `token` field of a JSON object body.
    pub fn token(&self) -> Option<String> {
        self.body
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// The `id` field of a JSON object body. Ids are kept opaque since the
    /// server may return them as numbers or strings.
    pub fn id(&self) -> Option<Value> {
        self.body.get("id").cloned().filter(|id| !id.is_null())
    }

    /// The `id` of the first element of a JSON array body.
    pub fn first_id(&self) -> Option<Value> {
        self.body
            .as_array()?
            .first()?
            .get("id")
            .cloned()
            .filter(|id| !id.is_null())
    }
}

impl ApiClient {
    pub fn new(root_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            root_url: root_url.into(),
        })
    }

    /// Performs one call against the API and normalizes whatever happens
    /// into a status/body pair. HTTP error responses keep their status and
    /// parsed body; transport failures (refused connection, timeout) are
    /// reported as status 500 with the error message as the body.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> CallOutcome {
        let url = format!("{}/api{}", self.root_url, endpoint);

        let mut request = self.client.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = match response.text().await {
                    Ok(text) => {
                        serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text))
                    }
                    Err(e) => Value::String(e.to_string()),
                };
                CallOutcome { status, body }
            }
            Err(e) => CallOutcome {
                status: 500,
                body: Value::String(e.to_string()),
            },
        }
    }

    /// Authenticates against `/auth/login`, returning the session token on
    /// HTTP 200. A failed login is reported on stdout and yields `None`.
    pub async fn login(&self, username: &str, password: &str) -> Option<String> {
        let payload = json!({ "username": username, "password": password });
        let outcome = self
            .call(Method::POST, "/auth/login", None, Some(&payload))
            .await;

        if outcome.is_ok() {
            outcome.token()
        } else {
            println!("Login failed for {}. Status: {}", username, outcome.status);
            None
        }
    }

    /// Polls the swagger page until the server answers, sleeping `delay`
    /// between attempts. Any HTTP response counts as up; only transport
    /// failures keep the loop going.
    pub async fn wait_for_server(&self, attempts: u32, delay: Duration) -> bool {
        println!("Waiting for server to start...");
        let url = format!("{}/api-docs", self.root_url);

        for _ in 0..attempts {
            if self.client.get(&url).send().await.is_ok() {
                println!("Server is up!");
                return true;
            }
            tokio::time::sleep(delay).await;
        }

        println!("Server failed to start.");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn login_returns_token_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc" })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let token = client.login("admin", "Admin@123").await;
        assert_eq!(token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn login_returns_none_on_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "bad credentials" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        assert_eq!(client.login("admin", "wrong").await, None);
    }

    #[tokio::test]
    async fn call_captures_http_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let outcome = client.call(Method::GET, "/users", None, None).await;
        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.body["message"], "not found");
    }

    #[tokio::test]
    async fn call_normalizes_transport_errors() {
        // Bind then drop a listener so the port is free but nothing answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(format!("http://{addr}")).unwrap();
        let outcome = client.call(Method::GET, "/users", None, None).await;
        assert_eq!(outcome.status, 500);
        assert!(outcome.body.is_string());
    }

    #[tokio::test]
    async fn call_keeps_non_json_bodies_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let outcome = client.call(Method::GET, "/users", None, None).await;
        assert_eq!(outcome.body, Value::String("plain text".into()));
    }

    #[tokio::test]
    async fn wait_for_server_succeeds_once_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api-docs"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        assert!(client.wait_for_server(3, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn wait_for_server_gives_up_when_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(format!("http://{addr}")).unwrap();
        assert!(!client.wait_for_server(2, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn first_id_reads_the_head_of_a_list() {
        let outcome = CallOutcome {
            status: 200,
            body: json!([{ "id": 4, "name": "Starters" }, { "id": 9 }]),
        };
        assert_eq!(outcome.first_id(), Some(json!(4)));

        let empty = CallOutcome {
            status: 200,
            body: json!([]),
        };
        assert_eq!(empty.first_id(), None);
    }
}
