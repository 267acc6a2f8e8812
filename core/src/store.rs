use crate::scoreboard::Write;
use crate::sse::{SseDecoder, SseEvent};
use crate::wire::{ErrorEnvelope, StreamPayload};
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Network(reqwest::Error, String),
    Api {
        status: StatusCode,
        message: String,
        url: String,
    },
    Parsing(reqwest::Error, String),
    /// Malformed event or a server-side cancel of a subscription.
    Stream(String),
    /// The credential used by a subscription expired or was revoked.
    AuthRevoked,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            StoreError::Api { status, message, url } => {
                write!(f, "Database error for {url}: {status} {message}")
            }
            StoreError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            StoreError::Stream(msg) => write!(f, "Stream error: {msg}"),
            StoreError::AuthRevoked => write!(f, "Session revoked; sign in again"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Client for a realtime database over its REST protocol. Every node is
/// addressed as `{base_url}/{root}/{path}.json`.
#[derive(Debug, Clone)]
pub struct RealtimeDb {
    client: Client,
    base_url: String,
    root: String,
    timeout: Duration,
    auth_token: Option<String>,
}

impl RealtimeDb {
    pub fn new(base_url: &str, root: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("groupstage/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            root: root.trim().trim_matches('/').to_string(),
            timeout: Duration::from_secs(10),
            auth_token: None,
        }
    }

    /// Token sent with every request from now on; `None` for anonymous reads.
    pub fn set_auth_token(&mut self, token: Option<String>) {
        self.auth_token = token;
    }

    /// Node URL without credentials. Used in logs and error messages.
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        match (self.root.is_empty(), path.is_empty()) {
            (true, true) => format!("{}/.json", self.base_url),
            (true, false) => format!("{}/{path}.json", self.base_url),
            (false, true) => format!("{}/{}.json", self.base_url, self.root),
            (false, false) => format!("{}/{}/{path}.json", self.base_url, self.root),
        }
    }

    fn request_url(&self, endpoint: &str) -> String {
        match &self.auth_token {
            Some(token) => format!("{endpoint}?auth={token}"),
            None => endpoint.to_string(),
        }
    }

    pub async fn get(&self, path: &str) -> StoreResult<Value> {
        let endpoint = self.endpoint(path);
        let response = self.send(Method::GET, &endpoint, None::<&Value>).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Parsing(e, endpoint))
    }

    /// Replaces the node at `path`.
    pub async fn set<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> StoreResult<()> {
        let endpoint = self.endpoint(path);
        self.send(Method::PUT, &endpoint, Some(value)).await.map(drop)
    }

    /// Writes only the named children of `path`.
    pub async fn update<T: Serialize + ?Sized>(&self, path: &str, fields: &T) -> StoreResult<()> {
        let endpoint = self.endpoint(path);
        self.send(Method::PATCH, &endpoint, Some(fields)).await.map(drop)
    }

    pub async fn remove(&self, path: &str) -> StoreResult<()> {
        let endpoint = self.endpoint(path);
        self.send(Method::DELETE, &endpoint, None::<&Value>).await.map(drop)
    }

    /// Persists one write produced by the scoreboard. Local-only writes are skipped.
    pub async fn apply(&self, write: &Write) -> StoreResult<()> {
        let Some(path) = write.path() else {
            return Ok(());
        };
        match write {
            Write::Groups(table) => self.set(&path, table).await,
            Write::SetMatch { record, .. } => self.set(&path, record).await,
            Write::UpdateScore { score_a, score_b, .. } => {
                self.update(&path, &json!({ "scoreA": score_a, "scoreB": score_b }))
                    .await
            }
            Write::RemoveMatch { .. } => self.remove(&path).await,
            Write::ClearLocal => Ok(()),
        }
    }

    /// Opens a change stream on `path`. The first event carries the whole node.
    pub async fn subscribe(&self, path: &str) -> StoreResult<Subscription> {
        let endpoint = self.endpoint(path);
        debug!("subscribing to {endpoint}");
        let response = self
            .client
            .get(self.request_url(&endpoint))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| StoreError::Network(e, endpoint.clone()))?;
        let response = check_status(response, &endpoint).await?;
        Ok(Subscription {
            response,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            tree: Value::Null,
            endpoint,
        })
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&T>,
    ) -> StoreResult<Response> {
        debug!("{method} {endpoint}");
        let mut request = self
            .client
            .request(method, self.request_url(endpoint))
            .timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e, endpoint.to_owned()))?;
        check_status(response, endpoint).await
    }
}

async fn check_status(response: Response, endpoint: &str) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message().to_string())
        .unwrap_or_default();
    Err(StoreError::Api {
        status,
        message,
        url: endpoint.to_owned(),
    })
}

/// A live change stream. Keeps its own copy of the node and hands back the
/// full value after every change.
pub struct Subscription {
    response: Response,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    tree: Value,
    endpoint: String,
}

impl Subscription {
    /// Waits for the next change. `Ok(None)` means the server closed the stream.
    pub async fn next_value(&mut self) -> StoreResult<Option<Value>> {
        loop {
            while let Some(event) = self.pending.pop_front() {
                if self.apply_event(event)? {
                    return Ok(Some(self.tree.clone()));
                }
            }
            let chunk = self
                .response
                .chunk()
                .await
                .map_err(|e| StoreError::Network(e, self.endpoint.clone()))?;
            match chunk {
                Some(bytes) => self.pending.extend(self.decoder.push(&bytes)),
                None => return Ok(None),
            }
        }
    }

    /// Returns whether the event changed the tree.
    fn apply_event(&mut self, event: SseEvent) -> StoreResult<bool> {
        match event.event.as_str() {
            "put" | "patch" => {
                let payload: StreamPayload = serde_json::from_str(&event.data).map_err(|e| {
                    StoreError::Stream(format!("bad {} event from {}: {e}", event.event, self.endpoint))
                })?;
                if event.event == "put" {
                    put_at(&mut self.tree, &payload.path, payload.data);
                } else {
                    patch_at(&mut self.tree, &payload.path, payload.data);
                }
                Ok(true)
            }
            "keep-alive" => Ok(false),
            "cancel" => Err(StoreError::Stream(format!(
                "subscription to {} cancelled: {}",
                self.endpoint, event.data
            ))),
            "auth_revoked" => Err(StoreError::AuthRevoked),
            other => {
                debug!("ignoring {other} event from {}", self.endpoint);
                Ok(false)
            }
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn put_at(tree: &mut Value, path: &str, data: Value) {
    set_node(tree, &segments(path), data);
}

fn patch_at(tree: &mut Value, path: &str, data: Value) {
    let base = segments(path);
    match data {
        Value::Object(fields) => {
            for (key, value) in fields {
                let mut full = base.clone();
                full.extend(segments(&key));
                set_node(tree, &full, value);
            }
        }
        other => set_node(tree, &base, other),
    }
}

/// Writes `data` at `path` below `node`. Lists along the way become keyed maps
/// and emptied nodes are pruned, the way the store itself keeps them.
fn set_node(node: &mut Value, path: &[&str], data: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = data;
        return;
    };
    let mut map = match std::mem::take(node) {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    };
    let mut child = map.remove(*head).unwrap_or(Value::Null);
    set_node(&mut child, rest, data);
    if !child.is_null() {
        map.insert((*head).to_string(), child);
    }
    if !map.is_empty() {
        *node = Value::Object(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Group, GroupTable};
    use mockito::{Matcher, Server};

    #[test]
    fn endpoints_join_root_and_path() {
        let db = RealtimeDb::new("https://db.example.com/", "/tournament/");
        assert_eq!(db.endpoint("groups"), "https://db.example.com/tournament/groups.json");
        assert_eq!(db.endpoint(""), "https://db.example.com/tournament.json");
        let bare = RealtimeDb::new("https://db.example.com", "");
        assert_eq!(bare.endpoint("/matches/A/"), "https://db.example.com/matches/A.json");
    }

    #[test]
    fn put_and_patch_maintain_the_tree() {
        let mut tree = Value::Null;
        put_at(&mut tree, "/", json!({"A": [{"name": "Lions"}, {"name": "Tigers"}]}));
        put_at(&mut tree, "/A/1/name", json!("Pumas"));
        assert_eq!(tree, json!({"A": {"0": {"name": "Lions"}, "1": {"name": "Pumas"}}}));

        patch_at(&mut tree, "/B", json!({"m1": {"teamA": "Eagles"}, "m2": null}));
        assert_eq!(tree["B"], json!({"m1": {"teamA": "Eagles"}}));

        put_at(&mut tree, "/B/m1", Value::Null);
        assert!(tree.get("B").is_none());
        put_at(&mut tree, "/", Value::Null);
        assert_eq!(tree, Value::Null);
    }

    #[tokio::test]
    async fn get_sends_auth_token_as_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tournament/groups.json")
            .match_query(Matcher::UrlEncoded("auth".into(), "tok".into()))
            .with_status(200)
            .with_body(r#"{"A":[{"name":"Lions"}]}"#)
            .create_async()
            .await;

        let mut db = RealtimeDb::new(&server.url(), "tournament");
        db.set_auth_token(Some("tok".into()));
        let value = db.get("groups").await.unwrap();
        assert_eq!(value["A"][0]["name"], "Lions");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn writes_use_put_patch_and_delete() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", "/t/groups.json")
            .match_body(Matcher::PartialJson(json!({"A": [{"name": "Lions"}]})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/t/matches/B/m1.json")
            .match_body(Matcher::Json(json!({"scoreA": 3, "scoreB": 1})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/t/matches/B/m2.json")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let db = RealtimeDb::new(&server.url(), "t");
        let mut table = GroupTable::new();
        table.add_team(Group::A, "a0".into(), "Lions").unwrap();
        db.apply(&Write::Groups(table)).await.unwrap();
        db.apply(&Write::UpdateScore {
            group: Group::B,
            id: "m1".into(),
            score_a: 3,
            score_b: 1,
        })
        .await
        .unwrap();
        db.apply(&Write::RemoveMatch {
            group: Group::B,
            id: "m2".into(),
        })
        .await
        .unwrap();
        db.apply(&Write::ClearLocal).await.unwrap();

        put.assert_async().await;
        patch.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_writes_report_the_reason_without_the_token() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", "/t/groups.json")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":"Permission denied"}"#)
            .create_async()
            .await;

        let mut db = RealtimeDb::new(&server.url(), "t");
        db.set_auth_token(Some("secret-token".into()));
        let err = db.set("groups", &json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status, .. } if status == StatusCode::UNAUTHORIZED));
        let shown = err.to_string();
        assert!(shown.contains("Permission denied"));
        assert!(!shown.contains("secret-token"));
    }

    #[tokio::test]
    async fn subscription_yields_the_full_value_after_each_change() {
        let mut server = Server::new_async().await;
        let body = concat!(
            "event: put\ndata: {\"path\":\"/\",\"data\":{\"A\":{\"m1\":{\"teamA\":\"Lions\"}}}}\n\n",
            "event: keep-alive\ndata: null\n\n",
            "event: patch\ndata: {\"path\":\"/A/m1\",\"data\":{\"scoreA\":2,\"scoreB\":0}}\n\n",
        );
        server
            .mock("GET", "/t/matches.json")
            .match_header("accept", "text/event-stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let db = RealtimeDb::new(&server.url(), "t");
        let mut sub = db.subscribe("matches").await.unwrap();
        let first = sub.next_value().await.unwrap().unwrap();
        assert_eq!(first, json!({"A": {"m1": {"teamA": "Lions"}}}));
        let second = sub.next_value().await.unwrap().unwrap();
        assert_eq!(second["A"]["m1"]["scoreA"], 2);
        assert!(sub.next_value().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revoked_and_cancelled_streams_are_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/t/groups.json")
            .with_status(200)
            .with_body("event: auth_revoked\ndata: credential is no longer valid\n\n")
            .create_async()
            .await;
        server
            .mock("GET", "/t/matches.json")
            .with_status(200)
            .with_body("event: cancel\ndata: Permission denied\n\n")
            .create_async()
            .await;

        let db = RealtimeDb::new(&server.url(), "t");
        let mut groups = db.subscribe("groups").await.unwrap();
        assert!(matches!(groups.next_value().await, Err(StoreError::AuthRevoked)));
        let mut matches = db.subscribe("matches").await.unwrap();
        assert!(matches!(matches.next_value().await, Err(StoreError::Stream(_))));
    }
}
