//! In-process fake of the Azure Resource Manager REST surface.
//!
//! Routes are matched on method and path (query ignored), exact paths before
//! prefixes. Each route replays
//! its canned replies in order and then repeats the last one. A token can be
//! expired, after which every request carrying it gets a 401.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use az_zone_migrate::application::ports::{AccessToken, CredentialProvider};
use az_zone_migrate::domain::config::{AzureConfig, RetryConfig};
use az_zone_migrate::infra::arm::ArmClient;
use az_zone_migrate::infra::credential::TokenCache;

pub const SUB: &str = "sub-1";

#[derive(Clone)]
pub struct Reply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl Reply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

struct Route {
    method: Method,
    path: String,
    prefix: bool,
    replies: VecDeque<Reply>,
}

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: String,
    pub authorization: Option<String>,
}

struct Expiry {
    token: String,
    after: Option<Method>,
}

#[derive(Default)]
pub struct FakeArm {
    routes: Mutex<Vec<Route>>,
    seen: Mutex<Vec<Seen>>,
    expiry: Mutex<Option<Expiry>>,
}

impl FakeArm {
    /// Register replies for an exact path.
    pub fn on(&self, method: Method, path: &str, replies: Vec<Reply>) {
        self.add(method, path, false, replies);
    }

    /// Register replies for every path under `prefix`.
    pub fn on_prefix(&self, method: Method, prefix: &str, replies: Vec<Reply>) {
        self.add(method, prefix, true, replies);
    }

    fn add(&self, method: Method, path: &str, prefix: bool, replies: Vec<Reply>) {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            prefix,
            replies: replies.into(),
        });
    }

    /// Reject `token` with `ExpiredAuthenticationToken`, from the start or
    /// once a request with method `after` has been answered.
    pub fn expire_token(&self, token: &str, after: Option<Method>) {
        *self.expiry.lock().unwrap() = Some(Expiry {
            token: token.to_string(),
            after,
        });
    }

    fn is_expired(&self, authorization: Option<&str>) -> bool {
        let expiry = self.expiry.lock().unwrap();
        let Some(expiry) = expiry.as_ref() else {
            return false;
        };
        if authorization != Some(format!("Bearer {}", expiry.token).as_str()) {
            return false;
        }
        match &expiry.after {
            None => true,
            Some(method) => self.seen.lock().unwrap().iter().any(|s| s.method == *method),
        }
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, method: &Method, path_part: &str) -> usize {
        self.seen()
            .iter()
            .filter(|s| s.method == *method && s.path.contains(path_part))
            .count()
    }

    fn reply(&self, method: &Method, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let exact = routes
            .iter()
            .position(|r| r.method == *method && !r.prefix && path == r.path);
        let index = exact.or_else(|| {
            routes
                .iter()
                .position(|r| r.method == *method && r.prefix && path.starts_with(&r.path))
        })?;
        let route = &mut routes[index];
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

async fn handle(
    State(arm): State<Arc<FakeArm>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let expired = arm.is_expired(authorization.as_deref());
    arm.seen.lock().unwrap().push(Seen {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&body).into_owned(),
        authorization,
    });
    if expired {
        let body = serde_json::json!({
            "error": {
                "code": "ExpiredAuthenticationToken",
                "message": "The access token expiry UTC time is earlier than current UTC time."
            }
        });
        return (StatusCode::UNAUTHORIZED, body.to_string()).into_response();
    }
    let Some(reply) = arm.reply(&method, uri.path()) else {
        let body = serde_json::json!({
            "error": {"code": "ResourceNotFound", "message": format!("{} not found", uri.path())}
        });
        return (StatusCode::NOT_FOUND, body.to_string()).into_response();
    };
    let mut out = HeaderMap::new();
    out.insert("content-type", HeaderValue::from_static("application/json"));
    for (name, value) in reply.headers {
        out.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(&value).unwrap(),
        );
    }
    (StatusCode::from_u16(reply.status).unwrap(), out, reply.body).into_response()
}

/// Bind the fake to an ephemeral port and return its base URL.
pub async fn serve(arm: Arc<FakeArm>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(handle).with_state(arm);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Issues `test-token-2`, `test-token-3`, ... on every acquisition.
#[derive(Default)]
pub struct TestCredential {
    issued: AtomicU32,
}

impl TestCredential {
    pub fn issued(&self) -> u32 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for &TestCredential {
    async fn access_token(&self, subscription_id: &str) -> anyhow::Result<AccessToken> {
        assert_eq!(subscription_id, SUB);
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 2;
        Ok(AccessToken {
            token: format!("test-token-{n}"),
            expires_on: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
        })
    }
}

/// A client pointed at `base` with fast retries, starting from `token`.
pub fn client_with<'a>(
    base: &str,
    credential: &'a TestCredential,
    token: AccessToken,
) -> ArmClient<&'a TestCredential> {
    let api = AzureConfig {
        endpoint: base.to_string(),
        ..AzureConfig::default()
    };
    let retry = RetryConfig {
        max_elapsed_secs: 5,
    };
    ArmClient::new(&api, &retry, SUB, TokenCache::new(credential, SUB, token))
        .unwrap()
        .with_initial_retry_interval(Duration::from_millis(5))
}

/// A client pointed at `base` with fast retries and the never-expiring
/// `test-token`.
pub fn client(base: &str) -> ArmClient<&'static TestCredential> {
    static CREDENTIAL: TestCredential = TestCredential {
        issued: AtomicU32::new(0),
    };
    let token = AccessToken {
        token: "test-token".into(),
        expires_on: None,
    };
    client_with(base, &CREDENTIAL, token)
}

pub fn vm_path(rg: &str, vm: &str) -> String {
    format!(
        "/subscriptions/{SUB}/resourceGroups/{rg}/providers/Microsoft.Compute/virtualMachines/{vm}"
    )
}

pub fn disk_id(rg: &str, disk: &str) -> String {
    format!("/subscriptions/{SUB}/resourceGroups/{rg}/providers/Microsoft.Compute/disks/{disk}")
}

pub fn skus_path() -> String {
    format!("/subscriptions/{SUB}/providers/Microsoft.Compute/skus")
}

/// ARM JSON for a zonal Linux VM with an OS disk, one data disk and one NIC.
pub fn vm_json(rg: &str, vm: &str, zone: &str) -> serde_json::Value {
    serde_json::json!({
        "id": vm_path(rg, vm),
        "name": vm,
        "location": "westeurope",
        "zones": [zone],
        "properties": {
            "hardwareProfile": {"vmSize": "Standard_D2s_v5"},
            "storageProfile": {
                "osDisk": {
                    "osType": "Linux",
                    "name": format!("{vm}-os"),
                    "createOption": "FromImage",
                    "managedDisk": {"id": disk_id(rg, &format!("{vm}-os")), "storageAccountType": "Premium_LRS"}
                },
                "dataDisks": [{
                    "lun": 0,
                    "name": format!("{vm}-data0"),
                    "createOption": "Empty",
                    "managedDisk": {"id": disk_id(rg, &format!("{vm}-data0")), "storageAccountType": "StandardSSD_ZRS"}
                }]
            },
            "networkProfile": {
                "networkInterfaces": [
                    {"id": format!("/subscriptions/{SUB}/resourceGroups/{rg}/providers/Microsoft.Network/networkInterfaces/{vm}-nic2"), "properties": {"primary": false}},
                    {"id": format!("/subscriptions/{SUB}/resourceGroups/{rg}/providers/Microsoft.Network/networkInterfaces/{vm}-nic"), "properties": {"primary": true}}
                ]
            },
            "provisioningState": "Succeeded"
        }
    })
}

pub fn sku_page(entries: &[(&str, &str)], next: Option<String>) -> serde_json::Value {
    let value: Vec<_> = entries
        .iter()
        .map(|(kind, name)| {
            serde_json::json!({"resourceType": kind, "name": name, "locations": ["westeurope"]})
        })
        .collect();
    match next {
        Some(next) => serde_json::json!({"value": value, "nextLink": next}),
        None => serde_json::json!({"value": value}),
    }
}
