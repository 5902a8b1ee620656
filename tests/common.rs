#![allow(dead_code)]

use ::std::collections::{HashMap, HashSet};
use ::std::sync::{Arc, Mutex};

use syndicate_server::client::{WireClient, CREDENTIAL_HEADER};
use syndicate_server::content::memory::MemoryContentStore;
use syndicate_server::content::ContentStore;
use syndicate_server::crypto::CredentialCipher;
use syndicate_server::model::{
    trailing_slashed, NewPost, PostPayload, PostStatus, WireResponse,
};
use syndicate_server::options::memory::MemoryOptionsStore;
use syndicate_server::registry::SiteRegistry;
use syndicate_server::State;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub type Router = ::warp::filters::BoxedFilter<(Box<dyn ::warp::Reply>,)>;

/// One in-process instance: memory stores, a real router, no network.
pub struct TestSite {
    pub state: Arc<State>,
    pub router: Router,
    pub content: Arc<MemoryContentStore>,
}

pub fn build_site(site_url: &str, client: Arc<dyn WireClient>) -> TestSite {
    let options = Arc::new(MemoryOptionsStore::new());
    let content = Arc::new(MemoryContentStore::new());

    let registry = SiteRegistry::new(
        options,
        CredentialCipher::new("test key material"),
    );

    let state = Arc::new(State {
        site_url: trailing_slashed(site_url),
        admin_token: ADMIN_TOKEN.to_string(),
        registry,
        content: content.clone(),
        client,
        statsd_client: ::cadence::StatsdClient::from_sink(
            "syndicate",
            ::cadence::NopMetricSink,
        ),
        dispatch_locks: Default::default(),
    });

    TestSite {
        router: syndicate_server::routes(state.clone()),
        state,
        content,
    }
}

/// Wire transport bridging in-process instances: deliveries drive the target
/// site's router through warp's test harness instead of a socket. Hosts can
/// be marked as failing to simulate transport errors.
#[derive(Default)]
pub struct LoopbackWireClient {
    routers: Mutex<HashMap<String, Router>>,
    sent: Mutex<Vec<(String, PostPayload)>>,
    failing: Mutex<HashSet<String>>,
    image_failing: Mutex<bool>,
}

impl LoopbackWireClient {
    pub fn new() -> Arc<LoopbackWireClient> {
        Arc::new(LoopbackWireClient::default())
    }

    pub fn register(&self, base_url: &str, router: Router) {
        self.routers
            .lock()
            .unwrap()
            .insert(trailing_slashed(base_url), router);
    }

    pub fn fail_host(&self, base_url: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(trailing_slashed(base_url));
    }

    pub fn restore_host(&self, base_url: &str) {
        self.failing
            .lock()
            .unwrap()
            .remove(&trailing_slashed(base_url));
    }

    pub fn fail_images(&self) {
        *self.image_failing.lock().unwrap() = true;
    }

    /// Every delivery attempt in order, including ones that failed.
    pub fn sent_payloads(&self) -> Vec<(String, PostPayload)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn router_for(&self, key: &str) -> Option<Router> {
        self.routers.lock().unwrap().get(key).cloned()
    }
}

/// Drives a peer router's `/wire/receive` on an isolated blocking thread with
/// its own runtime. warp 0.3's test harness stores the active route in a
/// thread-local and panics ("nested test filter calls") if `reply` runs while
/// another `reply` is already on the stack — which is exactly what happens when
/// an admin request's handler dispatches through the loopback into a peer
/// router. Running the peer reply on a fresh thread (where no route is set)
/// mirrors the real transport, which crosses a socket to a separate process.
async fn reply_isolated<F>(
    router: Router,
    customize: F,
) -> ::warp::http::Response<::bytes::Bytes>
where
    F: FnOnce(::warp::test::RequestBuilder) -> ::warp::test::RequestBuilder
        + Send
        + 'static,
{
    ::tokio::task::spawn_blocking(move || {
        let rt = ::tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let request =
                ::warp::test::request().method("POST").path("/wire/receive");
            customize(request).reply(&router).await
        })
    })
    .await
    .unwrap()
}

#[::async_trait::async_trait]
impl WireClient for LoopbackWireClient {
    async fn send_post(
        &self,
        base_url: &str,
        credential: &str,
        payload: &PostPayload,
    ) -> ::anyhow::Result<WireResponse> {
        let key = trailing_slashed(base_url);

        self.sent
            .lock()
            .unwrap()
            .push((key.clone(), payload.clone()));

        if self.failing.lock().unwrap().contains(&key) {
            ::anyhow::bail!("connection refused");
        }

        let router = self
            .router_for(&key)
            .ok_or_else(|| ::anyhow::anyhow!("unknown host {}", key))?;

        let credential = credential.to_string();
        let payload = payload.clone();
        let response = reply_isolated(router, move |request| {
            request
                .header(CREDENTIAL_HEADER, credential)
                .json(&payload)
        })
        .await;

        if !response.status().is_success() {
            ::anyhow::bail!("peer returned {}", response.status());
        }

        Ok(::serde_json::from_slice(response.body())?)
    }

    async fn test_connection(
        &self,
        base_url: &str,
        credential: &str,
    ) -> ::anyhow::Result<()> {
        let key = trailing_slashed(base_url);

        if self.failing.lock().unwrap().contains(&key) {
            ::anyhow::bail!("connection refused");
        }

        let router = self
            .router_for(&key)
            .ok_or_else(|| ::anyhow::anyhow!("unknown host {}", key))?;

        let probe = PostPayload {
            test: true,
            ..Default::default()
        };

        let credential = credential.to_string();
        let response = reply_isolated(router, move |request| {
            request.header(CREDENTIAL_HEADER, credential).json(&probe)
        })
        .await;

        let status = response.status();
        if status == ::warp::http::StatusCode::OK
            || status == ::warp::http::StatusCode::BAD_REQUEST
        {
            return Ok(());
        }

        ::anyhow::bail!("connection failed: peer returned {}", status)
    }

    async fn fetch_image(&self, _url: &str) -> ::anyhow::Result<()> {
        if *self.image_failing.lock().unwrap() {
            ::anyhow::bail!("image fetch failed");
        }
        Ok(())
    }
}

/// Two peered instances that know each other by URL and credential.
pub struct Network {
    pub a: TestSite,
    pub b: TestSite,
    pub client: Arc<LoopbackWireClient>,
    pub b_id_on_a: i64,
}

pub async fn two_site_network() -> Network {
    let client = LoopbackWireClient::new();

    let a = build_site("https://a.test/", client.clone());
    let b = build_site("https://b.test/", client.clone());

    client.register("https://a.test/", a.router.clone());
    client.register("https://b.test/", b.router.clone());

    a.state.registry.set_own_credential("k-a").await.unwrap();
    b.state.registry.set_own_credential("k-b").await.unwrap();

    let b_id_on_a = a
        .state
        .registry
        .add_site("https://b.test/", "k-b", "Site B")
        .await
        .unwrap();
    b.state
        .registry
        .add_site("https://a.test/", "k-a", "Site A")
        .await
        .unwrap();

    Network {
        a,
        b,
        client,
        b_id_on_a,
    }
}

pub async fn seed_published_post(
    content: &MemoryContentStore,
    title: &str,
    body: &str,
    permalink: &str,
) -> i64 {
    content
        .create_post(&NewPost {
            title: title.to_string(),
            content: body.to_string(),
            excerpt: String::new(),
            status: PostStatus::Publish,
            author_id: 1,
            author_name: "Alice".to_string(),
            date: "2026-08-06 10:00:00".to_string(),
            permalink: permalink.to_string(),
        })
        .await
        .unwrap()
}

/// Drives the wire endpoint of a router directly.
pub async fn wire_post(
    router: &Router,
    credential: Option<&str>,
    body: &::serde_json::Value,
) -> (::warp::http::StatusCode, ::serde_json::Value) {
    let mut request = ::warp::test::request()
        .method("POST")
        .path("/wire/receive")
        .json(body);

    if let Some(credential) = credential {
        request = request.header(CREDENTIAL_HEADER, credential);
    }

    let response = request.reply(router).await;
    let status = response.status();
    let value = ::serde_json::from_slice(response.body())
        .unwrap_or(::serde_json::Value::Null);

    (status, value)
}

/// Generic JSON request helper for the admin surface.
pub async fn request_json(
    router: &Router,
    method: &str,
    path: &str,
    auth: Option<&str>,
    body: Option<&::serde_json::Value>,
) -> (::warp::http::StatusCode, ::serde_json::Value) {
    let mut request = ::warp::test::request().method(method).path(path);

    if let Some(auth) = auth {
        request = request.header("authorization", auth);
    }
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request.reply(router).await;
    let status = response.status();
    let value = ::serde_json::from_slice(response.body())
        .unwrap_or(::serde_json::Value::Null);

    (status, value)
}

pub fn bearer() -> String {
    format!("Bearer {}", ADMIN_TOKEN)
}
