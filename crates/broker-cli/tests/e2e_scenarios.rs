//! End-to-end protocol scenarios, driven directly through the library
//! crates rather than by spawning the `broker-cli` binary — the same
//! style used by the teacher workspace's own cross-crate integration
//! tests, which call into library APIs rather than shelling out.

use std::collections::BTreeMap;
use std::io::Read as _;
use std::time::Duration;

use broker_core::{BrokerHome, CapRoot};
use broker_store::BrokerStore;

struct Fixture {
    _broker_dir: tempfile::TempDir,
    _cap_dir: tempfile::TempDir,
    home: BrokerHome,
    cap_root: CapRoot,
}

impl Fixture {
    fn new() -> Self {
        let broker_dir = tempfile::tempdir().unwrap();
        let cap_dir = tempfile::tempdir().unwrap();
        let home = BrokerHome::from_path(broker_dir.path());
        let cap_root = CapRoot::from_path(cap_dir.path());
        Self {
            _broker_dir: broker_dir,
            _cap_dir: cap_dir,
            home,
            cap_root,
        }
    }

    fn open_store(&self) -> BrokerStore {
        BrokerStore::open(self.home.clone()).unwrap()
    }
}

/// S1 - Happy-path seal+launch: issue -> redeem -> resolve ends with the
/// plaintext secret substituted into the stub spec's argv, and no
/// plaintext persists anywhere in `cap_root` afterward.
#[test]
fn s1_happy_path_seal_and_launch() {
    let fixture = Fixture::new();
    let mut store = fixture.open_store();
    store.init(&["svc".to_string()]).unwrap();
    store.secrets.set("svc", "TOKEN", "hunter2".to_string());
    store.save_secrets().unwrap();

    let tokens = broker_capability::issue(
        &mut store,
        &fixture.cap_root,
        "s1",
        &["svc".to_string()],
        10,
    )
    .unwrap();
    let token = &tokens[0];
    let capability_path = fixture
        .cap_root
        .stub_dir("svc")
        .join(format!("{}.json", token.capability_id));

    broker_redeem::redeem(&mut store, &capability_path, &["TOKEN".to_string()], None, false)
        .unwrap();

    let spec = broker_launcher::StubSpec {
        stub: "svc".to_string(),
        command: "/bin/echo".to_string(),
        args: vec!["${TOKEN}".to_string()],
        env: BTreeMap::new(),
        cwd: None,
        secrets: vec!["TOKEN".to_string()],
    };
    let resolved = broker_launcher::resolve(&spec, &fixture.cap_root).unwrap();
    assert_eq!(resolved.command, "/bin/echo");
    assert_eq!(resolved.args, vec!["hunter2".to_string()]);

    for entry in walkdir(fixture.cap_root.root()) {
        let contents = std::fs::read_to_string(&entry).unwrap_or_default();
        assert!(!contents.contains("hunter2"), "plaintext leaked into {entry:?}");
    }
}

/// S2 - Replay denial: a second redeem of the same capability fails and
/// leaves the used-capability ledger at exactly one entry.
#[test]
fn s2_replay_denial() {
    let fixture = Fixture::new();
    let mut store = fixture.open_store();
    store.init(&["svc".to_string()]).unwrap();
    store.secrets.set("svc", "TOKEN", "hunter2".to_string());
    store.save_secrets().unwrap();

    let tokens = broker_capability::issue(
        &mut store,
        &fixture.cap_root,
        "s2",
        &["svc".to_string()],
        10,
    )
    .unwrap();
    let capability_path = fixture
        .cap_root
        .stub_dir("svc")
        .join(format!("{}.json", tokens[0].capability_id));

    broker_redeem::redeem(&mut store, &capability_path, &["TOKEN".to_string()], None, false)
        .unwrap();
    assert_eq!(store.state.used_capability_count(), 1);

    let err = broker_redeem::redeem(&mut store, &capability_path, &["TOKEN".to_string()], None, false)
        .unwrap_err();
    assert!(err.to_string().contains("already redeemed"));
    assert_eq!(store.state.used_capability_count(), 1);
}

/// S3 - HMAC tamper: flipping a hex digit of `hmac` is rejected and no
/// sealed record is ever written.
#[test]
fn s3_hmac_tamper() {
    let fixture = Fixture::new();
    let mut store = fixture.open_store();
    store.init(&["svc".to_string()]).unwrap();
    store.secrets.set("svc", "TOKEN", "hunter2".to_string());
    store.save_secrets().unwrap();

    let tokens = broker_capability::issue(
        &mut store,
        &fixture.cap_root,
        "s3",
        &["svc".to_string()],
        10,
    )
    .unwrap();
    let capability_path = fixture
        .cap_root
        .stub_dir("svc")
        .join(format!("{}.json", tokens[0].capability_id));

    let raw = std::fs::read_to_string(&capability_path).unwrap();
    let mut token: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let hmac = token["hmac"].as_str().unwrap().to_string();
    let mut flipped: Vec<char> = hmac.chars().collect();
    flipped[0] = if flipped[0] == '0' { '1' } else { '0' };
    token["hmac"] = serde_json::Value::String(flipped.into_iter().collect());
    std::fs::write(&capability_path, serde_json::to_string(&token).unwrap()).unwrap();

    let err = broker_redeem::redeem(&mut store, &capability_path, &["TOKEN".to_string()], None, false)
        .unwrap_err();
    assert!(err.to_string().contains("HMAC mismatch"));

    let sealed_dir = capability_path.parent().unwrap().join("secrets");
    assert!(!sealed_dir.join("TOKEN.sealed").exists());
}

/// S4 - Expiry: a zero-TTL capability is rejected by redeem, and the
/// ledger stays empty.
#[test]
fn s4_expiry() {
    let fixture = Fixture::new();
    let mut store = fixture.open_store();
    store.init(&["svc".to_string()]).unwrap();
    store.secrets.set("svc", "TOKEN", "hunter2".to_string());
    store.save_secrets().unwrap();

    let tokens =
        broker_capability::issue(&mut store, &fixture.cap_root, "s4", &["svc".to_string()], 0)
            .unwrap();
    let capability_path = fixture
        .cap_root
        .stub_dir("svc")
        .join(format!("{}.json", tokens[0].capability_id));

    std::thread::sleep(Duration::from_millis(10));
    let err = broker_redeem::redeem(&mut store, &capability_path, &["TOKEN".to_string()], None, false)
        .unwrap_err();
    assert!(err.to_string().contains("expired"));
    assert_eq!(store.state.used_capability_count(), 0);
}

/// S5 - Rate limit: with a window of 3, the fourth issuance within the
/// window fails and exactly three timestamps are retained.
#[test]
fn s5_rate_limit() {
    // SAFETY: this test process does not otherwise touch these variables.
    unsafe {
        std::env::set_var("ISSUE_WINDOW_LIMIT", "3");
        std::env::set_var("ISSUE_WINDOW_SECONDS", "60");
    }

    let fixture = Fixture::new();
    let mut store = fixture.open_store();
    store.init(&["svc".to_string()]).unwrap();

    for _ in 0..3 {
        broker_capability::issue(&mut store, &fixture.cap_root, "s5", &["svc".to_string()], 10)
            .unwrap();
    }
    let err = broker_capability::issue(&mut store, &fixture.cap_root, "s5", &["svc".to_string()], 10)
        .unwrap_err();
    assert!(err.to_string().contains("rate limit"));
    assert_eq!(store.state.issue_timestamp_count(), 3);

    // SAFETY: paired with the set_var calls above.
    unsafe {
        std::env::remove_var("ISSUE_WINDOW_LIMIT");
        std::env::remove_var("ISSUE_WINDOW_SECONDS");
    }
}

/// S6 - Proxy allowlist: no inbound path, however crafted, causes the
/// proxy to contact a host other than its configured target.
#[test]
fn s6_proxy_allowlist() {
    let upstream = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let upstream_port = upstream.server_addr().to_ip().unwrap().port();
    std::thread::spawn(move || {
        for request in upstream.incoming_requests() {
            let _ = request.respond(tiny_http::Response::from_string("upstream-ok"));
        }
    });

    // Reserve a concrete port up front: `run` binds synchronously and the
    // test needs to know the address before the proxy thread starts.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let proxy_addr = listener.local_addr().unwrap();
    drop(listener);

    let config = broker_proxy::ProxyConfig::new(
        "demo".to_string(),
        proxy_addr.to_string(),
        &format!("http://127.0.0.1:{upstream_port}/base"),
        None,
        Duration::from_secs(5),
    )
    .unwrap();

    std::thread::spawn(move || {
        let _ = broker_proxy::run(config);
    });
    std::thread::sleep(Duration::from_millis(200));

    let client = reqwest::blocking::Client::new();

    // A path crafted to look like it escapes to another host: the merged
    // URL still forces scheme/host back onto the configured target, so
    // the request reaches our own upstream and its body comes back.
    let mut response = client
        .get(format!("http://{proxy_addr}/../../other.host/path"))
        .send()
        .unwrap();
    let mut body = String::new();
    response.read_to_string(&mut body).unwrap();
    assert_eq!(body, "upstream-ok");

    // An inbound `Host` header naming a different destination is just
    // another forwarded header; it never changes where the proxy connects.
    let mut response = client
        .get(format!("http://{proxy_addr}/base"))
        .header("Host", "evil.example")
        .send()
        .unwrap();
    let mut body = String::new();
    response.read_to_string(&mut body).unwrap();
    assert_eq!(body, "upstream-ok");
}

fn walkdir(root: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}
