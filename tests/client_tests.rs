/// HTTP client tests against a real local backend.
///
/// A `tiny_http` server on an ephemeral loopback port plays the cluster
/// backend, so these exercise the actual `ureq` transport: status codes,
/// timeouts and body parsing.
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use oven::cluster::{ClusterApi, ClusterHandle, DashboardError, HttpTransport, Transport};
use tiny_http::{Response, Server};

/// Start a fake backend and return its base URL.
fn backend() -> String {
    let server = Server::http("127.0.0.1:0").expect("bind ephemeral port");
    let addr = server.server_addr().to_ip().expect("ip listener");

    thread::spawn(move || {
        for request in server.incoming_requests() {
            thread::spawn(move || {
                let (status, body) = match request.url() {
                    "/" => (404, "Not Found".to_string()),
                    "/bake" => (200, r#"{"Cluster": {"Id": "j-LOCAL"}}"#.to_string()),
                    "/checkcluster/j-LOCAL" => (200, r#"{"status": "RUNNING"}"#.to_string()),
                    "/pull/tweets" => (200, r#"{"b": {"text": "old"}, "a": {"text": "new"}}"#.to_string()),
                    "/pull/plain" => (200, "no records here".to_string()),
                    "/terminate/j-LOCAL" => (200, "terminating".to_string()),
                    "/boom" => (500, "Internal Server Error".to_string()),
                    "/slow" => {
                        thread::sleep(Duration::from_millis(600));
                        (200, "late".to_string())
                    }
                    _ => (404, "Not Found".to_string()),
                };
                let _ = request.respond(Response::from_string(body).with_status_code(status));
            });
        }
    });

    format!("http://{addr}")
}

/// URL of a loopback port that was just released, so nothing listens there.
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn transport(base: &str) -> HttpTransport {
    HttpTransport::new(base, Duration::from_secs(2))
}

#[test]
fn full_cluster_lifecycle_over_http() {
    let api = ClusterApi::new(transport(&backend()));

    let cluster = api.bake().unwrap();
    assert_eq!(cluster, ClusterHandle::new("j-LOCAL"));
    assert!(api.check(&cluster).unwrap().is_ready());

    let records = api.pull("tweets").unwrap();
    let keys: Vec<&str> = records.keys().map(String::as_str).collect();
    assert_eq!(keys, ["b", "a"]);

    assert_eq!(api.terminate(&cluster).unwrap(), "terminating");
}

#[test]
fn error_status_is_request_failed() {
    let t = transport(&backend());
    let err = t.get("/boom").unwrap_err();
    match &err {
        DashboardError::RequestFailed { path, reason } => {
            assert_eq!(path, "/boom");
            assert!(reason.contains("500"), "{reason}");
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[test]
fn slow_backend_times_out() {
    let t = HttpTransport::new(&backend(), Duration::from_millis(150));
    let err = t.get("/slow").unwrap_err();
    assert_eq!(err, DashboardError::timeout("/slow", 150));
}

#[test]
fn non_json_pull_is_malformed() {
    let api = ClusterApi::new(transport(&backend()));
    let err = api.pull("plain").unwrap_err();
    assert_eq!(err.kind(), "malformed_response");
    assert!(err.to_string().contains("no records here"));
}

#[test]
fn ping_counts_any_http_answer() {
    let api = ClusterApi::new(transport(&backend()));
    assert!(api.ping().is_ok());

    let dead = ClusterApi::new(HttpTransport::new(&closed_port_url(), Duration::from_secs(1)));
    assert!(dead.ping().is_err());
}
