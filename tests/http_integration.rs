//! End-to-end tests over real HTTP against a scripted local server.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use reachme::models::{LinkDraft, RecordId};
use reachme::{EditorSession, Error, HttpClient, MutationKind};
use secrecy::SecretString;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One scripted exchange: expected request line prefix and the raw answer.
struct Exchange {
    expect: &'static str,
    status: &'static str,
    body: &'static str,
}

const fn exchange(expect: &'static str, status: &'static str, body: &'static str) -> Exchange {
    Exchange {
        expect,
        status,
        body,
    }
}

/// Serves `script` in order, one connection per exchange; returns the requests.
fn serve(script: Vec<Exchange>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/api", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for step in script {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            assert!(
                request.starts_with(step.expect),
                "expected {:?}, got {:?}",
                step.expect,
                request.lines().next()
            );
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                step.status,
                step.body.len(),
                step.body
            );
            stream.write_all(response.as_bytes()).unwrap();
            seen.push(request);
        }
        seen
    });
    (base, handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 2048];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).into_owned();
        let Some(end) = text.find("\r\n\r\n") else {
            continue;
        };
        let length = text[..end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + length {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn client(base: &str) -> Arc<HttpClient> {
    let inner = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
    Arc::new(
        HttpClient::with_client(base, inner).with_token(SecretString::from("creator-token".to_string())),
    )
}

#[test]
fn test_rejected_create_rolls_back_over_http() {
    let (base, server) = serve(vec![
        exchange("GET /api/profiles/me", "200 OK", r#"{"_id":"u1","username":"alice"}"#),
        exchange(
            "GET /api/links",
            "200 OK",
            r#"[{"_id":"l1","title":"Blog","url":"https://blog.test","sort_order":0}]"#,
        ),
        exchange("POST /api/links", "500 Internal Server Error", r#"{"error":"Database down"}"#),
    ]);
    let http = client(&base);
    let session = EditorSession::open(http.clone(), Some(http)).unwrap();
    let before = session.links().load().unwrap();

    let err = session
        .links()
        .add(LinkDraft::new("Shop", "https://shop.test"))
        .unwrap_err();

    assert!(matches!(err, Error::RemoteWrite { kind: MutationKind::Create, .. }));
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("Database down"));
    assert!(Arc::ptr_eq(&before, &session.links().records()));

    let requests = server.join().unwrap();
    assert!(
        requests[0]
            .to_lowercase()
            .contains("authorization: bearer creator-token")
    );
    assert!(requests[2].contains(r#""sort_order":1"#));
}

#[test]
fn test_update_and_reorder_over_http() {
    let (base, server) = serve(vec![
        exchange("GET /api/profiles/me", "200 OK", r#"{"_id":"u1","username":"alice"}"#),
        exchange(
            "GET /api/products",
            "200 OK",
            r#"[{"_id":"p1","title":"Mug","product_url":"https://m.test","sort_order":0},
                {"_id":"p2","title":"Tee","product_url":"https://t.test","sort_order":1}]"#,
        ),
        exchange(
            "PUT /api/products/p1",
            "200 OK",
            r#"{"_id":"p1","title":"Mug","product_url":"https://m.test","sort_order":0,"is_active":false}"#,
        ),
        exchange("PUT /api/products/reorder", "204 No Content", ""),
    ]);
    let http = client(&base);
    let session = EditorSession::open(http, None).unwrap();
    let products = session.products();
    products.load().unwrap();

    let hidden = products.set_active(&RecordId::new("p1"), false).unwrap().unwrap();
    assert!(!hidden.is_active);

    let reordered = products
        .reorder(&[RecordId::new("p2"), RecordId::new("p1")])
        .unwrap();
    let order: Vec<(&str, u32)> = reordered
        .iter()
        .map(|p| (p.id.as_str(), p.sort_order))
        .collect();
    assert_eq!(order, vec![("p2", 0), ("p1", 1)]);

    let requests = server.join().unwrap();
    assert!(requests[2].contains(r#"{"is_active":false}"#));
    assert!(requests[3].contains(r#"{"updates":[{"id":"p2","sort_order":0},{"id":"p1","sort_order":1}]}"#));
}
