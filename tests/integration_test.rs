//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero (puerto 0)
//! sobre un root temporal, y le habla por TCP real.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use webserver::config::ServerConfig;
use webserver::server::Server;

const PARAMS_TEMPLATE: &str = "<html>\n<body>\n<table>\n</table>\n</body>\n</html>\n";

/// Helper: root temporal con un sitio pequeño
fn site(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("webserver-it-{}-{}", name, std::process::id()));
    fs::create_dir_all(root.join("img")).unwrap();
    fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
    fs::write(root.join("form.html"), "<form></form>").unwrap();
    fs::write(root.join("img").join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
    fs::write(root.join("favicon.ico"), [0x00u8, 0x00, 0x01, 0x00, 0x01, 0xff]).unwrap();
    fs::write(root.join("notes.txt"), "plain notes").unwrap();
    fs::write(root.join("params_info.html"), PARAMS_TEMPLATE).unwrap();
    root
}

/// Helper: arranca un servidor en background y retorna su dirección
fn start_server(root: &Path, workers: usize) -> SocketAddr {
    let config = ServerConfig::new(root, 0, "index.html", workers);
    let server = Arc::new(Server::bind(config).expect("bind"));
    let port = server.local_addr().expect("local addr").port();

    let runner = Arc::clone(&server);
    thread::spawn(move || {
        let _ = runner.run();
    });

    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Helper: envía bytes crudos y retorna la response completa
fn send_raw(addr: SocketAddr, raw: &[u8]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect(addr)?;

    // Configurar timeouts
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.set_write_timeout(Some(Duration::from_secs(5)))?;

    stream.write_all(raw)?;
    stream.flush()?;

    // El servidor cierra después de cada response
    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    Ok(response)
}

fn send_request(addr: SocketAddr, raw: &str) -> String {
    let bytes = send_raw(addr, raw.as_bytes()).expect("Failed to send request");
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Helper: separa headers y body
fn split_response(response: &str) -> (&str, &str) {
    match response.find("\r\n\r\n") {
        Some(pos) => (&response[..pos], &response[pos + 4..]),
        None => (response, ""),
    }
}

/// Helper: reconstruye un body chunked
fn dechunk(mut body: &str) -> String {
    let mut out = String::new();
    loop {
        let (size_line, rest) = body.split_once("\r\n").expect("chunk size line");
        let size = usize::from_str_radix(size_line, 16).expect("hex chunk size");
        if size == 0 {
            assert_eq!(rest, "\r\n", "Chunked body must end with 0\\r\\n\\r\\n");
            return out;
        }
        out.push_str(&rest[..size]);
        body = rest[size..].strip_prefix("\r\n").expect("chunk terminator");
    }
}

#[test]
fn test_get_default_page() {
    let root = site("default");
    let addr = start_server(&root, 2);

    let response = send_request(addr, "GET / HTTP/1.1\r\nUser-Agent: it\r\n\r\n");
    let (headers, body) = split_response(&response);

    assert!(headers.starts_with("HTTP/1.1 200 OK"), "got: {}", response);
    assert!(headers.contains("Content-Length: 13"));
    assert!(headers.contains("Content-Type: text/html"));
    assert_eq!(body, "<h1>home</h1>");
}

#[test]
fn test_malformed_request_is_400() {
    let root = site("malformed");
    let addr = start_server(&root, 1);

    let response = send_request(addr, "GET /index.html\r\n\r\n");
    let (headers, body) = split_response(&response);

    assert!(headers.starts_with("HTTP/1.1 400 Bad Request"), "got: {}", response);
    assert!(headers.contains("Content-Type: text/plain"));
    assert_eq!(body, "400 Bad Request");
}

#[test]
fn test_missing_file_and_traversal_are_404() {
    let root = site("notfound");
    let addr = start_server(&root, 2);

    let missing = send_request(addr, "GET /nope.html HTTP/1.1\r\n\r\n");
    assert!(missing.starts_with("HTTP/1.1 404 Not Found"), "got: {}", missing);

    let traversal = send_request(addr, "GET /../../../../etc/passwd HTTP/1.1\r\n\r\n");
    assert!(traversal.starts_with("HTTP/1.1 404 Not Found"), "got: {}", traversal);
    assert!(!traversal.contains("root:"));

    let directory = send_request(addr, "GET /img HTTP/1.1\r\n\r\n");
    assert!(directory.starts_with("HTTP/1.1 404 Not Found"));
}

#[test]
fn test_unknown_method_is_501() {
    let root = site("unknown");
    let addr = start_server(&root, 1);

    let response = send_request(addr, "DELETE /index.html HTTP/1.1\r\n\r\n");
    let (headers, body) = split_response(&response);

    assert!(headers.starts_with("HTTP/1.1 501 Not Implemented"), "got: {}", response);
    assert_eq!(body, "501 Not Implemented");
}

#[test]
fn test_head_reports_size_without_body() {
    let root = site("head");
    let addr = start_server(&root, 1);

    let response = send_request(addr, "HEAD /form.html HTTP/1.1\r\n\r\n");
    let (headers, body) = split_response(&response);

    assert!(headers.starts_with("HTTP/1.1 200 OK"));
    assert!(headers.contains("Content-Length: 13"));
    assert!(body.is_empty());
}

#[test]
fn test_trace_echoes_request() {
    let root = site("trace");
    let addr = start_server(&root, 1);

    let raw = "TRACE /anything HTTP/1.1\r\nX-Probe: 42\r\n\r\n";
    let response = send_request(addr, raw);
    let (headers, body) = split_response(&response);

    assert!(headers.starts_with("HTTP/1.1 200 OK"));
    assert!(headers.contains("Content-Type: application/octet-stream"));
    assert_eq!(body, raw);
}

#[test]
fn test_chunked_response() {
    let root = site("chunked");
    let big = "x".repeat(2500);
    fs::write(root.join("big.html"), &big).unwrap();
    let addr = start_server(&root, 1);

    let response = send_request(addr, "GET /big.html HTTP/1.1\r\nchunked: yes\r\n\r\n");
    let (headers, body) = split_response(&response);

    assert!(headers.starts_with("HTTP/1.1 200 OK"));
    assert!(headers.contains("Transfer-Encoding: chunked"));
    assert!(!headers.contains("Content-Length"));
    // 1000 + 1000 + 500
    assert!(body.starts_with("3e8\r\n"));
    assert_eq!(dechunk(body), big);
}

#[test]
fn test_concurrent_gets_with_content_types() {
    let root = site("concurrent");
    let addr = start_server(&root, 4);

    let cases = [
        ("/index.html", "index.html", "text/html"),
        ("/img/logo.png", "img/logo.png", "image"),
        ("/favicon.ico", "favicon.ico", "icon"),
        ("/notes.txt", "notes.txt", "application/octet-stream"),
    ];

    let handles: Vec<_> = cases
        .iter()
        .map(|(target, file, expected)| {
            let request = format!("GET {} HTTP/1.1\r\n\r\n", target);
            let expected_type = expected.to_string();
            let expected_body = fs::read(root.join(file)).unwrap();
            thread::spawn(move || {
                let response = send_raw(addr, request.as_bytes()).expect("Failed to send request");
                let split = response
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .expect("header terminator");
                let headers = String::from_utf8_lossy(&response[..split]).into_owned();
                let body = &response[split + 4..];

                assert!(headers.starts_with("HTTP/1.1 200 OK"), "got: {}", headers);
                assert!(
                    headers.contains(&format!("Content-Type: {}", expected_type)),
                    "expected {} in {}",
                    expected_type,
                    headers
                );
                assert!(headers.contains(&format!("Content-Length: {}", expected_body.len())));
                assert_eq!(body, expected_body.as_slice());
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("client thread panicked");
    }
}

#[test]
fn test_get_params_are_logged() {
    let root = site("getparams");
    let addr = start_server(&root, 1);

    let response = send_request(addr, "GET /form.html?name=Ada%20Lovelace&lang=rust HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK"));

    let html = fs::read_to_string(root.join("params_info.html")).unwrap();
    assert!(html.contains("<tr><th>Parameter Name</th><th>Parameter Value</th></tr>"));
    assert!(html.contains("<tr><td>lang</td><td>rust</td></tr>"));
    assert!(html.contains("<tr><td>name</td><td>Ada Lovelace</td></tr>"));
    assert!(html.starts_with("<html>\n<body>\n<table>"));
    assert!(html.ends_with("</table>\n</body>\n</html>\n"));
}

#[test]
fn test_post_body_merged_with_query() {
    let root = site("post");
    let addr = start_server(&root, 1);

    let raw = "POST /form.html?z=0 HTTP/1.1\r\nContent-Length: 7\r\n\r\nx=1&y=2";
    let response = send_request(addr, raw);
    let (headers, body) = split_response(&response);

    assert!(headers.starts_with("HTTP/1.1 200 OK"), "got: {}", response);
    assert_eq!(body, "<form></form>");

    let html = fs::read_to_string(root.join("params_info.html")).unwrap();
    assert!(html.contains("<tr><td>x</td><td>1</td></tr>"));
    assert!(html.contains("<tr><td>y</td><td>2</td></tr>"));
    assert!(html.contains("<tr><td>z</td><td>0</td></tr>"));
}

#[test]
fn test_params_table_is_overwritten() {
    let root = site("overwrite");
    let addr = start_server(&root, 1);

    send_request(addr, "GET /index.html?first=1 HTTP/1.1\r\n\r\n");
    send_request(addr, "GET /index.html?second=2 HTTP/1.1\r\n\r\n");

    let html = fs::read_to_string(root.join("params_info.html")).unwrap();
    assert!(!html.contains("first"));
    assert!(html.contains("<tr><td>second</td><td>2</td></tr>"));
    assert_eq!(html.matches("<table>").count(), 1);
}

#[test]
fn test_broken_params_page_does_not_change_status() {
    let root = site("brokenparams");
    fs::remove_file(root.join("params_info.html")).unwrap();
    let addr = start_server(&root, 1);

    let response = send_request(addr, "GET /index.html?a=1 HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK"));
}
