//! One-shot local HTTP server for exercising the HTTP adapters.

use std::io::Read;
use std::thread;

use crossbeam_channel::Receiver;
use tiny_http::{Header, Response, Server, StatusCode};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub authorization: Option<String>,
}

/// Serves exactly one request with `status` and `body`, then shuts down.
/// Returns the base URL and a receiver yielding the captured request.
pub fn serve_once(status: u16, body: &str) -> (String, Receiver<CapturedRequest>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = crossbeam_channel::bounded(1);
    let body = body.to_string();

    thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut request_body = String::new();
        request.as_reader().read_to_string(&mut request_body).unwrap();
        let authorization = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Authorization"))
            .map(|h| h.value.as_str().to_string());

        let _ = tx.send(CapturedRequest {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            body: request_body,
            authorization,
        });

        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
        let response = Response::from_string(body)
            .with_status_code(StatusCode(status))
            .with_header(content_type);
        let _ = request.respond(response);
    });

    (format!("http://127.0.0.1:{port}"), rx)
}
