//! Interactive login against the status backend.
//!
//! 1. Open the backend's login page in the system browser.
//! 2. Listen on a loopback port for the redirect. The bearer token travels
//!    in the URL fragment, which never reaches an HTTP server, so the first
//!    response is a tiny page that re-requests with the fragment as a query
//!    string.
//! 3. Extract the `token` parameter from the forwarded request.
//!
//! The caller persists the token; nothing is stored here.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use url::Url;

use crate::error::ApiError;

const LOGIN_PATH: &str = "/extension/login";

/// Connections accepted before giving up on the redirect (browsers also ask
/// for favicons and the like).
const MAX_REDIRECT_REQUESTS: usize = 16;

/// Re-sends `location.hash` as a query string so the listener can see it.
const FORWARD_PAGE: &str = "<html><body><script>\
    var h = window.location.hash;\
    window.location.replace('/capture' + (h ? '?' + h.slice(1) : ''));\
    </script></body></html>";

const SUCCESS_PAGE: &str = "<html><body><h2>Login successful!</h2>\
    <p>You can close this tab and return to ongaku.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h2>Login failed</h2>\
    <p>No token was present in the redirect.</p></body></html>";

/// Run the interactive login flow and return the bearer token.
pub async fn login(origin: &str, callback_port: u16) -> Result<String, ApiError> {
    let redirect_uri = format!("http://127.0.0.1:{callback_port}/callback");

    let mut login_url = Url::parse(origin)
        .map_err(|e| ApiError::Auth(format!("invalid backend origin {origin}: {e}")))?;
    login_url.set_path(LOGIN_PATH);
    login_url
        .query_pairs_mut()
        .append_pair("redirect_uri", &redirect_uri);

    tracing::info!("Opening login URL in browser");
    open::that(login_url.as_str())
        .map_err(|e| ApiError::Auth(format!("failed to open browser: {e}")))?;

    tokio::task::spawn_blocking(move || listen_for_token(callback_port))
        .await
        .map_err(|e| ApiError::Auth(format!("login listener task failed: {e}")))?
}

/// Accept loopback connections until the forwarded redirect carrying the
/// token arrives.
fn listen_for_token(port: u16) -> Result<String, ApiError> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .map_err(|e| ApiError::Auth(format!("failed to bind localhost:{port}: {e}")))?;

    tracing::info!("Waiting for login redirect on localhost:{port}...");

    for _ in 0..MAX_REDIRECT_REQUESTS {
        let (mut stream, _) = listener
            .accept()
            .map_err(|e| ApiError::Auth(format!("failed to accept connection: {e}")))?;

        let mut buf = [0u8; 4096];
        let n = stream
            .read(&mut buf)
            .map_err(|e| ApiError::Auth(format!("failed to read from stream: {e}")))?;
        let request = String::from_utf8_lossy(&buf[..n]);

        let Some(path) = request
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
        else {
            respond(&mut stream, "400 Bad Request", "");
            continue;
        };

        if path.starts_with("/capture") {
            let full_url = format!("http://127.0.0.1{path}");
            return match extract_token(&full_url) {
                Some(token) => {
                    respond(&mut stream, "200 OK", SUCCESS_PAGE);
                    Ok(token)
                }
                None => {
                    respond(&mut stream, "200 OK", FAILURE_PAGE);
                    Err(ApiError::Auth("no token present in login redirect".into()))
                }
            };
        }

        if path.starts_with("/favicon") {
            respond(&mut stream, "404 Not Found", "");
            continue;
        }

        respond(&mut stream, "200 OK", FORWARD_PAGE);
    }

    Err(ApiError::Auth("login redirect never arrived".into()))
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Extract a bearer token from a redirect URL's `#token=` fragment, or from
/// its forwarded `?token=` form. Empty values count as absent.
pub fn extract_token(redirect_url: &str) -> Option<String> {
    let url = Url::parse(redirect_url).ok()?;

    if let Some(fragment) = url.fragment() {
        let from_fragment = url::form_urlencoded::parse(fragment.as_bytes())
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty());
        if from_fragment.is_some() {
            return from_fragment;
        }
    }

    url.query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_fragment() {
        assert_eq!(
            extract_token("http://127.0.0.1:17656/callback#token=abc.def.ghi").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(
            extract_token("http://127.0.0.1:17656/callback#expires=3600&token=t1").as_deref(),
            Some("t1")
        );
    }

    #[test]
    fn test_extract_from_forwarded_query() {
        assert_eq!(
            extract_token("http://127.0.0.1:17656/capture?token=abc").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_missing_token_yields_none() {
        assert_eq!(extract_token("http://127.0.0.1:17656/callback"), None);
        assert_eq!(extract_token("http://127.0.0.1:17656/callback#other=x"), None);
        assert_eq!(extract_token("http://127.0.0.1:17656/capture?token="), None);
        assert_eq!(extract_token("not a url"), None);
    }

    /// Drive the loopback listener the way a browser would: one request per
    /// connection, reading the full response each time.
    fn send_request(port: u16, path: &str) -> String {
        // The listener thread may not have bound yet.
        let mut stream = None;
        for _ in 0..50 {
            match TcpStream::connect(("127.0.0.1", port)) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(10)),
            }
        }
        let mut stream = stream.expect("listener never came up");
        stream
            .write_all(format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n").as_bytes())
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_listener_forwards_fragment_then_captures_token() {
        let port = 17690;
        let handle = std::thread::spawn(move || listen_for_token(port));

        // The redirect itself: the fragment never reaches us, so the
        // listener must answer with the forwarder page.
        let response = send_request(port, "/callback");
        assert!(response.contains("location.hash"));

        let response = send_request(port, "/capture?token=abc.def.ghi");
        assert!(response.contains("successful"));

        assert_eq!(handle.join().unwrap().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_listener_fails_when_redirect_has_no_token() {
        let port = 17691;
        let handle = std::thread::spawn(move || listen_for_token(port));

        let _ = send_request(port, "/callback");
        let response = send_request(port, "/capture?");
        assert!(response.contains("failed"));

        match handle.join().unwrap() {
            Err(ApiError::Auth(msg)) => assert!(msg.contains("no token")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}
