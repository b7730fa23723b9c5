//! Minimal HTTP/1.1 server standing in for the GitHub API in integration tests.
//!
//! Each path has a scripted sequence of replies. Replies are consumed in order;
//! the last one repeats. Unknown paths get 404.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u32,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn accepted() -> Self {
        Self {
            status: 202,
            body: "{}".to_string(),
        }
    }

    pub fn status(status: u32) -> Self {
        Self {
            status,
            body: r#"{"message": "scripted failure"}"#.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, VecDeque<Reply>>,
    requests: Vec<RecordedRequest>,
}

pub struct ApiServer {
    pub base_url: String,
    state: Arc<Mutex<State>>,
}

impl ApiServer {
    /// Starts a server in a background thread. It runs until the process exits.
    pub fn start(routes: Vec<(String, Vec<Reply>)>) -> Self {
        let state = State {
            routes: routes
                .into_iter()
                .map(|(path, replies)| (path, replies.into()))
                .collect(),
            requests: Vec::new(),
        };
        let state = Arc::new(Mutex::new(state));
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let server_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&server_state);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

/// Replies for a repository with no traffic and no contributors.
pub fn quiet_repo(org: &str, repo: &str) -> Vec<(String, Vec<Reply>)> {
    vec![
        (
            traffic_path(org, repo, "views"),
            vec![Reply::ok(r#"{"count": 0, "uniques": 0, "views": []}"#)],
        ),
        (
            traffic_path(org, repo, "clones"),
            vec![Reply::ok(r#"{"count": 0, "uniques": 0, "clones": []}"#)],
        ),
        (contributors_path(org, repo), vec![Reply::ok("[]")]),
    ]
}

pub fn traffic_path(org: &str, repo: &str, kind: &str) -> String {
    format!("/repos/{}/{}/traffic/{}", org, repo, kind)
}

pub fn contributors_path(org: &str, repo: &str) -> String {
    format!("/repos/{}/{}/stats/contributors", org, repo)
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let request = String::from_utf8_lossy(&buf);
    let recorded = parse_request(&request);

    let reply = {
        let mut state = state.lock().unwrap();
        let reply = match state.routes.get_mut(&recorded.path) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        state.requests.push(recorded);
        reply.unwrap_or(Reply {
            status: 404,
            body: r#"{"message": "Not Found"}"#.to_string(),
        })
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nX-RateLimit-Remaining: 4999\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reason(reply.status),
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn reason(status: u32) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        204 => "No Content",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn parse_request(request: &str) -> RecordedRequest {
    let mut lines = request.lines();
    let path = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();
    let mut authorization = None;
    let mut user_agent = None;
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            } else if name.eq_ignore_ascii_case("user-agent") {
                user_agent = Some(value.trim().to_string());
            }
        }
    }
    RecordedRequest {
        path,
        authorization,
        user_agent,
    }
}
