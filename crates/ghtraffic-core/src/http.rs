//! Blocking HTTP GET over libcurl.
//!
//! One request at a time on the calling thread. Response header lines are kept
//! verbatim so a failed call can be reported with its full header dump.

use std::str;

use url::Url;

/// Options applied to a single GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions<'a> {
    pub user_agent: &'a str,
    /// HTTP Basic credentials (username, secret).
    pub basic_auth: Option<(&'a str, &'a str)>,
    /// Extra headers as (name, value).
    pub headers: &'a [(&'a str, &'a str)],
}

/// Status, header lines and body of a completed request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u32,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Value of the last header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// True when the body is empty or whitespace only (e.g. 204 No Content).
    pub fn body_is_blank(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Performs a GET and returns whatever the server answered.
///
/// Follows redirects. No timeout is set: a stalled server stalls the caller.
pub fn get(url: &Url, opts: &RequestOptions<'_>) -> Result<RawResponse, curl::Error> {
    let mut headers: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url.as_str())?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    if !opts.user_agent.is_empty() {
        easy.useragent(opts.user_agent)?;
    }
    if let Some((user, secret)) = opts.basic_auth {
        let mut auth = curl::easy::Auth::new();
        auth.basic(true);
        easy.http_auth(&auth)?;
        easy.username(user)?;
        easy.password(secret)?;
    }

    if !opts.headers.is_empty() {
        let mut list = curl::easy::List::new();
        for (k, v) in opts.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        easy.http_headers(list)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                if !line.is_empty() {
                    headers.push(line.to_string());
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

/// Find a header value in collected header lines. Later lines win, so after a
/// redirect the final response's value is returned.
pub(crate) fn header_value<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    lines.iter().rev().find_map(|line| {
        let (n, v) = line.split_once(':')?;
        n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}
