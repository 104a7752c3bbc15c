//! Request parsing and routing for the JSON dashboard endpoint.
//!
//! The `dashboard_server` binary owns the socket; this module reads a request
//! from any buffered reader, maps it to a response and writes that back, so
//! every step can be exercised without a network.

use serde::Serialize;
use serde_json::json;
use std::io::{BufRead, Read, Write};

use crate::config::Config;
use crate::data::Source;
use crate::dataset::Dataset;
use crate::dimension::Dimension;
use crate::error::RequestError;
use crate::resolver::{all_options, available_options};
use crate::state::SelectionState;
use crate::view::{recompute, SelectionRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(err) => Self::error(500, &format!("encode failed: {err}")),
        }
    }

    fn error(status: u16, msg: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: json!({ "error": msg }).to_string(),
        }
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }
}

impl From<&RequestError> for Response {
    fn from(err: &RequestError) -> Self {
        let status = match err {
            RequestError::Timeout => 408,
            RequestError::TooLarge(_) => 413,
            RequestError::Malformed(_) => 400,
            RequestError::Io(_) => 500,
        };
        Response::error(status, &err.to_string())
    }
}

/// Largest accepted request body.
pub const MAX_BODY: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub body: Vec<u8>,
}

/// Reads one request: request line, headers up to the blank line, then
/// `Content-Length` bytes of body. `Ok(None)` when the peer closed the
/// connection without sending anything.
///
/// A declared body over [`MAX_BODY`] is rejected before any of it is read.
/// Read timeouts configured on the underlying stream surface as
/// [`RequestError::Timeout`].
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Option<Request>, RequestError> {
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(RequestError::Malformed(format!("bad request line {:?}", request_line.trim_end())));
    };

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(RequestError::Malformed("connection closed in headers".to_string()));
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value
                    .trim()
                    .parse()
                    .map_err(|_| RequestError::Malformed(format!("bad content-length {:?}", value.trim())))?;
            }
        }
    }
    if content_length > MAX_BODY {
        return Err(RequestError::TooLarge(content_length));
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;
    Ok(Some(Request {
        method: method.to_string(),
        target: target.to_string(),
        body,
    }))
}

pub fn write_response<W: Write>(out: &mut W, resp: &Response) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        resp.status,
        resp.reason(),
        resp.content_type,
        resp.body.len(),
    );
    out.write_all(head.as_bytes())?;
    out.write_all(resp.body.as_bytes())?;
    out.flush()
}

/// Shared, read-only state for every request.
pub struct App {
    pub dataset: Dataset,
    pub source: Source,
    pub config: Config,
}

impl App {
    pub fn new(dataset: Dataset, source: Source, config: Config) -> Self {
        Self {
            dataset,
            source,
            config,
        }
    }

    pub fn handle(&self, method: &str, target: &str, body: &[u8]) -> Response {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        match (method, path) {
            ("GET", "/api/health") => Response::json(200, &json!({ "status": "ok", "rows": self.dataset.len() })),
            ("GET", "/api/manifest") => self.manifest(),
            ("GET", "/api/options") => self.with_query(query, |state| Response::json(200, &all_options(&self.dataset, &state))),
            ("GET", "/api/dashboard") => {
                let page = match page_param(query) {
                    Ok(p) => p,
                    Err(resp) => return resp,
                };
                self.with_query(query, |state| self.dashboard(&state, page))
            }
            ("POST", "/api/dashboard") => match serde_json::from_slice::<SelectionRequest>(body) {
                Ok(req) => {
                    let state = req.into_state(&self.dataset, self.config.default_grouping);
                    self.dashboard(&state, 0)
                }
                Err(err) => Response::error(400, &format!("invalid selection: {err}")),
            },
            ("GET", p) if p.starts_with("/api/options/") => {
                let name = &p["/api/options/".len()..];
                let dim: Dimension = match name.parse() {
                    Ok(d) => d,
                    Err(err) => return Response::error(404, &err.to_string()),
                };
                self.with_query(query, |state| {
                    Response::json(200, &available_options(&self.dataset, dim, &state.selection, state.years))
                })
            }
            (_, "/api/health" | "/api/manifest" | "/api/options" | "/api/dashboard") => {
                Response::error(405, "method not allowed")
            }
            _ => Response::error(404, "not found"),
        }
    }

    fn with_query(&self, query: &str, f: impl FnOnce(SelectionState) -> Response) -> Response {
        match SelectionState::from_query(&self.dataset, query, self.config.default_grouping) {
            Ok(state) => f(state),
            Err(err) => Response::error(400, &err.to_string()),
        }
    }

    fn dashboard(&self, state: &SelectionState, page: usize) -> Response {
        let view = recompute(&self.dataset, state, page, self.config.ranking_page_size);
        Response::json(200, &view)
    }

    fn manifest(&self) -> Response {
        match &self.source {
            Source::Csv(manifest) => Response::json(200, manifest),
            Source::Demo { seed, rows } => Response::json(
                200,
                &json!({
                    "demo": true,
                    "seed": seed,
                    "rows": rows,
                    "year_min": self.dataset.year_bounds().min,
                    "year_max": self.dataset.year_bounds().max,
                }),
            ),
        }
    }
}

fn page_param(query: &str) -> Result<usize, Response> {
    match url::form_urlencoded::parse(query.as_bytes()).find(|(k, _)| k == "page") {
        Some((_, v)) => v
            .trim()
            .parse()
            .map_err(|_| Response::error(400, &format!("invalid page: {v:?}"))),
        None => Ok(0),
    }
}
