//! Dashboard server
//!
//! Serves option lists and aggregations as JSON for an external front end.
//! One request per connection, handled synchronously in arrival order. Each
//! connection gets `REQUEST_TIMEOUT_MS` to deliver its request; a stalled
//! client is answered with 408 and dropped.
//! Run with: cargo run --bin dashboard_server

use anyhow::{Context, Result};
use serde_json::json;
use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use salesboard::config::Config;
use salesboard::data::load_configured;
use salesboard::logging::{self, obj, v_str, Domain};
use salesboard::server::{read_request, write_response, App, Response};

fn serve(app: &App, stream: TcpStream, request_id: u64, timeout: Duration) {
    let started = Instant::now();
    if let Err(err) = stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
    {
        logging::warn(
            Domain::Server,
            "socket_setup_failed",
            obj(&[("request_id", json!(request_id)), ("msg", v_str(&err.to_string()))]),
        );
        return;
    }

    let mut reader = BufReader::new(&stream);
    let (method, target, resp) = match read_request(&mut reader) {
        Ok(Some(req)) => {
            let resp = app.handle(&req.method, &req.target, &req.body);
            (req.method, req.target, resp)
        }
        Ok(None) => return,
        Err(err) => {
            logging::warn(
                Domain::Server,
                "bad_request",
                obj(&[("request_id", json!(request_id)), ("msg", v_str(&err.to_string()))]),
            );
            (String::from("-"), String::from("-"), Response::from(&err))
        }
    };

    let mut out = &stream;
    if let Err(err) = write_response(&mut out, &resp) {
        logging::warn(
            Domain::Server,
            "write_failed",
            obj(&[("request_id", json!(request_id)), ("msg", v_str(&err.to_string()))]),
        );
    }
    logging::log_request(
        request_id,
        &method,
        &target,
        resp.status,
        started.elapsed().as_secs_f64() * 1000.0,
    );
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let (dataset, source) = load_configured(&cfg).context("loading dataset")?;
    let listener = TcpListener::bind(&cfg.bind_addr).with_context(|| format!("binding {}", cfg.bind_addr))?;
    let timeout = Duration::from_millis(cfg.request_timeout_ms);

    logging::info(
        Domain::System,
        "server_started",
        obj(&[
            ("bind_addr", v_str(&cfg.bind_addr)),
            ("request_timeout_ms", json!(cfg.request_timeout_ms)),
            ("msg", v_str("GET /api/health /api/manifest /api/options[/<Dimension>] /api/dashboard, POST /api/dashboard")),
        ]),
    );

    let app = App::new(dataset, source, cfg);
    let mut request_id = 0u64;

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(err) => {
                logging::error(Domain::Server, "accept_failed", obj(&[("msg", v_str(&err.to_string()))]));
                continue;
            }
        };
        request_id += 1;
        serve(&app, stream, request_id, timeout);
    }
    Ok(())
}
