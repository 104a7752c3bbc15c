//! Runs the `dashboard_server` binary and checks that one stalled client does
//! not hold up the others.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct Server {
    child: Child,
    addr: SocketAddr,
    _logs: TempDir,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap()
}

fn start_server(timeout_ms: u64) -> Server {
    let logs = TempDir::new().unwrap();
    let addr = free_addr();
    let child = Command::new(env!("CARGO_BIN_EXE_dashboard_server"))
        .env("BIND_ADDR", addr.to_string())
        .env("REQUEST_TIMEOUT_MS", timeout_ms.to_string())
        .env("DATASET_PATH", logs.path().join("absent.csv"))
        .env("DEMO_ROWS", "100")
        .env("LOG_DIR", logs.path())
        .env("LOG_STDOUT", "0")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let server = Server {
        child,
        addr,
        _logs: logs,
    };

    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        if let Ok(resp) = get(server.addr, "/api/health") {
            if resp.starts_with("HTTP/1.1 200") {
                return server;
            }
        }
        assert!(Instant::now() < deadline, "server did not come up on {}", server.addr);
        thread::sleep(Duration::from_millis(50));
    }
}

fn get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    write!(stream, "GET {path} HTTP/1.1\r\nHost: test\r\n\r\n")?;
    let mut out = String::new();
    stream.read_to_string(&mut out)?;
    Ok(out)
}

#[test]
fn idle_connection_does_not_block_other_clients() {
    let server = start_server(300);

    let mut idle = TcpStream::connect(server.addr).unwrap();
    idle.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let resp = get(server.addr, "/api/health").unwrap();
    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");

    let mut timed_out = String::new();
    idle.read_to_string(&mut timed_out).unwrap();
    assert!(timed_out.starts_with("HTTP/1.1 408"), "{timed_out}");
}

#[test]
fn oversized_body_gets_413() {
    let server = start_server(2_000);
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    write!(
        stream,
        "POST /api/dashboard HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        10 * 1024 * 1024
    )
    .unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    assert!(out.starts_with("HTTP/1.1 413"), "{out}");
}
