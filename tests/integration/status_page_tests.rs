//! Status page over a real loopback socket.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use airwatch::adapters::status_page::{StatusServer, bind_listener};
use airwatch::classifier::AlertLevel;
use airwatch::config::SystemConfig;
use airwatch::status::{StatusBoard, StatusReport};
use futures_lite::future::block_on;

fn loopback_config() -> SystemConfig {
    SystemConfig {
        status_port: 0,
        status_poll_ms: 5,
        ..SystemConfig::default()
    }
}

/// Drive the server on this thread while a client thread makes one request.
fn fetch(board: &StatusBoard, request: &'static str) -> String {
    let config = loopback_config();
    let listener = bind_listener(&config).unwrap();
    let mut server = StatusServer::new(board, listener, &config);
    let port = server.local_addr().unwrap().port();

    let client = std::thread::spawn(move || {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).unwrap();
        reply
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while server.served() == 0 && Instant::now() < deadline {
        block_on(server.poll_once());
    }
    assert_eq!(server.served(), 1);
    client.join().unwrap()
}

#[test]
fn serves_latest_report_as_json() {
    let board = StatusBoard::new();
    board.publish(StatusReport {
        level: Some(AlertLevel::Red),
        cycle: 12,
        alarm_active: true,
        alarm_silenced: true,
        ..StatusReport::default()
    });

    let reply = fetch(&board, "GET / HTTP/1.1\r\nHost: node\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
    let body = reply.split("\r\n\r\n").nth(1).unwrap();
    let v: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(v["level"], "Red");
    assert_eq!(v["cycle"], 12);
    assert_eq!(v["alarm_active"], true);
    assert_eq!(v["alarm_silenced"], true);
    assert_eq!(v["clock_synced"], false);
}

#[test]
fn unknown_path_is_404() {
    let reply = fetch(&StatusBoard::new(), "GET /config HTTP/1.1\r\n\r\n");
    assert!(reply.starts_with("HTTP/1.1 404 Not Found\r\n"), "{reply}");
}

#[test]
fn idle_poll_returns_without_a_client() {
    let config = loopback_config();
    let board = StatusBoard::new();
    let mut server = StatusServer::new(&board, bind_listener(&config).unwrap(), &config);

    let started = Instant::now();
    block_on(server.poll_once());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(server.served(), 0);
}
