//! HTTP query API for the demo server.
//!
//! Uses `std::net::TcpListener` on a dedicated thread, no HTTP framework
//! needed. Endpoints:
//!
//! - `GET /api/metrics`                    — every series
//! - `GET /api/metrics?metric=<name>`      — one series
//! - `GET /api/metrics?prefix=<p>`         — series by name prefix
//! - `GET /api/metrics/list`               — known names and count
//! - `GET /api/lagspikes`                  — recent lag spikes
//! - `GET /api/config`                     — active configuration echo
//!
//! Errors come back as JSON `{"status": code, "error": msg}`: 405 for
//! non-GET methods, 404 for unknown paths, 500 for internal failures.
//! Unrecognized query parameters are ignored, falling back to the full
//! metrics snapshot.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use tickscope::{ErrorResponse, MetricSelector, QueryService};

/// Runs the HTTP API server (blocking — intended for a dedicated thread).
pub fn run_api_server(query: Arc<QueryService>, port: u16) {
    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("API bind failed on {addr}: {e}");
            return;
        }
    };
    tracing::info!("query API listening on {addr}");

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("accept error: {e}");
                continue;
            }
        };

        // Short read timeout so a slow client cannot hold the thread.
        let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(5)));

        if let Err(e) = handle_request(&stream, &query) {
            tracing::debug!("request error: {e}");
        }
    }
}

/// Parses one HTTP request and dispatches to the matching handler.
fn handle_request(
    stream: &TcpStream,
    query: &QueryService,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // Parse: "GET /path?query HTTP/1.x"
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return send_error(stream, 400, "Bad Request");
    }

    let (path, raw_query) = match parts[1].split_once('?') {
        Some((path, raw_query)) => (path, raw_query),
        None => (parts[1], ""),
    };

    // Drain remaining headers (we don't need them).
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        if line.trim().is_empty() {
            break;
        }
    }

    if !parts[0].eq_ignore_ascii_case("GET") {
        return send_error(stream, 405, "Method Not Allowed");
    }

    let body = match path {
        "/api/metrics" => {
            let params = parse_query(raw_query);
            let selector = MetricSelector {
                metric: params.get("metric").cloned(),
                prefix: params.get("prefix").cloned(),
            };
            serde_json::to_string(&query.metrics(&selector))
        }
        "/api/metrics/list" => serde_json::to_string(&query.list()),
        "/api/lagspikes" => serde_json::to_string(&query.lag_spikes()),
        "/api/config" => serde_json::to_string(&query.config()),
        _ => return send_error(stream, 404, "Not Found"),
    };

    match body {
        Ok(body) => send_response(stream, 200, &body),
        Err(e) => {
            tracing::error!("failed to serve {path}: {e}");
            send_error(stream, 500, "Internal Server Error")
        }
    }
}

/// Sends a JSON error payload with the matching status line.
fn send_error(
    stream: &TcpStream,
    status: u16,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = serde_json::to_string(&ErrorResponse::new(status, message))
        .unwrap_or_else(|_| format!("{{\"status\":{status},\"error\":\"{message}\"}}"));
    send_response(stream, status, &body)
}

/// Sends a JSON HTTP response.
fn send_response(
    mut stream: &TcpStream,
    status: u16,
    body: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    };

    write!(
        stream,
        "HTTP/1.1 {status} {status_text}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len(),
    )?;

    Ok(())
}

/// Parses a query string into key-value pairs. Malformed pairs are
/// silently skipped; the caller falls back to defaults.
fn parse_query(raw_query: &str) -> HashMap<String, String> {
    raw_query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            Some((k.to_string(), v.to_string()))
        })
        .collect()
}
