//! Minimal HTTP front-end for an `InferenceService`.
//!
//! Routes:
//!   GET  /health   — `ok`
//!   POST /predict  — body is raw text or `{"text": "..."}`; replies with a
//!                    `Prediction` as JSON
//!
//! Requests are handled one at a time on the calling thread; the service is
//! only ever read.

use std::io::{Cursor, Read};

use serde_json::json;
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::inference::service::InferenceService;
use crate::text::embedding::EmbeddingProvider;
use crate::text::normalizer::TextNormalizer;

/// Largest request body accepted by `/predict`.
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// A routed response before it is turned into a `tiny_http::Response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn json(status: u16, value: serde_json::Value) -> Reply {
        Reply { status, content_type: "application/json", body: value.to_string() }
    }

    fn text(status: u16, body: &str) -> Reply {
        Reply { status, content_type: "text/plain; charset=utf-8", body: body.to_owned() }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let bytes = self.body.into_bytes();
        let len = bytes.len();
        let mut headers = Vec::new();
        if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            headers.push(h);
        }
        Response::new(StatusCode(self.status), headers, Cursor::new(bytes), Some(len), None)
    }
}

/// Extracts the text to classify from a `/predict` body.
fn request_text(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("text") {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => body.to_owned(),
        },
        _ => body.to_owned(),
    }
}

/// Maps one request to a reply.
pub fn route<N, E>(service: &InferenceService<N, E>, method: &Method, url: &str, body: &str) -> Reply
where
    N: TextNormalizer,
    E: EmbeddingProvider,
{
    let path = url.split('?').next().unwrap_or(url);
    match (method, path) {
        (Method::Get, "/health") => Reply::text(200, "ok"),
        (Method::Post, "/predict") => match service.predict(&request_text(body)) {
            Ok(prediction) => match serde_json::to_value(&prediction) {
                Ok(value) => Reply::json(200, value),
                Err(e) => Reply::json(500, json!({ "error": e.to_string() })),
            },
            Err(e) => Reply::json(422, json!({ "error": e.to_string() })),
        },
        (_, "/health") | (_, "/predict") => Reply::text(405, "method not allowed"),
        _ => Reply::text(404, "not found"),
    }
}

/// Reads at most `MAX_BODY_BYTES` of UTF-8. Anything longer is refused with
/// 413 rather than classified truncated.
fn read_body<R: Read>(reader: R) -> std::result::Result<String, Reply> {
    let mut bytes = Vec::new();
    if let Err(e) = reader.take(MAX_BODY_BYTES + 1).read_to_end(&mut bytes) {
        return Err(Reply::text(400, &format!("unreadable body: {e}")));
    }
    if bytes.len() as u64 > MAX_BODY_BYTES {
        return Err(Reply::text(413, "request body too large"));
    }
    String::from_utf8(bytes).map_err(|e| Reply::text(400, &format!("body is not UTF-8: {e}")))
}

/// Binds `addr` and serves until the process exits.
pub fn serve<N, E>(service: &InferenceService<N, E>, addr: &str) -> Result<()>
where
    N: TextNormalizer,
    E: EmbeddingProvider,
{
    let server = Server::http(addr).map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    info!(%addr, "serving predictions");

    for mut request in server.incoming_requests() {
        let read = read_body(request.as_reader());
        let reply = match read {
            Ok(body) => route(service, request.method(), request.url(), &body),
            Err(reply) => reply,
        };
        info!(method = %request.method(), url = request.url(), status = reply.status, "request");
        if let Err(e) = request.respond(reply.into_response()) {
            warn!(error = %e, "failed to send response");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::labels::LabelTable;
    use crate::network::head::ClassifierHead;
    use crate::text::embedding::HashingEmbedder;
    use crate::text::normalizer::BasicNormalizer;
    use rand::{rngs::StdRng, SeedableRng};

    fn service() -> InferenceService<BasicNormalizer, HashingEmbedder> {
        let head = ClassifierHead::new(16, 4, 0.0, &mut StdRng::seed_from_u64(1));
        InferenceService::new(BasicNormalizer, HashingEmbedder::new(16).expect("embedder"), head, LabelTable::sentiment())
            .expect("service")
    }

    #[test]
    fn predict_accepts_raw_and_json_bodies_identically() {
        let svc = service();
        let raw = route(&svc, &Method::Post, "/predict", "great crew");
        let wrapped = route(&svc, &Method::Post, "/predict", r#"{"text": "great crew"}"#);
        assert_eq!(raw.status, 200);
        assert_eq!(raw, wrapped);
        let v: serde_json::Value = serde_json::from_str(&raw.body).expect("json");
        assert!(["negative", "neutral", "positive"].contains(&v["label"].as_str().expect("label")));
    }

    #[test]
    fn health_and_unknown_routes() {
        let svc = service();
        assert_eq!(route(&svc, &Method::Get, "/health", "").status, 200);
        assert_eq!(route(&svc, &Method::Get, "/predict", "").status, 405);
        assert_eq!(route(&svc, &Method::Get, "/nope", "").status, 404);
    }

    #[test]
    fn oversized_bodies_are_refused_not_truncated() {
        let limit = MAX_BODY_BYTES as usize;
        let at_limit = "a".repeat(limit);
        assert_eq!(read_body(at_limit.as_bytes()).map(|b| b.len()), Ok(limit));
        let over = "a".repeat(limit + 1);
        assert_eq!(read_body(over.as_bytes()).map_err(|r| r.status), Err(413));
        assert_eq!(read_body(&[0xff, 0xfe][..]).map_err(|r| r.status), Err(400));
    }
}
