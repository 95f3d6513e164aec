use std::io::Read;
use std::net::SocketAddr;

use anyhow::{bail, Result};
use axum::http::HeaderMap;
use flate2::read::GzDecoder;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

use backend_domain::RuntimeConfig;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const SOURCE_HEADER: &str = "X-Webhook-Source";

const REDACTED_HEADERS: &[&str] = &["authorization", "cookie", "x-webhook-signature"];

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// HMAC-SHA256 check of the raw body. Only enforced when both a secret is
/// configured and the sender supplied a signature.
pub fn verify_signature(secret: Option<&str>, headers: &HeaderMap, body: &[u8]) -> bool {
    let (Some(secret), Some(signature)) = (secret, header_str(headers, SIGNATURE_HEADER)) else {
        return true;
    };
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded) = header_str(headers, "X-Forwarded-For") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|ip| !ip.is_empty()) {
            return Some(first.to_string());
        }
    }
    if let Some(real_ip) = header_str(headers, "X-Real-IP").map(str::trim) {
        if !real_ip.is_empty() {
            return Some(real_ip.to_string());
        }
    }
    peer.map(|addr| addr.ip().to_string())
}

pub fn resolve_source(path_source: Option<String>, headers: &HeaderMap) -> String {
    path_source
        .map(|source| source.trim().to_string())
        .filter(|source| !source.is_empty())
        .or_else(|| {
            header_str(headers, SOURCE_HEADER)
                .map(str::trim)
                .filter(|source| !source.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Decoded body text and its JSON value. A gzip body may not inflate past
/// `max_bytes`.
pub fn parse_payload(headers: &HeaderMap, body: &[u8], max_bytes: u64) -> Result<(String, Value)> {
    let content = maybe_gunzip(headers, body, max_bytes)?;
    let value = serde_json::from_str(&content)?;
    Ok((content, value))
}

pub fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        let name = name.as_str();
        if REDACTED_HEADERS.contains(&name) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            map.insert(name.to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(map)
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8], max_bytes: u64) -> Result<String> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("") == "gzip" {
            let mut decoder = GzDecoder::new(body).take(max_bytes.saturating_add(1));
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            if out.len() as u64 > max_bytes {
                bail!("inflated body exceeds {} bytes", max_bytes);
            }
            return Ok(String::from_utf8(out)?);
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
