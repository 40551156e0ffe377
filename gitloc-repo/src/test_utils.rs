//! Test helpers shared by unit and integration tests: in-memory zip archives
//! and a scripted transport

use crate::api::{HttpResponse, HttpTransport};
use async_trait::async_trait;
use gitloc_core::{ErrorContext, GitlocError, GitlocResult};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;

pub struct ZipItem<'a> {
    pub path: &'a str,
    pub content: Option<&'a [u8]>,
}

impl<'a> ZipItem<'a> {
    pub fn file(path: &'a str, content: &'a [u8]) -> Self {
        Self {
            path,
            content: Some(content),
        }
    }

    pub fn dir(path: &'a str) -> Self {
        Self {
            path,
            content: None,
        }
    }
}

pub fn build_zip(items: &[ZipItem<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for item in items {
        match item.content {
            Some(content) => {
                writer.start_file(item.path, options).unwrap();
                writer.write_all(content).unwrap();
            }
            None => {
                writer.add_directory(item.path, options).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

enum Scripted {
    Response(u16, Vec<u8>),
    Failure(String),
}

/// Transport answering from a fixed table; unknown URLs get a 404.
/// Every requested URL is recorded in order.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Response(status, body.into()));
        self
    }

    pub fn fail(self, url: &str, message: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Failure(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, _accept: &str) -> GitlocResult<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());

        match self.routes.lock().unwrap().get(url) {
            Some(Scripted::Response(status, body)) => Ok(HttpResponse {
                status: *status,
                reason: reason(*status).to_string(),
                body: body.clone(),
            }),
            Some(Scripted::Failure(message)) => Err(GitlocError::Network {
                message: message.clone(),
                source: None,
                context: ErrorContext::new("scripted_transport"),
            }),
            None => Ok(HttpResponse {
                status: 404,
                reason: reason(404).to_string(),
                body: b"Not Found".to_vec(),
            }),
        }
    }
}

/// Metadata document as served by `GET /repos/{owner}/{repo}`
pub fn metadata_json(name: &str, default_branch: &str, size: u64) -> Vec<u8> {
    serde_json::json!({
        "name": name,
        "default_branch": default_branch,
        "size": size,
        "private": false,
    })
    .to_string()
    .into_bytes()
}
