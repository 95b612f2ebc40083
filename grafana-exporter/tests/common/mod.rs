//! Fake exporter plugin backend served by axum on an ephemeral port.
//!
//! Catalog: three Terraform kinds for the local instance, two for cloud, and
//! two uncategorised Grizzly kinds for Grizzly formats. `generate` answers one
//! file per requested kind, warns about contact points, and fails with a plain
//! text body when `grafana_broken` is requested. Any `Authorization` header
//! other than `Bearer test-token` is rejected.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";

fn authorised(headers: &HeaderMap) -> bool {
    match headers.get("authorization") {
        Some(value) => value.to_str().ok() == Some("Bearer test-token"),
        None => true,
    }
}

async fn resource_types(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorised(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid API key"}))).into_response();
    }
    let target = params.get("target").map(String::as_str).unwrap_or("");
    let format = params.get("outputFormat").map(String::as_str).unwrap_or("");
    let resources = match (target, format) {
        (_, f) if f.starts_with("grizzly") => json!([
            {"name": "Dashboard"},
            {"name": "Folder"}
        ]),
        ("cloud", _) => json!([
            {"name": "grafana_folder", "category": "Grafana"},
            {"name": "grafana_cloud_stack", "category": "Cloud"}
        ]),
        _ => json!([
            {"name": "grafana_folder", "category": "Grafana"},
            {"name": "grafana_dashboard", "category": "Grafana"},
            {"name": "grafana_contact_point", "category": "Alerting"}
        ]),
    };
    Json(json!({ "resources": resources })).into_response()
}

async fn generate(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorised(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "invalid API key"}))).into_response();
    }
    let kinds: Vec<String> = body["onlyResources"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim_end_matches(".*").to_string())
                .collect()
        })
        .unwrap_or_default();
    if kinds.iter().any(|k| k == "grafana_broken") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to list broken resources\n").into_response();
    }
    let extension = match body["outputFormat"].as_str() {
        Some("terraform-json") | Some("grizzly-json") => "json",
        Some("crossplane") | Some("grizzly-yaml") => "yaml",
        _ => "tf",
    };
    let files: Vec<Value> = kinds
        .iter()
        .map(|k| json!({"name": format!("{k}.{extension}"), "content": format!("# {k}\n")}))
        .collect();
    let warnings: Vec<String> = kinds
        .iter()
        .filter(|k| k.as_str() == "grafana_contact_point")
        .map(|k| format!("{k}: permission denied"))
        .collect();
    if warnings.is_empty() {
        Json(json!({ "files": files })).into_response()
    } else {
        Json(json!({ "files": files, "warnings": warnings })).into_response()
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/resource-types", get(resource_types))
        .route("/generate", post(generate))
}

/// Serves the fake backend on its own runtime thread and returns the base URL.
pub fn spawn_backend() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.set_nonblocking(true).expect("nonblocking listener");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
            axum::serve(listener, router()).await.expect("serve fake backend");
        });
    });
    format!("http://{addr}")
}

/// Base URL nothing listens on.
pub fn dead_backend() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn write_config(dir: &Path, backend_url: &str, cloud_enabled: bool) -> std::path::PathBuf {
    let path = dir.join("exporter.yaml");
    let yaml = format!(
        "backend_url: {backend_url}\ncloud_enabled: {cloud_enabled}\ntimeout_secs: 5\n"
    );
    std::fs::write(&path, yaml).expect("write config");
    path
}
