use actix_web::{web, HttpResponse, Responder};
use log::warn;
use serde::Serialize;
use std::collections::HashMap;
use std::env;

use crate::config::Config;
use crate::db::Store;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

/*
    GET /health
*/
pub async fn health_check(store: web::Data<dyn Store>, config: web::Data<Config>) -> impl Responder {
    let checks = [
        ("mongodb", check_mongodb(&store).await),
        (
            "generation",
            check_key("OPENAI_API_KEY", config.generation.api_key.as_deref()),
        ),
        (
            "places",
            check_key("GOOGLE_MAPS_API_KEY", config.maps_api_key.as_deref()),
        ),
    ];

    // Any failing dependency degrades the whole service.
    let degraded = checks.iter().any(|(_, check)| check.status != "ok");
    let health = HealthStatus {
        status: if degraded { "degraded" } else { "ok" }.to_string(),
        services: checks
            .into_iter()
            .map(|(name, check)| (name.to_string(), check))
            .collect(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(store: &web::Data<dyn Store>) -> ServiceStatus {
    match store.ping().await {
        Ok(()) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Connected successfully to MongoDB".to_string()),
        },
        Err(e) => {
            warn!("MongoDB health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("Failed to connect: {}", e)),
            }
        }
    }
}

fn check_key(name: &str, key: Option<&str>) -> ServiceStatus {
    match key {
        Some(key) => {
            let chars: Vec<char> = key.chars().collect();
            let masked_key = if chars.len() > 8 {
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}***{}", head, tail)
            } else {
                "***".to_string()
            };
            ServiceStatus {
                status: "ok".to_string(),
                details: Some(format!("{} configured ({})", name, masked_key)),
            }
        }
        None => ServiceStatus {
            status: "error".to_string(),
            details: Some(format!("{} not configured", name)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_masked() {
        let check = check_key("OPENAI_API_KEY", Some("sk-abcdefghijkl"));
        assert_eq!(check.status, "ok");
        assert_eq!(
            check.details.as_deref(),
            Some("OPENAI_API_KEY configured (sk-a***ijkl)")
        );
        assert_eq!(
            check_key("X", Some("short")).details.as_deref(),
            Some("X configured (***)")
        );
        assert_eq!(check_key("X", None).status, "error");
    }
}
