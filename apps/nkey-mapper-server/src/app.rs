//! Wires the configured backends into the mapper router.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use nkey_mapper::{MappingTable, NKeyMapperLocalClient, Service};
use nkey_mapper_sdk::NKeyMapperClient;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Upper bound for request bodies; tickets and signed headers are small.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the mapper service. Any invalid backend section aborts startup.
pub fn build_service(cfg: &ServerConfig) -> anyhow::Result<Service> {
    let mut service = Service::new();

    if let Some(kerberos) = &cfg.kerberos {
        let verifier = kerberos_verifier_plugin::Service::from_config(&kerberos.verifier)
            .context("invalid kerberos verifier configuration")?;
        let table = MappingTable::from_config(&kerberos.mapping())
            .context("invalid kerberos user mappings")?;
        service = service.with_backend(Arc::new(verifier), table);
    } else {
        info!("kerberos backend not configured");
    }

    if let Some(aws_iam) = &cfg.aws_iam {
        let verifier = aws_iam_verifier_plugin::Service::from_config(&aws_iam.verifier)
            .context("invalid aws_iam verifier configuration")?;
        let table = MappingTable::from_config(&aws_iam.mapping())
            .context("invalid aws_iam user mappings")?;
        service = service.with_backend(Arc::new(verifier), table);
    } else {
        info!("aws_iam backend not configured");
    }

    if cfg.user_count() == 0 {
        warn!("NO USERS CAN BE AUTHENTICATED: no user mappings are configured");
    }

    Ok(service)
}

pub fn build_router(cfg: &ServerConfig) -> anyhow::Result<Router> {
    let service = Arc::new(build_service(cfg)?);
    let client: Arc<dyn NKeyMapperClient> = Arc::new(NKeyMapperLocalClient::new(service));

    Ok(nkey_mapper::api::rest::router(client)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http()))
}
