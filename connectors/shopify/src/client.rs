//! Admin API client construction.

use mfa_graphql::{GraphqlClient, GraphqlClientBuilder};
use reqwest::header::{HeaderName, HeaderValue};

use crate::config::ShopifyConfig;
use crate::error::{AuditError, AuditResult};

/// Build a GraphQL client for the Admin API.
///
/// Fails with a config error, before any request is made, when the shop or
/// token is missing.
pub fn admin_client(config: &ShopifyConfig) -> AuditResult<GraphqlClient> {
    let (_, token) = config.credentials()?;
    let endpoint = config.endpoint()?;
    let token = HeaderValue::from_str(token)
        .map_err(|_| AuditError::config("SHOPIFY_ADMIN_TOKEN contains invalid characters"))?;

    let client = GraphqlClientBuilder::new(endpoint)
        .with_service_name("shopify")
        .with_header(HeaderName::from_static("x-shopify-access-token"), token)
        .with_timeout(config.timeout)
        .build()?;
    Ok(client)
}
