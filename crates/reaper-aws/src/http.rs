//! Shared HTTP plumbing for the signed AWS clients

use reqwest::Client;
use url::Url;

use crate::errors::AwsError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub(crate) fn build_client() -> Result<Client, AwsError> {
    Ok(Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Parse an endpoint override such as `http://127.0.0.1:9000`
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, AwsError> {
    let url = Url::parse(endpoint)
        .map_err(|e| AwsError::Endpoint(format!("{}: {}", endpoint, e)))?;
    if url.host_str().is_none() {
        return Err(AwsError::Endpoint(format!("{}: missing host", endpoint)));
    }
    Ok(url)
}

/// Value of the `host` header as the server will see it
pub(crate) fn host_header(endpoint: &Url) -> String {
    let host = endpoint.host_str().unwrap_or_default();
    match endpoint.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

pub(crate) fn join_url(endpoint: &Url, path: &str, query: &str) -> String {
    let base = endpoint.as_str().trim_end_matches('/');
    if query.is_empty() {
        format!("{}{}", base, path)
    } else {
        format!("{}{}?{}", base, path, query)
    }
}
