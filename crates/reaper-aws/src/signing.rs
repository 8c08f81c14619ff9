//! AWS Signature Version 4 request signing

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::credentials::AwsCredentials;

type HmacSha256 = Hmac<Sha256>;

/// The parts of a request covered by the signature
pub struct SigningInput<'a> {
    pub method: &'a str,
    /// Canonical (already encoded) path, e.g. `/2013-04-01/hostedzone`
    pub uri: &'a str,
    /// Canonical query string as built by [`canonical_query`]
    pub query_string: &'a str,
    /// Headers to sign besides `x-amz-date`; must include `host`
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

/// Headers to attach to the request
#[derive(Debug, Clone)]
pub struct RequestSignature {
    pub authorization: String,
    pub amz_date: String,
    pub payload_hash: String,
    pub security_token: Option<String>,
}

pub fn sign_request(input: &SigningInput<'_>, credentials: &AwsCredentials) -> RequestSignature {
    sign_request_at(input, credentials, Utc::now())
}

pub fn sign_request_at(
    input: &SigningInput<'_>,
    credentials: &AwsCredentials,
    now: DateTime<Utc>,
) -> RequestSignature {
    let date_stamp = now.format("%Y%m%d").to_string();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

    // Create canonical request
    let payload_hash = hex::encode(Sha256::digest(input.payload.as_bytes()));

    let mut headers: Vec<(String, String)> = input
        .headers
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
        .collect();
    headers.push(("x-amz-date".to_string(), amz_date.clone()));
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token".to_string(), token.clone()));
    }
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let signed_headers_str = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let mut canonical_headers = String::new();
    for (key, value) in &headers {
        canonical_headers.push_str(&format!("{}:{}\n", key, value));
    }

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        input.method,
        input.uri,
        input.query_string,
        canonical_headers,
        signed_headers_str,
        payload_hash
    );

    let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));

    // Create string to sign
    let credential_scope = format!(
        "{}/{}/{}/aws4_request",
        date_stamp, input.region, input.service
    );
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date, credential_scope, canonical_request_hash
    );

    // Calculate signature
    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        &date_stamp,
    );
    let k_region = hmac_sha256(&k_date, input.region);
    let k_service = hmac_sha256(&k_region, input.service);
    let k_signing = hmac_sha256(&k_service, "aws4_request");
    let signature = hex::encode(hmac_sha256(&k_signing, &string_to_sign));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        credentials.access_key_id, credential_scope, signed_headers_str, signature
    );

    RequestSignature {
        authorization,
        amz_date,
        payload_hash,
        security_token: credentials.session_token.clone(),
    }
}

/// Build a query string (or form body) with keys sorted and both keys and
/// values percent-encoded as SigV4 expects.
pub fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
