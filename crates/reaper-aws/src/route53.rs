//! AWS Route 53 zone directory
//!
//! Talks to the Route 53 REST/XML API. Requests are signed with SigV4
//! against `us-east-1`, which is where the global Route 53 endpoint lives.
//!
//! Required IAM Policy:
//! - route53:ListHostedZones
//! - route53:ListResourceRecordSets
//! - route53:ChangeResourceRecordSets

use async_trait::async_trait;
use reaper_core::{
    ChangeBatch, ChangeInfo, HostedZone, RecordSet, RecordSetQuery, RecordType, ReaperError,
    ZoneDirectory, DEFAULT_RECORD_TTL,
};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use url::Url;

use crate::credentials::AwsCredentials;
use crate::errors::AwsError;
use crate::http;
use crate::signing::{self, SigningInput};

pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";
const API_VERSION_PATH: &str = "/2013-04-01";
const XML_NAMESPACE: &str = "https://route53.amazonaws.com/doc/2013-04-01/";
const SIGNING_REGION: &str = "us-east-1";
const SERVICE: &str = "route53";
const SERVICE_LABEL: &str = "Route53";

/// Route 53 client implementing [`ZoneDirectory`]
pub struct Route53Client {
    client: Client,
    credentials: AwsCredentials,
    endpoint: Url,
}

/// Route 53 API response structures
#[derive(Debug, Deserialize)]
struct ListHostedZonesResponse {
    #[serde(rename = "HostedZones")]
    hosted_zones: Option<HostedZonesWrapper>,
    #[serde(rename = "IsTruncated", default)]
    is_truncated: bool,
    #[serde(rename = "NextMarker")]
    next_marker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostedZonesWrapper {
    #[serde(rename = "HostedZone", default)]
    hosted_zone: Vec<HostedZoneXml>,
}

#[derive(Debug, Deserialize)]
struct HostedZoneXml {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Config")]
    config: Option<HostedZoneConfigXml>,
}

#[derive(Debug, Deserialize)]
struct HostedZoneConfigXml {
    #[serde(rename = "PrivateZone", default)]
    private_zone: bool,
}

#[derive(Debug, Deserialize)]
struct ListResourceRecordSetsResponse {
    #[serde(rename = "ResourceRecordSets")]
    resource_record_sets: Option<ResourceRecordSetsWrapper>,
}

#[derive(Debug, Deserialize)]
struct ResourceRecordSetsWrapper {
    #[serde(rename = "ResourceRecordSet", default)]
    resource_record_set: Vec<ResourceRecordSetXml>,
}

#[derive(Debug, Deserialize)]
struct ResourceRecordSetXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "TTL")]
    ttl: Option<u32>,
    #[serde(rename = "ResourceRecords")]
    resource_records: Option<ResourceRecordsWrapper>,
}

#[derive(Debug, Deserialize)]
struct ResourceRecordsWrapper {
    #[serde(rename = "ResourceRecord", default)]
    resource_record: Vec<ResourceRecordXml>,
}

#[derive(Debug, Deserialize)]
struct ResourceRecordXml {
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ChangeResourceRecordSetsResponse {
    #[serde(rename = "ChangeInfo")]
    change_info: ChangeInfoXml,
}

#[derive(Debug, Deserialize)]
struct ChangeInfoXml {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "SubmittedAt")]
    submitted_at: Option<String>,
}

/// Change batch request for Route 53
#[derive(Debug, Serialize)]
#[serde(rename = "ChangeResourceRecordSetsRequest")]
struct ChangeResourceRecordSetsRequest {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "ChangeBatch")]
    change_batch: ChangeBatchXml,
}

#[derive(Debug, Serialize)]
struct ChangeBatchXml {
    #[serde(rename = "Comment")]
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(rename = "Changes")]
    changes: ChangesXml,
}

#[derive(Debug, Serialize)]
struct ChangesXml {
    #[serde(rename = "Change")]
    change: Vec<ChangeXml>,
}

#[derive(Debug, Serialize)]
struct ChangeXml {
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "ResourceRecordSet")]
    resource_record_set: ChangeResourceRecordSet,
}

#[derive(Debug, Serialize)]
struct ChangeResourceRecordSet {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "TTL")]
    ttl: u32,
    #[serde(rename = "ResourceRecords")]
    resource_records: ChangeResourceRecords,
}

#[derive(Debug, Serialize)]
struct ChangeResourceRecords {
    #[serde(rename = "ResourceRecord")]
    resource_record: Vec<ChangeResourceRecord>,
}

#[derive(Debug, Serialize)]
struct ChangeResourceRecord {
    #[serde(rename = "Value")]
    value: String,
}

impl From<ResourceRecordSetXml> for RecordSet {
    fn from(xml: ResourceRecordSetXml) -> Self {
        RecordSet {
            name: xml.name,
            record_type: RecordType::parse(&xml.record_type),
            ttl: xml.ttl,
            values: xml
                .resource_records
                .map(|r| r.resource_record.into_iter().map(|rr| rr.value).collect())
                .unwrap_or_default(),
        }
    }
}

fn change_request_body(batch: &ChangeBatch) -> Result<String, AwsError> {
    let request = ChangeResourceRecordSetsRequest {
        xmlns: XML_NAMESPACE,
        change_batch: ChangeBatchXml {
            comment: batch.comment.clone(),
            changes: ChangesXml {
                change: batch
                    .changes
                    .iter()
                    .map(|change| ChangeXml {
                        action: change.action.to_string(),
                        resource_record_set: ChangeResourceRecordSet {
                            name: change.record_set.name.clone(),
                            record_type: change.record_set.record_type.to_string(),
                            ttl: change.record_set.ttl.unwrap_or(DEFAULT_RECORD_TTL),
                            resource_records: ChangeResourceRecords {
                                resource_record: change
                                    .record_set
                                    .values
                                    .iter()
                                    .map(|value| ChangeResourceRecord {
                                        value: value.clone(),
                                    })
                                    .collect(),
                            },
                        },
                    })
                    .collect(),
            },
        },
    };

    let xml = quick_xml::se::to_string(&request)
        .map_err(|e| AwsError::Serialization(e.to_string()))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{}", xml))
}

impl Route53Client {
    /// Create a client for the public Route 53 endpoint
    pub fn new(credentials: AwsCredentials) -> Result<Self, AwsError> {
        Self::with_endpoint(credentials, ROUTE53_ENDPOINT)
    }

    /// Create a client against a custom endpoint (local stacks, tests)
    pub fn with_endpoint(credentials: AwsCredentials, endpoint: &str) -> Result<Self, AwsError> {
        Ok(Self {
            client: http::build_client()?,
            credentials,
            endpoint: http::parse_endpoint(endpoint)?,
        })
    }

    /// Make a signed request to Route 53 API
    async fn api_request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<String, AwsError> {
        let query_string = signing::canonical_query(query);
        let url = http::join_url(&self.endpoint, path, &query_string);
        let payload = body.unwrap_or("");
        let host = http::host_header(&self.endpoint);

        let signature = signing::sign_request(
            &SigningInput {
                method: method.as_str(),
                uri: path,
                query_string: &query_string,
                headers: &[("host", host.as_str())],
                payload,
                region: SIGNING_REGION,
                service: SERVICE,
            },
            &self.credentials,
        );

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Host", &host)
            .header("X-Amz-Date", &signature.amz_date)
            .header("Authorization", &signature.authorization)
            .header("Content-Type", "application/xml");

        if let Some(token) = &signature.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        debug!("Route53 API request: {} {}", method, url);

        let response = request.send().await?;
        let status = response.status();
        let response_body = response.text().await?;
        trace!("Route53 API response ({}): {}", status, response_body);

        if !status.is_success() {
            return Err(AwsError::from_response(
                SERVICE_LABEL,
                status.as_u16(),
                &response_body,
            ));
        }

        Ok(response_body)
    }

    async fn list_hosted_zones_page(
        &self,
        marker: Option<&str>,
    ) -> Result<ListHostedZonesResponse, AwsError> {
        let path = format!("{}/hostedzone", API_VERSION_PATH);
        let query: Vec<(&str, &str)> = marker.map(|m| ("marker", m)).into_iter().collect();

        let body = self.api_request(Method::GET, &path, &query, None).await?;
        quick_xml::de::from_str(&body).map_err(|e| AwsError::parse(SERVICE_LABEL, e))
    }
}

#[async_trait]
impl ZoneDirectory for Route53Client {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ReaperError> {
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self.list_hosted_zones_page(marker.as_deref()).await?;

            zones.extend(
                page.hosted_zones
                    .map(|w| w.hosted_zone)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|z| HostedZone {
                        id: z.id,
                        name: z.name,
                        private_zone: z.config.map(|c| c.private_zone).unwrap_or(false),
                    }),
            );

            match (page.is_truncated, page.next_marker) {
                (true, Some(next)) if marker.as_deref() != Some(next.as_str()) => {
                    marker = Some(next);
                }
                (true, _) => {
                    warn!("Route53 reported more hosted zones without a usable NextMarker");
                    break;
                }
                _ => break,
            }
        }

        debug!("Listed {} hosted zones", zones.len());
        Ok(zones)
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, ReaperError> {
        let path = format!("{}/hostedzone/{}/rrset", API_VERSION_PATH, zone_id);
        let record_type = query.start_type.to_string();
        let max_items = query.max_items.to_string();
        let params = [
            ("name", query.start_name.as_str()),
            ("type", record_type.as_str()),
            ("maxitems", max_items.as_str()),
        ];

        let body = self.api_request(Method::GET, &path, &params, None).await?;
        let parsed: ListResourceRecordSetsResponse =
            quick_xml::de::from_str(&body).map_err(|e| AwsError::parse(SERVICE_LABEL, e))?;

        Ok(parsed
            .resource_record_sets
            .map(|w| w.resource_record_set)
            .unwrap_or_default()
            .into_iter()
            .map(RecordSet::from)
            .collect())
    }

    async fn change_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, ReaperError> {
        let path = format!("{}/hostedzone/{}/rrset/", API_VERSION_PATH, zone_id);
        let body = change_request_body(batch)?;

        let response = match self.api_request(Method::POST, &path, &[], Some(&body)).await {
            Ok(response) => response,
            Err(AwsError::Api {
                status: 400,
                code,
                message,
                ..
            }) => {
                let fqdn = batch
                    .changes
                    .first()
                    .map(|c| c.record_set.name.clone())
                    .unwrap_or_default();
                return Err(ReaperError::DeleteRejected {
                    fqdn,
                    reason: format!("{}: {}", code, message),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let parsed: ChangeResourceRecordSetsResponse =
            quick_xml::de::from_str(&response).map_err(|e| AwsError::parse(SERVICE_LABEL, e))?;

        Ok(ChangeInfo {
            id: parsed.change_info.id,
            status: parsed.change_info.status,
            submitted_at: parsed.change_info.submitted_at,
        })
    }
}
