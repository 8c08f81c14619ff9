//! EC2 instance inventory
//!
//! Uses the EC2 Query API (`DescribeInstances`) with a tag filter.
//!
//! Required IAM Policy:
//! - ec2:DescribeInstances

use async_trait::async_trait;
use reaper_core::{InstanceInventory, InstanceState, InstanceSummary, ReaperError};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::credentials::AwsCredentials;
use crate::errors::AwsError;
use crate::http;
use crate::signing::{self, SigningInput};

const API_VERSION: &str = "2016-11-15";
const SERVICE: &str = "ec2";
const SERVICE_LABEL: &str = "EC2";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// EC2 client implementing [`InstanceInventory`]
pub struct Ec2Client {
    client: Client,
    credentials: AwsCredentials,
    region: String,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct DescribeInstancesResponse {
    #[serde(rename = "reservationSet")]
    reservation_set: Option<ReservationSet>,
    #[serde(rename = "nextToken")]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReservationSet {
    #[serde(rename = "item", default)]
    items: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
struct Reservation {
    #[serde(rename = "instancesSet")]
    instances_set: Option<InstancesSet>,
}

#[derive(Debug, Deserialize)]
struct InstancesSet {
    #[serde(rename = "item", default)]
    items: Vec<InstanceXml>,
}

#[derive(Debug, Deserialize)]
struct InstanceXml {
    #[serde(rename = "instanceId")]
    instance_id: String,
    #[serde(rename = "instanceState")]
    instance_state: Option<InstanceStateXml>,
}

#[derive(Debug, Deserialize)]
struct InstanceStateXml {
    #[serde(rename = "name", default)]
    name: String,
}

impl DescribeInstancesResponse {
    fn into_summaries(self) -> (Vec<InstanceSummary>, Option<String>) {
        let summaries = self
            .reservation_set
            .map(|set| set.items)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|reservation| {
                reservation
                    .instances_set
                    .map(|set| set.items)
                    .unwrap_or_default()
            })
            .map(|instance| InstanceSummary {
                instance_id: instance.instance_id,
                state: InstanceState::parse(
                    &instance.instance_state.map(|s| s.name).unwrap_or_default(),
                ),
            })
            .collect();

        let next_token = self.next_token.filter(|token| !token.trim().is_empty());
        (summaries, next_token)
    }
}

impl Ec2Client {
    /// Create a client for the regional EC2 endpoint
    pub fn new(credentials: AwsCredentials, region: &str) -> Result<Self, AwsError> {
        let endpoint = format!("https://ec2.{}.amazonaws.com", region);
        Self::with_endpoint(credentials, region, &endpoint)
    }

    pub fn with_endpoint(
        credentials: AwsCredentials,
        region: &str,
        endpoint: &str,
    ) -> Result<Self, AwsError> {
        Ok(Self {
            client: http::build_client()?,
            credentials,
            region: region.to_string(),
            endpoint: http::parse_endpoint(endpoint)?,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// POST a signed Query API action and return the response body
    async fn api_request(&self, params: &[(&str, &str)]) -> Result<String, AwsError> {
        let body = signing::canonical_query(params);
        let url = http::join_url(&self.endpoint, "/", "");
        let host = http::host_header(&self.endpoint);

        let signature = signing::sign_request(
            &SigningInput {
                method: "POST",
                uri: "/",
                query_string: "",
                headers: &[("content-type", FORM_CONTENT_TYPE), ("host", host.as_str())],
                payload: &body,
                region: &self.region,
                service: SERVICE,
            },
            &self.credentials,
        );

        let mut request = self
            .client
            .post(&url)
            .header("Host", &host)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .header("X-Amz-Date", &signature.amz_date)
            .header("Authorization", &signature.authorization)
            .body(body);

        if let Some(token) = &signature.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        debug!("EC2 API request: POST {} ({})", url, self.region);

        let response = request.send().await?;
        let status = response.status();
        let response_body = response.text().await?;
        trace!("EC2 API response ({}): {}", status, response_body);

        if !status.is_success() {
            return Err(AwsError::from_response(
                SERVICE_LABEL,
                status.as_u16(),
                &response_body,
            ));
        }

        Ok(response_body)
    }

    async fn describe_instances_page(
        &self,
        tag_key: &str,
        tag_value: &str,
        next_token: Option<&str>,
    ) -> Result<DescribeInstancesResponse, AwsError> {
        let filter_name = format!("tag:{}", tag_key);
        let mut params = vec![
            ("Action", "DescribeInstances"),
            ("Version", API_VERSION),
            ("Filter.1.Name", filter_name.as_str()),
            ("Filter.1.Value.1", tag_value),
        ];
        if let Some(token) = next_token {
            params.push(("NextToken", token));
        }

        let body = self.api_request(&params).await?;
        quick_xml::de::from_str(&body).map_err(|e| AwsError::parse(SERVICE_LABEL, e))
    }
}

#[async_trait]
impl InstanceInventory for Ec2Client {
    async fn find_instances_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<InstanceSummary>, ReaperError> {
        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .describe_instances_page(key, value, next_token.as_deref())
                .await?;
            let (summaries, token) = page.into_summaries();
            instances.extend(summaries);

            match token {
                Some(token) if next_token.as_deref() != Some(token.as_str()) => {
                    next_token = Some(token);
                }
                _ => break,
            }
        }

        debug!(
            "Found {} instances tagged {}={}",
            instances.len(),
            key,
            value
        );
        Ok(instances)
    }
}
