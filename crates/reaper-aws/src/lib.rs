//! AWS backends for the DNS reaper
//!
//! [`Route53Client`] implements [`reaper_core::ZoneDirectory`] and
//! [`Ec2Client`] implements [`reaper_core::InstanceInventory`]. Both sign
//! requests with AWS Signature V4 using static credentials.

pub mod credentials;
pub mod ec2;
pub mod errors;
mod http;
pub mod route53;
pub mod signing;

pub use credentials::{resolve_region, AwsCredentials, DEFAULT_REGION};
pub use ec2::Ec2Client;
pub use errors::AwsError;
pub use route53::{Route53Client, ROUTE53_ENDPOINT};
