//! Target identity derived from the command line hostname

use serde::Serialize;

use crate::errors::ReaperError;

/// The host whose address record should be reclaimed.
///
/// Computed once per run. `fqdn` always ends with `.<zone_suffix>.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetIdentity {
    zone_suffix: String,
    short_hostname: String,
    fqdn: String,
}

impl TargetIdentity {
    /// Derive the identity from a short or fully-qualified hostname.
    ///
    /// `web01`, `web01.internal.example.com` and
    /// `web01.internal.example.com.` all yield the short name `web01`.
    pub fn new(hostname: &str, zone_suffix: &str) -> Result<Self, ReaperError> {
        let zone_suffix = zone_suffix.trim().trim_end_matches('.').to_lowercase();
        if zone_suffix.is_empty() {
            return Err(ReaperError::Validation(
                "hosted zone suffix must not be empty".to_string(),
            ));
        }

        let mut short = hostname.trim().trim_end_matches('.').to_string();
        if short.eq_ignore_ascii_case(&zone_suffix) {
            return Err(ReaperError::Validation(format!(
                "hostname {} is the zone apex, not a host",
                hostname.trim()
            )));
        }

        let dotted_suffix = format!(".{}", zone_suffix);
        while let Some(stripped) = strip_suffix_ignore_case(&short, &dotted_suffix) {
            short = stripped.to_string();
        }

        if short.is_empty() || short.starts_with('.') {
            return Err(ReaperError::Validation(format!(
                "cannot derive a host name from '{}'",
                hostname.trim()
            )));
        }
        if short.chars().any(char::is_whitespace) {
            return Err(ReaperError::Validation(format!(
                "hostname '{}' contains whitespace",
                short
            )));
        }

        let fqdn = format!("{}.{}.", short.to_lowercase(), zone_suffix);

        Ok(Self {
            zone_suffix,
            short_hostname: short,
            fqdn,
        })
    }

    pub fn zone_suffix(&self) -> &str {
        &self.zone_suffix
    }

    /// Name as used for the instance `Name` tag
    pub fn short_hostname(&self) -> &str {
        &self.short_hostname
    }

    /// Record name in the provider's canonical form, trailing dot included
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    if !value.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = value.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
