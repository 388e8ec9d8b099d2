//! Dom.ru API client
//!
//! Talks to two public endpoints: the unauthenticated profile API
//! (contract-asterisked lookups) and the mobile API (branch list plus
//! full agreement contacts for phone numbers). Requests present the
//! same browser/mobile-app identities the official clients send.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::HttpSettings;
use crate::error::{Error, Result};
use crate::types::{is_phone, ContactRecord, ContactReport, ContactType, Target};

const GEOGRAPHY_URL: &str = "https://api-mobile.domru.ru/v1/geography/all-cities?active=1";
const PROFILE_URL: &str = "https://api-profile.dom.ru/v1/unauth/contract-asterisked";
const MOBILE_CONTACT_URL: &str = "https://api-mobile.domru.ru/v1/agreement/list-contact";

const MOBILE_USER_AGENT: &str = "com.ertelecom.agent/3.31.3 (Android 28)";
const APP_VERSION: &str = "3.31.3";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.4692.71 Safari/537.36";

/// Branch codes that alias another branch in the same list.
const REDUNDANT_DOMAINS: &[&str] = &[
    "sbor",   // Sosnovy Bor, alias of St. Petersburg (interzet)
    "vlz",    // Volzhsky, alias of Volgograd
    "ber",    // Berezniki, alias of Perm
    "kungur", // Kungur, alias of Perm
    "chus",   // Chusovoy, alias of Perm
    "slk",    // Solikamsk, alias of Perm
];

// ─────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CityEntry {
    domain: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ProfileResponse {
    #[serde(default)]
    contacts: Vec<ProfileContact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileContact {
    contact_id: Option<serde_json::Value>,
    agreement_id: Option<serde_json::Value>,
    contact_type: Option<i64>,
    /// Masked contact value
    row: Option<String>,
    address: Option<String>,
    /// Opaque token naming a linked contact; feeding it back into the
    /// profile endpoint expands the result set
    row_enc: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct MobileContactResponse {
    #[serde(default)]
    agreements: Vec<MobileAgreement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MobileAgreement {
    value: Option<String>,
    send_type: Option<i64>,
    contact_id: Option<serde_json::Value>,
    agreement_id: Option<serde_json::Value>,
}

/// The API is inconsistent about id fields; they arrive as numbers or
/// strings depending on the branch.
fn scalar_string(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────
// DomruClient
// ─────────────────────────────────────────────────────────────────

/// HTTP client for the Dom.ru profile and mobile APIs.
#[derive(Clone)]
pub struct DomruClient {
    http: reqwest::Client,
}

impl DomruClient {
    /// Build a client from HTTP settings, optionally routed via proxy.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        // The API endpoints serve certificates that fail strict validation
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .timeout(Duration::from_millis(settings.request_timeout_ms));

        if let Some(ref proxy) = settings.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| Error::ProxyInvalid {
                proxy: proxy.clone(),
                message: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder.build()?;
        Ok(Self { http })
    }

    /// Fetch the list of active regional branch codes.
    ///
    /// Branches that alias another branch are dropped; the rest come
    /// back sorted and deduplicated.
    pub async fn fetch_domains(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(GEOGRAPHY_URL)
            .headers(mobile_headers(None))
            .send()
            .await
            .map_err(|e| classify_transport_error(GEOGRAPHY_URL, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api_status(GEOGRAPHY_URL, status.as_u16()));
        }

        let cities: Vec<CityEntry> = response
            .json()
            .await
            .map_err(|e| Error::api_malformed(GEOGRAPHY_URL, e.to_string()))?;

        let redundant: HashSet<&str> = REDUNDANT_DOMAINS.iter().copied().collect();
        let mut domains: Vec<String> = cities
            .into_iter()
            .filter_map(|c| c.domain)
            .filter(|d| !redundant.contains(d.as_str()))
            .collect();
        domains.sort_unstable();
        domains.dedup();

        debug!(count = domains.len(), "Fetched branch list");
        Ok(domains)
    }

    /// Look up one target. Returns `None` when the branch holds no
    /// records for the identifier.
    ///
    /// The profile endpoint may hand back `rowEnc` tokens naming linked
    /// contacts; those are fed back into the endpoint until the worklist
    /// is exhausted. A seen-set stops token cycles.
    pub async fn lookup(&self, target: &Target) -> Result<Option<ContactReport>> {
        let mut records = Vec::new();
        let mut worklist = vec![target.value.clone()];
        let mut seen: HashSet<String> = worklist.iter().cloned().collect();

        while let Some(contact) = worklist.pop() {
            let (found, follow_ups) = self.profile_contacts(&contact, &target.domain).await?;
            let has_records = !found.is_empty();
            records.extend(found);

            // The mobile endpoint reveals full agreement ids, but only
            // answers for phone numbers that the profile API confirmed
            if has_records && is_phone(&contact) {
                match self.mobile_agreements(&contact, &target.domain).await {
                    Ok(extra) => records.extend(extra),
                    Err(e) => {
                        warn!(target = %target, error = %e, "Mobile agreement lookup failed")
                    }
                }
            }

            for token in follow_ups {
                if seen.insert(token.clone()) {
                    worklist.push(token);
                }
            }
        }

        if records.is_empty() {
            return Ok(None);
        }

        Ok(Some(ContactReport {
            target: target.clone(),
            records,
        }))
    }

    /// Query the profile endpoint for one contact value.
    ///
    /// Returns the records found plus any `rowEnc` follow-up tokens.
    async fn profile_contacts(
        &self,
        contact: &str,
        domain: &str,
    ) -> Result<(Vec<ContactRecord>, Vec<String>)> {
        let url = format!("{}?contact={}&isActive=1", PROFILE_URL, contact);

        let response = self
            .http
            .get(&url)
            .headers(profile_headers(domain))
            .send()
            .await
            .map_err(|e| classify_transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api_status(&url, status.as_u16()));
        }

        let body: ProfileResponse = response
            .json()
            .await
            .map_err(|e| Error::api_malformed(&url, e.to_string()))?;

        let mut records = Vec::new();
        let mut follow_ups = Vec::new();

        for entry in body.contacts {
            let contact_type = entry
                .contact_type
                .map(ContactType::from_code)
                .unwrap_or(ContactType::Unknown);

            records.push(ContactRecord {
                value: entry.row.unwrap_or_default(),
                contact_type,
                contact_id: scalar_string(entry.contact_id),
                agreement_id: scalar_string(entry.agreement_id),
                domain: domain.to_string(),
                address: entry.address,
            });

            if let Some(token) = entry.row_enc {
                if !token.is_empty() {
                    follow_ups.push(token);
                }
            }
        }

        debug!(
            contact,
            domain,
            records = records.len(),
            follow_ups = follow_ups.len(),
            "Profile lookup complete"
        );

        Ok((records, follow_ups))
    }

    /// Query the mobile endpoint for the full agreement contacts of a
    /// phone number.
    async fn mobile_agreements(&self, contact: &str, domain: &str) -> Result<Vec<ContactRecord>> {
        let response = self
            .http
            .post(MOBILE_CONTACT_URL)
            .headers(mobile_headers(Some(domain)))
            .form(&[("username", contact)])
            .send()
            .await
            .map_err(|e| classify_transport_error(MOBILE_CONTACT_URL, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api_status(MOBILE_CONTACT_URL, status.as_u16()));
        }

        let body: MobileContactResponse = response
            .json()
            .await
            .map_err(|e| Error::api_malformed(MOBILE_CONTACT_URL, e.to_string()))?;

        let records = body
            .agreements
            .into_iter()
            .map(|a| ContactRecord {
                value: a.value.unwrap_or_default(),
                contact_type: a
                    .send_type
                    .map(ContactType::from_code)
                    .unwrap_or(ContactType::Unknown),
                contact_id: scalar_string(a.contact_id),
                agreement_id: scalar_string(a.agreement_id),
                domain: domain.to_string(),
                address: None,
            })
            .collect();

        Ok(records)
    }
}

// ─────────────────────────────────────────────────────────────────
// Request headers
// ─────────────────────────────────────────────────────────────────

/// Headers presented to the mobile API (official Android client).
fn mobile_headers(domain: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(MOBILE_USER_AGENT),
    );
    headers.insert(
        HeaderName::from_static("app-version"),
        HeaderValue::from_static(APP_VERSION),
    );
    headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

    if let Some(domain) = domain {
        if let Ok(value) = HeaderValue::from_str(domain) {
            headers.insert(HeaderName::from_static("domain"), value);
        }
    }

    headers
}

/// Headers presented to the profile API (desktop browser on the
/// branch's own site).
fn profile_headers(domain: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(BROWSER_USER_AGENT),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en,ru-RU;q=0.9,ru;q=0.8,en-US;q=0.7"),
    );
    headers.insert(
        reqwest::header::AUTHORIZATION,
        HeaderValue::from_static("Bearer unauth"),
    );
    headers.insert(
        reqwest::header::PRAGMA,
        HeaderValue::from_static("no-cache"),
    );
    headers.insert(
        reqwest::header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );

    if let Ok(value) = HeaderValue::from_str(domain) {
        headers.insert(HeaderName::from_static("domain"), value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("https://{}.dom.ru", domain)) {
        headers.insert(reqwest::header::ORIGIN, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("https://{}.dom.ru/", domain)) {
        headers.insert(reqwest::header::REFERER, value);
    }

    headers
}

fn classify_transport_error(url: &str, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::NetworkTimeout {
            url: url.to_string(),
        }
    } else {
        Error::network_failed(url, error.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
