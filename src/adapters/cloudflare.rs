//! Cloudflare Zero Trust Gateway client: domain lists and DNS block rules.

use crate::domain::model::{Domain, RemoteList, RemotePolicy};
use crate::domain::ports::GatewayApi;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static LIST_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([0-9A-Za-z-]+)").expect("static pattern compiles"));

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListResource {
    id: String,
    name: String,
    #[serde(default)]
    count: usize,
}

#[derive(Debug, Deserialize)]
struct RuleResource {
    id: String,
    name: String,
    #[serde(default)]
    traffic: String,
}

#[derive(Debug, Serialize)]
struct ListItem<'a> {
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateListBody<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    items: Vec<ListItem<'a>>,
}

#[derive(Debug, Serialize)]
struct RuleSettings {
    block_page_enabled: bool,
}

#[derive(Debug, Serialize)]
struct RuleBody<'a> {
    name: &'a str,
    description: &'a str,
    action: &'a str,
    enabled: bool,
    filters: [&'a str; 1],
    traffic: String,
    rule_settings: RuleSettings,
}

impl<'a> RuleBody<'a> {
    fn block_dns(name: &'a str, list_ids: &[String]) -> Self {
        Self {
            name,
            description: "Block ads and trackers. Managed by adblock-gateway-sync.",
            action: "block",
            enabled: true,
            filters: ["dns"],
            traffic: traffic_expression(list_ids),
            rule_settings: RuleSettings {
                block_page_enabled: false,
            },
        }
    }
}

/// `any(dns.domains[*] in $<id>)` for each list, joined with `or`.
/// List references drop the dashes of the list UUID.
pub fn traffic_expression(list_ids: &[String]) -> String {
    list_ids
        .iter()
        .map(|id| format!("any(dns.domains[*] in ${})", id.replace('-', "")))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// List ids referenced by a traffic expression, in order of appearance.
/// Dashless UUIDs get their 8-4-4-4-12 dashes back so they match `RemoteList::id`.
pub fn referenced_list_ids(traffic: &str) -> Vec<String> {
    LIST_REFERENCE
        .captures_iter(traffic)
        .map(|caps| restore_uuid_dashes(&caps[1]))
        .collect()
}

fn restore_uuid_dashes(token: &str) -> String {
    if token.len() != 32 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return token.to_string();
    }
    format!(
        "{}-{}-{}-{}-{}",
        &token[..8],
        &token[8..12],
        &token[12..16],
        &token[16..20],
        &token[20..]
    )
}

/// Gateway API client bound to one account.
#[derive(Clone)]
pub struct CloudflareClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    api_token: String,
    account_id: String,
    base_url: String,
}

impl CloudflareClient {
    pub fn new(api_token: impl Into<String>, account_id: impl Into<String>) -> Result<Self> {
        CloudflareClientBuilder::new(api_token, account_id).build()
    }

    pub fn builder(
        api_token: impl Into<String>,
        account_id: impl Into<String>,
    ) -> CloudflareClientBuilder {
        CloudflareClientBuilder::new(api_token, account_id)
    }

    fn gateway_url(&self, path: &str) -> String {
        format!(
            "{}/accounts/{}/gateway/{}",
            self.inner.base_url.trim_end_matches('/'),
            self.inner.account_id,
            path
        )
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<Option<T>> {
        let response = request.bearer_auth(&self.inner.api_token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(operation, status = %status, "Gateway API response");

        let envelope = match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SyncError::remote(operation, status.as_u16(), body));
            }
            Err(e) => return Err(SyncError::SerializationError(e)),
        };

        if !status.is_success() || !envelope.success {
            let message = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SyncError::remote(operation, status.as_u16(), message));
        }

        Ok(envelope.result)
    }

    async fn list_rules(&self, name_prefix: &str) -> Result<Vec<RuleResource>> {
        let request = self.inner.http.get(self.gateway_url("rules"));
        let rules: Vec<RuleResource> = self.send("list policies", request).await?.unwrap_or_default();
        Ok(rules
            .into_iter()
            .filter(|rule| rule.name.starts_with(name_prefix))
            .collect())
    }
}

#[async_trait]
impl GatewayApi for CloudflareClient {
    async fn list_gateway_lists(&self, name_prefix: &str) -> Result<Vec<RemoteList>> {
        let request = self.inner.http.get(self.gateway_url("lists"));
        let lists: Vec<ListResource> = self.send("list lists", request).await?.unwrap_or_default();

        let owned: Vec<RemoteList> = lists
            .into_iter()
            .filter(|list| list.name.starts_with(name_prefix))
            .map(|list| RemoteList {
                id: list.id,
                name: list.name,
                count: list.count,
            })
            .collect();
        tracing::info!("Number of lists in gateway: {}", owned.len());
        Ok(owned)
    }

    async fn delete_gateway_list(&self, id: &str) -> Result<()> {
        let request = self.inner.http.delete(self.gateway_url(&format!("lists/{}", id)));
        self.send::<serde_json::Value>("delete list", request).await?;
        Ok(())
    }

    async fn create_gateway_list(&self, name: &str, domains: &[Domain]) -> Result<RemoteList> {
        let body = CreateListBody {
            name,
            description: "Managed by adblock-gateway-sync",
            kind: "DOMAIN",
            items: domains
                .iter()
                .map(|domain| ListItem {
                    value: domain.as_str(),
                })
                .collect(),
        };
        let request = self.inner.http.post(self.gateway_url("lists")).json(&body);
        let created: ListResource = self
            .send("create list", request)
            .await?
            .ok_or_else(|| SyncError::remote("create list", 200, "response carried no result"))?;

        Ok(RemoteList {
            id: created.id,
            name: created.name,
            count: if created.count == 0 {
                domains.len()
            } else {
                created.count
            },
        })
    }

    async fn list_gateway_policies(&self, name_prefix: &str) -> Result<Vec<RemotePolicy>> {
        Ok(self
            .list_rules(name_prefix)
            .await?
            .into_iter()
            .map(|rule| RemotePolicy {
                list_ids: referenced_list_ids(&rule.traffic),
                id: rule.id,
                name: rule.name,
            })
            .collect())
    }

    async fn delete_gateway_policy(&self, name_prefix: &str) -> Result<usize> {
        let rules = self.list_rules(name_prefix).await?;
        for rule in &rules {
            tracing::debug!("Deleting policy {} - ID: {}", rule.name, rule.id);
            let request = self
                .inner
                .http
                .delete(self.gateway_url(&format!("rules/{}", rule.id)));
            self.send::<serde_json::Value>("delete policy", request).await?;
        }
        Ok(rules.len())
    }

    async fn create_gateway_policy(&self, name: &str, list_ids: &[String]) -> Result<()> {
        let request = self
            .inner
            .http
            .post(self.gateway_url("rules"))
            .json(&RuleBody::block_dns(name, list_ids));
        self.send::<serde_json::Value>("create policy", request).await?;
        Ok(())
    }

    async fn update_gateway_policy(
        &self,
        name: &str,
        id: &str,
        list_ids: &[String],
    ) -> Result<()> {
        let request = self
            .inner
            .http
            .put(self.gateway_url(&format!("rules/{}", id)))
            .json(&RuleBody::block_dns(name, list_ids));
        self.send::<serde_json::Value>("update policy", request).await?;
        Ok(())
    }
}

/// Builder for configuring a [`CloudflareClient`]
pub struct CloudflareClientBuilder {
    api_token: String,
    account_id: String,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl CloudflareClientBuilder {
    pub fn new(api_token: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            account_id: account_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("adblock-gateway-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<CloudflareClient> {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(CloudflareClient {
            inner: Arc::new(ClientInner {
                http,
                api_token: self.api_token,
                account_id: self.account_id,
                base_url: self.base_url,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traffic_expression_joins_lists() {
        let ids = vec![
            "2f9a1c3e-0000-4000-8000-000000000001".to_string(),
            "2f9a1c3e-0000-4000-8000-000000000002".to_string(),
        ];
        assert_eq!(
            traffic_expression(&ids),
            "any(dns.domains[*] in $2f9a1c3e000040008000000000000001) or \
             any(dns.domains[*] in $2f9a1c3e000040008000000000000002)"
        );
    }

    #[test]
    fn test_referenced_list_ids_round_trip_order() {
        let traffic = "any(dns.domains[*] in $aaa111) or any(dns.domains[*] in $bbb222)";
        assert_eq!(referenced_list_ids(traffic), vec!["aaa111", "bbb222"]);
        assert!(referenced_list_ids("").is_empty());
    }

    #[test]
    fn test_list_ids_survive_traffic_round_trip() {
        let ids = vec![
            "2f9a1c3e-0000-4000-8000-000000000001".to_string(),
            "2F9A1C3E-0000-4000-8000-00000000000B".to_string(),
            "legacy-list".to_string(),
        ];
        let parsed = referenced_list_ids(&traffic_expression(&ids));
        assert_eq!(parsed[..2], ids[..2]);
        // non-UUID ids only lose their dashes
        assert_eq!(parsed[2], "legacylist");
    }

    #[test]
    fn test_rule_body_shape() {
        let body = RuleBody::block_dns("[AdBlock-DNS Block List] Block Ads", &["abc".to_string()]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["action"], "block");
        assert_eq!(json["filters"], serde_json::json!(["dns"]));
        assert_eq!(json["traffic"], "any(dns.domains[*] in $abc)");
        assert_eq!(json["rule_settings"]["block_page_enabled"], false);
    }
}
