use ethers::providers::{Http, Middleware, Provider, ProviderError};
use ethers::utils::to_checksum;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use super::{blockfrost::BlockfrostClient, fetch_json_optional};
use crate::{
    config::Config,
    constants::ADA_HANDLE_POLICY_ID,
    error::{AppError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScheme {
    Ens,
    Unstoppable,
    Handle,
    Sns,
}

impl FromStr for NameScheme {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ens" => Ok(NameScheme::Ens),
            "unstoppable" | "ud" => Ok(NameScheme::Unstoppable),
            "handle" | "adahandle" => Ok(NameScheme::Handle),
            "sns" | "sol" => Ok(NameScheme::Sns),
            other => Err(AppError::BadRequest(format!(
                "Unsupported name scheme: {}",
                other
            ))),
        }
    }
}

/// Resolves human-readable names to one canonical chain address.
#[derive(Clone, Debug)]
pub struct NameService {
    config: Config,
    client: Client,
    blockfrost: BlockfrostClient,
}

#[derive(Debug, Deserialize)]
struct UnstoppableRecord {
    #[serde(default)]
    meta: Option<UnstoppableMeta>,
    #[serde(default)]
    records: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UnstoppableMeta {
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HandleRecord {
    #[serde(default)]
    resolved_addresses: Option<HandleAddresses>,
}

#[derive(Debug, Deserialize)]
struct HandleAddresses {
    #[serde(default)]
    ada: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnsReply {
    #[serde(default)]
    s: String,
    #[serde(default)]
    result: Option<Value>,
}

impl NameService {
    pub fn new(client: Client, config: &Config, blockfrost: BlockfrostClient) -> Self {
        Self {
            config: config.clone(),
            client,
            blockfrost,
        }
    }

    pub async fn resolve(&self, scheme: NameScheme, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is empty".into()));
        }
        match scheme {
            NameScheme::Ens => self.resolve_ens(name).await,
            NameScheme::Unstoppable => self.resolve_unstoppable(name).await,
            NameScheme::Handle => self.resolve_handle(name).await,
            NameScheme::Sns => self.resolve_sns(name).await,
        }
    }

    /// ENS through the registry on the configured mainnet RPC; returns a checksummed address.
    pub async fn resolve_ens(&self, name: &str) -> Result<String> {
        if !name.contains('.') {
            return Err(AppError::BadRequest(format!("{} is not an ENS name", name)));
        }
        let provider = Provider::<Http>::try_from(self.config.eth_rpc_url.as_str())
            .map_err(|e| AppError::Internal(format!("Invalid ETH_RPC_URL: {}", e)))?;
        match provider.resolve_name(name).await {
            Ok(address) => Ok(to_checksum(&address, None)),
            Err(ProviderError::EnsError(_)) | Err(ProviderError::EnsNotOwned(_)) => {
                Err(AppError::NotFound(format!("{} does not resolve", name)))
            }
            Err(e) => Err(AppError::UpstreamUnavailable(format!(
                "ENS lookup failed: {}",
                e
            ))),
        }
    }

    pub async fn resolve_unstoppable(&self, name: &str) -> Result<String> {
        let key = self.config.unstoppable_api_key.as_deref().ok_or_else(|| {
            AppError::UpstreamUnavailable("UNSTOPPABLE_API_KEY not configured".into())
        })?;
        let url = format!(
            "{}/resolve/domains/{}",
            self.config.unstoppable_api_url.trim_end_matches('/'),
            name.to_ascii_lowercase()
        );
        let record: Option<UnstoppableRecord> =
            fetch_json_optional(self.client.get(url).bearer_auth(key)).await?;
        let record = record.ok_or_else(|| not_found(name))?;

        let from_records = record
            .records
            .get("crypto.ETH.address")
            .and_then(Value::as_str)
            .map(str::to_string);
        from_records
            .or_else(|| record.meta.and_then(|meta| meta.owner))
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(|| not_found(name))
    }

    /// `$handle` lookup: handle API first, then the current holder of the handle token.
    pub async fn resolve_handle(&self, name: &str) -> Result<String> {
        let handle = name.trim().trim_start_matches('$').to_ascii_lowercase();
        if handle.is_empty() {
            return Err(AppError::BadRequest("Handle is empty".into()));
        }

        match self.lookup_handle_api(&handle).await {
            Ok(Some(address)) => return Ok(address),
            Ok(None) => tracing::debug!("handle API has no address for ${}", handle),
            Err(e) => tracing::debug!("handle API failed for ${}: {}", handle, e),
        }

        if !self.blockfrost.is_configured() {
            tracing::debug!("no Blockfrost project id; ${} has no on-chain fallback", handle);
            return Err(not_found(&format!("${}", handle)));
        }
        let unit = format!("{}{}", ADA_HANDLE_POLICY_ID, hex::encode(handle.as_bytes()));
        let holders = self.blockfrost.asset_addresses(&unit).await?;
        holders
            .into_iter()
            .map(|holder| holder.address)
            .find(|address| !address.trim().is_empty())
            .ok_or_else(|| not_found(&format!("${}", handle)))
    }

    // Internal helper that supports `lookup_handle_api` operations.
    async fn lookup_handle_api(&self, handle: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/handles/{}",
            self.config.handle_api_url.trim_end_matches('/'),
            handle
        );
        let record: Option<HandleRecord> = fetch_json_optional(self.client.get(url)).await?;
        Ok(record
            .and_then(|r| r.resolved_addresses)
            .and_then(|a| a.ada)
            .filter(|address| !address.trim().is_empty()))
    }

    pub async fn resolve_sns(&self, name: &str) -> Result<String> {
        let domain = name.trim().trim_end_matches(".sol").to_ascii_lowercase();
        let url = format!(
            "{}/resolve/{}",
            self.config.sns_proxy_url.trim_end_matches('/'),
            domain
        );
        let reply: Option<SnsReply> = fetch_json_optional(self.client.get(url)).await?;
        reply
            .filter(|reply| reply.s == "ok")
            .and_then(|reply| reply.result)
            .and_then(|result| result.as_str().map(str::to_string))
            .filter(|address| !address.trim().is_empty())
            .ok_or_else(|| not_found(name))
    }
}

fn not_found(name: &str) -> AppError {
    AppError::NotFound(format!("{} does not resolve", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> NameService {
        let config = Config {
            handle_api_url: server.uri(),
            blockfrost_api_url: server.uri(),
            blockfrost_project_id: Some("mainnetKEY".to_string()),
            unstoppable_api_url: server.uri(),
            unstoppable_api_key: Some("ud-key".to_string()),
            sns_proxy_url: server.uri(),
            ..Config::default()
        };
        let client = Client::new();
        let blockfrost = BlockfrostClient::new(client.clone(), &config);
        NameService::new(client, &config, blockfrost)
    }

    #[test]
    fn scheme_parses_aliases() {
        assert_eq!("ENS".parse::<NameScheme>().unwrap(), NameScheme::Ens);
        assert_eq!("adahandle".parse::<NameScheme>().unwrap(), NameScheme::Handle);
        assert!("lens".parse::<NameScheme>().is_err());
    }

    #[tokio::test]
    async fn handle_falls_back_to_token_holder() {
        // Memastikan fallback holder dipakai saat API handle gagal
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/handles/shortname"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let unit = format!("{}{}", ADA_HANDLE_POLICY_ID, hex::encode("shortname"));
        Mock::given(method("GET"))
            .and(path(format!("/assets/{}/addresses", unit)))
            .and(header("project_id", "mainnetKEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "address": "addr1qholder", "quantity": "1" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let address = service_for(&server)
            .resolve(NameScheme::Handle, "$shortname")
            .await
            .unwrap();
        assert_eq!(address, "addr1qholder");
    }

    #[tokio::test]
    async fn handle_api_answer_skips_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/handles/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "alice",
                "resolved_addresses": { "ada": "addr1qalice" }
            })))
            .mount(&server)
            .await;

        let address = service_for(&server).resolve_handle("$Alice").await.unwrap();
        assert_eq!(address, "addr1qalice");
    }

    #[tokio::test]
    async fn unresolvable_handle_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = service_for(&server).resolve_handle("$ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unstoppable_uses_owner_when_no_eth_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resolve/domains/brad.crypto"))
            .and(header("authorization", "Bearer ud-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": { "domain": "brad.crypto", "owner": "0x8aaD44321A86b170879d7A244c1e8d360c99DdA8" },
                "records": {}
            })))
            .mount(&server)
            .await;

        let address = service_for(&server)
            .resolve_unstoppable("brad.crypto")
            .await
            .unwrap();
        assert_eq!(address, "0x8aaD44321A86b170879d7A244c1e8d360c99DdA8");
    }

    #[tokio::test]
    async fn sns_error_reply_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resolve/nobody"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "s": "error", "result": "Invalid domain" })),
            )
            .mount(&server)
            .await;

        let err = service_for(&server).resolve_sns("nobody.sol").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
