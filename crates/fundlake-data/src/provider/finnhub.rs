//! Finnhub REST endpoints.
//!
//! Per-ticker URLs are built from a template rendered once per endpoint
//! (`key={key}&...`) and bound to concrete values for each ticker. Values
//! are not escaped; a bad value produces a bad URL and surfaces as an HTTP
//! error on that ticker.

use std::sync::Arc;

use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fundlake_core::ParamValue;

use crate::error::{DataError, FetchError, Result};
use crate::provider::transport::JsonTransport;

/// URL template for one endpoint, reused for every ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUrl {
    base_url: String,
    endpoint: String,
    template: String,
    params: IndexMap<String, ParamValue>,
}

impl EndpointUrl {
    /// The `key={key}` query template, without ticker and token.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Bind parameter values and append `symbol` and `token`.
    pub fn render(&self, ticker: &str, api_key: &SecretString) -> String {
        let query = bind_template(&self.template, &self.params);
        let sep = if query.is_empty() { "" } else { "&" };
        format!(
            "{}/stock/{}?{}{}symbol={}&token={}",
            self.base_url,
            self.endpoint,
            query,
            sep,
            ticker,
            api_key.expose_secret()
        )
    }

    /// Same as [`render`](Self::render) with the token masked, for logs.
    pub fn redacted(&self, ticker: &str) -> String {
        self.render(ticker, &SecretString::from("***".to_string()))
    }
}

/// Build the URL template for `endpoint` from its ordered parameters.
pub fn endpoint_url(
    base_url: &str,
    endpoint: &str,
    params: &IndexMap<String, ParamValue>,
) -> EndpointUrl {
    let template = params
        .keys()
        .map(|k| format!("{}={{{}}}", k, k))
        .collect::<Vec<_>>()
        .join("&");

    debug!(endpoint, template = %template, "Built endpoint URL template");

    EndpointUrl {
        base_url: base_url.trim_end_matches('/').to_string(),
        endpoint: endpoint.to_string(),
        template,
        params: params.clone(),
    }
}

/// Replace each `{name}` with its value. Unknown placeholders are left as is.
fn bind_template(template: &str, params: &IndexMap<String, ParamValue>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match params.get(name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// One entry of the Finnhub symbol directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolListing {
    pub symbol: String,
    #[serde(default)]
    pub display_symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub security_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub mic: Option<String>,
}

/// Finnhub client for requests outside the per-ticker fan-out.
#[derive(Clone)]
pub struct FinnhubClient {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
    api_key: SecretString,
}

impl FinnhubClient {
    pub fn new(
        transport: Arc<dyn JsonTransport>,
        base_url: impl Into<String>,
        api_key: SecretString,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn transport(&self) -> &dyn JsonTransport {
        self.transport.as_ref()
    }

    pub fn transport_handle(&self) -> Arc<dyn JsonTransport> {
        Arc::clone(&self.transport)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// All symbols listed on `exchange` (e.g. `US`).
    pub async fn symbol_directory(&self, exchange: &str) -> Result<Vec<SymbolListing>> {
        let url = format!(
            "{}/stock/symbol?exchange={}&token={}",
            self.base_url,
            exchange,
            self.api_key.expose_secret()
        );

        let payload = self
            .transport
            .get_json(&url)
            .await
            .map_err(|e| DataError::source_failed("finnhub symbol directory", e))?;

        let listings: Vec<SymbolListing> = serde_json::from_value(payload)
            .map_err(|e| DataError::source_failed("finnhub symbol directory", FetchError::from(e)))?;

        info!(exchange, symbols = listings.len(), "Fetched symbol directory");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::transport::HttpTransport;
    use proptest::prelude::*;
    use std::time::Duration;

    fn key() -> SecretString {
        SecretString::from("secret-key".to_string())
    }

    #[test]
    fn test_render_with_params() {
        let mut params = IndexMap::new();
        params.insert("statement".to_string(), ParamValue::from("bs"));
        params.insert("freq".to_string(), ParamValue::from("annual"));

        let url = endpoint_url("https://finnhub.io/api/v1/", "financials", &params);
        assert_eq!(url.template(), "statement={statement}&freq={freq}");
        assert_eq!(
            url.render("AAPL", &key()),
            "https://finnhub.io/api/v1/stock/financials?statement=bs&freq=annual&symbol=AAPL&token=secret-key"
        );
    }

    #[test]
    fn test_render_without_params() {
        let url = endpoint_url("https://finnhub.io/api/v1", "profile2", &IndexMap::new());
        assert_eq!(
            url.render("MSFT", &key()),
            "https://finnhub.io/api/v1/stock/profile2?symbol=MSFT&token=secret-key"
        );
        assert!(!url.redacted("MSFT").contains("secret-key"));
    }

    #[test]
    fn test_render_integer_params() {
        let mut params = IndexMap::new();
        params.insert("resolution".to_string(), ParamValue::from("D"));
        params.insert("from".to_string(), ParamValue::Int(1_700_000_000));
        params.insert("to".to_string(), ParamValue::Int(1_700_600_000));

        let url = endpoint_url("http://localhost", "candle", &params);
        assert_eq!(
            url.render("IBM", &key()),
            "http://localhost/stock/candle?resolution=D&from=1700000000&to=1700600000&symbol=IBM&token=secret-key"
        );
    }

    #[test]
    fn test_values_are_not_escaped() {
        let mut params = IndexMap::new();
        params.insert("q".to_string(), ParamValue::from("a b&c"));
        let url = endpoint_url("http://localhost", "search", &params);
        assert!(url.render("X", &key()).contains("q=a b&c&symbol=X"));
    }

    #[test]
    fn test_bind_template_leaves_unknown_placeholders() {
        let params = IndexMap::new();
        assert_eq!(bind_template("a={a}&b={", &params), "a={a}&b={");
    }

    #[tokio::test]
    async fn test_symbol_directory() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stock/symbol")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("exchange".into(), "US".into()),
                mockito::Matcher::UrlEncoded("token".into(), "secret-key".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[{"symbol":"AAPL","displaySymbol":"AAPL","description":"APPLE INC","type":"Common Stock","currency":"USD","mic":"XNAS"},
                    {"symbol":"BRK.B","description":"BERKSHIRE HATHAWAY INC-CL B"}]"#,
            )
            .create_async()
            .await;

        let transport = Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap());
        let client = FinnhubClient::new(transport, server.url(), key());
        let listings = client.symbol_directory("US").await.unwrap();

        mock.assert_async().await;
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].security_type.as_deref(), Some("Common Stock"));
        assert_eq!(listings[1].display_symbol, None);
    }

    #[tokio::test]
    async fn test_symbol_directory_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stock/symbol")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let transport = Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap());
        let client = FinnhubClient::new(transport, server.url(), key());
        let err = client.symbol_directory("US").await.unwrap_err();
        assert!(matches!(err, DataError::DataSource { .. }));
    }

    proptest! {
        #[test]
        fn prop_render_keeps_param_order(values in proptest::collection::vec(0i64..1_000_000, 0..6)) {
            let params: IndexMap<String, ParamValue> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("p{}", i), ParamValue::Int(*v)))
                .collect();
            let url = endpoint_url("http://h", "e", &params).render("T", &key());

            let expected: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("p{}={}", i, v))
                .chain(["symbol=T".to_string(), "token=secret-key".to_string()])
                .collect();
            let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
            prop_assert_eq!(query, expected.join("&"));
        }
    }
}
