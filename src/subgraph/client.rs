//! GraphQL client for the pools subgraph

use alloy::primitives::Address;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use crate::{
    errors::{PoolError, PoolResult},
    network::retry::{retry_with_backoff, RetryConfig},
    registry::PoolQuery,
    subgraph::{GraphResponse, PoolData, PoolsData},
    types::PoolSnapshot,
};

const POOL_FIELDS: &str = "id finalized swapFee totalWeight tokensList \
    tokens { address symbol decimals balance denormWeight }";

/// Largest `first:` the hosted subgraph accepts.
pub const PAGE_SIZE: usize = 1000;

pub struct SubgraphClient {
    http: reqwest::Client,
    url: String,
    retry: RetryConfig,
    page_size: usize,
}

impl SubgraphClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> PoolResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PoolError::Network {
                message: "Failed to build HTTP client".to_string(),
                source: Some(e.into()),
                retry_count: 0,
            })?;
        Ok(Self {
            http,
            url: url.into(),
            retry: RetryConfig::default(),
            page_size: PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, PAGE_SIZE);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> PoolResult<T> {
        let body = json!({ "query": query, "variables": variables });

        let response: GraphResponse<T> = retry_with_backoff(
            || async {
                let response = self.http
                    .post(&self.url)
                    .json(&body)
                    .send()
                    .await
                    .context("HTTP request failed")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    warn!("⚠️ Subgraph returned error status {}: {}", status, text);
                    return Err(anyhow::anyhow!("Subgraph error: {} - {}", status, text));
                }

                response.json::<GraphResponse<T>>().await
                    .context("Failed to parse subgraph response")
            },
            &self.retry,
            "subgraph query",
        ).await?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(PoolError::DataParsing {
                context: "subgraph query".to_string(),
                source: anyhow::anyhow!("{}", messages.join("; ")),
            });
        }

        response.data.ok_or_else(|| PoolError::DataParsing {
            context: "subgraph query".to_string(),
            source: anyhow::anyhow!("response has neither data nor errors"),
        })
    }
}

fn public_pools_query(filtered: bool, page_size: usize) -> String {
    let filter = if filtered { ", tokensList_contains: $tokens" } else { "" };
    format!(
        "query PublicPools($tokens: [Bytes!], $lastId: ID!) {{ pools(first: {page_size}, orderBy: id, \
         orderDirection: asc, where: {{ finalized: true, id_gt: $lastId{filter} }}) {{ {POOL_FIELDS} }} }}"
    )
}

impl PoolQuery for SubgraphClient {
    async fn fetch_public_pools(&self, token_index: &[Address]) -> PoolResult<Vec<PoolSnapshot>> {
        let tokens: Vec<String> = token_index.iter().map(|t| t.to_string().to_lowercase()).collect();
        let query = public_pools_query(!tokens.is_empty(), self.page_size);

        let mut snapshots = Vec::new();
        let mut last_id = String::new();
        loop {
            let data: PoolsData = self
                .query(&query, json!({ "tokens": &tokens, "lastId": &last_id }))
                .await?;
            let page_len = data.pools.len();
            let next_id = data.pools.last().map(|p| p.id.clone());
            for pool in data.pools {
                snapshots.push(PoolSnapshot::try_from(pool)?);
            }

            match next_id {
                Some(id) if page_len >= self.page_size => {
                    if id <= last_id {
                        warn!("⚠️ Subgraph page did not advance past {}, stopping", last_id);
                        break;
                    }
                    last_id = id;
                }
                _ => break,
            }
        }

        debug!("Subgraph returned {} pools", snapshots.len());
        Ok(snapshots)
    }

    async fn fetch_pool(&self, address: Address) -> PoolResult<Option<PoolSnapshot>> {
        let query = format!("query Pool($id: ID!) {{ pool(id: $id) {{ {POOL_FIELDS} }} }}");
        let data: PoolData = self
            .query(&query, json!({ "id": address.to_string().to_lowercase() }))
            .await?;
        data.pool.map(PoolSnapshot::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const POOLS_BODY: &str = r#"{"data":{"pools":[{
        "id": "0x1111111111111111111111111111111111111111",
        "finalized": true,
        "swapFee": "0.003",
        "totalWeight": "10",
        "tokensList": ["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"],
        "tokens": [{ "address": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "symbol": "DAI",
                     "decimals": 18, "balance": "12345.678", "denormWeight": "10" }]
    }]}}"#;

    fn fast_client(url: String) -> SubgraphClient {
        SubgraphClient::new(url, Duration::from_secs(2))
            .unwrap()
            .with_retry(RetryConfig {
                max_attempts: 2,
                initial_delay_ms: 1,
                max_delay_ms: 2,
                exponential_base: 2.0,
            })
    }

    #[test]
    fn query_filter_only_when_tokens_given() {
        assert!(public_pools_query(true, PAGE_SIZE).contains("tokensList_contains"));
        assert!(!public_pools_query(false, PAGE_SIZE).contains("tokensList_contains"));
        assert!(public_pools_query(false, 2).contains("first: 2"));
    }

    fn pool_json(id_byte: char) -> String {
        let id: String = std::iter::repeat(id_byte).take(40).collect();
        format!(
            r#"{{"id":"0x{id}","finalized":true,"swapFee":"0.003","totalWeight":"10",
               "tokensList":["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"],
               "tokens":[{{"address":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","symbol":"DAI",
                          "decimals":18,"balance":"1","denormWeight":"10"}}]}}"#
        )
    }

    #[tokio::test]
    async fn follows_pages_until_a_short_one() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex(r#""lastId":"""#.to_string()))
            .with_status(200)
            .with_body(format!(r#"{{"data":{{"pools":[{},{}]}}}}"#, pool_json('1'), pool_json('2')))
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex(
                r#""lastId":"0x2222222222222222222222222222222222222222""#.to_string(),
            ))
            .with_status(200)
            .with_body(format!(r#"{{"data":{{"pools":[{}]}}}}"#, pool_json('3')))
            .create_async()
            .await;

        let pools = fast_client(server.url())
            .with_page_size(2)
            .fetch_public_pools(&[])
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(pools.len(), 3);
        assert_eq!(pools[2].address, Address::repeat_byte(0x33));
    }

    #[tokio::test]
    async fn fetches_public_pools() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("finalized: true".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(POOLS_BODY)
            .create_async()
            .await;

        let pools = fast_client(server.url()).fetch_public_pools(&[]).await.unwrap();
        mock.assert_async().await;
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].tokens[0].balance, dec!(12345.678));
        assert!(pools[0].finalized);
    }

    #[tokio::test]
    async fn unknown_pool_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"pool":null}}"#)
            .create_async()
            .await;

        let pool = fast_client(server.url())
            .fetch_pool(Address::repeat_byte(0x11))
            .await
            .unwrap();
        assert!(pool.is_none());
    }

    #[tokio::test]
    async fn graphql_errors_surface() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"errors":[{"message":"bad query"}]}"#)
            .create_async()
            .await;

        let result = fast_client(server.url()).fetch_public_pools(&[]).await;
        assert!(matches!(result, Err(PoolError::DataParsing { .. })));
    }

    #[tokio::test]
    async fn http_failures_exhaust_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(502)
            .expect(2)
            .create_async()
            .await;

        let result = fast_client(server.url()).fetch_public_pools(&[]).await;
        mock.assert_async().await;
        assert!(matches!(result, Err(PoolError::Network { retry_count: 2, .. })));
    }
}
