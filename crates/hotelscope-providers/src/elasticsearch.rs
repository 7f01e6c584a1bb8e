use hotelscope::search::{IndexDocument, SearchError, SearchIndex, SearchRequest};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::{ProviderConfig, ProviderError, Result, runtime, trim_base_url};

/// Search backend speaking the Elasticsearch multi-search API.
pub struct ElasticsearchClient {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MultiSearchResponse {
    #[serde(default)]
    responses: Vec<ItemResponse>,
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    error: Option<Value>,
    hits: Option<Hits>,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Option<Value>,
}

/// Renders the NDJSON body of an `_msearch` call: one header line and one body line per request.
fn msearch_body(requests: &[SearchRequest]) -> Result<String> {
    let mut body = String::new();
    for request in requests {
        body.push_str(&serde_json::to_string(&json!({ "index": request.index }))?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&request.query.to_json())?);
        body.push('\n');
    }
    Ok(body)
}

impl ItemResponse {
    fn into_documents(self) -> Vec<IndexDocument> {
        if let Some(error) = self.error {
            warn!(%error, "Search request failed");
            return Vec::new();
        }
        self.hits
            .map(|hits| hits.hits)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|hit| hit.source)
            .filter_map(|source| match serde_json::from_value(source) {
                Ok(document) => Some(document),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable search hit");
                    None
                }
            })
            .collect()
    }
}

/// Pairs every request with its result list, padding missing entries with empty lists.
fn collect_results(response: MultiSearchResponse, expected: usize) -> Vec<Vec<IndexDocument>> {
    if response.responses.len() != expected {
        warn!(
            expected,
            received = response.responses.len(),
            "Multi-search response count mismatch"
        );
    }
    let mut results: Vec<Vec<IndexDocument>> = response
        .responses
        .into_iter()
        .take(expected)
        .map(ItemResponse::into_documents)
        .collect();
    results.resize_with(expected, Vec::new);
    results
}

impl ElasticsearchClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            runtime: runtime()?,
            base_url: trim_base_url(&config.elasticsearch_base_url),
        })
    }

    #[instrument(name = "Elasticsearch msearch", skip_all, fields(requests = requests.len()), level = "debug")]
    fn send(&self, requests: &[SearchRequest]) -> Result<Vec<Vec<IndexDocument>>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/_msearch", self.base_url);
        let body = msearch_body(requests)?;

        let response = self.runtime.block_on(async {
            self.client
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
                .body(body)
                .send()
                .await?
                .error_for_status()?
                .json::<MultiSearchResponse>()
                .await
        })?;

        let results = collect_results(response, requests.len());
        debug!(hits = results.iter().map(Vec::len).sum::<usize>(), "Multi-search finished");
        Ok(results)
    }
}

impl SearchIndex for ElasticsearchClient {
    fn multi_search(&self, requests: &[SearchRequest]) -> hotelscope::search::Result<Vec<Vec<IndexDocument>>> {
        self.send(requests).map_err(|e| match e {
            ProviderError::Serde(e) => SearchError::Serde(e),
            other => SearchError::Unavailable(other.to_string()),
        })
    }
}
