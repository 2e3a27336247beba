use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use shakmaty::uci::UciMove;
use tracing::{debug, warn};

use crate::{
    config::AdvisorConfig,
    error::AdvisorError,
    types::{AdvisoryResult, AppliedSettings, EngineSettings, Evaluation},
};

/// The remote move-evaluation service.
///
/// [`AdvisoryClient`] talks to it over HTTP; tests substitute scripted
/// implementations.
#[allow(async_fn_in_trait)]
pub trait AdvisoryService {
    /// Ranked lines for `position` (a FEN). One request, no retries.
    async fn query(&self, position: &str) -> Result<AdvisoryResult, AdvisorError>;

    /// Push engine settings; returns what the service actually applied.
    async fn configure(&self, settings: EngineSettings) -> Result<AppliedSettings, AdvisorError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvisoryPayload {
    best_moves: Vec<String>,
    evals: Vec<Evaluation>,
}

pub struct AdvisoryClient {
    client: Client,
    base_url: String,
}

impl AdvisoryClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(AdvisorError::transport)?;

        Ok(Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the service is reachable.
    pub async fn ping(&self) -> Result<(), AdvisorError> {
        let resp = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(AdvisorError::transport)?;

        if !resp.status().is_success() {
            return Err(AdvisorError::ServiceUnavailable(format!("HTTP {}", resp.status())));
        }
        Ok(())
    }

    async fn post(&self, path: &str, body: String) -> Result<String, AdvisorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Advisory request");

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(AdvisorError::transport)?;

        if !resp.status().is_success() {
            return Err(AdvisorError::ServiceUnavailable(format!("HTTP {}", resp.status())));
        }

        resp.text()
            .await
            .map_err(|e| AdvisorError::ServiceUnavailable(format!("Body read error: {e}")))
    }
}

impl AdvisoryService for AdvisoryClient {
    async fn query(&self, position: &str) -> Result<AdvisoryResult, AdvisorError> {
        let body = json!({ "fen": position }).to_string();
        let text = self.post("/lich", body).await?;
        parse_advisory(&text)
    }

    async fn configure(&self, settings: EngineSettings) -> Result<AppliedSettings, AdvisorError> {
        let body = serde_json::to_string(&settings)
            .map_err(|e| AdvisorError::InvalidSettings(e.to_string()))?;
        let text = self.post("/configure", body).await?;
        serde_json::from_str(&text).map_err(|e| AdvisorError::MalformedResponse(e.to_string()))
    }
}

/// Parse an advisory response body into an aligned result.
pub(crate) fn parse_advisory(body: &str) -> Result<AdvisoryResult, AdvisorError> {
    let payload: AdvisoryPayload =
        serde_json::from_str(body).map_err(|e| AdvisorError::MalformedResponse(e.to_string()))?;

    let moves = payload
        .best_moves
        .iter()
        .map(|notation| parse_move(notation))
        .collect::<Result<Vec<_>, _>>()?;

    if moves.len() != payload.evals.len() {
        warn!(
            moves = moves.len(),
            evals = payload.evals.len(),
            "Advisory lists differ in length, truncating"
        );
    }

    Ok(AdvisoryResult::new(moves, payload.evals))
}

fn parse_move(notation: &str) -> Result<UciMove, AdvisorError> {
    match notation.parse::<UciMove>() {
        Ok(uci @ UciMove::Normal { .. }) => Ok(uci),
        _ => Err(AdvisorError::MalformedResponse(format!(
            "not a board move: {notation:?}"
        ))),
    }
}
