//! Cold-start global model fetch: the server returns counters keyed by the
//! deterministic-ciphertext of each action, alongside the IV needed to
//! decrypt that one key (not the data itself, which travels in the clear
//! counts) back into a plaintext-keyed map the local engine understands.

use predict_core::{GlobalActionCounter, PredictError, TimePatterns};
use predict_crypto::CryptoService;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct GlobalModelResponse {
    #[serde(rename = "globalActionCounter")]
    global_action_counter: BTreeMap<String, u64>,
    #[serde(rename = "globalActionCounterIVs")]
    global_action_counter_ivs: BTreeMap<String, String>,
    #[serde(rename = "timePatterns")]
    time_patterns: BTreeMap<String, BTreeMap<u8, u64>>,
    #[serde(rename = "timePatternsIVs")]
    time_patterns_ivs: BTreeMap<String, String>,
}

/// The decrypted global model, ready to install into the local engine.
pub struct GlobalModel {
    pub global_action_counter: GlobalActionCounter,
    pub time_patterns: TimePatterns,
}

/// `GET /global-model/{appId}`, decrypting each ciphertext-keyed entry back
/// to a plaintext action name.
pub async fn fetch_global_model(
    client: &reqwest::Client,
    server_url: &str,
    app_id: &str,
    crypto: &CryptoService,
) -> Result<GlobalModel, PredictError> {
    let response = client
        .get(format!("{server_url}/global-model/{app_id}"))
        .send()
        .await
        .map_err(|e| PredictError::network(format!("global-model request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(PredictError::network(format!(
            "global-model returned status {}",
            response.status()
        )));
    }

    let parsed: GlobalModelResponse = response
        .json()
        .await
        .map_err(|e| PredictError::network(format!("global-model response malformed: {e}")))?;

    let mut global_action_counter = GlobalActionCounter::new();
    for (ciphertext, count) in parsed.global_action_counter {
        let iv = parsed
            .global_action_counter_ivs
            .get(&ciphertext)
            .ok_or_else(|| PredictError::protocol_mismatch("global-model counter missing matching IV"))?;
        let action = crypto.decrypt(&ciphertext, iv)?;
        global_action_counter.insert(action, count);
    }

    let mut time_patterns = TimePatterns::new();
    for (ciphertext, by_hour) in parsed.time_patterns {
        let iv = parsed
            .time_patterns_ivs
            .get(&ciphertext)
            .ok_or_else(|| PredictError::protocol_mismatch("global-model time pattern missing matching IV"))?;
        let action = crypto.decrypt(&ciphertext, iv)?;
        time_patterns.insert(action, by_hour);
    }

    Ok(GlobalModel {
        global_action_counter,
        time_patterns,
    })
}
