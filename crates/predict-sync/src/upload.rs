//! Daily anonymized upload: per-action counts over the retained history,
//! encrypted with a deterministic IV so the server can join them across
//! uploads without learning the plaintext action names in transit.

use predict_core::{GlobalActionCounter, PredictError};
use predict_crypto::CryptoService;
use serde::Serialize;

#[derive(Serialize)]
struct UploadInteraction {
    #[serde(rename = "actionType")]
    action_type: String,
    #[serde(rename = "actionTypeIV")]
    action_type_iv: String,
    count: u64,
}

#[derive(Serialize)]
struct UploadBody {
    #[serde(rename = "appId")]
    app_id: String,
    interactions: Vec<UploadInteraction>,
}

/// Upload `counts` to the aggregator. A no-op if `counts` is empty or
/// `app_id` hasn't been established.
pub async fn upload_anonymous_data(
    client: &reqwest::Client,
    server_url: &str,
    app_id: Option<&str>,
    crypto: &CryptoService,
    counts: GlobalActionCounter,
) -> Result<(), PredictError> {
    let Some(app_id) = app_id else {
        tracing::debug!("skipping upload: no app id yet");
        return Ok(());
    };
    if counts.is_empty() {
        tracing::debug!("skipping upload: no interaction history to report");
        return Ok(());
    }

    let mut interactions = Vec::with_capacity(counts.len());
    for (action, count) in counts {
        let (action_type, action_type_iv) = crypto.encrypt_deterministic(&action).await?;
        interactions.push(UploadInteraction {
            action_type,
            action_type_iv,
            count,
        });
    }

    let body = UploadBody {
        app_id: app_id.to_string(),
        interactions,
    };

    let response = client
        .post(format!("{server_url}/upload-anonymous-data"))
        .json(&body)
        .send()
        .await
        .map_err(|e| PredictError::network(format!("upload-anonymous-data request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(PredictError::network(format!(
            "upload-anonymous-data returned status {}",
            response.status()
        )));
    }
    Ok(())
}
