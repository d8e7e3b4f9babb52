use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::AppState;
use crate::{error::Result, integrations::NameScheme};

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub address: String,
}

/// GET /resolve/{scheme}/{name}
pub async fn resolve_name(
    State(state): State<AppState>,
    Path((scheme, name)): Path<(String, String)>,
) -> Result<Json<ResolveResponse>> {
    let scheme: NameScheme = scheme.parse()?;
    let address = state.names.resolve(scheme, &name).await?;
    tracing::debug!("Resolved {} via {:?} to {}", name, scheme, address);
    Ok(Json(ResolveResponse { address }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_for;
    use crate::error::AppError;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unknown_scheme_is_bad_request() {
        let server = MockServer::start().await;
        let err = resolve_name(
            State(state_for(&server).await),
            Path(("lens".to_string(), "alice.lens".to_string())),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn sns_name_resolves_through_proxy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resolve/bonfida"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "s": "ok",
                "result": "HKKp49qGWXd639QsuH7JiLijfVW5UtCVY4s1n2HANwEA"
            })))
            .mount(&server)
            .await;

        let Json(body) = resolve_name(
            State(state_for(&server).await),
            Path(("sns".to_string(), "bonfida.sol".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(body.address, "HKKp49qGWXd639QsuH7JiLijfVW5UtCVY4s1n2HANwEA");
    }
}
