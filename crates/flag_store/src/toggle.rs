//! Operator-side maintenance status toggle

use crate::store::write_flag;
use config::{ConfigValidator, ToggleOptions};
use types::Result;

/// Turn maintenance mode on or off.
///
/// Options are validated before any network call. The write is attempted
/// once; a failure is returned as is.
pub async fn set_status(is_active: bool, options: &ToggleOptions) -> Result<()> {
    ConfigValidator::validate_toggle(options)?;

    write_flag(options, is_active).await?;

    tracing::info!(
        provider = %options.provider,
        key = options.flag_key(),
        active = is_active,
        "Maintenance mode status updated"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;
    use types::{MaintenanceError, Provider};
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_upstash_toggle_writes_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upstash"))
            .and(body_json(serde_json::json!(["SET", "isInMaintenanceMode", "true"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "OK" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = ToggleOptions::new(Provider::Upstash, format!("{}/upstash@token", mock_server.uri()));
        set_status(true, &options).await.unwrap();
    }

    #[tokio::test]
    async fn test_edge_config_toggle_uses_custom_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/v1/edge-config/ecfg_abc/items"))
            .and(body_json(serde_json::json!({
                "items": [{ "operation": "update", "key": "siteDown", "value": false }]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = ToggleOptions::new(Provider::EdgeConfig, "https://edge-config.vercel.com/ecfg_abc?token=t")
            .with_key("siteDown")
            .with_edge_config_management("ecfg_abc", "vercel-token")
            .with_management_api_url(mock_server.uri());
        set_status(false, &options).await.unwrap();
    }

    #[tokio::test]
    async fn test_edge_config_without_credentials_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let options = ToggleOptions::new(Provider::EdgeConfig, "https://edge-config.vercel.com/ecfg_abc?token=t")
            .with_management_api_url(mock_server.uri());
        let err = assert_err!(set_status(true, &options).await);
        assert_eq!(
            err,
            MaintenanceError::Configuration(config::MISSING_MANAGEMENT_CREDENTIALS.to_string())
        );
    }

    #[tokio::test]
    async fn test_mismatched_connection_string_is_rejected() {
        let options = ToggleOptions::new(Provider::Upstash, "https://edge-config.vercel.com/ecfg_abc?token=t");
        let err = assert_err!(set_status(true, &options).await);
        assert_eq!(
            err,
            MaintenanceError::Configuration(config::INVALID_CONNECTION_STRING.to_string())
        );
    }

    #[tokio::test]
    async fn test_management_failure_surfaces_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let options = ToggleOptions::new(Provider::EdgeConfig, "https://edge-config.vercel.com/ecfg_abc?token=t")
            .with_edge_config_management("ecfg_abc", "expired")
            .with_management_api_url(mock_server.uri());
        let err = assert_err!(set_status(true, &options).await);
        assert!(err.to_string().contains("401 - Unauthorized"));
    }
}
