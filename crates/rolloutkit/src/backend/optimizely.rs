//! Optimizely REST API backend.
//!
//! This module provides the [`OptimizelyBackend`] implementation for the
//! feature endpoints of Optimizely's v2 API. Every request is scoped to one
//! project and authenticated with a personal access token.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{FeatureUpdate, ProjectEnvironment, RemoteFeature};
use serde::Serialize;
use serde::de::DeserializeOwned;
use ureq::Body;
use ureq::http::Response;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.optimizely.com/v2";

/// Optimizely feature API backend.
///
/// # Example
///
/// ```no_run
/// use rolloutkit::backend::Backend;
/// use rolloutkit::backend::optimizely::OptimizelyBackend;
///
/// let backend = OptimizelyBackend::new("token", 12345);
/// let features = backend.list_features().unwrap();
/// println!("Found {} features", features.len());
/// ```
pub struct OptimizelyBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL.
    api_base: String,
    access_token: String,
    project_id: u64,
}

/// Body of a create request.
#[derive(Serialize)]
struct CreateFeature<'a> {
    project_id: u64,
    key: &'a str,
}

impl OptimizelyBackend {
    /// Create a backend for the public API.
    #[must_use]
    pub fn new(access_token: impl Into<String>, project_id: u64) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, access_token, project_id)
    }

    /// Create a backend with a custom API base.
    #[must_use]
    pub fn with_api_base(
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        project_id: u64,
    ) -> Self {
        // Status codes are checked here so error bodies can be reported.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            api_base: api_base.into(),
            access_token: access_token.into(),
            project_id,
        }
    }

    /// Build the project-scoped URL for an API path.
    fn url(&self, path: &str) -> String {
        format!(
            "{}{}?project_id={}",
            self.api_base.trim_end_matches('/'),
            path,
            self.project_id
        )
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {url}");

        let response = self
            .agent
            .get(&url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .call()?;

        read_json(response)
    }
}

/// Decode a 2xx JSON response, or turn the status and body into an error.
fn read_json<T: DeserializeOwned>(mut response: Response<Body>) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;

    if !(200..300).contains(&status) {
        return Err(Error::remote(status, body));
    }

    Ok(serde_json::from_str(&body)?)
}

impl Backend for OptimizelyBackend {
    fn list_environments(&self) -> Result<Vec<ProjectEnvironment>> {
        self.get_json("/environments")
    }

    fn list_features(&self) -> Result<Vec<RemoteFeature>> {
        self.get_json("/features")
    }

    fn get_feature(&self, id: u64) -> Result<RemoteFeature> {
        self.get_json(&format!("/features/{id}"))
    }

    fn create_feature(&self, key: &str) -> Result<RemoteFeature> {
        let url = self.url("/features");
        log::debug!("POST {url} key={key}");

        let response = self
            .agent
            .post(&url)
            .header("Authorization", self.authorization())
            .send_json(CreateFeature {
                project_id: self.project_id,
                key,
            })?;

        read_json(response)
    }

    fn delete_feature(&self, id: u64) -> Result<()> {
        let url = self.url(&format!("/features/{id}"));
        log::debug!("DELETE {url}");

        let mut response = self
            .agent
            .delete(&url)
            .header("Authorization", self.authorization())
            .call()?;

        if response.status().as_u16() != 204 {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(Error::DeleteFailed { id, body });
        }
        Ok(())
    }

    fn update_feature(&self, id: u64, update: &FeatureUpdate) -> Result<RemoteFeature> {
        let url = self.url(&format!("/features/{id}"));
        log::debug!(
            "PATCH {url} environments={}",
            update.environments.len()
        );

        let response = self
            .agent
            .patch(&url)
            .header("Authorization", self.authorization())
            .send_json(update)?;

        read_json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EVERYONE, EnvironmentUpdate, RolloutRule};
    use mockito::{Matcher, Server};
    use serde_json::json;

    const TOKEN: &str = "fake-token";
    const PROJECT: u64 = 1_234_567_890;

    fn backend(server: &Server) -> OptimizelyBackend {
        OptimizelyBackend::with_api_base(server.url(), TOKEN, PROJECT)
    }

    fn project_query() -> Matcher {
        Matcher::UrlEncoded("project_id".to_string(), PROJECT.to_string())
    }

    #[test]
    fn test_url_is_project_scoped() {
        let backend = OptimizelyBackend::new("token", 42);
        assert_eq!(
            backend.url("/features"),
            "https://api.optimizely.com/v2/features?project_id=42"
        );
        assert_eq!(
            backend.url("/features/7"),
            "https://api.optimizely.com/v2/features/7?project_id=42"
        );
    }

    #[test]
    fn test_custom_api_base_trailing_slash() {
        let backend = OptimizelyBackend::with_api_base("http://localhost:8080/v2/", "t", 1);
        assert_eq!(
            backend.url("/features"),
            "http://localhost:8080/v2/features?project_id=1"
        );
    }

    #[test]
    fn test_list_features_sends_auth_and_project() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/features")
            .match_query(project_query())
            .match_header("authorization", "Bearer fake-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {
                        "key": "search",
                        "id": 11,
                        "archived": false,
                        "environments": {
                            "production": {
                                "id": 3,
                                "is_primary": true,
                                "rollout_rules": [
                                    {"audience_conditions": "everyone", "enabled": true, "percentage_included": 2500}
                                ]
                            }
                        }
                    },
                    {"key": "legacy", "id": 12, "archived": true}
                ])
                .to_string(),
            )
            .create();

        let features = backend(&server).list_features().unwrap();

        mock.assert();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].key, "search");
        assert_eq!(features[0].id, Some(11));
        assert_eq!(
            features[0].environments["production"].rollout_rules[0].percentage_included,
            2500
        );
        assert!(features[1].archived);
    }

    #[test]
    fn test_list_features_rejects_non_2xx() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/features")
            .match_query(project_query())
            .with_status(404)
            .with_body("nope")
            .create();

        let err = backend(&server).list_features().unwrap_err();

        mock.assert();
        match err {
            Error::RemoteRequestFailed { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "nope");
            }
            other => panic!("Expected RemoteRequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_list_environments() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/environments")
            .match_query(project_query())
            .match_header("authorization", "Bearer fake-token")
            .with_status(200)
            .with_body(
                json!([
                    {"key": "production", "id": 1, "name": "Production", "archived": false},
                    {"key": "staging", "id": 2, "archived": true}
                ])
                .to_string(),
            )
            .create();

        let environments = backend(&server).list_environments().unwrap();

        mock.assert();
        assert_eq!(environments.len(), 2);
        assert_eq!(environments[0].key, "production");
        assert_eq!(environments[0].name, "Production");
        assert!(environments[1].archived);
    }

    #[test]
    fn test_get_feature() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/features/11")
            .match_query(project_query())
            .match_header("authorization", "Bearer fake-token")
            .with_status(200)
            .with_body(json!({"key": "search", "id": 11}).to_string())
            .create();

        let feature = backend(&server).get_feature(11).unwrap();

        mock.assert();
        assert_eq!(feature.key, "search");
        assert_eq!(feature.id, Some(11));
    }

    #[test]
    fn test_create_feature_posts_project_and_key() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/features")
            .match_query(project_query())
            .match_header("authorization", "Bearer fake-token")
            .match_body(Matcher::Json(json!({"project_id": PROJECT, "key": "new_page"})))
            .with_status(201)
            .with_body(json!({"key": "new_page", "id": 99}).to_string())
            .create();

        let created = backend(&server).create_feature("new_page").unwrap();

        mock.assert();
        assert_eq!(created.id, Some(99));
    }

    #[test]
    fn test_create_feature_rejects_non_2xx() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/features")
            .match_query(project_query())
            .with_status(400)
            .with_body("key already in use")
            .create();

        let err = backend(&server).create_feature("search").unwrap_err();

        mock.assert();
        assert!(matches!(
            err,
            Error::RemoteRequestFailed { status: 400, ref body } if body == "key already in use"
        ));
    }

    #[test]
    fn test_update_feature_patches_rules() {
        let mut update = FeatureUpdate::default();
        update.environments.insert(
            "production".to_string(),
            EnvironmentUpdate {
                rollout_rules: vec![RolloutRule {
                    audience_conditions: EVERYONE.to_string(),
                    enabled: true,
                    percentage_included: 5000,
                }],
            },
        );

        let mut server = Server::new();
        let mock = server
            .mock("PATCH", "/features/11")
            .match_query(project_query())
            .match_header("authorization", "Bearer fake-token")
            .match_body(Matcher::Json(json!({
                "environments": {
                    "production": {
                        "rollout_rules": [
                            {"audience_conditions": "everyone", "enabled": true, "percentage_included": 5000}
                        ]
                    }
                }
            })))
            .with_status(200)
            .with_body(json!({"key": "search", "id": 11}).to_string())
            .create();

        let updated = backend(&server).update_feature(11, &update).unwrap();

        mock.assert();
        assert_eq!(updated.key, "search");
    }

    #[test]
    fn test_delete_feature_accepts_204() {
        let mut server = Server::new();
        let mock = server
            .mock("DELETE", "/features/5")
            .match_query(project_query())
            .match_header("authorization", "Bearer fake-token")
            .with_status(204)
            .create();

        backend(&server).delete_feature(5).unwrap();

        mock.assert();
    }

    #[test]
    fn test_delete_feature_rejects_other_2xx() {
        let mut server = Server::new();
        let mock = server
            .mock("DELETE", "/features/5")
            .match_query(project_query())
            .with_status(200)
            .with_body("still here")
            .create();

        let err = backend(&server).delete_feature(5).unwrap_err();

        mock.assert();
        match err {
            Error::DeleteFailed { id, body } => {
                assert_eq!(id, 5);
                assert_eq!(body, "still here");
            }
            other => panic!("Expected DeleteFailed, got {other:?}"),
        }
    }
}
