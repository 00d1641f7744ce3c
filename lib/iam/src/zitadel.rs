//! Zitadel management API client.
//!
//! Speaks Connect/JSON to the Authorization v2 service and plain JSON to the
//! User v2 REST endpoints, authenticating with a service user's personal
//! access token.

use crate::dto::{
    AuthorizationDto, AuthorizationFilter, CreateAuthorizationRequest,
    CreateAuthorizationResponse, DeleteAuthorizationRequest, DeleteAuthorizationResponse,
    EmailQuery, GetUserResponse, IdFilter, IdsFilter, ListAuthorizationsRequest,
    ListAuthorizationsResponse, ListQuery, ListUsersRequest, ListUsersResponse, Pagination,
    UpdateAuthorizationRequest, UpdateAuthorizationResponse, UserSearchQuery,
};
use crate::error::IamError;
use crate::store::{AuthorizationStore, IdentityDirectory};
use crate::types::{AuthorizationScope, Grant, GrantState};
use async_trait::async_trait;
use open_console_core::{GrantId, SubjectId};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument, warn};

const AUTHORIZATION_SERVICE: &str = "zitadel.authorization.v2.AuthorizationService";

/// Connection settings for a Zitadel instance.
///
/// The API token is never printed by `Debug`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ZitadelConfig {
    /// Instance domain (e.g., "idp.example.com"). A leading `http://` or
    /// `https://` is kept as given; otherwise `https://` is assumed.
    domain: String,
    /// Organization owning the project and its users.
    organization_id: String,
    /// Project whose roles are granted.
    project_id: String,
    /// Personal access token of the service user.
    api_token: String,
    /// Page size for list calls.
    /// Default: 100
    #[serde(default = "default_list_limit")]
    list_limit: u32,
}

fn default_list_limit() -> u32 {
    100
}

impl fmt::Debug for ZitadelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZitadelConfig")
            .field("domain", &self.domain)
            .field("organization_id", &self.organization_id)
            .field("project_id", &self.project_id)
            .field("api_token", &"[redacted]")
            .field("list_limit", &self.list_limit)
            .finish()
    }
}

impl ZitadelConfig {
    /// Creates a configuration with the default page size.
    #[must_use]
    pub fn new(
        domain: String,
        organization_id: String,
        project_id: String,
        api_token: String,
    ) -> Self {
        Self {
            domain,
            organization_id,
            project_id,
            api_token,
            list_limit: default_list_limit(),
        }
    }

    /// Sets the page size for list calls.
    #[must_use]
    pub fn with_list_limit(mut self, list_limit: u32) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// Returns the base URL of the instance, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    /// Returns the organization id.
    #[must_use]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Returns the project id.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the page size for list calls.
    #[must_use]
    pub fn list_limit(&self) -> u32 {
        self.list_limit
    }

    /// Returns the scope all grants live in.
    #[must_use]
    pub fn scope(&self) -> AuthorizationScope {
        AuthorizationScope::new(&self.organization_id, &self.project_id)
    }
}

/// HTTP client for one Zitadel organization and project.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ZitadelClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    api_token: String,
    scope: AuthorizationScope,
    list_limit: u32,
}

impl fmt::Debug for ZitadelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZitadelClient")
            .field("base_url", &self.base_url.as_str())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ZitadelClient {
    /// Creates a client for the configured instance.
    ///
    /// # Errors
    ///
    /// Returns `TransportFailure` if the domain does not form a URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &ZitadelConfig) -> Result<Self, Report<IamError>> {
        let base_url = config.base_url();
        let base_url = reqwest::Url::parse(&base_url)
            .map_err(|e| IamError::transport(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(IamError::transport(format!("invalid base URL {base_url}")).into());
        }

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| IamError::transport(format!("HTTP client error: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_token: config.api_token.clone(),
            scope: config.scope(),
            list_limit: config.list_limit,
        })
    }

    /// Returns the scope this client grants roles in.
    #[must_use]
    pub fn scope(&self) -> &AuthorizationScope {
        &self.scope
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, IamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| IamError::transport(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, IamError> {
        let request = self
            .http
            .request(method, self.endpoint(segments)?)
            .bearer_auth(&self.api_token)
            .header("x-zitadel-orgid", &self.scope.organization_id)
            .header("Connect-Protocol-Version", "1");
        Ok(request)
    }

    async fn authorization_call<B, R>(
        &self,
        method: &str,
        body: &B,
        resource: &str,
    ) -> Result<R, IamError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .request(reqwest::Method::POST, &[AUTHORIZATION_SERVICE, method])?
            .json(body);
        self.send(request, resource).await
    }

    async fn send<R>(&self, request: reqwest::RequestBuilder, resource: &str) -> Result<R, IamError>
    where
        R: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|e| IamError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), %body, "identity provider rejected request");
            return Err(IamError::from_status(status.as_u16(), resource, body));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| IamError::TransportFailure {
                status: Some(status.as_u16()),
                details: format!("failed to decode response: {e}"),
            })
    }
}

fn grant_from_dto(requested: &SubjectId, dto: AuthorizationDto) -> Option<Grant> {
    let id = match GrantId::new(dto.id) {
        Ok(id) => id,
        Err(e) => {
            warn!(subject = %requested, error = %e, "skipping grant without id");
            return None;
        }
    };
    let subject = SubjectId::new(dto.user_id).unwrap_or_else(|_| requested.clone());

    debug!(
        grant = %id,
        project = %dto.project_id,
        organization = %dto.organization_id,
        created = ?dto.creation_date,
        changed = ?dto.change_date,
        "grant listed"
    );

    Some(Grant {
        id,
        subject,
        role_keys: dto.role_keys,
        state: GrantState::from_wire(&dto.state),
    })
}

#[async_trait]
impl AuthorizationStore for ZitadelClient {
    #[instrument(skip(self))]
    async fn create_grant(
        &self,
        subject: &SubjectId,
        role_keys: &[String],
    ) -> Result<GrantId, IamError> {
        let body = CreateAuthorizationRequest {
            user_id: subject.as_str(),
            project_id: &self.scope.project_id,
            organization_id: &self.scope.organization_id,
            role_keys,
        };

        let response: CreateAuthorizationResponse = self
            .authorization_call("CreateAuthorization", &body, &format!("user {subject}"))
            .await?;

        let id = GrantId::new(response.id).map_err(|e| IamError::TransportFailure {
            status: None,
            details: format!("create response carried no grant id: {e}"),
        })?;

        debug!(grant = %id, created = ?response.creation_date, "grant created");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn update_grant(&self, grant: &GrantId, role_keys: &[String]) -> Result<(), IamError> {
        let body = UpdateAuthorizationRequest {
            id: grant.as_str(),
            role_keys,
        };

        let response: UpdateAuthorizationResponse = self
            .authorization_call("UpdateAuthorization", &body, &format!("grant {grant}"))
            .await?;

        debug!(changed = ?response.change_date, "grant updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_grants(&self, subject: &SubjectId) -> Result<Vec<Grant>, IamError> {
        let body = ListAuthorizationsRequest {
            pagination: Pagination {
                limit: self.list_limit,
                asc: true,
            },
            sorting_column: "AUTHORIZATION_FIELD_NAME_UNSPECIFIED",
            filters: vec![
                AuthorizationFilter {
                    in_user_ids: Some(IdsFilter {
                        ids: vec![subject.as_str()],
                    }),
                    project_id: Some(IdFilter {
                        id: &self.scope.project_id,
                    }),
                    ..Default::default()
                },
                AuthorizationFilter {
                    organization_id: Some(IdFilter {
                        id: &self.scope.organization_id,
                    }),
                    ..Default::default()
                },
            ],
        };

        let response: ListAuthorizationsResponse = self
            .authorization_call("ListAuthorizations", &body, &format!("grants of {subject}"))
            .await?;

        let grants: Vec<Grant> = response
            .authorizations
            .into_iter()
            .filter_map(|dto| grant_from_dto(subject, dto))
            .collect();

        debug!(count = grants.len(), "grants listed");
        Ok(grants)
    }

    #[instrument(skip(self))]
    async fn delete_grant(&self, grant: &GrantId) -> Result<(), IamError> {
        let body = DeleteAuthorizationRequest { id: grant.as_str() };

        let response: DeleteAuthorizationResponse = self
            .authorization_call("DeleteAuthorization", &body, &format!("grant {grant}"))
            .await?;

        debug!(deleted = ?response.deletion_date, "grant deleted");
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for ZitadelClient {
    #[instrument(skip(self))]
    async fn subject_by_email(&self, email: &str) -> Result<SubjectId, IamError> {
        let body = ListUsersRequest {
            query: ListQuery {
                offset: 0,
                limit: self.list_limit,
                asc: true,
            },
            queries: vec![UserSearchQuery {
                email_query: EmailQuery {
                    email_address: email,
                    method: "TEXT_QUERY_METHOD_EQUALS",
                },
            }],
        };

        let resource = format!("user with email {email}");
        let request = self
            .request(reqwest::Method::POST, &["v2", "users"])?
            .json(&body);
        let response: ListUsersResponse = self.send(request, &resource).await?;

        let subject = response
            .result
            .first()
            .and_then(|user| user.subject())
            .and_then(|id| SubjectId::new(id).ok())
            .ok_or_else(|| IamError::not_found(resource))?;

        debug!(subject = %subject, "user resolved");
        Ok(subject)
    }

    #[instrument(skip(self))]
    async fn email_by_subject(&self, subject: &SubjectId) -> Result<String, IamError> {
        let resource = format!("user {subject}");
        // Dot segments are dropped from URL paths, so they cannot name a user.
        if matches!(subject.as_str(), "." | "..") {
            return Err(IamError::not_found(resource));
        }
        let request = self.request(reqwest::Method::GET, &["v2", "users", subject.as_str()])?;
        let response: GetUserResponse = self.send(request, &resource).await?;

        response
            .user
            .as_ref()
            .and_then(|user| user.email())
            .map(str::to_string)
            .ok_or_else(|| IamError::not_found(format!("email of {resource}")))
    }
}
