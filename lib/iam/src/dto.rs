//! Wire types for the Zitadel Authorization v2 and User v2 APIs.
//!
//! Field names follow the Connect/JSON mapping (camelCase). Responses accept
//! missing fields, since the API omits empty values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateAuthorizationRequest<'a> {
    pub user_id: &'a str,
    pub project_id: &'a str,
    pub organization_id: &'a str,
    pub role_keys: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct CreateAuthorizationResponse {
    pub id: String,
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateAuthorizationRequest<'a> {
    pub id: &'a str,
    pub role_keys: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct UpdateAuthorizationResponse {
    pub change_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteAuthorizationRequest<'a> {
    pub id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DeleteAuthorizationResponse {
    pub deletion_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListAuthorizationsRequest<'a> {
    pub pagination: Pagination,
    pub sorting_column: &'static str,
    pub filters: Vec<AuthorizationFilter<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Pagination {
    pub limit: u32,
    pub asc: bool,
}

/// One search filter; the API ANDs the set fields.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorizationFilter<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_user_ids: Option<IdsFilter<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<IdFilter<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<IdFilter<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdsFilter<'a> {
    pub ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdFilter<'a> {
    pub id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListAuthorizationsResponse {
    pub authorizations: Vec<AuthorizationDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct AuthorizationDto {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub organization_id: String,
    pub role_keys: Vec<String>,
    pub state: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub change_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListUsersRequest<'a> {
    pub query: ListQuery,
    pub queries: Vec<UserSearchQuery<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListQuery {
    pub offset: u32,
    pub limit: u32,
    pub asc: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserSearchQuery<'a> {
    pub email_query: EmailQuery<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmailQuery<'a> {
    pub email_address: &'a str,
    pub method: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListUsersResponse {
    pub result: Vec<UserDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GetUserResponse {
    pub user: Option<UserDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct UserDto {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub human: Option<HumanDto>,
}

impl UserDto {
    /// The user's id; older responses carry it as `userId`.
    pub fn subject(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.user_id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.human
            .as_ref()
            .and_then(|human| human.email.as_ref())
            .and_then(|email| email.email.as_deref())
            .filter(|email| !email.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct HumanDto {
    pub email: Option<EmailDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EmailDto {
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_request_shape() {
        let request = ListAuthorizationsRequest {
            pagination: Pagination {
                limit: 100,
                asc: true,
            },
            sorting_column: "AUTHORIZATION_FIELD_NAME_UNSPECIFIED",
            filters: vec![
                AuthorizationFilter {
                    in_user_ids: Some(IdsFilter { ids: vec!["u1"] }),
                    project_id: Some(IdFilter { id: "p1" }),
                    ..Default::default()
                },
                AuthorizationFilter {
                    organization_id: Some(IdFilter { id: "o1" }),
                    ..Default::default()
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({
                "pagination": {"limit": 100, "asc": true},
                "sortingColumn": "AUTHORIZATION_FIELD_NAME_UNSPECIFIED",
                "filters": [
                    {"inUserIds": {"ids": ["u1"]}, "projectId": {"id": "p1"}},
                    {"organizationId": {"id": "o1"}}
                ]
            })
        );
    }

    #[test]
    fn list_response_tolerates_missing_fields() {
        let response: ListAuthorizationsResponse = serde_json::from_value(json!({
            "pagination": {"totalResult": "1"},
            "authorizations": [{
                "id": "g1",
                "userId": "u1",
                "roleKeys": ["admin"],
                "state": "AUTHORIZATION_STATE_ACTIVE",
                "creationDate": "2025-01-15T08:30:00.123456Z"
            }]
        }))
        .expect("deserialize");

        let grant = &response.authorizations[0];
        assert_eq!(grant.id, "g1");
        assert_eq!(grant.role_keys, vec!["admin"]);
        assert!(grant.creation_date.is_some());
        assert!(grant.change_date.is_none());

        let empty: ListAuthorizationsResponse =
            serde_json::from_value(json!({})).expect("deserialize");
        assert!(empty.authorizations.is_empty());
    }

    #[test]
    fn user_subject_prefers_id() {
        let user: UserDto =
            serde_json::from_value(json!({"id": "a", "userId": "b"})).expect("deserialize");
        assert_eq!(user.subject(), Some("a"));

        let user: UserDto = serde_json::from_value(json!({"userId": "b"})).expect("deserialize");
        assert_eq!(user.subject(), Some("b"));

        let user: UserDto = serde_json::from_value(json!({"id": ""})).expect("deserialize");
        assert_eq!(user.subject(), None);
    }

    #[test]
    fn user_email_is_nested_under_human() {
        let user: UserDto = serde_json::from_value(json!({
            "userId": "u1",
            "human": {"email": {"email": "alice@example.com", "isVerified": true}}
        }))
        .expect("deserialize");
        assert_eq!(user.email(), Some("alice@example.com"));

        let machine: UserDto =
            serde_json::from_value(json!({"userId": "u2", "machine": {}})).expect("deserialize");
        assert_eq!(machine.email(), None);
    }
}
