//! Command-line interface.

use crate::error::AdminError;
use clap::{ArgGroup, Args, Parser, Subcommand};
use open_console_core::SubjectId;
use open_console_iam::{
    AuthorizationGateway, IamError, RoleSyncService, ZitadelClient, ZitadelConfig,
};
use open_console_platform_access::{CallerContext, ClaimsBag, OidcConfig, Role, RoleSet};
use rootcause::prelude::Report;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Manage Open Console roles in the identity provider.
#[derive(Debug, Parser)]
#[command(name = "role-admin", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Admin(AdminCommand),

    /// Show the roles carried by a caller's token claims.
    Me(MeArgs),
}

/// Commands that act on the identity provider.
#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommand {
    /// Grant roles to a user, keeping the roles they already hold.
    Assign {
        /// The user's email address.
        email: String,
        /// Role to grant; repeat for several.
        #[arg(short, long = "role", required = true)]
        roles: Vec<Role>,
    },

    /// Revoke a role from a user.
    Remove {
        /// The user's email address.
        email: String,
        /// Role to revoke.
        #[arg(short, long)]
        role: Role,
    },

    /// List the roles granted to a user.
    List {
        /// The user's email address.
        email: String,
    },

    /// Look up the email address and roles of a subject.
    Whois {
        /// The identity provider's user id.
        subject: SubjectId,
    },
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["claims", "token"])))]
pub struct MeArgs {
    /// JSON file holding the token's claims.
    #[arg(long)]
    pub claims: Option<PathBuf>,

    /// Compact JWT, already verified by whoever issued it to you.
    #[arg(long)]
    pub token: Option<String>,

    /// Fail unless the caller holds at least one of these roles.
    #[arg(long = "require")]
    pub require: Vec<Role>,
}

/// What every command prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectId>,
    pub roles: RoleSet,
}

/// Builds the role service on top of the Zitadel client.
///
/// # Errors
///
/// Returns `Iam` if the HTTP client cannot be built.
pub fn build_service(
    zitadel: &ZitadelConfig,
    oidc: &OidcConfig,
) -> Result<RoleSyncService, AdminError> {
    let client = ZitadelClient::new(zitadel)
        .map_err(|report| AdminError::from(report.current_context().clone()))?;
    let client = Arc::new(client);
    Ok(RoleSyncService::new(
        AuthorizationGateway::new(client.clone()),
        client,
        oidc.claims_extractor(),
    ))
}

/// Runs an identity provider command and reports the resulting roles.
///
/// # Errors
///
/// Returns the service's errors unchanged.
pub async fn run_admin(
    service: &RoleSyncService,
    command: AdminCommand,
) -> Result<RoleReport, Report<IamError>> {
    match command {
        AdminCommand::Assign { email, roles } => {
            service.assign_roles(&email, &roles).await?;
            info!(%email, "assigned roles");
            report_for_email(service, email).await
        }
        AdminCommand::Remove { email, role } => {
            service.remove_role(&email, role).await?;
            info!(%email, %role, "removed role");
            report_for_email(service, email).await
        }
        AdminCommand::List { email } => report_for_email(service, email).await,
        AdminCommand::Whois { subject } => {
            let email = service.get_user_email(&subject).await?;
            let roles = service.gateway().get_user_roles(&subject).await?;
            Ok(RoleReport {
                email: Some(email),
                subject: Some(subject),
                roles,
            })
        }
    }
}

async fn report_for_email(
    service: &RoleSyncService,
    email: String,
) -> Result<RoleReport, Report<IamError>> {
    let roles = service.get_user_roles(&email).await?;
    Ok(RoleReport {
        email: Some(email),
        subject: None,
        roles,
    })
}

/// Reports the caller described by a claims file or token. No network.
///
/// # Errors
///
/// Returns `ClaimsInput` if the claims cannot be read, `Authentication` if
/// they do not identify a caller, and `Authorization` if a required role is
/// missing.
pub fn inspect_caller(oidc: &OidcConfig, args: &MeArgs) -> Result<RoleReport, AdminError> {
    let caller = match (&args.claims, &args.token) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(path).map_err(|e| AdminError::ClaimsInput {
                details: format!("{}: {e}", path.display()),
            })?;
            let claims: ClaimsBag =
                serde_json::from_str(&raw).map_err(|e| AdminError::ClaimsInput {
                    details: format!("{}: {e}", path.display()),
                })?;
            CallerContext::from_claims(claims, oidc)?
        }
        (None, Some(token)) => CallerContext::from_token(token, oidc)?,
        (None, None) => {
            return Err(AdminError::ClaimsInput {
                details: "either --claims or --token is required".to_string(),
            });
        }
    };

    let identity = caller.identity(&oidc.claims_extractor());
    if !args.require.is_empty() {
        identity.require_any_role(&args.require)?;
    }

    Ok(RoleReport {
        email: identity.email,
        subject: Some(identity.subject),
        roles: identity.roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use open_console_iam::InMemoryIam;
    use std::io::Write;

    fn subject(id: &str) -> SubjectId {
        SubjectId::new(id).expect("valid id")
    }

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).expect("parse").command
    }

    fn in_memory_service() -> (Arc<InMemoryIam>, RoleSyncService) {
        let iam = Arc::new(InMemoryIam::new().with_user("alice@example.com", subject("u1")));
        let service = RoleSyncService::new(
            AuthorizationGateway::new(iam.clone()),
            iam.clone(),
            OidcConfig::default().claims_extractor(),
        );
        (iam, service)
    }

    fn me(claims: Option<PathBuf>, token: Option<String>, require: Vec<Role>) -> MeArgs {
        MeArgs {
            claims,
            token,
            require,
        }
    }

    #[test]
    fn parses_assign_with_repeated_roles() {
        let command = parse(&[
            "role-admin",
            "assign",
            "alice@example.com",
            "--role",
            "admin",
            "-r",
            "USERA",
        ]);
        match command {
            Command::Admin(AdminCommand::Assign { email, roles }) => {
                assert_eq!(email, "alice@example.com");
                assert_eq!(roles, vec![Role::Admin, Role::UserA]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_role() {
        let result =
            Cli::try_parse_from(["role-admin", "remove", "a@example.com", "--role", "root"]);
        assert!(result.is_err());
    }

    #[test]
    fn assign_requires_a_role() {
        let result = Cli::try_parse_from(["role-admin", "assign", "a@example.com"]);
        assert!(result.is_err());
    }

    #[test]
    fn me_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["role-admin", "me"]).is_err());
        assert!(
            Cli::try_parse_from(["role-admin", "me", "--claims", "c.json", "--token", "a.b.c"])
                .is_err()
        );

        match parse(&["role-admin", "me", "--token", "a.b.c", "--require", "admin"]) {
            Command::Me(args) => {
                assert_eq!(args.token.as_deref(), Some("a.b.c"));
                assert_eq!(args.require, vec![Role::Admin]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn whois_rejects_blank_subject() {
        assert!(Cli::try_parse_from(["role-admin", "whois", " "]).is_err());
    }

    #[tokio::test]
    async fn assign_then_list() {
        let (_iam, service) = in_memory_service();

        let report = run_admin(
            &service,
            AdminCommand::Assign {
                email: "alice@example.com".to_string(),
                roles: vec![Role::UserA, Role::Admin],
            },
        )
        .await
        .expect("assign");
        assert_eq!(report.roles.roles(), &[Role::UserA, Role::Admin]);

        let report = run_admin(
            &service,
            AdminCommand::List {
                email: "alice@example.com".to_string(),
            },
        )
        .await
        .expect("list");
        assert_eq!(
            serde_json::to_value(&report).expect("serialize"),
            serde_json::json!({"email": "alice@example.com", "roles": ["userA", "admin"]})
        );
    }

    #[tokio::test]
    async fn remove_reports_remaining_roles() {
        let (iam, service) = in_memory_service();
        iam.seed_grant(&subject("u1"), &["admin", "userB"]).expect("seed");

        let report = run_admin(
            &service,
            AdminCommand::Remove {
                email: "alice@example.com".to_string(),
                role: Role::Admin,
            },
        )
        .await
        .expect("remove");
        assert_eq!(report.roles.roles(), &[Role::UserB]);
    }

    #[tokio::test]
    async fn whois_reports_email_and_roles() {
        let (iam, service) = in_memory_service();
        iam.seed_grant(&subject("u1"), &["user"]).expect("seed");

        let report = run_admin(&service, AdminCommand::Whois { subject: subject("u1") })
            .await
            .expect("whois");
        assert_eq!(
            report,
            RoleReport {
                email: Some("alice@example.com".to_string()),
                subject: Some(subject("u1")),
                roles: [Role::User].into_iter().collect(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_user_maps_to_not_found_exit_code() {
        let (_iam, service) = in_memory_service();

        let report = run_admin(
            &service,
            AdminCommand::List {
                email: "bob@example.com".to_string(),
            },
        )
        .await
        .unwrap_err();

        let err = AdminError::from(report.current_context().clone());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn inspect_caller_from_claims_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        let claims = serde_json::json!({
            "sub": "u1",
            "email": "alice@example.com",
            "roles": ["userA"],
            "urn:zitadel:iam:org:project:roles": {"admin": {}}
        });
        write!(file, "{claims}").expect("write");

        let report = inspect_caller(
            &OidcConfig::default(),
            &me(Some(file.path().to_path_buf()), None, vec![Role::Admin]),
        )
        .expect("report");

        assert_eq!(report.email.as_deref(), Some("alice@example.com"));
        assert_eq!(report.subject, Some(subject("u1")));
        assert_eq!(report.roles.roles(), &[Role::UserA, Role::Admin]);
    }

    #[test]
    fn inspect_caller_from_token() {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let token = format!(
            "{}.{}.sig",
            engine.encode(r#"{"alg":"none"}"#),
            engine.encode(
                r#"{"sub":"u2","preferred_username":"bob@example.com","roles":["userC"]}"#
            )
        );

        let report = inspect_caller(&OidcConfig::default(), &me(None, Some(token), Vec::new()))
            .expect("report");
        assert_eq!(report.email.as_deref(), Some("bob@example.com"));
        assert_eq!(report.roles.roles(), &[Role::UserC]);
    }

    #[test]
    fn inspect_caller_enforces_required_roles() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"sub": "u1", "roles": ["user"]}}"#).expect("write");

        let err = inspect_caller(
            &OidcConfig::default(),
            &me(Some(file.path().to_path_buf()), None, vec![Role::Admin]),
        )
        .unwrap_err();
        assert!(matches!(err, AdminError::Authorization(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn inspect_caller_reports_bad_input() {
        let missing = inspect_caller(
            &OidcConfig::default(),
            &me(Some(PathBuf::from("/nonexistent/claims.json")), None, Vec::new()),
        )
        .unwrap_err();
        assert!(matches!(missing, AdminError::ClaimsInput { .. }));

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"email": "a@example.com"}}"#).expect("write");
        let no_subject = inspect_caller(
            &OidcConfig::default(),
            &me(Some(file.path().to_path_buf()), None, Vec::new()),
        )
        .unwrap_err();
        assert!(matches!(no_subject, AdminError::Authentication(_)));
    }
}
