//! Session commands - login, logout, whoami.

use anyhow::{Result, bail};
use clap::Args;
use safeconsole_core::{AccountStatus, Role, SubscriptionTier, UserIdentity};

use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
///
/// The identity and token come from the backend's login flow; this command
/// only stores them.
#[derive(Args)]
pub struct LoginArgs {
    /// Backend user id.
    #[arg(long)]
    pub id: String,

    /// Display name.
    #[arg(long)]
    pub name: String,

    /// Email address.
    #[arg(long)]
    pub email: String,

    /// Role (admin, safety_manager, supervisor, auditor, employee, viewer).
    #[arg(long, default_value = "employee")]
    pub role: Role,

    /// Bearer token issued by the backend.
    #[arg(long, env = "SAFECONSOLE_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Organization name.
    #[arg(long)]
    pub organization: Option<String>,

    /// Subscription tier (free, basic, professional, enterprise).
    #[arg(long)]
    pub tier: Option<SubscriptionTier>,

    /// Account status (active, pending, suspended, inactive).
    #[arg(long)]
    pub status: Option<AccountStatus>,
}

impl LoginArgs {
    fn identity(&self) -> UserIdentity {
        let mut user = UserIdentity::new(&self.id, &self.name, &self.email, self.role);
        if let Some(org) = &self.organization {
            user = user.with_organization(org);
        }
        if let Some(tier) = self.tier {
            user = user.with_tier(tier);
        }
        if let Some(status) = self.status {
            user = user.with_status(status);
        }
        user
    }
}

/// Runs the login command.
pub async fn login(args: &LoginArgs, cli: &Cli) -> Result<()> {
    if args.token.trim().is_empty() {
        bail!("token must not be empty");
    }

    let ctx = AppContext::build(cli).await?;
    ctx.session.login(args.identity(), args.token.trim()).await;
    print_session(&ctx, cli)
}

/// Runs the logout command.
pub async fn logout(cli: &Cli) -> Result<()> {
    let ctx = AppContext::build(cli).await?;
    ctx.session.logout().await;
    print_session(&ctx, cli)
}

/// Runs the whoami command.
pub async fn whoami(cli: &Cli) -> Result<()> {
    let ctx = AppContext::build(cli).await?;
    print_session(&ctx, cli)
}

fn print_session(ctx: &AppContext, cli: &Cli) -> Result<()> {
    let session = ctx.session.session();
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_session(&session));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_session(&session)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        login: LoginArgs,
    }

    #[test]
    fn test_login_args_build_identity() {
        let harness = Harness::try_parse_from([
            "test",
            "--id",
            "u-1",
            "--name",
            "Alice",
            "--email",
            "alice@example.com",
            "--role",
            "safety-manager",
            "--token",
            "t0k",
            "--tier",
            "enterprise",
        ])
        .unwrap();

        let user = harness.login.identity();
        assert_eq!(user.role, Role::SafetyManager);
        assert_eq!(user.subscription_tier, SubscriptionTier::Enterprise);
        assert_eq!(user.status, AccountStatus::Active);
        assert!(user.organization.is_none());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = Harness::try_parse_from([
            "test", "--id", "u-1", "--name", "A", "--email", "a@b.c", "--role", "janitor",
            "--token", "t",
        ]);
        assert!(result.is_err());
    }
}
