use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{issue_token, IdentityClaims, RequestAuthenticator};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint an access token signed with JWT_SECRET")]
    Issue {
        #[arg(long, help = "User id (sub claim)")]
        user: String,

        #[arg(long, help = "User email")]
        email: String,

        #[arg(long, default_value = "1", help = "Tenant id (tenantId claim)")]
        tenant: String,

        #[arg(long = "role", default_value = "user", help = "Role, may be repeated")]
        roles: Vec<String>,

        #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Verify a token against JWT_SECRET and print its claims")]
    Verify {
        #[arg(help = "Encoded token")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();

    match cmd {
        TokenCommands::Issue {
            user,
            email,
            tenant,
            roles,
            hours,
        } => {
            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let claims = IdentityClaims::new(user, email, tenant, roles, hours);
            let token = issue_token(&claims, &config.security.jwt_secret).context("failed to sign token")?;

            match output_format {
                OutputFormat::Json => output_success(
                    output_format,
                    "Token issued",
                    Some(json!({ "token": token, "claims": claims })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::Verify { token } => {
            let authenticator = RequestAuthenticator::with_hs256(&config.security.jwt_secret)
                .with_leeway(config.security.jwt_leeway_secs);
            let header = format!("Bearer {}", token);

            match authenticator.authenticate(Some(&header)) {
                Ok(claims) => match output_format {
                    OutputFormat::Json => output_success(output_format, "Token valid", Some(json!({ "claims": claims }))),
                    OutputFormat::Text => {
                        print_fields(&[
                            ("sub", claims.sub),
                            ("email", claims.email),
                            ("tenantId", claims.tenant_id),
                            ("roles", claims.roles.join(",")),
                            ("exp", claims.exp.to_string()),
                        ]);
                        Ok(())
                    }
                },
                Err(rejection) => {
                    output_error(output_format, &rejection.to_string(), Some(rejection.kind()))?;
                    anyhow::bail!("token rejected")
                }
            }
        }
    }
}
