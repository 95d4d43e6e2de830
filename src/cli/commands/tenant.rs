use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::app::Stores;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::tenant::resolve_tenant_id;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "Show which tenant id a request would resolve to")]
    Resolve {
        #[arg(long, help = "Value of the tenant header")]
        header: Option<String>,

        #[arg(long, help = "Value of the Host header")]
        host: Option<String>,
    },

    #[command(about = "Look up a tenant and report whether it is active")]
    Check {
        #[arg(help = "Tenant id")]
        tenant: String,
    },
}

pub async fn handle(cmd: TenantCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();

    match cmd {
        TenantCommands::Resolve { header, host } => {
            let resolved = resolve_tenant_id(
                header.as_deref(),
                host.as_deref(),
                &config.tenant.default_tenant_id,
                &config.tenant.reserved_subdomains,
            );

            match output_format {
                OutputFormat::Json => output_success(
                    output_format,
                    "Tenant resolved",
                    Some(json!({ "tenantId": resolved, "header": config.tenant.header_name })),
                ),
                OutputFormat::Text => {
                    println!("{}", resolved.as_deref().unwrap_or("(none)"));
                    Ok(())
                }
            }
        }
        TenantCommands::Check { tenant } => {
            let stores = Stores::from_config(&config.database)
                .await
                .context("failed to open tenant directory")?;
            let found = stores
                .tenants
                .find_by_id(&tenant)
                .await
                .context("tenant lookup failed")?;

            let Some(found) = found else {
                output_error(output_format, &format!("Tenant {} not found", tenant), Some("NOT_FOUND"))?;
                anyhow::bail!("tenant not found");
            };

            match output_format {
                OutputFormat::Json => output_success(output_format, "Tenant found", Some(json!({ "tenant": found }))),
                OutputFormat::Text => {
                    print_fields(&[
                        ("id", found.id),
                        ("name", found.name),
                        ("subdomain", found.subdomain),
                        ("active", found.is_active.to_string()),
                    ]);
                    Ok(())
                }
            }
        }
    }
}
