//! CLI handlers for `regimen org` and `regimen user`.

use anyhow::Result;
use sqlx::PgPool;

use regimen_db::queries::directory;

use crate::resolve::resolve_organization_id;
use crate::{OrgCommands, UserCommands};

pub async fn run_org_command(command: OrgCommands, pool: &PgPool) -> Result<()> {
    match command {
        OrgCommands::Add { name } => {
            let org = directory::insert_organization(pool, &name).await?;
            println!("Organization created.");
            println!("  ID:   {}", org.id);
            println!("  Name: {}", org.name);
            Ok(())
        }
    }
}

pub async fn run_user_command(command: UserCommands, pool: &PgPool) -> Result<()> {
    match command {
        UserCommands::Add {
            name,
            email,
            organization,
        } => {
            let organization_id = match organization.as_deref() {
                Some(input) => Some(resolve_organization_id(pool, input).await?),
                None => None,
            };
            let user = directory::insert_user(pool, &name, &email, organization_id).await?;
            println!("User created.");
            println!("  ID:           {}", user.id);
            println!("  Name:         {}", user.name);
            println!("  Email:        {}", user.email);
            if let Some(org) = user.organization_id {
                println!("  Organization: {org}");
            }
            Ok(())
        }
    }
}
