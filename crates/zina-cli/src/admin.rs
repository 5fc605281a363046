//! Admin account management. Accounts are identified by the auth provider's
//! user id (the `sub` claim of their session token).

use clap::Subcommand;
use uuid::Uuid;

#[derive(Debug, Subcommand)]
pub enum AdminCommands {
    /// Grant (or reactivate) back-office access for an account
    Grant {
        /// Auth provider user id
        #[arg(long)]
        user_id: Uuid,
        /// Account email, stored when the user row does not exist yet
        #[arg(long)]
        email: String,
        /// Display name shown in the back office
        #[arg(long)]
        name: String,
    },
    /// Revoke back-office access
    Revoke {
        #[arg(long)]
        user_id: Uuid,
    },
}

pub(crate) async fn run_admin_command(
    pool: &sqlx::PgPool,
    command: AdminCommands,
) -> anyhow::Result<()> {
    match command {
        AdminCommands::Grant {
            user_id,
            email,
            name,
        } => {
            let name = name.trim();
            anyhow::ensure!(!name.is_empty(), "--name must not be blank");
            let admin = zina_db::grant_admin(pool, user_id, email.trim(), name).await?;
            tracing::info!(admin_id = admin.id, %user_id, "admin granted");
            println!("admin {} active for {user_id}", admin.full_name);
        }
        AdminCommands::Revoke { user_id } => {
            if zina_db::deactivate_admin(pool, user_id).await? {
                tracing::info!(%user_id, "admin revoked");
                println!("admin access revoked for {user_id}");
            } else {
                anyhow::bail!("{user_id} is not an admin");
            }
        }
    }
    Ok(())
}
