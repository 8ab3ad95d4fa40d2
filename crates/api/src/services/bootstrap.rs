//! Startup bootstrap: default roles and the root account.
//!
//! Both steps run after migrations on every startup and are idempotent. The
//! role seeding is intentionally coarse: if any live role exists the whole
//! step is skipped, so a partially customized hierarchy is never overwritten.

use std::collections::HashMap;

use serde_json::json;
use shared::password::{hash_password, PasswordError};
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::role::{
    NewRole, Role, DEFAULT_ROLES, PLAYER_ROLE_NAME, ROOT_ROLE_NAME,
};
use domain::models::user::{NewUser, User, UserStatus};
use domain::Error;
use persistence::repositories::{RoleRepository, UserRepository};
use persistence::store::Store;

use crate::config::RootAccountConfig;

/// Error types for startup bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Domain(#[from] domain::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// Seeds the default role hierarchy into an empty store.
///
/// Roles are created in two passes: first every default role with an empty
/// descendant set, then descendants are resolved from names to the freshly
/// assigned ids. This keeps the seed order-independent.
pub async fn seed_default_roles<S: Store<Role>>(repo: &RoleRepository<S>) -> domain::Result<()> {
    if repo.any_exist().await? {
        info!("Roles already present - skipping default role seeding");
        return Ok(());
    }

    for default in DEFAULT_ROLES {
        repo.create(NewRole {
            name: default.name.to_string(),
            status: default.status,
            descendants: Vec::new(),
        })
        .await?;
    }

    let mut ids: HashMap<&str, Uuid> = HashMap::new();
    for default in DEFAULT_ROLES {
        let role = repo.find_by_name(default.name).await?.ok_or_else(|| {
            Error::Storage(format!(
                "Seeded role \"{}\" disappeared during bootstrap",
                default.name
            ))
        })?;
        ids.insert(default.name, role.id);
    }

    for default in DEFAULT_ROLES {
        if default.name == PLAYER_ROLE_NAME {
            if !default.descendants.is_empty() {
                warn!("Default player role declares descendants - ignoring them");
            }
            continue;
        }
        if default.descendants.is_empty() {
            continue;
        }

        let descendants: Vec<Uuid> = default
            .descendants
            .iter()
            .filter_map(|name| ids.get(name).copied())
            .collect();

        repo.update(
            ids[default.name],
            json!({ "name": default.name, "descendants": descendants }),
        )
        .await?;
    }

    info!("Seeded {} default roles", DEFAULT_ROLES.len());
    Ok(())
}

/// Creates the root account if configured and not already present.
pub async fn ensure_root_user<R: Store<Role>, U: Store<User>>(
    roles: &RoleRepository<R>,
    users: &UserRepository<U>,
    config: &RootAccountConfig,
) -> Result<(), BootstrapError> {
    if config.username.is_empty() {
        return Ok(());
    }

    if config.password.is_empty() {
        warn!(
            "AR__ROOT_ACCOUNT__USERNAME is set but AR__ROOT_ACCOUNT__PASSWORD is empty - skipping root account bootstrap"
        );
        return Ok(());
    }

    if users.find_by_username(&config.username).await?.is_some() {
        info!("Root account already exists - skipping bootstrap");
        return Ok(());
    }

    let root_role = roles.find_by_name(ROOT_ROLE_NAME).await?.ok_or_else(|| {
        Error::NotFound(format!(
            "The \"{ROOT_ROLE_NAME}\" role must exist before the root account can be created"
        ))
    })?;

    let password_hash = hash_password(&config.password)?;

    let user = users
        .create(NewUser {
            username: config.username.clone(),
            password_hash,
            role: root_role.id,
            status: UserStatus::Active,
            balance: 0,
        })
        .await?;

    info!(
        username = %user.username,
        user_id = %user.id,
        "Root account created"
    );

    Ok(())
}
