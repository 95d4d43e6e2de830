use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{hash_password, validate_roles, Email, User, UserHandlers, DEFAULT_ROLE, MIN_PASSWORD_LEN};
use crate::cqrs::{Command, CommandHandler};
use crate::domain::{DomainError, RepositoryError};

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub tenant_id: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Option<Vec<String>>,
}

impl Command for CreateUser {
    type Output = User;
}

/// Fields a caller may change; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub tenant_id: String,
    pub id: Uuid,
    pub changes: UserChanges,
}

impl Command for UpdateUser {
    type Output = User;
}

#[derive(Debug, Clone)]
pub struct DeleteUser {
    pub tenant_id: String,
    pub id: Uuid,
}

impl Command for DeleteUser {
    type Output = ();
}

fn email_conflict(email: &Email) -> DomainError {
    DomainError::Conflict(format!("User with email {} already exists", email))
}

#[async_trait]
impl CommandHandler<CreateUser> for UserHandlers {
    async fn handle(&self, command: CreateUser) -> Result<User, DomainError> {
        let email = Email::parse(&command.email)?;

        if command.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(
                "password",
                format!("Password must be at least {} characters long", MIN_PASSWORD_LEN),
            ));
        }

        let roles = match command.roles {
            Some(roles) => validate_roles(roles)?,
            None => vec![DEFAULT_ROLE.to_string()],
        };

        if self
            .repository
            .find_by_email(&command.tenant_id, email.as_str())
            .await?
            .is_some()
        {
            return Err(email_conflict(&email));
        }

        let password = command.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| DomainError::Hashing(e.to_string()))??;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: command.tenant_id,
            email: email.as_str().to_string(),
            password_hash,
            first_name: command.first_name,
            last_name: command.last_name,
            roles,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.repository.save(&user).await.map_err(|e| match e {
            RepositoryError::Duplicate(_) => email_conflict(&email),
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "User created");

        self.events
            .publish(
                "users.created",
                &user.id.to_string(),
                json!({ "id": user.id, "email": user.email, "tenantId": user.tenant_id }),
            )
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl CommandHandler<UpdateUser> for UserHandlers {
    async fn handle(&self, command: UpdateUser) -> Result<User, DomainError> {
        let id = command.id.to_string();
        let mut user = self
            .repository
            .find_by_id(&command.tenant_id, command.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", &id))?;

        let changes = command.changes;

        if let Some(raw) = changes.email {
            let email = Email::parse(&raw)?;
            if email.as_str() != user.email {
                let taken = self
                    .repository
                    .find_by_email(&command.tenant_id, email.as_str())
                    .await?
                    .is_some_and(|other| other.id != user.id);
                if taken {
                    return Err(email_conflict(&email));
                }
                user.email = email.as_str().to_string();
            }
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(roles) = changes.roles {
            user.roles = validate_roles(roles)?;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        self.repository.save(&user).await.map_err(|e| match e {
            RepositoryError::Duplicate(_) => DomainError::Conflict(format!("User with email {} already exists", user.email)),
            other => other.into(),
        })?;

        self.events
            .publish(
                "users.updated",
                &id,
                json!({ "id": user.id, "email": user.email, "tenantId": user.tenant_id }),
            )
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl CommandHandler<DeleteUser> for UserHandlers {
    async fn handle(&self, command: DeleteUser) -> Result<(), DomainError> {
        let id = command.id.to_string();
        if !self.repository.delete(&command.tenant_id, command.id).await? {
            return Err(DomainError::not_found("User", &id));
        }

        tracing::info!(user_id = %id, tenant_id = %command.tenant_id, "User deleted");

        self.events
            .publish("users.deleted", &id, json!({ "id": id, "tenantId": command.tenant_id }))
            .await?;

        Ok(())
    }
}
