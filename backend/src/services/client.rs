//! Client records for dispatches

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use shared::Client;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ClientService {
    db: PgPool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClientInput {
    #[validate(length(min = 1, max = 200, message = "Client name is required"))]
    pub name: String,
    #[validate(length(max = 32))]
    pub document_id: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClientInput {
    #[validate(length(min = 1, max = 200, message = "Client name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub document_id: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

const CLIENT_COLUMNS: &str =
    "id, name, document_id, phone, email, address, is_active, created_at, updated_at";

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ClientService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_client(&self, input: CreateClientInput) -> AppResult<Client> {
        input.validate()?;
        if input.name.trim().is_empty() {
            return Err(AppError::invalid("name", "Client name is required"));
        }

        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (name, document_id, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(trimmed(&input.document_id))
        .bind(trimmed(&input.phone))
        .bind(trimmed(&input.email))
        .bind(trimmed(&input.address))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(client_id = %client.id, "client created");

        Ok(client)
    }

    pub async fn update_client(&self, client_id: Uuid, input: UpdateClientInput) -> AppResult<Client> {
        input.validate()?;
        if matches!(input.name.as_deref().map(str::trim), Some("")) {
            return Err(AppError::invalid("name", "Client name cannot be empty"));
        }

        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET name = COALESCE($2, name),
                document_id = COALESCE($3, document_id),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                address = COALESCE($6, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(client_id)
        .bind(trimmed(&input.name))
        .bind(trimmed(&input.document_id))
        .bind(trimmed(&input.phone))
        .bind(trimmed(&input.email))
        .bind(trimmed(&input.address))
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        Ok(client)
    }

    /// Activate or deactivate a client; clients are never deleted
    pub async fn set_client_active(&self, client_id: Uuid, is_active: bool) -> AppResult<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(client_id)
        .bind(is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        tracing::info!(client_id = %client_id, is_active, "client activation changed");

        Ok(client)
    }

    pub async fn list_clients(&self, active_only: bool) -> AppResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE is_active OR NOT $1 ORDER BY name",
            CLIENT_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        Ok(clients)
    }
}
