//! Error handling for the lot ledger backend
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use shared::LedgerError;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String, message_es: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger errors
    #[error("Lot {lot_number} is already registered with different values")]
    DuplicateLot {
        lot_number: String,
        existing_lot_id: Uuid,
    },

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        lot_id: Option<Uuid>,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Dispatch date {dispatch_date} is before production date {production_date}")]
    Chronology {
        production_date: NaiveDate,
        dispatch_date: NaiveDate,
    },

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Concurrency conflict: {0}")]
    Concurrency(String),

    #[error("Integrity violation: {message}")]
    Integrity {
        constraint: Option<String>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Validation error from a message that only exists in English
    pub fn invalid(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_es: format!("Dato inválido: {}", message),
        }
    }

    /// Attach the lot id to a rule violation found while handling that lot
    pub fn for_lot(lot_id: Uuid, err: LedgerError) -> Self {
        match AppError::from(err) {
            AppError::InsufficientStock {
                available,
                requested,
                ..
            } => AppError::InsufficientStock {
                lot_id: Some(lot_id),
                available,
                requested,
            },
            other => other,
        }
    }

    /// Whether this is an integrity violation of the named constraint
    pub fn is_constraint(&self, name: &str) -> bool {
        matches!(self, AppError::Integrity { constraint: Some(c), .. } if c == name)
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthorized { .. } => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation { .. } | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateLot { .. } => "DUPLICATE_LOT",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::Chronology { .. } => "CHRONOLOGY_ERROR",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::Concurrency(_) => "CONCURRENCY_ERROR",
            AppError::Integrity { .. } => "INTEGRITY_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateLot { .. } | AppError::Integrity { .. } => StatusCode::CONFLICT,
            AppError::InsufficientStock { .. }
            | AppError::Chronology { .. }
            | AppError::InvalidStateTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Concurrency(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Invalid { field, message } => AppError::invalid(field, &message),
            LedgerError::InsufficientStock {
                available,
                requested,
            } => AppError::InsufficientStock {
                lot_id: None,
                available,
                requested,
            },
            LedgerError::Chronology {
                production_date,
                dispatch_date,
            } => AppError::Chronology {
                production_date,
                dispatch_date,
            },
            err @ LedgerError::InvalidTransition { .. } => {
                AppError::InvalidStateTransition(err.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match classify_sqlx_error(&err) {
            Some(mapped) => mapped,
            None => AppError::DatabaseError(err),
        }
    }
}

/// Map PostgreSQL conditions callers can act on to ledger errors
fn classify_sqlx_error(err: &sqlx::Error) -> Option<AppError> {
    match err {
        sqlx::Error::PoolTimedOut => Some(AppError::Concurrency(
            "timed out waiting for a database connection".to_string(),
        )),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("55P03") => Some(AppError::Concurrency(
                "timed out waiting for a lot lock".to_string(),
            )),
            Some("40001") | Some("40P01") => Some(AppError::Concurrency(
                "transaction conflicted with a concurrent update".to_string(),
            )),
            Some("23505") | Some("23503") | Some("23514") | Some("23001") => {
                Some(AppError::Integrity {
                    constraint: db_err.constraint().map(str::to_string),
                    message: db_err.message().to_string(),
                })
            }
            Some("22003") => Some(AppError::Validation {
                field: "quantity".to_string(),
                message: format!("Numeric value out of range: {}", db_err.message()),
                message_es: "Valor numérico fuera de rango".to_string(),
            }),
            _ => None,
        },
        _ => None,
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.iter().collect();
        fields.sort_by_key(|(field, _)| **field);

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::invalid(field, &message)
            }
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: impl Into<String>, message_es: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: message_en.into(),
            message_es: message_es.into(),
            field: None,
            details: None,
        }
    }
}

impl AppError {
    fn detail(&self) -> ErrorDetail {
        let code = self.code();
        match self {
            AppError::InvalidCredentials => ErrorDetail::new(
                code,
                "Invalid username or password",
                "Usuario o contraseña incorrectos",
            ),
            AppError::Unauthorized {
                message,
                message_es,
            } => ErrorDetail::new(code, message.clone(), message_es.clone()),
            AppError::Forbidden(msg) => ErrorDetail::new(
                code,
                msg.clone(),
                "No tiene permisos para realizar esta acción",
            ),
            AppError::Validation {
                field,
                message,
                message_es,
            } => ErrorDetail {
                field: Some(field.clone()),
                ..ErrorDetail::new(code, message.clone(), message_es.clone())
            },
            AppError::ValidationError(msg) => {
                ErrorDetail::new(code, msg.clone(), format!("Dato inválido: {}", msg))
            }
            AppError::NotFound(resource) => ErrorDetail::new(
                code,
                format!("{} not found", resource),
                format!("No se encontró {}", resource),
            ),
            AppError::DuplicateLot {
                lot_number,
                existing_lot_id,
            } => ErrorDetail {
                field: Some("lot_number".to_string()),
                details: Some(json!({
                    "lot_number": lot_number,
                    "existing_lot_id": existing_lot_id,
                })),
                ..ErrorDetail::new(
                    code,
                    format!("Lot {} is already registered with a different SKU or quantity", lot_number),
                    format!("El lote {} ya está registrado con otro SKU o cantidad", lot_number),
                )
            },
            AppError::InsufficientStock {
                lot_id,
                available,
                requested,
            } => ErrorDetail {
                field: Some("quantity".to_string()),
                details: Some(json!({
                    "lot_id": lot_id,
                    "available": available,
                    "requested": requested,
                })),
                ..ErrorDetail::new(
                    code,
                    format!("Insufficient stock: {} available, {} requested", available, requested),
                    format!("Stock insuficiente: {} disponible, {} solicitado", available, requested),
                )
            },
            AppError::Chronology {
                production_date,
                dispatch_date,
            } => ErrorDetail {
                field: Some("dispatch_date".to_string()),
                details: Some(json!({
                    "production_date": production_date,
                    "dispatch_date": dispatch_date,
                })),
                ..ErrorDetail::new(
                    code,
                    format!(
                        "Dispatch date {} is before the lot production date {}",
                        dispatch_date, production_date
                    ),
                    format!(
                        "La fecha de despacho {} es anterior a la fecha de producción {}",
                        dispatch_date, production_date
                    ),
                )
            },
            AppError::InvalidStateTransition(msg) => ErrorDetail::new(
                code,
                msg.clone(),
                format!("Cambio de estado no permitido: {}", msg),
            ),
            AppError::Concurrency(msg) => ErrorDetail::new(
                code,
                format!("The lot is busy, please retry: {}", msg),
                "El lote está siendo modificado, intente nuevamente",
            ),
            AppError::Integrity {
                constraint,
                message,
            } => ErrorDetail {
                details: constraint
                    .as_ref()
                    .map(|c| json!({ "constraint": c })),
                ..ErrorDetail::new(
                    code,
                    message.clone(),
                    "La operación viola una restricción de integridad",
                )
            },
            AppError::Configuration(msg) => ErrorDetail::new(
                code,
                format!("Configuration error: {}", msg),
                format!("Error de configuración: {}", msg),
            ),
            AppError::DatabaseError(_) => ErrorDetail::new(
                code,
                "A database error occurred",
                "Ocurrió un error en la base de datos",
            ),
            AppError::Internal(msg) => {
                ErrorDetail::new(code, msg.clone(), "Error interno del servidor")
            }
            AppError::InternalError(_) => ErrorDetail::new(
                code,
                "An internal server error occurred",
                "Error interno del servidor",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_detail = self.detail();

        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
