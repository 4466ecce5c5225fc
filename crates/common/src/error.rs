//! Error types for fandom.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// Display strings are shown to end users, so they are written in Portuguese.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Não autenticado")]
    Unauthorized,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Pontos insuficientes: necessário {required}")]
    InsufficientPoints { required: i64 },

    // === Server Errors ===
    #[error("Erro de banco de dados: {0}")]
    Database(String),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro em serviço externo: {0}")]
    ExternalService(String),

    #[error("Erro interno: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientPoints { .. } => StatusCode::PAYMENT_REQUIRED,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message safe to show to the client.
    ///
    /// Server errors carry driver or upstream details that stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => {
                "Ocorreu um erro inesperado. Tente novamente.".to_string()
            }
            Self::Config(_) => "Serviço não configurado.".to_string(),
            Self::ExternalService(_) => "Falha ao contatar serviço externo.".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("post".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InsufficientPoints { required: 10 }.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::ExternalService("llm".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert!(AppError::Database("x".into()).is_server_error());
        assert!(!AppError::Unauthorized.is_server_error());
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::Database("relation \"profile\" does not exist".into());
        assert!(!err.public_message().contains("relation"));

        let err = AppError::Forbidden("apenas administradores".into());
        assert_eq!(err.public_message(), "Acesso negado: apenas administradores");
    }

    #[test]
    fn test_insufficient_points_message() {
        let err = AppError::InsufficientPoints { required: 150 };
        assert_eq!(err.error_code(), "INSUFFICIENT_POINTS");
        assert!(err.to_string().contains("150"));
    }
}
