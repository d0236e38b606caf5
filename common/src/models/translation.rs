//! Translation models.
//!
//! Types for the natural-language-to-SQL step.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for generating SQL from a question.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TranslateRequest {
    /// Natural-language question.
    #[validate(length(min = 1, message = "Question is required"))]
    pub question: String,
}

/// Generated SQL for a question.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratedSql {
    /// The question that was translated.
    pub question: String,

    /// Cleaned and formatted SQL text.
    pub sql: String,

    /// Dialect the SQL was generated for.
    pub dialect: String,
}
