//! Natural-language-to-SQL translation.
//!
//! Builds the prompt, calls Gemini with zero sampling temperature, and
//! cleans the reply into displayable SQL. The LLM owns correctness of the
//! generated query; nothing here validates it against the schema.

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::connection::DbType;
use common::models::translation::GeneratedSql;
use common::utils::{clean_llm_sql, format_sql};
use serde_json::{json, Value};

use crate::schema::SchemaSnapshot;

/// Row limit the prompt instructs the model to apply to SELECT queries.
const TOP_K: u32 = 100;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const PROMPT_TEMPLATE: &str = "\
You are a natural-language-to-SQL translator. Your task is to generate a SQL \
query answering the user's question, based on the database schema provided.

**Crucial instructions:**
1.  Generate the query in the **{dialect}** dialect.
2.  The query MUST be functional and syntactically correct for that dialect.
3.  **Make sure every JOIN condition is valid and based on columns that exist in BOTH joined tables.**
4.  **Always alias (AS) columns with the same name coming from different tables, to avoid duplicates in the result (e.g. SELECT t1.name AS name_table1, t2.name AS name_table2).**
5.  Do **NOT** include explanations, comments, markdown formatting (such as ```sql) or any text besides the raw SQL query. Answer with the SQL query **ONLY**.
6.  For queries returning multiple rows (SELECT), always include a LIMIT {top_k} clause to cap the result size.
7.  Make sure every table and column you reference exists in the provided schema.

**Table schema:**
{table_info}

**User question:**
{input}

**SQL query:**
";

/// Fills the prompt template with its four variables.
pub fn build_prompt(question: &str, table_info: &str, dialect: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{dialect}", dialect)
        .replace("{top_k}", &TOP_K.to_string())
        .replace("{table_info}", table_info)
        .replace("{input}", question)
}

/// Extracts the reply text from the LLM response value.
///
/// Accepts either a bare JSON string or the Gemini candidates mapping; any
/// other shape produces no SQL.
pub fn response_text(value: &Value) -> Option<String> {
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(String::from)
}

/// Transport for the LLM call; stubbed out in tests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Sends a prompt and returns the raw response body as JSON.
    async fn generate(&self, prompt: &str) -> AppResult<Value>;
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> AppResult<Value> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.0 }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(AppError::LlmService(format!("HTTP {}: {}", status, snippet)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::LlmResponse(e.to_string()))
    }
}

/// Translation engine bound to one connection, API key and dialect.
///
/// Holds the schema snapshot captured at init; the session memoizes one
/// instance per (connection URL, API key, dialect) tuple.
pub struct SqlTranslator {
    backend: Box<dyn LlmBackend>,
    dialect: &'static str,
    schema: SchemaSnapshot,
}

impl SqlTranslator {
    pub fn new(backend: Box<dyn LlmBackend>, db_type: DbType, schema: SchemaSnapshot) -> Self {
        Self {
            backend,
            dialect: db_type.dialect_name(),
            schema,
        }
    }

    /// Table names the model may reference.
    pub fn usable_tables(&self) -> &[String] {
        &self.schema.usable_tables
    }

    /// Translates a question into cleaned, formatted SQL.
    pub async fn translate(&self, question: &str) -> AppResult<GeneratedSql> {
        let prompt = build_prompt(question, &self.schema.table_info, self.dialect);
        let reply = self.backend.generate(&prompt).await?;
        let text = response_text(&reply)
            .ok_or_else(|| AppError::LlmResponse("no candidate text in reply".to_string()))?;

        let sql = format_sql(&clean_llm_sql(&text));
        tracing::info!(question = %question, sql = %sql, "generated SQL");

        Ok(GeneratedSql {
            question: question.to_string(),
            sql,
            dialect: self.dialect.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubBackend {
        reply: Value,
    }

    #[async_trait]
    impl LlmBackend for StubBackend {
        async fn generate(&self, _prompt: &str) -> AppResult<Value> {
            Ok(self.reply.clone())
        }
    }

    fn translator(reply: Value) -> SqlTranslator {
        SqlTranslator::new(
            Box::new(StubBackend { reply }),
            DbType::MySQL,
            SchemaSnapshot {
                usable_tables: vec!["t".to_string()],
                table_info: "Table: t\nColumns: a (int)\n".to_string(),
            },
        )
    }

    #[test]
    fn test_prompt_fills_all_variables() {
        let prompt = build_prompt("how many users?", "Table: users", "PostgreSQL");
        assert!(prompt.contains("**PostgreSQL**"));
        assert!(prompt.contains("LIMIT 100"));
        assert!(prompt.contains("Table: users"));
        assert!(prompt.contains("how many users?"));
        assert!(!prompt.contains("{dialect}"));
        assert!(!prompt.contains("{input}"));
    }

    #[test]
    fn test_response_text_accepts_bare_string() {
        assert_eq!(
            response_text(&json!("SELECT 1")),
            Some("SELECT 1".to_string())
        );
    }

    #[test]
    fn test_response_text_accepts_candidates_shape() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "SELECT 1" }] }
            }]
        });
        assert_eq!(response_text(&reply), Some("SELECT 1".to_string()));
    }

    #[test]
    fn test_response_text_rejects_other_shapes() {
        assert_eq!(response_text(&json!({ "unexpected": true })), None);
        assert_eq!(response_text(&json!(42)), None);
    }

    #[tokio::test]
    async fn test_translate_cleans_and_formats_reply() {
        let t = translator(json!("```sql\nSELECT a FROM t\n```"));
        let generated = t.translate("show a").await.unwrap();
        assert_eq!(generated.sql, "SELECT a\nFROM t");
        assert_eq!(generated.dialect, "MySQL");
    }

    #[tokio::test]
    async fn test_translate_surfaces_malformed_reply() {
        let t = translator(json!({ "error": "quota" }));
        let err = t.translate("show a").await.unwrap_err();
        assert_eq!(err.code(), "LLM_RESPONSE_ERROR");
    }
}
