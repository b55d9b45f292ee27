use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::DocumentStore;
use crate::error::StorageError;
use crate::models::{DocumentInsert, SearchResult, StorageConfig};

#[derive(Debug, Deserialize)]
struct IdRow {
    id: i64,
}

/// Supabase document store, spoken to over its PostgREST interface.
pub struct SupabaseBackend {
    client: Client,
    base_url: String,
    table: String,
    match_function: String,
}

impl SupabaseBackend {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let base_url = config
            .url
            .as_deref()
            .ok_or_else(|| StorageError::Config("SUPABASE_URL is not set".to_string()))?
            .trim_end_matches('/')
            .to_string();
        let key = config.api_key.as_deref().unwrap_or_default();

        let mut headers = HeaderMap::new();
        let invalid_key = |e: reqwest::header::InvalidHeaderValue| {
            StorageError::Config(format!("invalid API key: {e}"))
        };
        headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid_key)?);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid_key)?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            table: config.table.clone(),
            match_function: config.match_function.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.match_function)
    }

    /// Rows touched by a write are echoed back so they can be counted.
    fn returning(builder: RequestBuilder) -> RequestBuilder {
        builder.header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, StorageError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                StorageError::ConnectionError(e.to_string())
            } else {
                StorageError::RequestError(e)
            }
        })?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for SupabaseBackend {
    async fn health_check(&self) -> Result<(), StorageError> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "id"), ("limit", "1")]);
        let _: Vec<IdRow> = Self::send(request).await?;
        Ok(())
    }

    async fn insert(&self, document: DocumentInsert) -> Result<i64, StorageError> {
        let request = Self::returning(self.client.post(self.table_url()).json(&document));
        let rows: Vec<IdRow> = Self::send(request).await?;

        rows.first()
            .map(|row| row.id)
            .ok_or_else(|| StorageError::InvalidResponse("insert returned no rows".to_string()))
    }

    async fn insert_batch(&self, documents: Vec<DocumentInsert>) -> Result<usize, StorageError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let request = Self::returning(self.client.post(self.table_url()).json(&documents));
        let rows: Vec<IdRow> = Self::send(request).await?;
        Ok(rows.len())
    }

    async fn delete_by_file(&self, file_id: &str) -> Result<usize, StorageError> {
        let filter = format!("eq.{file_id}");
        let request = Self::returning(
            self.client
                .delete(self.table_url())
                .query(&[("metadata->>file_id", filter.as_str())]),
        );
        let rows: Vec<IdRow> = Self::send(request).await?;
        Ok(rows.len())
    }

    async fn search(
        &self,
        query_embedding: Vec<f32>,
        limit: u32,
        file_id: Option<&str>,
    ) -> Result<Vec<SearchResult>, StorageError> {
        let mut request = self.client.post(self.rpc_url()).json(&json!({
            "query_embedding": query_embedding,
            "match_count": limit,
        }));

        if let Some(file_id) = file_id {
            request = request.query(&[("metadata->>file_id", format!("eq.{file_id}"))]);
        }

        Self::send(request).await
    }

    fn location(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(url: String) -> SupabaseBackend {
        SupabaseBackend::new(&StorageConfig {
            url: Some(url),
            api_key: Some("service-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn document(file_id: &str) -> DocumentInsert {
        let mut metadata = Map::new();
        metadata.insert("file_id".to_string(), json!(file_id));
        DocumentInsert {
            content: "chunk".to_string(),
            embedding: vec![0.5, 0.5],
            metadata,
        }
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let result = SupabaseBackend::new(&StorageConfig::default());
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[tokio::test]
    async fn test_insert_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/documents"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id": 17, "content": "chunk", "metadata": { "file_id": "f-1" } }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let id = backend(server.uri()).insert(document("f-1")).await.unwrap();
        assert_eq!(id, 17);
    }

    #[tokio::test]
    async fn test_delete_by_file_counts_rows() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/documents"))
            .and(query_param("metadata->>file_id", "eq.f-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
            .mount(&server)
            .await;

        let deleted = backend(server.uri()).delete_by_file("f-1").await.unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_search_calls_match_function_with_filter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/match_documents"))
            .and(query_param("metadata->>file_id", "eq.f-1"))
            .and(body_json(json!({ "query_embedding": [0.5, 0.25], "match_count": 3 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 4, "content": "hit", "metadata": { "file_id": "f-1" }, "similarity": 0.91 }
            ])))
            .mount(&server)
            .await;

        let results = backend(server.uri())
            .search(vec![0.5, 0.25], 3, Some("f-1"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 4);
        assert!((results[0].similarity - 0.91).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_backend_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid input syntax"))
            .mount(&server)
            .await;

        let err = backend(server.uri())
            .insert_batch(vec![document("f-1")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ServerError { status: 400, .. }));
    }
}
