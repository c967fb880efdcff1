//! Managed backend repository over its REST query surface.
//!
//! Talks PostgREST conventions: `GET/POST/PATCH /rest/v1/<table>` with
//! `column=eq.value` filters, an `apikey` header and a bearer token.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ListRepository;
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::models::{
    ListId, ListRecord, ListSummary, ListTarget, ListUpdate, ListValue, NewList, StoredList,
    ValueChange, ValueDraft, ValueId,
};
use crate::util::{compact_text, is_http_url, unix_timestamp_millis};

const LIST_COLUMNS: &str = "id,list_code,list_name,is_active,updated_at";
const VALUE_COLUMNS: &str =
    "id,list_id,value_code,value_label,parent_value_code,sort_order,is_active";

/// Authenticated HTTP client for the managed backend's REST endpoint
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub fn new(url: impl AsRef<str>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_rest_url(url.as_ref())?;
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(Error::Config("backend API key must not be empty".to_string()));
        }

        Ok(Self {
            base_url,
            api_key,
            http: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Build a client from resolved configuration.
    ///
    /// Fails when the backend URL or key is missing.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let (url, api_key) = config.rest_credentials()?.ok_or_else(|| {
            Error::Config(
                "LISTSYNC_BACKEND_URL and LISTSYNC_BACKEND_KEY must be set for the REST backend"
                    .to_string(),
            )
        })?;
        Self::new(url, api_key, config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }
        Ok(())
    }
}

/// REST implementation of `ListRepository`
#[derive(Debug, Clone)]
pub struct RestListRepository {
    client: RestClient,
    target: ListTarget,
}

impl RestListRepository {
    pub const fn new(client: RestClient, target: ListTarget) -> Self {
        Self { client, target }
    }

    async fn fetch_values(&self, list_id: ListId) -> Result<Vec<ListValue>> {
        let request = self
            .client
            .request(Method::GET, self.target.tables().values)
            .query(&[
                ("select", VALUE_COLUMNS.to_string()),
                ("list_id", eq_filter(&list_id.as_str())),
                ("order", "sort_order.asc,value_code.asc".to_string()),
            ]);
        self.client.send_json(request).await
    }

    async fn insert_values(&self, list_id: ListId, drafts: &[&ValueDraft]) -> Result<Vec<ListValue>> {
        let values = drafts
            .iter()
            .map(|draft| ListValue {
                id: ValueId::new(),
                list_id,
                value_code: draft.value_code.clone(),
                value_label: draft.value_label.clone(),
                parent_value_code: draft.parent_value_code.clone(),
                sort_order: draft.sort_order,
                is_active: true,
            })
            .collect::<Vec<_>>();
        if values.is_empty() {
            return Ok(values);
        }

        let request = self
            .client
            .request(Method::POST, self.target.tables().values)
            .header("Prefer", "return=minimal")
            .json(&values);
        self.client.send_empty(request).await?;
        Ok(values)
    }
}

#[derive(Debug, Serialize)]
struct ListPatch<'a> {
    list_name: &'a str,
    is_active: bool,
    updated_at: i64,
}

#[derive(Debug, Serialize)]
struct ValuePatch<'a> {
    value_label: &'a str,
    parent_value_code: Option<&'a str>,
    sort_order: i64,
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct CountedList {
    #[serde(flatten)]
    record: ListRecord,
    value_count: Vec<ValueCount>,
}

#[derive(Debug, Deserialize)]
struct ValueCount {
    count: usize,
}

impl ListRepository for RestListRepository {
    fn target(&self) -> ListTarget {
        self.target
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<StoredList>> {
        let request = self
            .client
            .request(Method::GET, self.target.tables().lists)
            .query(&[
                ("select", LIST_COLUMNS.to_string()),
                ("list_code", eq_filter(code)),
                ("limit", "1".to_string()),
            ]);
        let records: Vec<ListRecord> = self.client.send_json(request).await?;
        let Some(record) = records.into_iter().next() else {
            return Ok(None);
        };

        let values = self.fetch_values(record.id).await?;
        Ok(Some(StoredList { record, values }))
    }

    async fn insert(&self, list: &NewList) -> Result<StoredList> {
        let record = ListRecord {
            id: ListId::new(),
            list_code: list.list_code.clone(),
            list_name: list.list_name.clone(),
            is_active: true,
            updated_at: unix_timestamp_millis(),
        };
        let request = self
            .client
            .request(Method::POST, self.target.tables().lists)
            .header("Prefer", "return=representation")
            .json(&[&record]);
        let rows: Vec<ListRecord> = self.client.send_json(request).await?;
        let record = rows.into_iter().next().ok_or_else(|| {
            Error::Api(format!("insert of list '{}' returned no row", list.list_code))
        })?;

        // A failure here leaves the parent row in place; the next run sees it
        // and inserts the missing values as an update.
        let drafts = list.values.iter().collect::<Vec<_>>();
        let values = self.insert_values(record.id, &drafts).await?;
        Ok(StoredList { record, values })
    }

    async fn update(&self, update: &ListUpdate) -> Result<()> {
        let patch = ListPatch {
            list_name: &update.list_name,
            is_active: true,
            updated_at: unix_timestamp_millis(),
        };
        let request = self
            .client
            .request(Method::PATCH, self.target.tables().lists)
            .query(&[("id", eq_filter(&update.list_id.as_str()))])
            .json(&patch);
        self.client.send_empty(request).await?;

        let mut inserts = Vec::new();
        for change in &update.values {
            match change {
                ValueChange::Insert(draft) => inserts.push(draft),
                ValueChange::Update { id, draft } => {
                    let patch = ValuePatch {
                        value_label: &draft.value_label,
                        parent_value_code: draft.parent_value_code.as_deref(),
                        sort_order: draft.sort_order,
                        is_active: true,
                    };
                    let request = self
                        .client
                        .request(Method::PATCH, self.target.tables().values)
                        .query(&[("id", eq_filter(&id.as_str()))])
                        .json(&patch);
                    self.client.send_empty(request).await?;
                }
            }
        }

        self.insert_values(update.list_id, &inserts).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ListSummary>> {
        let tables = self.target.tables();
        // Embedded count keeps value totals server-side, clear of the max-rows cap
        let select = format!("{LIST_COLUMNS},value_count:{}(count)", tables.values);
        let request = self.client.request(Method::GET, tables.lists).query(&[
            ("select", select.as_str()),
            ("order", "list_code.asc"),
        ]);
        let rows: Vec<CountedList> = self.client.send_json(request).await?;

        Ok(rows
            .into_iter()
            .map(|row| ListSummary {
                value_count: row.value_count.iter().map(|entry| entry.count).sum(),
                record: row.record,
            })
            .collect())
    }
}

/// Normalize a backend URL to its REST root (`.../rest/v1`).
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("backend URL must not be empty".to_string()));
    }
    if !is_http_url(trimmed) {
        return Err(Error::Config(
            "backend URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

/// Build an `eq.` filter, quoting values PostgREST would otherwise split.
fn eq_filter(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|ch| matches!(ch, ',' | '.' | ':' | '(' | ')' | '"' | '\\') || ch.is_whitespace());
    if needs_quotes {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("eq.\"{escaped}\"")
    } else {
        format!("eq.{value}")
    }
}

#[derive(Debug, Deserialize)]
struct RestErrorBody {
    message: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<RestErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return match payload.details.filter(|details| !details.trim().is_empty()) {
                Some(details) => format!(
                    "{}: {} ({})",
                    message.trim(),
                    compact_text(&details),
                    status.as_u16()
                ),
                None => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::ListDefinition;
    use crate::sync::ListSyncEngine;
    use pretty_assertions::assert_eq;

    const LIST_ID: &str = "01920000-0000-7000-8000-000000000001";
    const VALUE_ID: &str = "01920000-0000-7000-8000-0000000000a1";

    fn repository(server: &MockServer, target: ListTarget) -> RestListRepository {
        let client = RestClient::new(server.uri(), "secret", Duration::from_secs(5)).unwrap();
        RestListRepository::new(client, target)
    }

    fn formats_row() -> serde_json::Value {
        json!({
            "id": LIST_ID,
            "list_code": "formats",
            "list_name": "Formats",
            "is_active": true,
            "updated_at": 1_700_000_000_000_i64
        })
    }

    fn print_row() -> serde_json::Value {
        json!({
            "id": VALUE_ID,
            "list_id": LIST_ID,
            "value_code": "print",
            "value_label": "Imprimé",
            "parent_value_code": null,
            "sort_order": 1,
            "is_active": true
        })
    }

    #[tokio::test]
    async fn find_by_code_reads_list_and_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/system_lists"))
            .and(query_param("list_code", "eq.formats"))
            .and(query_param("select", LIST_COLUMNS))
            .and(header("apikey", "secret"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([formats_row()])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/system_list_values"))
            .and(query_param("list_id", format!("eq.{LIST_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([print_row()])))
            .expect(1)
            .mount(&server)
            .await;

        let stored = repository(&server, ListTarget::System)
            .find_by_code("formats")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.record.id.as_str(), LIST_ID);
        assert_eq!(stored.values.len(), 1);
        assert_eq!(stored.value("print").unwrap().value_label, "Imprimé");
    }

    #[tokio::test]
    async fn find_by_code_returns_none_without_fetching_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/autocomplete_lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/autocomplete_list_values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let found = repository(&server, ListTarget::Autocomplete)
            .find_by_code("scripts")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn insert_uses_returned_row_for_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/system_lists"))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!([{ "list_code": "formats" }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([formats_row()])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/system_list_values"))
            .and(header("prefer", "return=minimal"))
            .and(body_partial_json(json!([{ "list_id": LIST_ID, "value_code": "print" }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let definition = ListDefinition::new("formats", "Formats").with_option("print", "Imprimé");
        let stored = repository(&server, ListTarget::System)
            .insert(&NewList::from(&definition))
            .await
            .unwrap();

        assert_eq!(stored.record.id.as_str(), LIST_ID);
        assert_eq!(stored.values[0].list_id.as_str(), LIST_ID);
    }

    #[tokio::test]
    async fn update_patches_changed_values_and_posts_new_ones() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/system_lists"))
            .and(query_param("id", format!("eq.{LIST_ID}")))
            .and(body_partial_json(json!({ "list_name": "Formats de document", "is_active": true })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/system_list_values"))
            .and(query_param("id", format!("eq.{VALUE_ID}")))
            .and(body_partial_json(json!({ "value_label": "Imprimé (papier)" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/system_list_values"))
            .and(body_partial_json(json!([{ "list_id": LIST_ID, "value_code": "audio" }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let draft = |code: &str, label: &str, sort_order| ValueDraft {
            value_code: code.to_string(),
            value_label: label.to_string(),
            parent_value_code: None,
            sort_order,
        };
        repository(&server, ListTarget::System)
            .update(&ListUpdate {
                list_id: LIST_ID.parse().unwrap(),
                list_name: "Formats de document".to_string(),
                values: vec![
                    ValueChange::Update {
                        id: VALUE_ID.parse().unwrap(),
                        draft: draft("print", "Imprimé (papier)", 1),
                    },
                    ValueChange::Insert(draft("audio", "Livre audio", 2)),
                ],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_all_reads_embedded_value_counts() {
        let server = MockServer::start().await;
        let mut row = formats_row();
        row["value_count"] = json!([{ "count": 3 }]);
        Mock::given(method("GET"))
            .and(path("/rest/v1/system_lists"))
            .and(query_param(
                "select",
                format!("{LIST_COLUMNS},value_count:system_list_values(count)"),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
            .expect(1)
            .mount(&server)
            .await;

        let summaries = repository(&server, ListTarget::System).list_all().await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].record.list_code, "formats");
        assert_eq!(summaries[0].value_count, 3);
    }

    #[tokio::test]
    async fn api_errors_surface_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/system_lists"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "JWT expired" })),
            )
            .mount(&server)
            .await;

        let error = repository(&server, ListTarget::System)
            .find_by_code("formats")
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Backend API error: JWT expired (401)");
    }

    #[tokio::test]
    async fn failed_value_insert_is_completed_by_next_run() {
        let server = MockServer::start().await;
        // First lookup sees nothing, later lookups see the parent row
        Mock::given(method("GET"))
            .and(path("/rest/v1/system_lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/system_lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([formats_row()])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/system_list_values"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/system_lists"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([formats_row()])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/system_list_values"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/system_list_values"))
            .and(body_partial_json(json!([{ "value_code": "print" }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/system_lists"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let engine = ListSyncEngine::new(repository(&server, ListTarget::System));
        let definitions =
            vec![ListDefinition::new("formats", "Formats").with_option("print", "Imprimé")];

        let first = engine.auto_sync(&definitions).await;
        assert_eq!((first.created, first.failed), (0, 1));
        assert!(first.errors[0].message.contains("upstream down (503)"));

        let second = engine.auto_sync(&definitions).await;
        assert_eq!((second.updated, second.failed), (1, 0));
    }

    #[test]
    fn normalize_rest_url_appends_rest_root() {
        assert_eq!(
            normalize_rest_url("https://project.supabase.co/").unwrap(),
            "https://project.supabase.co/rest/v1"
        );
        assert_eq!(
            normalize_rest_url("https://project.supabase.co/rest/v1").unwrap(),
            "https://project.supabase.co/rest/v1"
        );
    }

    #[test]
    fn normalize_rest_url_rejects_invalid_values() {
        assert!(normalize_rest_url("  ").is_err());
        assert!(normalize_rest_url("project.supabase.co").is_err());
    }

    #[test]
    fn eq_filter_quotes_reserved_characters() {
        assert_eq!(eq_filter("languages"), "eq.languages");
        assert_eq!(eq_filter("a,b"), "eq.\"a,b\"");
        assert_eq!(eq_filter("say \"hi\""), "eq.\"say \\\"hi\\\"\"");
    }

    #[test]
    fn parse_api_error_prefers_message_and_details() {
        let body = r#"{"code":"23505","message":"duplicate key value","details":"Key (list_code)=(languages) already exists."}"#;
        let message = parse_api_error(StatusCode::CONFLICT, body);
        assert!(message.starts_with("duplicate key value: Key (list_code)"));
        assert!(message.ends_with("(409)"));
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::FORBIDDEN, "permission denied"),
            "permission denied (403)"
        );
    }

    #[test]
    fn client_debug_redacts_key() {
        let client =
            RestClient::new("https://project.supabase.co", "secret", Duration::from_secs(5))
                .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn client_rejects_blank_key() {
        assert!(RestClient::new("https://project.supabase.co", " ", Duration::from_secs(5)).is_err());
    }
}
