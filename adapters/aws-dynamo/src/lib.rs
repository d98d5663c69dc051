//! DynamoDB adapter implementing the domain `Store` port.
//!
//! - Every table is keyed by the string attribute `id`.
//! - Projections, filters and conditions are sent as expressions with
//!   `#name` placeholders, since attributes such as `name` are reserved words.
//! - Scans follow `LastEvaluatedKey` until the table is exhausted.
//! - Provides `from_env()` wiring for Lambda/apps using env vars:
//!   `AWS_REGION` (default `eu-west-1`) and `DYNAMO_ENDPOINT` (optional).
//!
//! Store failures are relayed as `CoreError::Store` with the service error
//! code; there are no retries on top of the SDK's own.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use domain::{AttrValue, Condition, CoreError, Item, ScanFilter, Store, KEY_ATTR};
use tracing::debug;

pub const DEFAULT_REGION: &str = "eu-west-1";

/// Connection settings for the DynamoDB client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamoSettings {
    pub region: String,
    /// Custom endpoint, e.g. `http://localhost:8000` for DynamoDB Local.
    pub endpoint: Option<String>,
}

impl DynamoSettings {
    /// Build from environment variables.
    pub fn from_env() -> Self {
        let region = std::env::var("AWS_REGION")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.into());
        let endpoint = std::env::var("DYNAMO_ENDPOINT").ok().filter(|s| !s.is_empty());
        Self { region, endpoint }
    }
}

impl Default for DynamoSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.into(),
            endpoint: None,
        }
    }
}

/// Store backed by AWS DynamoDB.
#[derive(Clone)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Wrap an already configured SDK client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Load credentials from env/IMDS and apply region and endpoint settings.
    pub async fn new(settings: &DynamoSettings) -> Self {
        let conf = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&conf);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self::with_client(Client::from_conf(builder.build()))
    }

    pub async fn from_env() -> Self {
        Self::new(&DynamoSettings::from_env()).await
    }
}

#[async_trait]
impl Store for DynamoStore {
    async fn get(
        &self,
        table: &str,
        key: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Item>, CoreError> {
        let mut req = self
            .client
            .get_item()
            .table_name(table)
            .key(KEY_ATTR, AttributeValue::S(key.to_string()));
        if let Some(names) = projection {
            let (expr, placeholders) = projection_expression(names);
            req = req
                .projection_expression(expr)
                .set_expression_attribute_names(Some(placeholders));
        }
        let out = req.send().await.map_err(map_sdk_err)?;
        debug!(table, key, found = out.item().is_some(), "dynamo get_item");
        Ok(out.item().map(from_dynamo_item))
    }

    async fn put(
        &self,
        table: &str,
        item: Item,
        condition: Option<&Condition>,
    ) -> Result<(), CoreError> {
        let mut req = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(to_dynamo_item(&item)));
        if let Some(cond) = condition {
            req = match cond {
                Condition::AttributeEquals { name, value } => req
                    .condition_expression("#c = :c")
                    .expression_attribute_names("#c", name)
                    .expression_attribute_values(":c", to_dynamo_value(value)),
                Condition::AttributeNotExists(name) => req
                    .condition_expression("attribute_not_exists(#c)")
                    .expression_attribute_names("#c", name),
            };
        }
        req.send().await.map_err(map_put_err)?;
        debug!(table, conditional = condition.is_some(), "dynamo put_item");
        Ok(())
    }

    async fn scan(
        &self,
        table: &str,
        filter: Option<&ScanFilter>,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Item>, CoreError> {
        let mut names: HashMap<String, String> = HashMap::new();
        let mut values: HashMap<String, AttributeValue> = HashMap::new();
        let projection_expr = projection.map(|p| {
            let (expr, placeholders) = projection_expression(p);
            names.extend(placeholders);
            expr
        });
        let filter_expr = filter.map(|f| {
            names.insert("#f".into(), f.attribute.clone());
            values.insert(":f".into(), to_dynamo_value(&f.equals));
            "#f = :f".to_string()
        });

        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0usize;
        loop {
            let mut req = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take())
                .set_projection_expression(projection_expr.clone())
                .set_filter_expression(filter_expr.clone());
            if !names.is_empty() {
                req = req.set_expression_attribute_names(Some(names.clone()));
            }
            if !values.is_empty() {
                req = req.set_expression_attribute_values(Some(values.clone()));
            }
            let out = req.send().await.map_err(map_sdk_err)?;
            pages += 1;
            items.extend(out.items().iter().map(from_dynamo_item));
            match out.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        debug!(table, pages, count = items.len(), "dynamo scan");
        Ok(items)
    }
}

fn map_sdk_err<E: ProvideErrorMetadata + std::fmt::Display>(e: E) -> CoreError {
    match e.code() {
        Some("ResourceNotFoundException") => {
            CoreError::Store(format!("missing table: {}", e.message().unwrap_or_default()))
        }
        Some(code) => CoreError::Store(format!("{code}: {}", e.message().unwrap_or_default())),
        None => CoreError::Store(format!("dynamo error: {e}")),
    }
}

fn map_put_err<E: ProvideErrorMetadata + std::fmt::Display>(e: E) -> CoreError {
    match e.code() {
        Some("ConditionalCheckFailedException") => CoreError::ConditionFailed,
        _ => map_sdk_err(e),
    }
}

/// `#p0, #p1, ...` plus the placeholder-to-name map.
fn projection_expression(names: &[&str]) -> (String, HashMap<String, String>) {
    let placeholders: Vec<(String, String)> = names
        .iter()
        .enumerate()
        .map(|(i, n)| (format!("#p{i}"), n.to_string()))
        .collect();
    let expr = placeholders
        .iter()
        .map(|(p, _)| p.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    (expr, placeholders.into_iter().collect())
}

fn to_dynamo_value(v: &AttrValue) -> AttributeValue {
    match v {
        AttrValue::S(s) => AttributeValue::S(s.clone()),
        AttrValue::N(n) => AttributeValue::N(n.clone()),
        AttrValue::Bool(b) => AttributeValue::Bool(*b),
        AttrValue::L(l) => AttributeValue::L(l.iter().map(to_dynamo_value).collect()),
        AttrValue::Null => AttributeValue::Null(true),
    }
}

// Binary and map attributes are not part of any record shape and are dropped.
fn from_dynamo_value(v: &AttributeValue) -> Option<AttrValue> {
    Some(match v {
        AttributeValue::S(s) => AttrValue::S(s.clone()),
        AttributeValue::N(n) => AttrValue::N(n.clone()),
        AttributeValue::Bool(b) => AttrValue::Bool(*b),
        AttributeValue::Null(_) => AttrValue::Null,
        AttributeValue::L(l) => AttrValue::L(l.iter().filter_map(from_dynamo_value).collect()),
        AttributeValue::Ss(ss) => AttrValue::L(ss.iter().cloned().map(AttrValue::S).collect()),
        AttributeValue::Ns(ns) => AttrValue::L(ns.iter().cloned().map(AttrValue::N).collect()),
        _ => return None,
    })
}

fn to_dynamo_item(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(k, v)| (k.clone(), to_dynamo_value(v)))
        .collect()
}

fn from_dynamo_item(item: &HashMap<String, AttributeValue>) -> Item {
    item.iter()
        .filter_map(|(k, v)| from_dynamo_value(v).map(|v| (k.clone(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_smithy_types::error::ErrorMetadata;

    fn sample_party_item() -> Item {
        let mut m = Item::new();
        m.insert("id".into(), AttrValue::S("z1".into()));
        m.insert("hostParentId".into(), AttrValue::S("p1".into()));
        m.insert(
            "children".into(),
            AttrValue::L(vec![AttrValue::S("c1".into()), AttrValue::S("c2".into())]),
        );
        m.insert("version".into(), AttrValue::N("3".into()));
        m
    }

    #[test]
    fn roundtrip_item_mapping() {
        let item = sample_party_item();
        let dynamo = to_dynamo_item(&item);
        assert_eq!(dynamo.get("version"), Some(&AttributeValue::N("3".into())));
        assert_eq!(from_dynamo_item(&dynamo), item);
    }

    #[test]
    fn string_sets_read_as_lists() {
        let mut dynamo = HashMap::new();
        dynamo.insert("id".to_string(), AttributeValue::S("z1".into()));
        dynamo.insert(
            "children".to_string(),
            AttributeValue::Ss(vec!["c1".into()]),
        );
        dynamo.insert("blob".to_string(), AttributeValue::M(HashMap::new()));

        let item = from_dynamo_item(&dynamo);
        assert_eq!(item.get("children"), Some(&AttrValue::L(vec![AttrValue::S("c1".into())])));
        assert!(!item.contains_key("blob"));
    }

    #[test]
    fn projection_uses_placeholders() {
        let (expr, names) = projection_expression(&["id", "name", "birthDate"]);
        assert_eq!(expr, "#p0, #p1, #p2");
        assert_eq!(names.get("#p1").map(String::as_str), Some("name"));
        assert_eq!(names.len(), 3);
    }

    fn service_error(code: &str) -> ErrorMetadata {
        ErrorMetadata::builder()
            .code(code)
            .message("The conditional request failed")
            .build()
    }

    #[test]
    fn wraps_a_configured_client() {
        let conf = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let store = DynamoStore::with_client(Client::from_conf(conf));
        assert_eq!(store.client.config().region(), Some(&Region::new("us-east-1")));
    }

    #[test]
    fn failed_condition_maps_to_condition_failed() {
        assert_eq!(
            map_put_err(service_error("ConditionalCheckFailedException")),
            CoreError::ConditionFailed
        );
        assert_eq!(
            map_put_err(service_error("ResourceNotFoundException")),
            CoreError::Store("missing table: The conditional request failed".into())
        );
        assert!(matches!(
            map_put_err(service_error("ThrottlingException")),
            CoreError::Store(msg) if msg.starts_with("ThrottlingException")
        ));
    }

    #[test]
    fn settings_default_region() {
        let s = DynamoSettings::default();
        assert_eq!(s.region, "eu-west-1");
        assert!(s.endpoint.is_none());
    }
}
