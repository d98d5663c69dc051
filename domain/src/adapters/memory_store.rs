use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Condition, CoreError, Item, ScanFilter, Store, KEY_ATTR};

/// In-memory store keyed by table name, then item id.
///
/// Each operation holds the internal mutex for its whole duration, so a
/// conditional put is evaluated and applied atomically. Scans return items in
/// id order.
pub struct MemoryStore {
    tables: Mutex<HashMap<String, BTreeMap<String, Item>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
        }
    }

    fn project(item: &Item, projection: Option<&[&str]>) -> Item {
        match projection {
            None => item.clone(),
            Some(names) => item
                .iter()
                .filter(|(k, _)| names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(
        &self,
        table: &str,
        key: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Item>, CoreError> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| CoreError::Store("mutex poisoned".into()))?;
        Ok(tables
            .get(table)
            .and_then(|t| t.get(key))
            .map(|item| Self::project(item, projection)))
    }

    async fn put(
        &self,
        table: &str,
        item: Item,
        condition: Option<&Condition>,
    ) -> Result<(), CoreError> {
        let key = item
            .get(KEY_ATTR)
            .and_then(|v| v.as_s())
            .ok_or_else(|| CoreError::Store("item is missing the key attribute".into()))?
            .to_string();
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| CoreError::Store("mutex poisoned".into()))?;
        let t = tables.entry(table.to_string()).or_default();
        if let Some(cond) = condition {
            if !cond.holds(t.get(&key)) {
                return Err(CoreError::ConditionFailed);
            }
        }
        t.insert(key, item);
        Ok(())
    }

    async fn scan(
        &self,
        table: &str,
        filter: Option<&ScanFilter>,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Item>, CoreError> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| CoreError::Store("mutex poisoned".into()))?;
        let Some(t) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(t.values()
            .filter(|item| {
                filter.map_or(true, |f| item.get(&f.attribute) == Some(&f.equals))
            })
            .map(|item| Self::project(item, projection))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttrValue;

    fn mk_item(id: &str, host: &str) -> Item {
        let mut m = Item::new();
        m.insert("id".into(), AttrValue::S(id.into()));
        m.insert("hostParentId".into(), AttrValue::S(host.into()));
        m
    }

    #[tokio::test]
    async fn put_get_roundtrip_and_overwrite() {
        let store = MemoryStore::new();
        store.put("t", mk_item("a", "p1"), None).await.unwrap();
        store.put("t", mk_item("a", "p2"), None).await.unwrap();
        let got = store.get("t", "a", None).await.unwrap().unwrap();
        assert_eq!(got.get("hostParentId"), Some(&AttrValue::S("p2".into())));
        assert!(store.get("t", "missing", None).await.unwrap().is_none());
        assert!(store.get("other", "a", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn projection_restricts_attributes() {
        let store = MemoryStore::new();
        store.put("t", mk_item("a", "p1"), None).await.unwrap();
        let got = store.get("t", "a", Some(&["id"])).await.unwrap().unwrap();
        assert_eq!(got.len(), 1);
        assert!(got.contains_key("id"));
    }

    #[tokio::test]
    async fn scan_filters_by_attribute() {
        let store = MemoryStore::new();
        store.put("t", mk_item("a", "p1"), None).await.unwrap();
        store.put("t", mk_item("b", "p2"), None).await.unwrap();
        store.put("t", mk_item("c", "p1"), None).await.unwrap();

        let filter = ScanFilter::eq("hostParentId", AttrValue::S("p1".into()));
        let items = store.scan("t", Some(&filter), None).await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i["id"].as_s().unwrap()).collect();
        assert_eq!(ids, ["a", "c"]);

        assert_eq!(store.scan("t", None, None).await.unwrap().len(), 3);
        assert!(store.scan("empty", None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conditional_put_rejects_stale_state() {
        let store = MemoryStore::new();
        let cond = Condition::AttributeNotExists("version".into());
        let mut item = mk_item("a", "p1");
        item.insert("version".into(), AttrValue::N("1".into()));
        store.put("t", item.clone(), Some(&cond)).await.unwrap();

        let err = store.put("t", item, Some(&cond)).await.unwrap_err();
        assert_eq!(err, CoreError::ConditionFailed);
    }

    #[tokio::test]
    async fn put_without_key_fails() {
        let store = MemoryStore::new();
        let err = store.put("t", Item::new(), None).await.unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));
    }
}
