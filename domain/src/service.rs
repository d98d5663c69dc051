use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::item::{
    child_to_item, item_to_child, item_to_parent, item_to_party, parent_to_item, party_to_item,
    ATTR_CHILDREN, ATTR_HOST_PARENT_ID, ATTR_VERSION, CHILD_PROJECTION,
};
use crate::{
    AttrValue, Child, Condition, CoreError, Fixtures, Parent, Party, ScanFilter, Store, Tables,
    Widget,
};

/// Attempts made by a guarded append before giving up with `Conflict`.
pub const MAX_APPEND_ATTEMPTS: usize = 8;

/// Fresh party write token. Never reused, so a guard cannot match a later write.
fn next_version() -> String {
    Uuid::new_v4().to_string()
}

/// Data access layer over the parents, parties and children tables.
///
/// Every read and write maps to a single store call, except the guarded
/// append in [`add_child_to_party`](Self::add_child_to_party) and the
/// concurrent child fetch in
/// [`get_children_for_party`](Self::get_children_for_party). Store errors are
/// relayed unchanged; a missing id is `Ok(None)`, never an error.
#[derive(Clone)]
pub struct PartyService {
    store: Arc<dyn Store>,
    tables: Tables,
    fixtures: Fixtures,
}

impl PartyService {
    pub fn new(store: Arc<dyn Store>, tables: Tables, fixtures: Fixtures) -> Self {
        Self {
            store,
            tables,
            fixtures,
        }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Unconditionally store a parent, overwriting any record with the same id.
    pub async fn create_parent(&self, parent: Parent) -> Result<Parent, CoreError> {
        debug!(table = %self.tables.parents, id = %parent.id, "put parent");
        self.store
            .put(&self.tables.parents, parent_to_item(&parent), None)
            .await?;
        Ok(parent)
    }

    pub async fn get_parent(&self, id: &str) -> Result<Option<Parent>, CoreError> {
        debug!(table = %self.tables.parents, id, "get parent");
        self.store
            .get(&self.tables.parents, id, None)
            .await?
            .map(|item| item_to_parent(&item))
            .transpose()
    }

    /// Unconditionally store a child.
    pub async fn create_child(&self, child: Child) -> Result<Child, CoreError> {
        debug!(table = %self.tables.children, id = %child.id, "put child");
        self.store
            .put(&self.tables.children, child_to_item(&child), None)
            .await?;
        Ok(child)
    }

    pub async fn get_child(&self, id: &str) -> Result<Option<Child>, CoreError> {
        debug!(table = %self.tables.children, id, "get child");
        self.store
            .get(&self.tables.children, id, Some(&CHILD_PROJECTION))
            .await?
            .map(|item| item_to_child(&item))
            .transpose()
    }

    /// Full scan of the children table.
    pub async fn get_children(&self) -> Result<Vec<Child>, CoreError> {
        debug!(table = %self.tables.children, "scan children");
        self.store
            .scan(&self.tables.children, None, Some(&CHILD_PROJECTION))
            .await?
            .iter()
            .map(item_to_child)
            .collect()
    }

    /// Upsert a party. `children` is always written, empty if the record had
    /// none, and the write token is replaced.
    pub async fn put_party(&self, mut party: Party) -> Result<Party, CoreError> {
        party.version = Some(next_version());
        debug!(table = %self.tables.parties, id = %party.id, "put party");
        self.store
            .put(&self.tables.parties, party_to_item(&party), None)
            .await?;
        Ok(party)
    }

    pub async fn get_party(&self, id: &str) -> Result<Option<Party>, CoreError> {
        debug!(table = %self.tables.parties, id, "get party");
        self.store
            .get(&self.tables.parties, id, None)
            .await?
            .map(|item| item_to_party(&item))
            .transpose()
    }

    /// Full scan of the parties table.
    pub async fn get_parties(&self) -> Result<Vec<Party>, CoreError> {
        debug!(table = %self.tables.parties, "scan parties");
        self.store
            .scan(&self.tables.parties, None, None)
            .await?
            .iter()
            .map(item_to_party)
            .collect()
    }

    /// Parties whose `hostParentId` equals `parent_id`.
    pub async fn get_host_parties(&self, parent_id: &str) -> Result<Vec<Party>, CoreError> {
        debug!(table = %self.tables.parties, parent_id, "scan host parties");
        let filter = ScanFilter::eq(ATTR_HOST_PARENT_ID, AttrValue::S(parent_id.to_string()));
        self.store
            .scan(&self.tables.parties, Some(&filter), None)
            .await?
            .iter()
            .map(item_to_party)
            .collect()
    }

    /// Append `child_id` to the party's invite list.
    ///
    /// The write-back is conditioned on the write token that was read, so
    /// neither a concurrent append nor an upsert can be silently overwritten;
    /// a lost race re-reads and tries again. Duplicate ids are not rejected.
    pub async fn add_child_to_party(
        &self,
        child_id: &str,
        party_id: &str,
    ) -> Result<Party, CoreError> {
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            let Some(item) = self.store.get(&self.tables.parties, party_id, None).await? else {
                return Err(CoreError::PartyNotFound(party_id.to_string()));
            };
            // Legacy items carry no version attribute; guard those on its absence.
            let expected = match item.get(ATTR_VERSION) {
                Some(v) => Condition::AttributeEquals {
                    name: ATTR_VERSION.into(),
                    value: v.clone(),
                },
                None => Condition::AttributeNotExists(ATTR_VERSION.into()),
            };
            let mut party = item_to_party(&item)?;
            party.children.push(child_id.to_string());
            party.version = Some(next_version());

            match self
                .store
                .put(&self.tables.parties, party_to_item(&party), Some(&expected))
                .await
            {
                Ok(()) => {
                    info!(party_id, child_id, attempt, "child added to party");
                    return Ok(party);
                }
                Err(CoreError::ConditionFailed) => {
                    warn!(party_id, child_id, attempt, "party changed concurrently; retrying append");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::Conflict(format!(
            "party {party_id} kept changing during {MAX_APPEND_ATTEMPTS} append attempts"
        )))
    }

    /// Resolve every child invited to a party, in invitation order.
    ///
    /// All lookups run concurrently and are awaited before returning. Ids that
    /// no longer resolve yield `None` at their position; a missing party yields
    /// an empty list.
    pub async fn get_children_for_party(
        &self,
        party_id: &str,
    ) -> Result<Vec<Option<Child>>, CoreError> {
        debug!(table = %self.tables.parties, party_id, "get party children");
        let Some(item) = self
            .store
            .get(&self.tables.parties, party_id, Some(&[ATTR_CHILDREN]))
            .await?
        else {
            return Ok(Vec::new());
        };
        let ids: Vec<String> = item
            .get(ATTR_CHILDREN)
            .and_then(|v| v.as_l())
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_s().map(|s| s.to_string()))
            .collect();
        try_join_all(ids.iter().map(|id| self.get_child(id))).await
    }

    /// The viewer's parent record when `id` is the viewer id.
    pub async fn get_user(&self, id: &str) -> Result<Option<Parent>, CoreError> {
        if id == self.fixtures.viewer_id {
            self.get_viewer().await
        } else {
            Ok(None)
        }
    }

    pub async fn get_viewer(&self) -> Result<Option<Parent>, CoreError> {
        self.get_parent(&self.fixtures.viewer_id).await
    }

    pub fn get_widget(&self, id: &str) -> Option<&Widget> {
        self.fixtures.widgets.iter().find(|w| w.id == id)
    }

    pub fn get_widgets(&self) -> &[Widget] {
        &self.fixtures.widgets
    }
}
