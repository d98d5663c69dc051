use async_graphql::{Context, EmptySubscription, Object, Result, Schema, ID};
use domain::PartyService;
use tracing::debug;

use crate::global_id::from_global_id;
use crate::mutation::MutationRoot;
use crate::types::{Child, Node, Parent, Party};
use crate::{gql_err, service};

pub type PartySchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the executable schema with the data access layer attached.
pub fn build_schema(service: PartyService) -> PartySchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

/// Schema definition language of the full schema.
pub fn sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Fetches an object given its global id
    async fn node(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Node>> {
        let Some(gid) = from_global_id(&id) else {
            debug!(id = %id.as_str(), "undecodable global id");
            return Ok(None);
        };
        let Some(kind) = gid.kind() else {
            debug!(type_name = %gid.type_name, "unknown node type");
            return Ok(None);
        };
        kind.resolve(service(ctx)?, &gid.id).await.map_err(gql_err)
    }

    async fn parties(&self, ctx: &Context<'_>) -> Result<Vec<Party>> {
        let parties = service(ctx)?.get_parties().await.map_err(gql_err)?;
        Ok(parties.into_iter().map(Party).collect())
    }

    async fn children(&self, ctx: &Context<'_>) -> Result<Vec<Child>> {
        let children = service(ctx)?.get_children().await.map_err(gql_err)?;
        Ok(children.into_iter().map(Child).collect())
    }

    /// Look up a parent by local id; null when no id is given
    async fn parent(&self, ctx: &Context<'_>, id: Option<String>) -> Result<Option<Parent>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let parent = service(ctx)?.get_parent(&id).await.map_err(gql_err)?;
        Ok(parent.map(Parent))
    }

    /// The parent record of the signed-in user
    async fn viewer(&self, ctx: &Context<'_>) -> Result<Option<Parent>> {
        let viewer = service(ctx)?.get_viewer().await.map_err(gql_err)?;
        Ok(viewer.map(Parent))
    }
}
