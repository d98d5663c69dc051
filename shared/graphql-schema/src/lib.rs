//! GraphQL schema and resolvers for the party planner.
//!
//! Exposes the data access layer as a Relay-compliant graph: every object
//! type implements `Node` and carries a global id, widgets are paginated as a
//! connection, and mutations follow the `clientMutationId` convention.
//!
//! ## Schema
//!
//! - **Queries**: `node`, `parties`, `children`, `parent`, `viewer`
//! - **Mutations**: `createChild`, `addChildToParty`, `createParty`, `createParent`
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use domain::{adapters::memory_store::MemoryStore, Fixtures, PartyService, Tables};
//! # async fn demo() {
//! let service = PartyService::new(Arc::new(MemoryStore::new()), Tables::default(), Fixtures::default());
//! let schema = graphql_schema::build_schema(service);
//! let res = schema.execute("{ viewer { name } }").await;
//! # }
//! ```

mod connection;
mod global_id;
mod mutation;
mod schema;
mod types;

pub use connection::{ArrayCursor, CursorError, Window};
pub use global_id::{from_global_id, to_global_id, GlobalId, NodeKind};
pub use mutation::*;
pub use schema::{build_schema, sdl, PartySchema, QueryRoot};
pub use types::*;

use async_graphql::{Context, ErrorExtensions};
use domain::{CoreError, PartyService};

/// The data access layer registered as schema data.
pub(crate) fn service<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a PartyService> {
    ctx.data::<PartyService>()
}

/// Field error carrying the domain error code as the `code` extension.
pub(crate) fn gql_err(err: CoreError) -> async_graphql::Error {
    let code = err.code();
    async_graphql::Error::new(err.to_string()).extend_with(|_, ext| ext.set("code", code))
}
