//! GraphQL object types and the `Node` interface.

use async_graphql::connection::Connection;
use async_graphql::{Context, Interface, Object, Result, ID};
use domain::{CoreError, PartyService};

use crate::connection::{connection_from_slice, ArrayCursor};
use crate::global_id::{to_global_id, NodeKind};
use crate::{gql_err, service};

/// Party content
pub struct Party(pub domain::Party);

#[Object]
impl Party {
    async fn id(&self) -> ID {
        to_global_id(NodeKind::Party, &self.0.id)
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn host_parent_id(&self) -> Option<&str> {
        self.0.host_parent_id.as_deref()
    }

    async fn date_time(&self) -> Option<&str> {
        self.0.date_time.as_deref()
    }

    async fn venue_description(&self) -> Option<&str> {
        self.0.venue_description.as_deref()
    }

    async fn venue_name(&self) -> Option<&str> {
        self.0.venue_name.as_deref()
    }

    /// Name of the birthday child
    async fn child_name(&self) -> Option<&str> {
        self.0.child_name.as_deref()
    }

    /// The children that are invited to the party
    async fn invited_children(&self, ctx: &Context<'_>) -> Result<Vec<Option<Child>>> {
        let children = service(ctx)?
            .get_children_for_party(&self.0.id)
            .await
            .map_err(gql_err)?;
        Ok(children.into_iter().map(|c| c.map(Child)).collect())
    }
}

/// Parents are the users of the system
pub struct Parent(pub domain::Parent);

#[Object]
impl Parent {
    async fn id(&self) -> ID {
        to_global_id(NodeKind::Parent, &self.0.id)
    }

    async fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    async fn mobile_number(&self) -> Option<&str> {
        self.0.mobile_number.as_deref()
    }

    /// A collection of parties that the parent is administrating
    async fn parties(&self, ctx: &Context<'_>) -> Result<Vec<Party>> {
        let parties = service(ctx)?
            .get_host_parties(&self.0.id)
            .await
            .map_err(gql_err)?;
        Ok(parties.into_iter().map(Party).collect())
    }
}

/// Child that is either a guest of a party or the birthday child
pub struct Child(pub domain::Child);

#[Object]
impl Child {
    async fn id(&self) -> ID {
        to_global_id(NodeKind::Child, &self.0.id)
    }

    async fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    async fn birth_date(&self) -> Option<&str> {
        self.0.birth_date.as_deref()
    }
}

/// A person who uses our app; the viewer's parent record seen as a user
pub struct User(pub domain::Parent);

#[Object]
impl User {
    async fn id(&self) -> ID {
        to_global_id(NodeKind::User, &self.0.id)
    }

    async fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// A person's collection of widgets
    async fn widgets(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<Connection<ArrayCursor, Widget>> {
        let svc = service(ctx)?;
        connection_from_slice(svc.get_widgets(), after, before, first, last, |w| {
            Widget(w.clone())
        })
        .await
    }
}

/// A shiny widget
pub struct Widget(pub domain::Widget);

#[Object]
impl Widget {
    async fn id(&self) -> ID {
        to_global_id(NodeKind::Widget, &self.0.id)
    }

    /// The name of the widget
    async fn name(&self) -> &str {
        &self.0.name
    }
}

/// An object with a global id
#[derive(Interface)]
#[graphql(field(name = "id", ty = "ID", desc = "The global id of the object"))]
pub enum Node {
    Party(Party),
    Child(Child),
    Parent(Parent),
    User(User),
    Widget(Widget),
}

impl NodeKind {
    /// Resolver table: the typed getter behind each tag.
    pub async fn resolve(
        self,
        svc: &PartyService,
        id: &str,
    ) -> std::result::Result<Option<Node>, CoreError> {
        Ok(match self {
            NodeKind::Party => svc.get_party(id).await?.map(|p| Node::Party(Party(p))),
            NodeKind::Child => svc.get_child(id).await?.map(|c| Node::Child(Child(c))),
            NodeKind::Parent => svc.get_parent(id).await?.map(|p| Node::Parent(Parent(p))),
            NodeKind::User => svc.get_user(id).await?.map(|p| Node::User(User(p))),
            NodeKind::Widget => svc.get_widget(id).cloned().map(|w| Node::Widget(Widget(w))),
        })
    }
}
