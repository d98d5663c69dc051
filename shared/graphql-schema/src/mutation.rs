use async_graphql::{Context, Error, ErrorExtensions, InputObject, Object, Result, ID};
use domain::Child as ChildRecord;
use domain::{Parent as ParentRecord, Party as PartyRecord};
use tracing::info;

use crate::types::{Child, Parent, Party};
use crate::{gql_err, service};

fn check_timestamp(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if !http_common::is_rfc3339(v) => Err(Error::new(format!(
            "{field} must be an RFC 3339 timestamp, got {v:?}"
        ))
        .extend_with(|_, ext| ext.set("code", "BAD_USER_INPUT"))),
        _ => Ok(()),
    }
}

#[derive(InputObject)]
pub struct CreateChildInput {
    pub client_mutation_id: Option<String>,
    pub id: String,
    #[graphql(validator(min_length = 1, max_length = 100))]
    pub name: Option<String>,
    pub birth_date: Option<String>,
}

pub struct CreateChildPayload {
    client_mutation_id: Option<String>,
    child_id: String,
}

#[Object]
impl CreateChildPayload {
    async fn client_mutation_id(&self) -> Option<&str> {
        self.client_mutation_id.as_deref()
    }

    async fn child(&self, ctx: &Context<'_>) -> Result<Option<Child>> {
        let child = service(ctx)?.get_child(&self.child_id).await.map_err(gql_err)?;
        Ok(child.map(Child))
    }
}

#[derive(InputObject)]
pub struct AddChildToPartyInput {
    pub client_mutation_id: Option<String>,
    pub child_id: String,
    #[graphql(validator(min_length = 1, max_length = 100))]
    pub name: Option<String>,
    pub party_id: String,
}

pub struct AddChildToPartyPayload {
    client_mutation_id: Option<String>,
    child_id: String,
    party_id: String,
}

#[Object]
impl AddChildToPartyPayload {
    async fn client_mutation_id(&self) -> Option<&str> {
        self.client_mutation_id.as_deref()
    }

    async fn child(&self, ctx: &Context<'_>) -> Result<Option<Child>> {
        let child = service(ctx)?.get_child(&self.child_id).await.map_err(gql_err)?;
        Ok(child.map(Child))
    }

    async fn party(&self, ctx: &Context<'_>) -> Result<Option<Party>> {
        let party = service(ctx)?.get_party(&self.party_id).await.map_err(gql_err)?;
        Ok(party.map(Party))
    }
}

#[derive(InputObject)]
pub struct CreatePartyInput {
    pub client_mutation_id: Option<String>,
    pub host_parent_id: ID,
    pub id: String,
    #[graphql(validator(min_length = 1, max_length = 30))]
    pub description: Option<String>,
    pub date_time: Option<String>,
    #[graphql(validator(max_length = 100))]
    pub venue_name: Option<String>,
    #[graphql(validator(max_length = 100))]
    pub venue_description: Option<String>,
    #[graphql(validator(min_length = 1, max_length = 100))]
    pub child_name: Option<String>,
}

pub struct CreatePartyPayload {
    client_mutation_id: Option<String>,
    party_id: String,
}

#[Object]
impl CreatePartyPayload {
    async fn client_mutation_id(&self) -> Option<&str> {
        self.client_mutation_id.as_deref()
    }

    async fn party(&self, ctx: &Context<'_>) -> Result<Option<Party>> {
        let party = service(ctx)?.get_party(&self.party_id).await.map_err(gql_err)?;
        Ok(party.map(Party))
    }
}

#[derive(InputObject)]
pub struct CreateParentInput {
    pub client_mutation_id: Option<String>,
    pub id: String,
    #[graphql(validator(min_length = 1, max_length = 100))]
    pub name: Option<String>,
    #[graphql(validator(max_length = 30))]
    pub mobile_number: Option<String>,
}

pub struct CreateParentPayload {
    client_mutation_id: Option<String>,
    parent_id: String,
}

#[Object]
impl CreateParentPayload {
    async fn client_mutation_id(&self) -> Option<&str> {
        self.client_mutation_id.as_deref()
    }

    async fn parent(&self, ctx: &Context<'_>) -> Result<Option<Parent>> {
        let parent = service(ctx)?.get_parent(&self.parent_id).await.map_err(gql_err)?;
        Ok(parent.map(Parent))
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create (or overwrite) a child
    async fn create_child(
        &self,
        ctx: &Context<'_>,
        input: CreateChildInput,
    ) -> Result<CreateChildPayload> {
        check_timestamp("birthDate", input.birth_date.as_deref())?;
        let svc = service(ctx)?;
        let child = svc
            .create_child(ChildRecord {
                id: input.id,
                name: input.name,
                birth_date: input.birth_date,
            })
            .await
            .map_err(gql_err)?;
        info!(child_id = %child.id, "createChild");
        Ok(CreateChildPayload {
            client_mutation_id: input.client_mutation_id,
            child_id: child.id,
        })
    }

    /// Write the child record, then append it to the party's invite list.
    ///
    /// The two writes are independent: if the append fails the child stays
    /// written. An existing child keeps its birth date, and its name unless a
    /// new one is given.
    async fn add_child_to_party(
        &self,
        ctx: &Context<'_>,
        input: AddChildToPartyInput,
    ) -> Result<AddChildToPartyPayload> {
        let svc = service(ctx)?;
        let existing = svc.get_child(&input.child_id).await.map_err(gql_err)?;
        let child = match existing {
            Some(prev) => ChildRecord {
                name: input.name.or(prev.name),
                ..prev
            },
            None => ChildRecord {
                id: input.child_id.clone(),
                name: input.name,
                birth_date: None,
            },
        };
        svc.create_child(child).await.map_err(gql_err)?;
        svc.add_child_to_party(&input.child_id, &input.party_id)
            .await
            .map_err(gql_err)?;
        info!(child_id = %input.child_id, party_id = %input.party_id, "addChildToParty");
        Ok(AddChildToPartyPayload {
            client_mutation_id: input.client_mutation_id,
            child_id: input.child_id,
            party_id: input.party_id,
        })
    }

    /// Create or fully replace a party, starting with an empty invite list
    async fn create_party(
        &self,
        ctx: &Context<'_>,
        input: CreatePartyInput,
    ) -> Result<CreatePartyPayload> {
        check_timestamp("dateTime", input.date_time.as_deref())?;
        let svc = service(ctx)?;
        let party = svc
            .put_party(PartyRecord {
                description: input.description,
                date_time: input.date_time,
                venue_name: input.venue_name,
                venue_description: input.venue_description,
                child_name: input.child_name,
                host_parent_id: Some(input.host_parent_id.to_string()),
                ..PartyRecord::new(input.id)
            })
            .await
            .map_err(gql_err)?;
        info!(party_id = %party.id, host_parent_id = ?party.host_parent_id, "createParty");
        Ok(CreatePartyPayload {
            client_mutation_id: input.client_mutation_id,
            party_id: party.id,
        })
    }

    /// Create (or overwrite) a parent
    async fn create_parent(
        &self,
        ctx: &Context<'_>,
        input: CreateParentInput,
    ) -> Result<CreateParentPayload> {
        let svc = service(ctx)?;
        let parent = svc
            .create_parent(ParentRecord {
                id: input.id,
                name: input.name,
                mobile_number: input.mobile_number,
            })
            .await
            .map_err(gql_err)?;
        info!(parent_id = %parent.id, "createParent");
        Ok(CreateParentPayload {
            client_mutation_id: input.client_mutation_id,
            parent_id: parent.id,
        })
    }
}
