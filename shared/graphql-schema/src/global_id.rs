//! Relay global object identification.
//!
//! A global id is the base64 encoding of `"{Type}:{localId}"`. Local ids are
//! only unique within their own collection, so the type tag is what makes the
//! encoded id unique across the graph.

use async_graphql::ID;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Every type reachable through the `node` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Party,
    Child,
    Parent,
    User,
    Widget,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Party,
        NodeKind::Child,
        NodeKind::Parent,
        NodeKind::User,
        NodeKind::Widget,
    ];

    /// The GraphQL type name used as the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Party => "Party",
            NodeKind::Child => "Child",
            NodeKind::Parent => "Parent",
            NodeKind::User => "User",
            NodeKind::Widget => "Widget",
        }
    }

    /// Tags are case-sensitive, like GraphQL type names.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

/// Decoded global id. `type_name` is kept raw so unknown tags can be reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalId {
    pub type_name: String,
    pub id: String,
}

impl GlobalId {
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::parse(&self.type_name)
    }
}

pub fn to_global_id(kind: NodeKind, id: &str) -> ID {
    ID(STANDARD.encode(format!("{}:{}", kind.as_str(), id)))
}

/// Decode a global id; `None` when it is not base64 of `Type:id`.
///
/// Splits on the first `:`, so local ids may themselves contain colons.
pub fn from_global_id(global_id: &str) -> Option<GlobalId> {
    let bytes = STANDARD.decode(global_id).ok()?;
    let raw = String::from_utf8(bytes).ok()?;
    let (type_name, id) = raw.split_once(':')?;
    Some(GlobalId {
        type_name: type_name.to_string(),
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_like_relay() {
        assert_eq!(to_global_id(NodeKind::Party, "z1").0, "UGFydHk6ejE=");
    }

    #[test]
    fn roundtrip_every_kind() {
        for kind in NodeKind::ALL {
            let gid = to_global_id(kind, "a:b");
            let decoded = from_global_id(&gid).unwrap();
            assert_eq!(decoded.kind(), Some(kind));
            assert_eq!(decoded.id, "a:b");
        }
    }

    #[test]
    fn unknown_tags_and_garbage() {
        let gid = STANDARD.encode("Balloon:1");
        let decoded = from_global_id(&gid).unwrap();
        assert_eq!(decoded.type_name, "Balloon");
        assert_eq!(decoded.kind(), None);

        assert_eq!(from_global_id("%%%"), None);
        assert_eq!(from_global_id(&STANDARD.encode("no-separator")), None);
        assert_eq!(NodeKind::parse("party"), None);
    }
}
