//! Mapping between entity records and store items.
//!
//! Attribute names match the camelCase document shape written by earlier
//! clients of the same tables. Optional attributes are omitted when `None`.

use crate::{AttrValue, Child, CoreError, Item, Parent, Party, KEY_ATTR};

pub const ATTR_NAME: &str = "name";
pub const ATTR_MOBILE_NUMBER: &str = "mobileNumber";
pub const ATTR_BIRTH_DATE: &str = "birthDate";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_DATE_TIME: &str = "dateTime";
pub const ATTR_VENUE_DESCRIPTION: &str = "venueDescription";
pub const ATTR_VENUE_NAME: &str = "venueName";
pub const ATTR_HOST_PARENT_ID: &str = "hostParentId";
pub const ATTR_CHILD_NAME: &str = "childName";
pub const ATTR_CHILDREN: &str = "children";
pub const ATTR_VERSION: &str = "version";

/// Attributes a child lookup is restricted to.
pub const CHILD_PROJECTION: [&str; 3] = [KEY_ATTR, ATTR_NAME, ATTR_BIRTH_DATE];

fn put_opt(m: &mut Item, name: &str, value: &Option<String>) {
    if let Some(v) = value {
        m.insert(name.into(), AttrValue::S(v.clone()));
    }
}

fn get_opt(item: &Item, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s()).map(|s| s.to_string())
}

fn get_id(item: &Item, kind: &str) -> Result<String, CoreError> {
    get_opt(item, KEY_ATTR).ok_or_else(|| CoreError::InvalidItem(format!("{kind} item missing id")))
}

pub fn parent_to_item(parent: &Parent) -> Item {
    let mut m = Item::new();
    m.insert(KEY_ATTR.into(), AttrValue::S(parent.id.clone()));
    put_opt(&mut m, ATTR_NAME, &parent.name);
    put_opt(&mut m, ATTR_MOBILE_NUMBER, &parent.mobile_number);
    m
}

pub fn item_to_parent(item: &Item) -> Result<Parent, CoreError> {
    Ok(Parent {
        id: get_id(item, "parent")?,
        name: get_opt(item, ATTR_NAME),
        mobile_number: get_opt(item, ATTR_MOBILE_NUMBER),
    })
}

pub fn child_to_item(child: &Child) -> Item {
    let mut m = Item::new();
    m.insert(KEY_ATTR.into(), AttrValue::S(child.id.clone()));
    put_opt(&mut m, ATTR_NAME, &child.name);
    put_opt(&mut m, ATTR_BIRTH_DATE, &child.birth_date);
    m
}

pub fn item_to_child(item: &Item) -> Result<Child, CoreError> {
    Ok(Child {
        id: get_id(item, "child")?,
        name: get_opt(item, ATTR_NAME),
        birth_date: get_opt(item, ATTR_BIRTH_DATE),
    })
}

pub fn party_to_item(party: &Party) -> Item {
    let mut m = Item::new();
    m.insert(KEY_ATTR.into(), AttrValue::S(party.id.clone()));
    put_opt(&mut m, ATTR_DESCRIPTION, &party.description);
    put_opt(&mut m, ATTR_DATE_TIME, &party.date_time);
    put_opt(&mut m, ATTR_VENUE_DESCRIPTION, &party.venue_description);
    put_opt(&mut m, ATTR_VENUE_NAME, &party.venue_name);
    put_opt(&mut m, ATTR_HOST_PARENT_ID, &party.host_parent_id);
    put_opt(&mut m, ATTR_CHILD_NAME, &party.child_name);
    m.insert(
        ATTR_CHILDREN.into(),
        AttrValue::L(party.children.iter().cloned().map(AttrValue::S).collect()),
    );
    put_opt(&mut m, ATTR_VERSION, &party.version);
    m
}

pub fn item_to_party(item: &Item) -> Result<Party, CoreError> {
    // Older items may lack `children` and `version`; both default.
    let children = match item.get(ATTR_CHILDREN) {
        None | Some(AttrValue::Null) => Vec::new(),
        Some(AttrValue::L(values)) => values
            .iter()
            .map(|v| {
                v.as_s()
                    .map(|s| s.to_string())
                    .ok_or_else(|| CoreError::InvalidItem("party children must be strings".into()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(CoreError::InvalidItem("party children must be a list".into())),
    };
    // Numeric versions were written by the earlier counter scheme.
    let version = match item.get(ATTR_VERSION) {
        None | Some(AttrValue::Null) => None,
        Some(AttrValue::S(s)) | Some(AttrValue::N(s)) => Some(s.clone()),
        Some(_) => return Err(CoreError::InvalidItem("party version must be a scalar".into())),
    };
    Ok(Party {
        id: get_id(item, "party")?,
        description: get_opt(item, ATTR_DESCRIPTION),
        date_time: get_opt(item, ATTR_DATE_TIME),
        venue_description: get_opt(item, ATTR_VENUE_DESCRIPTION),
        venue_name: get_opt(item, ATTR_VENUE_NAME),
        host_parent_id: get_opt(item, ATTR_HOST_PARENT_ID),
        child_name: get_opt(item, ATTR_CHILD_NAME),
        children,
        version,
    })
}
