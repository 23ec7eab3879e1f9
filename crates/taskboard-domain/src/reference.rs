//! Serde helpers for references the store nests as `{ "id": n, ... }`.
//!
//! Only the id is kept; any other fields of the nested object are ignored.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entity::EntityId;

#[derive(Serialize, Deserialize)]
struct IdRef {
    id: EntityId,
}

pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Option<EntityId>, s: S) -> Result<S::Ok, S::Error> {
        id.map(|id| IdRef { id }).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<EntityId>, D::Error> {
        Ok(Option::<IdRef>::deserialize(d)?.map(|r| r.id))
    }
}

pub mod required {
    use super::*;

    pub fn serialize<S: Serializer>(id: &EntityId, s: S) -> Result<S::Ok, S::Error> {
        IdRef { id: *id }.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<EntityId, D::Error> {
        Ok(IdRef::deserialize(d)?.id)
    }
}
