use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ExternalId, FormName, ModelError, SourceName};

/// The kind of metadata entity tracked for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Concept,
    AttributeType,
    IdentifierType,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Concept,
        EntityKind::AttributeType,
        EntityKind::IdentifierType,
    ];

    /// OpenMRS REST resource segment for this kind.
    pub fn rest_segment(self) -> &'static str {
        match self {
            EntityKind::Concept => "concept",
            EntityKind::AttributeType => "personattributetype",
            EntityKind::IdentifierType => "patientidentifiertype",
        }
    }

    /// Group name used in catalog input, report trees, and dashboard payloads.
    pub fn group_name(self) -> &'static str {
        match self {
            EntityKind::Concept => "concepts",
            EntityKind::AttributeType => "personattributetypes",
            EntityKind::IdentifierType => "patientidentifiertypes",
        }
    }

    /// Short label for tables and log lines.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Concept => "Concepts",
            EntityKind::AttributeType => "Attribute types",
            EntityKind::IdentifierType => "Identifier types",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

/// Per-source verification outcome for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    NotChecked,
    Found,
    /// Confirmed absent, or the lookup failed; rendered as "Missing".
    #[serde(rename = "Missing")]
    NotFound,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NotChecked => f.write_str("Not checked"),
            Status::Found => f.write_str("Found"),
            Status::NotFound => f.write_str("Missing"),
        }
    }
}

/// One catalog member: an identifier plus everything learned about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: ExternalId,
    pub kind: EntityKind,
    /// One entry per source this entity has been checked against.
    #[serde(default)]
    pub statuses: BTreeMap<SourceName, Status>,
    /// Forms referencing this entity, in first-seen order, deduplicated.
    #[serde(default)]
    pub forms: Vec<FormName>,
}

impl Entity {
    pub fn new(id: ExternalId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            statuses: BTreeMap::new(),
            forms: Vec::new(),
        }
    }

    /// Status against the given source, `NotChecked` when never visited.
    pub fn status_for(&self, source: &SourceName) -> Status {
        self.statuses.get(source).copied().unwrap_or_default()
    }

    /// Record form provenance, skipping duplicates.
    pub fn add_form(&mut self, form: FormName) {
        if !self.forms.contains(&form) {
            self.forms.push(form);
        }
    }
}

/// Entities of one kind in insertion order, with an id index for joins.
#[derive(Debug, Clone, Default)]
struct KindSet {
    entities: Vec<Entity>,
    index: HashMap<ExternalId, usize>,
}

impl KindSet {
    fn insert_or_get(&mut self, kind: EntityKind, id: ExternalId) -> &mut Entity {
        let position = match self.index.get(&id) {
            Some(&position) => position,
            None => {
                let position = self.entities.len();
                self.index.insert(id.clone(), position);
                self.entities.push(Entity::new(id, kind));
                position
            }
        };
        &mut self.entities[position]
    }

    fn get(&self, id: &ExternalId) -> Option<&Entity> {
        self.index.get(id).map(|&position| &self.entities[position])
    }

    fn get_mut(&mut self, id: &ExternalId) -> Option<&mut Entity> {
        self.index
            .get(id)
            .map(|&position| &mut self.entities[position])
    }
}

/// The normalized set of identifiers to verify, grouped by kind.
///
/// A given `(id, kind)` pair appears at most once; membership is only ever
/// extended through [`Catalog::insert_or_get`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kinds: BTreeMap<EntityKind, KindSet>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from the parsed spreadsheet-ingestion output.
    ///
    /// An input with no identifier groups at all is malformed (the upstream
    /// state object lost its uuid maps), not an empty catalog.
    pub fn from_input(input: CatalogInput) -> Result<Self, ModelError> {
        if input.concepts.is_empty() && input.attributes.is_empty() && input.identifiers.is_empty()
        {
            return Err(ModelError::MalformedInput(
                "catalog input contains no identifier groups".to_string(),
            ));
        }
        let mut catalog = Self::new();
        for (kind, group) in [
            (EntityKind::Concept, input.concepts),
            (EntityKind::AttributeType, input.attributes),
            (EntityKind::IdentifierType, input.identifiers),
        ] {
            for (id, member) in group {
                let id = ExternalId::new(id)?;
                let entity = catalog.insert_or_get(kind, id);
                for form in member.forms {
                    entity.add_form(FormName::new(form)?);
                }
            }
        }
        Ok(catalog)
    }

    /// Fetch the entity for `(kind, id)`, creating it when absent.
    pub fn insert_or_get(&mut self, kind: EntityKind, id: ExternalId) -> &mut Entity {
        self.kinds.entry(kind).or_default().insert_or_get(kind, id)
    }

    pub fn get(&self, kind: EntityKind, id: &ExternalId) -> Option<&Entity> {
        self.kinds.get(&kind).and_then(|set| set.get(id))
    }

    pub fn get_mut(&mut self, kind: EntityKind, id: &ExternalId) -> Option<&mut Entity> {
        self.kinds.get_mut(&kind).and_then(|set| set.get_mut(id))
    }

    /// Entities of one kind in insertion order.
    pub fn entities(&self, kind: EntityKind) -> &[Entity] {
        self.kinds
            .get(&kind)
            .map(|set| set.entities.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.entities(kind).len()
    }

    pub fn total_len(&self) -> usize {
        EntityKind::ALL.iter().map(|&kind| self.len(kind)).sum()
    }
}

/// Wire shape produced by the external spreadsheet-ingestion stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogInput {
    #[serde(default)]
    pub concepts: BTreeMap<String, CatalogMember>,
    #[serde(default)]
    pub attributes: BTreeMap<String, CatalogMember>,
    #[serde(default)]
    pub identifiers: BTreeMap<String, CatalogMember>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogMember {
    #[serde(default)]
    pub forms: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ExternalId {
        ExternalId::new(value).unwrap()
    }

    #[test]
    fn insert_or_get_deduplicates_by_id() {
        let mut catalog = Catalog::new();
        catalog
            .insert_or_get(EntityKind::Concept, id("uuid-1"))
            .add_form(FormName::new("F01").unwrap());
        catalog
            .insert_or_get(EntityKind::Concept, id("uuid-1"))
            .add_form(FormName::new("F02").unwrap());

        assert_eq!(catalog.len(EntityKind::Concept), 1);
        let entity = catalog.get(EntityKind::Concept, &id("uuid-1")).unwrap();
        assert_eq!(entity.forms.len(), 2);
    }

    #[test]
    fn same_id_is_distinct_across_kinds() {
        let mut catalog = Catalog::new();
        catalog.insert_or_get(EntityKind::Concept, id("uuid-1"));
        catalog.insert_or_get(EntityKind::AttributeType, id("uuid-1"));

        assert_eq!(catalog.len(EntityKind::Concept), 1);
        assert_eq!(catalog.len(EntityKind::AttributeType), 1);
        assert_eq!(catalog.total_len(), 2);
    }

    #[test]
    fn form_provenance_deduplicates() {
        let mut entity = Entity::new(id("uuid-1"), EntityKind::Concept);
        entity.add_form(FormName::new("F01").unwrap());
        entity.add_form(FormName::new("F01").unwrap());
        assert_eq!(entity.forms.len(), 1);
    }

    #[test]
    fn catalog_from_input_groups_by_kind() {
        let json = r#"{
            "concepts": {"c1": {"forms": ["F01", "F02"]}, "c2": {}},
            "attributes": {"a1": {}},
            "identifiers": {"i1": {}}
        }"#;
        let input: CatalogInput = serde_json::from_str(json).unwrap();
        let catalog = Catalog::from_input(input).unwrap();

        assert_eq!(catalog.len(EntityKind::Concept), 2);
        assert_eq!(catalog.len(EntityKind::AttributeType), 1);
        assert_eq!(catalog.len(EntityKind::IdentifierType), 1);
        let c1 = catalog.get(EntityKind::Concept, &id("c1")).unwrap();
        assert_eq!(c1.forms.len(), 2);
    }

    #[test]
    fn empty_catalog_input_is_malformed() {
        let input = CatalogInput::default();
        assert!(matches!(
            Catalog::from_input(input),
            Err(ModelError::MalformedInput(_))
        ));
    }

    #[test]
    fn status_serializes_not_found_as_missing() {
        let json = serde_json::to_string(&Status::NotFound).unwrap();
        assert_eq!(json, "\"Missing\"");
        let round: Status = serde_json::from_str("\"Missing\"").unwrap();
        assert_eq!(round, Status::NotFound);
    }
}
