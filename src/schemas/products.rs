//! Research products: datasets and their versions.

use chrono::NaiveDate;

use super::{AGENT, DATE, TEXT, expect_schema, items, push, text};
use crate::model::{
    Descriptor, Entity, EntityRef, NodeId, PropertyType, ReverseDescriptor, Schema, SchemaKind,
    Value,
};
use crate::Result;

const VERSION_TYPE: &[PropertyType] = &[PropertyType::Schema("DatasetVersion")];

// ============================================================================
// Dataset
// ============================================================================

static DATASET: Schema = Schema {
    name: "Dataset",
    type_uri: "https://openminds.ebrains.eu/core/Dataset",
    kind: SchemaKind::Entity,
    default_space: "dataset",
    properties: &[
        Dataset::FULL_NAME,
        Dataset::SHORT_NAME,
        Dataset::DESCRIPTION,
        Dataset::AUTHORS,
        Dataset::CUSTODIANS,
        Dataset::HAS_VERSIONS,
    ],
    reverse_properties: &[],
    existence_key: &["full_name"],
};

/// The version-independent description of a dataset.
#[derive(Debug, Clone)]
pub struct Dataset(EntityRef);

impl Dataset {
    pub const SCHEMA: &'static Schema = &DATASET;

    pub const FULL_NAME: Descriptor =
        Descriptor::new("full_name", "https://openminds.ebrains.eu/vocab/fullName", TEXT)
            .mark_required();
    pub const SHORT_NAME: Descriptor =
        Descriptor::new("short_name", "https://openminds.ebrains.eu/vocab/shortName", TEXT);
    pub const DESCRIPTION: Descriptor =
        Descriptor::new("description", "https://openminds.ebrains.eu/vocab/description", TEXT);
    /// Persons or organizations.
    pub const AUTHORS: Descriptor =
        Descriptor::new("authors", "https://openminds.ebrains.eu/vocab/author", AGENT)
            .multiple()
            .with_reverse("is_author_of");
    pub const CUSTODIANS: Descriptor =
        Descriptor::new("custodians", "https://openminds.ebrains.eu/vocab/custodian", AGENT)
            .multiple()
            .with_reverse("is_custodian_of");
    pub const HAS_VERSIONS: Descriptor =
        Descriptor::new("has_versions", "https://openminds.ebrains.eu/vocab/hasVersion", VERSION_TYPE)
            .multiple()
            .with_reverse("is_version_of");

    pub fn new(full_name: &str) -> Self {
        Self(Entity::new(&DATASET).with(&Self::FULL_NAME, full_name).into())
    }

    pub fn from_entity(entity: EntityRef) -> Result<Self> {
        expect_schema(&entity, &DATASET)?;
        Ok(Self(entity))
    }

    pub fn entity(&self) -> &EntityRef {
        &self.0
    }

    pub fn id(&self) -> Option<NodeId> {
        self.0.id()
    }

    pub fn full_name(&self) -> Option<String> {
        text(&self.0, &Self::FULL_NAME)
    }

    pub fn description(&self) -> Option<String> {
        text(&self.0, &Self::DESCRIPTION)
    }

    pub fn set_description(&self, description: &str) {
        self.0.put(&Self::DESCRIPTION, description);
    }

    pub fn authors(&self) -> Vec<Value> {
        items(&self.0, &Self::AUTHORS)
    }

    /// Append a person or organization.
    pub fn add_author(&self, author: impl Into<Value>) {
        push(&self.0, &Self::AUTHORS, author.into());
    }

    pub fn custodians(&self) -> Vec<Value> {
        items(&self.0, &Self::CUSTODIANS)
    }

    pub fn add_custodian(&self, custodian: impl Into<Value>) {
        push(&self.0, &Self::CUSTODIANS, custodian.into());
    }

    pub fn versions(&self) -> Vec<Value> {
        items(&self.0, &Self::HAS_VERSIONS)
    }

    pub fn add_version(&self, version: &DatasetVersion) {
        push(&self.0, &Self::HAS_VERSIONS, version.entity().into());
    }
}

impl From<&Dataset> for Value {
    fn from(d: &Dataset) -> Self {
        Value::Entity(d.0.clone())
    }
}

// ============================================================================
// DatasetVersion
// ============================================================================

static DATASET_VERSION: Schema = Schema {
    name: "DatasetVersion",
    type_uri: "https://openminds.ebrains.eu/core/DatasetVersion",
    kind: SchemaKind::Entity,
    default_space: "dataset",
    properties: &[
        DatasetVersion::FULL_NAME,
        DatasetVersion::SHORT_NAME,
        DatasetVersion::VERSION_IDENTIFIER,
        DatasetVersion::RELEASE_DATE,
        DatasetVersion::AUTHORS,
    ],
    reverse_properties: &[ReverseDescriptor::new(
        "is_version_of",
        "https://openminds.ebrains.eu/vocab/hasVersion",
        &["Dataset"],
    )
    .single()],
    existence_key: &["short_name", "version_identifier"],
};

#[derive(Debug, Clone)]
pub struct DatasetVersion(EntityRef);

impl DatasetVersion {
    pub const SCHEMA: &'static Schema = &DATASET_VERSION;

    pub const FULL_NAME: Descriptor =
        Descriptor::new("full_name", "https://openminds.ebrains.eu/vocab/fullName", TEXT);
    pub const SHORT_NAME: Descriptor =
        Descriptor::new("short_name", "https://openminds.ebrains.eu/vocab/shortName", TEXT);
    pub const VERSION_IDENTIFIER: Descriptor = Descriptor::new(
        "version_identifier",
        "https://openminds.ebrains.eu/vocab/versionIdentifier",
        TEXT,
    )
    .mark_required();
    pub const RELEASE_DATE: Descriptor =
        Descriptor::new("release_date", "https://openminds.ebrains.eu/vocab/releaseDate", DATE);
    pub const AUTHORS: Descriptor =
        Descriptor::new("authors", "https://openminds.ebrains.eu/vocab/author", AGENT)
            .multiple()
            .with_reverse("is_author_of");

    pub fn new(short_name: &str, version_identifier: &str) -> Self {
        Self(
            Entity::new(&DATASET_VERSION)
                .with(&Self::SHORT_NAME, short_name)
                .with(&Self::VERSION_IDENTIFIER, version_identifier)
                .into(),
        )
    }

    pub fn from_entity(entity: EntityRef) -> Result<Self> {
        expect_schema(&entity, &DATASET_VERSION)?;
        Ok(Self(entity))
    }

    pub fn entity(&self) -> &EntityRef {
        &self.0
    }

    pub fn id(&self) -> Option<NodeId> {
        self.0.id()
    }

    pub fn short_name(&self) -> Option<String> {
        text(&self.0, &Self::SHORT_NAME)
    }

    pub fn version_identifier(&self) -> Option<String> {
        text(&self.0, &Self::VERSION_IDENTIFIER)
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        self.0.get(Self::RELEASE_DATE.name).and_then(|v| v.as_date())
    }

    pub fn set_release_date(&self, date: NaiveDate) {
        self.0.put(&Self::RELEASE_DATE, date);
    }

    pub fn authors(&self) -> Vec<Value> {
        items(&self.0, &Self::AUTHORS)
    }

    pub fn add_author(&self, author: impl Into<Value>) {
        push(&self.0, &Self::AUTHORS, author.into());
    }

    /// The dataset listing this version, once resolved.
    pub fn is_version_of(&self) -> Option<Value> {
        self.0.get("is_version_of")
    }
}

impl From<&DatasetVersion> for Value {
    fn from(v: &DatasetVersion) -> Self {
        Value::Entity(v.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationPolicy;
    use crate::schemas::{Organization, Person};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_union_authors_keep_their_types() {
        let dataset = Dataset::new("Mouse hippocampus recordings");
        dataset.add_author(Person::new("Ada"));
        dataset.add_author(&Organization::new("EBRAINS"));

        let types: Vec<&str> = dataset
            .authors()
            .iter()
            .filter_map(|v| v.as_entity().map(|e| e.schema().name))
            .collect();
        assert_eq!(types, vec!["Person", "Organization"]);
    }

    #[test]
    fn test_release_date_encodes_as_iso_date() {
        let version = DatasetVersion::new("hc-rec", "v1.0");
        version.set_release_date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let doc = version.entity().read().to_document(&ValidationPolicy::default()).unwrap();
        assert_eq!(doc["https://openminds.ebrains.eu/vocab/releaseDate"], "2024-02-29");
        assert_eq!(version.release_date(), NaiveDate::from_ymd_opt(2024, 2, 29));
    }
}
