//! People, organizations and how they relate.

use chrono::NaiveDate;

use super::{DATE, IRI, TEXT, expect_schema, items, push, text, texts};
use crate::model::{
    Descriptor, EmbeddedValue, Entity, EntityRef, NodeId, PropertyType, ReverseDescriptor, Schema,
    SchemaKind, Value,
};
use crate::{Error, Result};

const AFFILIATION_TYPE: &[PropertyType] = &[PropertyType::Schema("Affiliation")];
const CONTACT_TYPE: &[PropertyType] = &[PropertyType::Schema("ContactInformation")];
const ORGANIZATION_TYPE: &[PropertyType] = &[PropertyType::Schema("Organization")];

// ============================================================================
// Person
// ============================================================================

static PERSON: Schema = Schema {
    name: "Person",
    type_uri: "https://openminds.ebrains.eu/core/Person",
    kind: SchemaKind::Entity,
    default_space: "common",
    properties: &[
        Person::GIVEN_NAME,
        Person::FAMILY_NAME,
        Person::ALTERNATE_NAMES,
        Person::AFFILIATIONS,
        Person::CONTACT_INFORMATION,
    ],
    reverse_properties: &[
        ReverseDescriptor::new(
            "is_author_of",
            "https://openminds.ebrains.eu/vocab/author",
            &["Dataset", "DatasetVersion"],
        ),
        ReverseDescriptor::new(
            "is_custodian_of",
            "https://openminds.ebrains.eu/vocab/custodian",
            &["Dataset"],
        ),
    ],
    existence_key: &["given_name", "family_name"],
};

/// A human being.
#[derive(Debug, Clone)]
pub struct Person(EntityRef);

impl Person {
    pub const SCHEMA: &'static Schema = &PERSON;

    pub const GIVEN_NAME: Descriptor =
        Descriptor::new("given_name", "https://openminds.ebrains.eu/vocab/givenName", TEXT)
            .mark_required();
    pub const FAMILY_NAME: Descriptor =
        Descriptor::new("family_name", "https://openminds.ebrains.eu/vocab/familyName", TEXT);
    pub const ALTERNATE_NAMES: Descriptor =
        Descriptor::new("alternate_names", "https://openminds.ebrains.eu/vocab/alternateName", TEXT)
            .multiple();
    pub const AFFILIATIONS: Descriptor = Descriptor::new(
        "affiliations",
        "https://openminds.ebrains.eu/vocab/affiliation",
        AFFILIATION_TYPE,
    )
    .multiple();
    pub const CONTACT_INFORMATION: Descriptor = Descriptor::new(
        "contact_information",
        "https://openminds.ebrains.eu/vocab/contactInformation",
        CONTACT_TYPE,
    )
    .with_reverse("is_contact_information_of");

    pub fn new(given_name: &str) -> Self {
        Self(Entity::new(&PERSON).with(&Self::GIVEN_NAME, given_name).into())
    }

    pub fn from_entity(entity: EntityRef) -> Result<Self> {
        expect_schema(&entity, &PERSON)?;
        Ok(Self(entity))
    }

    pub fn entity(&self) -> &EntityRef {
        &self.0
    }

    pub fn id(&self) -> Option<NodeId> {
        self.0.id()
    }

    pub fn given_name(&self) -> Option<String> {
        text(&self.0, &Self::GIVEN_NAME)
    }

    pub fn set_given_name(&self, name: &str) {
        self.0.put(&Self::GIVEN_NAME, name);
    }

    pub fn family_name(&self) -> Option<String> {
        text(&self.0, &Self::FAMILY_NAME)
    }

    pub fn set_family_name(&self, name: &str) {
        self.0.put(&Self::FAMILY_NAME, name);
    }

    pub fn alternate_names(&self) -> Vec<String> {
        texts(&self.0, &Self::ALTERNATE_NAMES)
    }

    pub fn set_alternate_names<S: AsRef<str>>(&self, names: &[S]) {
        let names: Vec<Value> = names.iter().map(|n| Value::from(n.as_ref())).collect();
        self.0.put(&Self::ALTERNATE_NAMES, names);
    }

    pub fn affiliations(&self) -> Vec<Affiliation> {
        items(&self.0, &Self::AFFILIATIONS)
            .iter()
            .filter_map(Value::as_embedded)
            .map(|e| Affiliation(e.clone()))
            .collect()
    }

    pub fn add_affiliation(&self, affiliation: Affiliation) {
        push(&self.0, &Self::AFFILIATIONS, affiliation.into());
    }

    /// Proxy until resolved, then the entity.
    pub fn contact_information(&self) -> Option<Value> {
        self.0.get(Self::CONTACT_INFORMATION.name)
    }

    pub fn set_contact_information(&self, contact: &ContactInformation) {
        self.0.put(&Self::CONTACT_INFORMATION, contact.entity());
    }

    /// Datasets and versions listing this person as author. A deferred
    /// query until resolved; unset on persons that were never saved.
    pub fn is_author_of(&self) -> Option<Value> {
        self.0.get("is_author_of")
    }

    pub fn is_custodian_of(&self) -> Option<Value> {
        self.0.get("is_custodian_of")
    }
}

impl From<Person> for Value {
    fn from(p: Person) -> Self {
        Value::Entity(p.0)
    }
}

impl From<&Person> for Value {
    fn from(p: &Person) -> Self {
        Value::Entity(p.0.clone())
    }
}

// ============================================================================
// Organization
// ============================================================================

static ORGANIZATION: Schema = Schema {
    name: "Organization",
    type_uri: "https://openminds.ebrains.eu/core/Organization",
    kind: SchemaKind::Entity,
    default_space: "common",
    properties: &[
        Organization::FULL_NAME,
        Organization::SHORT_NAME,
        Organization::HAS_PARENTS,
        Organization::HOMEPAGE,
    ],
    reverse_properties: &[
        ReverseDescriptor::new(
            "has_children",
            "https://openminds.ebrains.eu/vocab/hasParent",
            &["Organization"],
        ),
        ReverseDescriptor::new(
            "is_author_of",
            "https://openminds.ebrains.eu/vocab/author",
            &["Dataset", "DatasetVersion"],
        ),
    ],
    existence_key: &["full_name"],
};

#[derive(Debug, Clone)]
pub struct Organization(EntityRef);

impl Organization {
    pub const SCHEMA: &'static Schema = &ORGANIZATION;

    pub const FULL_NAME: Descriptor =
        Descriptor::new("full_name", "https://openminds.ebrains.eu/vocab/fullName", TEXT)
            .mark_required();
    pub const SHORT_NAME: Descriptor =
        Descriptor::new("short_name", "https://openminds.ebrains.eu/vocab/shortName", TEXT);
    pub const HAS_PARENTS: Descriptor = Descriptor::new(
        "has_parents",
        "https://openminds.ebrains.eu/vocab/hasParent",
        ORGANIZATION_TYPE,
    )
    .multiple()
    .with_reverse("has_children");
    pub const HOMEPAGE: Descriptor =
        Descriptor::new("homepage", "https://openminds.ebrains.eu/vocab/homepage", IRI);

    pub fn new(full_name: &str) -> Self {
        Self(Entity::new(&ORGANIZATION).with(&Self::FULL_NAME, full_name).into())
    }

    pub fn from_entity(entity: EntityRef) -> Result<Self> {
        expect_schema(&entity, &ORGANIZATION)?;
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

    pub fn short_name(&self) -> Option<String> {
        text(&self.0, &Self::SHORT_NAME)
    }

    pub fn set_short_name(&self, name: &str) {
        self.0.put(&Self::SHORT_NAME, name);
    }

    pub fn homepage(&self) -> Option<String> {
        text(&self.0, &Self::HOMEPAGE)
    }

    pub fn set_homepage(&self, url: &str) {
        self.0.put(&Self::HOMEPAGE, url);
    }

    pub fn has_parents(&self) -> Vec<Value> {
        items(&self.0, &Self::HAS_PARENTS)
    }

    pub fn add_parent(&self, parent: &Organization) {
        push(&self.0, &Self::HAS_PARENTS, parent.into());
    }

    /// Organizations naming this one as parent.
    pub fn has_children(&self) -> Option<Value> {
        self.0.get("has_children")
    }
}

impl From<Organization> for Value {
    fn from(o: Organization) -> Self {
        Value::Entity(o.0)
    }
}

impl From<&Organization> for Value {
    fn from(o: &Organization) -> Self {
        Value::Entity(o.0.clone())
    }
}

// ============================================================================
// ContactInformation
// ============================================================================

static CONTACT_INFORMATION: Schema = Schema {
    name: "ContactInformation",
    type_uri: "https://openminds.ebrains.eu/core/ContactInformation",
    kind: SchemaKind::Entity,
    // Personal data is kept out of the public space.
    default_space: "restricted",
    properties: &[ContactInformation::EMAIL],
    reverse_properties: &[ReverseDescriptor::new(
        "is_contact_information_of",
        "https://openminds.ebrains.eu/vocab/contactInformation",
        &["Person"],
    )
    .single()],
    existence_key: &["email"],
};

#[derive(Debug, Clone)]
pub struct ContactInformation(EntityRef);

impl ContactInformation {
    pub const SCHEMA: &'static Schema = &CONTACT_INFORMATION;

    pub const EMAIL: Descriptor =
        Descriptor::new("email", "https://openminds.ebrains.eu/vocab/email", TEXT).mark_required();

    pub fn new(email: &str) -> Self {
        Self(Entity::new(&CONTACT_INFORMATION).with(&Self::EMAIL, email).into())
    }

    pub fn from_entity(entity: EntityRef) -> Result<Self> {
        expect_schema(&entity, &CONTACT_INFORMATION)?;
        Ok(Self(entity))
    }

    pub fn entity(&self) -> &EntityRef {
        &self.0
    }

    pub fn id(&self) -> Option<NodeId> {
        self.0.id()
    }

    pub fn email(&self) -> Option<String> {
        text(&self.0, &Self::EMAIL)
    }

    pub fn is_contact_information_of(&self) -> Option<Value> {
        self.0.get("is_contact_information_of")
    }
}

impl From<&ContactInformation> for Value {
    fn from(c: &ContactInformation) -> Self {
        Value::Entity(c.0.clone())
    }
}

// ============================================================================
// Affiliation (embedded)
// ============================================================================

static AFFILIATION: Schema = Schema {
    name: "Affiliation",
    type_uri: "https://openminds.ebrains.eu/core/Affiliation",
    kind: SchemaKind::Embedded,
    default_space: "",
    properties: &[Affiliation::MEMBER_OF, Affiliation::START_DATE, Affiliation::END_DATE],
    reverse_properties: &[],
    existence_key: &[],
};

/// Membership of a person in an organization, inlined into the person.
#[derive(Debug, Clone, PartialEq)]
pub struct Affiliation(EmbeddedValue);

impl Affiliation {
    pub const SCHEMA: &'static Schema = &AFFILIATION;

    pub const MEMBER_OF: Descriptor =
        Descriptor::new("member_of", "https://openminds.ebrains.eu/vocab/memberOf", ORGANIZATION_TYPE)
            .mark_required();
    pub const START_DATE: Descriptor =
        Descriptor::new("start_date", "https://openminds.ebrains.eu/vocab/startDate", DATE);
    pub const END_DATE: Descriptor =
        Descriptor::new("end_date", "https://openminds.ebrains.eu/vocab/endDate", DATE);

    pub fn new(member_of: &Organization) -> Self {
        Self(EmbeddedValue::new(&AFFILIATION).with(&Self::MEMBER_OF, member_of))
    }

    pub fn from_value(value: EmbeddedValue) -> Result<Self> {
        if value.schema() != &AFFILIATION {
            return Err(Error::InvalidDocument(format!(
                "expected an Affiliation, got a {}",
                value.schema().name
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> &EmbeddedValue {
        &self.0
    }

    pub fn member_of(&self) -> Option<&Value> {
        self.0.get(Self::MEMBER_OF.name)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.0.get(Self::START_DATE.name).and_then(Value::as_date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.0.get(Self::END_DATE.name).and_then(Value::as_date)
    }

    pub fn with_start_date(self, date: NaiveDate) -> Self {
        Self(self.0.with(&Self::START_DATE, date))
    }

    pub fn with_end_date(self, date: NaiveDate) -> Self {
        Self(self.0.with(&Self::END_DATE, date))
    }
}

impl From<Affiliation> for Value {
    fn from(a: Affiliation) -> Self {
        Value::Embedded(Box::new(a.0))
    }
}
