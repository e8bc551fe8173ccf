//! Form state store for personal details, experience, education and skills.
//!
//! Collections are addressed by index only. Records sit behind `Arc` so that
//! an update swaps out exactly one record and every other record stays
//! pointer-equal to the previous snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised by store operations.
///
/// A failed operation never leaves the store partially modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{collection} index {index} out of range (len {len})")]
    IndexOutOfRange {
        collection: Collection,
        index: usize,
        len: usize,
    },

    #[error("unknown {record} field '{name}'")]
    UnknownField { record: &'static str, name: String },

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
}

/// The index-addressed collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Experience,
    Education,
    Skill,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Experience => write!(f, "experience"),
            Collection::Education => write!(f, "education"),
            Collection::Skill => write!(f, "skill"),
        }
    }
}

impl FromStr for Collection {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "experience" => Ok(Collection::Experience),
            "education" => Ok(Collection::Education),
            "skill" | "skills" => Ok(Collection::Skill),
            other => Err(FormError::UnknownCollection(other.to_string())),
        }
    }
}

/// Declares a field-name enum that parses from the input names used by the
/// form widgets.
macro_rules! field_enum {
    ($(#[$meta:meta])* $name:ident, $record:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FormError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(FormError::UnknownField {
                        record: $record,
                        name: other.to_string(),
                    }),
                }
            }
        }
    };
}

field_enum!(
    /// Fields of [`PersonalInfo`].
    PersonalField, "personal", {
        Name => "name",
        Email => "email",
        Phone => "phone",
    }
);

field_enum!(
    /// Fields of [`ExperienceEntry`].
    ExperienceField, "experience", {
        Company => "company",
        Position => "position",
        Duration => "duration",
        Description => "description",
    }
);

field_enum!(
    /// Fields of [`EducationEntry`].
    EducationField, "education", {
        Institution => "institution",
        Degree => "degree",
        Year => "year",
    }
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl PersonalInfo {
    pub fn set(&mut self, field: PersonalField, value: String) {
        match field {
            PersonalField::Name => self.name = value,
            PersonalField::Email => self.email = value,
            PersonalField::Phone => self.phone = value,
        }
    }

    pub fn get(&self, field: PersonalField) -> &str {
        match field {
            PersonalField::Name => &self.name,
            PersonalField::Email => &self.email,
            PersonalField::Phone => &self.phone,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub duration: String,
    pub description: String,
}

impl ExperienceEntry {
    pub fn set(&mut self, field: ExperienceField, value: String) {
        match field {
            ExperienceField::Company => self.company = value,
            ExperienceField::Position => self.position = value,
            ExperienceField::Duration => self.duration = value,
            ExperienceField::Description => self.description = value,
        }
    }

    pub fn get(&self, field: ExperienceField) -> &str {
        match field {
            ExperienceField::Company => &self.company,
            ExperienceField::Position => &self.position,
            ExperienceField::Duration => &self.duration,
            ExperienceField::Description => &self.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub year: String,
}

impl EducationEntry {
    pub fn set(&mut self, field: EducationField, value: String) {
        match field {
            EducationField::Institution => self.institution = value,
            EducationField::Degree => self.degree = value,
            EducationField::Year => self.year = value,
        }
    }

    pub fn get(&self, field: EducationField) -> &str {
        match field {
            EducationField::Institution => &self.institution,
            EducationField::Degree => &self.degree,
            EducationField::Year => &self.year,
        }
    }
}

/// Full value of the store at a point in time.
///
/// Cloning is cheap: only the `Arc` handles are copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSnapshot {
    pub personal: Arc<PersonalInfo>,
    pub experiences: Vec<Arc<ExperienceEntry>>,
    pub educations: Vec<Arc<EducationEntry>>,
    pub skills: Vec<Arc<str>>,
}

impl Default for FormSnapshot {
    /// The mount-time state: one empty record in every collection.
    fn default() -> Self {
        Self {
            personal: Arc::default(),
            experiences: vec![Arc::default()],
            educations: vec![Arc::default()],
            skills: vec![Arc::from("")],
        }
    }
}

impl FormSnapshot {
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Experience => self.experiences.len(),
            Collection::Education => self.educations.len(),
            Collection::Skill => self.skills.len(),
        }
    }
}

/// Mutable container for the form state.
///
/// All operations are synchronous and infallible for in-range indices. Any
/// string is accepted as a field value.
#[derive(Debug, Clone, Default)]
pub struct FormStore {
    state: FormSnapshot,
}

impl FormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: FormSnapshot) -> Self {
        Self { state: snapshot }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.state.clone()
    }

    pub fn personal(&self) -> &PersonalInfo {
        &self.state.personal
    }

    pub fn experiences(&self) -> &[Arc<ExperienceEntry>] {
        &self.state.experiences
    }

    pub fn educations(&self) -> &[Arc<EducationEntry>] {
        &self.state.educations
    }

    pub fn skills(&self) -> &[Arc<str>] {
        &self.state.skills
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.state.len(collection)
    }

    pub fn update_personal(&mut self, field: PersonalField, value: impl Into<String>) {
        Arc::make_mut(&mut self.state.personal).set(field, value.into());
    }

    pub fn update_experience(
        &mut self,
        index: usize,
        field: ExperienceField,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        let entry = slot(&mut self.state.experiences, Collection::Experience, index)?;
        Arc::make_mut(entry).set(field, value.into());
        Ok(())
    }

    pub fn add_experience(&mut self) {
        self.state.experiences.push(Arc::default());
        debug!(len = self.state.experiences.len(), "Added experience entry");
    }

    pub fn remove_experience(&mut self, index: usize) -> Result<(), FormError> {
        remove_at(&mut self.state.experiences, Collection::Experience, index)
    }

    pub fn update_education(
        &mut self,
        index: usize,
        field: EducationField,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        let entry = slot(&mut self.state.educations, Collection::Education, index)?;
        Arc::make_mut(entry).set(field, value.into());
        Ok(())
    }

    pub fn add_education(&mut self) {
        self.state.educations.push(Arc::default());
        debug!(len = self.state.educations.len(), "Added education entry");
    }

    pub fn remove_education(&mut self, index: usize) -> Result<(), FormError> {
        remove_at(&mut self.state.educations, Collection::Education, index)
    }

    pub fn update_skill(&mut self, index: usize, value: impl Into<String>) -> Result<(), FormError> {
        let skill = slot(&mut self.state.skills, Collection::Skill, index)?;
        *skill = Arc::from(value.into());
        Ok(())
    }

    pub fn add_skill(&mut self) {
        self.state.skills.push(Arc::from(""));
        debug!(len = self.state.skills.len(), "Added skill");
    }

    pub fn remove_skill(&mut self, index: usize) -> Result<(), FormError> {
        remove_at(&mut self.state.skills, Collection::Skill, index)
    }

    /// Appends one empty record to `collection`.
    pub fn add(&mut self, collection: Collection) {
        match collection {
            Collection::Experience => self.add_experience(),
            Collection::Education => self.add_education(),
            Collection::Skill => self.add_skill(),
        }
    }

    /// Removes the record at `index` from `collection`.
    pub fn remove(&mut self, collection: Collection, index: usize) -> Result<(), FormError> {
        match collection {
            Collection::Experience => self.remove_experience(index),
            Collection::Education => self.remove_education(index),
            Collection::Skill => self.remove_skill(index),
        }
    }
}

fn slot<T>(items: &mut [T], collection: Collection, index: usize) -> Result<&mut T, FormError> {
    let len = items.len();
    items
        .get_mut(index)
        .ok_or(FormError::IndexOutOfRange { collection, index, len })
}

fn remove_at<T>(items: &mut Vec<T>, collection: Collection, index: usize) -> Result<(), FormError> {
    if index >= items.len() {
        return Err(FormError::IndexOutOfRange {
            collection,
            index,
            len: items.len(),
        });
    }
    items.remove(index);
    debug!(%collection, index, len = items.len(), "Removed entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_initial_state() {
        let store = FormStore::new();

        assert_eq!(*store.personal(), PersonalInfo::default());
        assert_eq!(store.experiences().len(), 1);
        assert_eq!(store.educations().len(), 1);
        assert_eq!(store.skills().len(), 1);
        assert_eq!(*store.experiences()[0], ExperienceEntry::default());
        assert_eq!(&*store.skills()[0], "");
    }

    #[test]
    fn test_add_then_remove_middle_experience() {
        let mut store = FormStore::new();
        store.update_experience(0, ExperienceField::Company, "zero").unwrap();
        store.add_experience();
        store.add_experience();
        store.update_experience(2, ExperienceField::Company, "two").unwrap();
        assert_eq!(store.experiences().len(), 3);

        store.remove_experience(1).unwrap();

        let companies: Vec<&str> = store.experiences().iter().map(|e| e.company.as_str()).collect();
        assert_eq!(companies, vec!["zero", "two"]);
    }

    #[test]
    fn test_two_field_updates_on_same_entry() {
        let mut store = FormStore::new();
        store.update_experience(0, ExperienceField::Company, "Acme").unwrap();
        store.update_experience(0, ExperienceField::Position, "Engineer").unwrap();

        assert_eq!(store.experiences()[0].get(ExperienceField::Company), "Acme");
        assert_eq!(
            *store.experiences()[0],
            ExperienceEntry {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                duration: String::new(),
                description: String::new(),
            }
        );
    }

    #[test]
    fn test_update_leaves_other_records_pointer_equal() {
        let mut store = FormStore::new();
        store.add_education();
        store.add_education();
        let before = store.snapshot();

        store.update_education(1, EducationField::Degree, "BSc").unwrap();

        let after = store.snapshot();
        assert!(Arc::ptr_eq(&before.educations[0], &after.educations[0]));
        assert!(!Arc::ptr_eq(&before.educations[1], &after.educations[1]));
        assert!(Arc::ptr_eq(&before.educations[2], &after.educations[2]));
        assert!(Arc::ptr_eq(&before.personal, &after.personal));
        assert_eq!(before.educations[1].degree, "");
    }

    #[test]
    fn test_out_of_range_is_reported_and_ignored() {
        let mut store = FormStore::new();
        let before = store.snapshot();

        let err = store.update_skill(3, "Rust").unwrap_err();
        assert_eq!(
            err,
            FormError::IndexOutOfRange {
                collection: Collection::Skill,
                index: 3,
                len: 1,
            }
        );
        assert!(store.remove_education(1).is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_remove_last_entry_leaves_empty_collection() {
        let mut store = FormStore::new();
        store.remove_skill(0).unwrap();
        assert!(store.skills().is_empty());

        store.add_skill();
        assert_eq!(store.skills().len(), 1);
    }

    #[test]
    fn test_any_string_is_accepted() {
        let mut store = FormStore::new();
        store.update_personal(PersonalField::Email, "not an email");
        store.update_education(0, EducationField::Year, "sometime").unwrap();

        assert_eq!(store.personal().get(PersonalField::Email), "not an email");
        assert_eq!(store.educations()[0].get(EducationField::Year), "sometime");
    }

    #[test]
    fn test_field_names_parse() {
        assert_eq!("phone".parse::<PersonalField>().unwrap(), PersonalField::Phone);
        assert_eq!(
            "description".parse::<ExperienceField>().unwrap(),
            ExperienceField::Description
        );
        assert_eq!("skills".parse::<Collection>().unwrap(), Collection::Skill);
        assert!(matches!(
            "salary".parse::<ExperienceField>(),
            Err(FormError::UnknownField { record: "experience", .. })
        ));
    }

    #[test]
    fn test_snapshot_deserializes_partial_json() {
        let json = r#"{
            "personal": { "name": "Ada" },
            "skills": ["Rust", "SQL"]
        }"#;
        let snapshot: FormSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.personal.name, "Ada");
        assert_eq!(snapshot.personal.email, "");
        assert_eq!(snapshot.experiences.len(), 1);
        assert_eq!(snapshot.skills.len(), 2);
    }

    fn experience_store(len: usize) -> FormStore {
        let mut store = FormStore::new();
        store.remove_experience(0).unwrap();
        for i in 0..len {
            store.add_experience();
            store
                .update_experience(i, ExperienceField::Company, format!("company-{i}"))
                .unwrap();
        }
        store
    }

    proptest! {
        #[test]
        fn prop_update_touches_only_target(len in 1usize..8, pick in 0usize..8, value in ".*") {
            let index = pick % len;
            let mut store = experience_store(len);
            let before = store.snapshot();

            store.update_experience(index, ExperienceField::Description, value.clone()).unwrap();

            let after = store.snapshot();
            for i in 0..len {
                if i == index {
                    prop_assert_eq!(&after.experiences[i].description, &value);
                    prop_assert_eq!(&after.experiences[i].company, &before.experiences[i].company);
                } else {
                    prop_assert!(Arc::ptr_eq(&before.experiences[i], &after.experiences[i]));
                }
            }
        }

        #[test]
        fn prop_add_appends_one_empty_record(adds in 0usize..6) {
            let mut store = FormStore::new();
            for _ in 0..adds {
                let len = store.len(Collection::Education);
                store.add(Collection::Education);
                prop_assert_eq!(store.len(Collection::Education), len + 1);
            }
            prop_assert!(store.educations().iter().all(|e| **e == EducationEntry::default()));
        }

        #[test]
        fn prop_remove_preserves_order(len in 1usize..8, pick in 0usize..8) {
            let index = pick % len;
            let mut store = experience_store(len);
            let mut expected: Vec<String> =
                store.experiences().iter().map(|e| e.company.clone()).collect();
            expected.remove(index);

            store.remove(Collection::Experience, index).unwrap();

            let actual: Vec<String> = store.experiences().iter().map(|e| e.company.clone()).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
