//! The accumulating extraction record.

use crate::truncate::char_len;
use derive_more::Display;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A field of the imported posting, displayed as its external key.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    #[display("url")]
    Url,
    #[display("source_url")]
    SourceUrl,
    #[display("source_site")]
    SourceSite,
    #[display("source")]
    Source,
    #[display("titre_poste")]
    Title,
    #[display("entreprise")]
    Company,
    #[display("localisation")]
    Location,
    #[display("type_contrat")]
    ContractType,
    #[display("texte_annonce")]
    Description,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Url,
        Field::SourceUrl,
        Field::SourceSite,
        Field::Source,
        Field::Title,
        Field::Company,
        Field::Location,
        Field::ContractType,
        Field::Description,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::SourceUrl => "source_url",
            Field::SourceSite => "source_site",
            Field::Source => "source",
            Field::Title => "titre_poste",
            Field::Company => "entreprise",
            Field::Location => "localisation",
            Field::ContractType => "type_contrat",
            Field::Description => "texte_annonce",
        }
    }
}

pub const HAS_JOBPOSTING_KEY: &str = "_has_jobposting";
pub const HAS_DETAIL_KEY: &str = "_has_detail";
pub const DUMP_PATH_KEY: &str = "_dump_path";
pub const OG_DESCRIPTION_KEY: &str = "_og_description";

/// Comparator for [`Record::replace_if_richer`]: the candidate wins when it
/// has strictly more characters than the current value.
pub fn richer_by_length(candidate: &str, current: &str) -> bool {
    char_len(candidate) > char_len(current)
}

/// Accumulates the fields of one import.
///
/// Values are stored trimmed and are never empty. The first source to provide
/// a field owns it: [`set_if_absent`](Self::set_if_absent) is the normal way
/// to contribute, and only [`replace_if_richer`](Self::replace_if_richer) may
/// displace an existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<Field, String>,
    og_description: Option<String>,
    has_jobposting: bool,
    has_detail: bool,
    dump_path: Option<PathBuf>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    /// Stores `value` unless the field already holds one. Blank values are
    /// ignored. Returns whether the record changed.
    pub fn set_if_absent(&mut self, field: Field, value: impl AsRef<str>) -> bool {
        let value = value.as_ref().trim();
        if value.is_empty() || self.has(field) {
            return false;
        }
        self.fields.insert(field, value.to_string());
        true
    }

    /// Stores `value` if the field is empty, or if `richer(value, current)`
    /// says the candidate beats the current value. Returns whether the record
    /// changed.
    pub fn replace_if_richer(&mut self, field: Field, value: impl AsRef<str>, richer: impl Fn(&str, &str) -> bool) -> bool {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return false;
        }
        match self.fields.get(&field) {
            Some(current) if !richer(value, current.as_str()) => false,
            _ => {
                self.fields.insert(field, value.to_string());
                true
            },
        }
    }

    /// Keeps an OpenGraph description aside; it is only a description
    /// candidate once every structured source has had its turn.
    pub fn stage_og_description(&mut self, value: impl AsRef<str>) -> bool {
        let value = value.as_ref().trim();
        if value.is_empty() || self.og_description.is_some() {
            return false;
        }
        self.og_description = Some(value.to_string());
        true
    }

    pub fn og_description(&self) -> Option<&str> {
        self.og_description.as_deref()
    }

    /// Uses the staged OpenGraph description if no description was found.
    pub fn promote_og_description(&mut self) -> bool {
        match self.og_description.clone() {
            Some(staged) => self.set_if_absent(Field::Description, staged),
            None => false,
        }
    }

    /// A schema.org `JobPosting` node was found.
    pub fn mark_jobposting(&mut self) {
        self.has_jobposting = true;
    }

    pub fn has_jobposting(&self) -> bool {
        self.has_jobposting
    }

    /// A site heuristic recognised a detail page.
    pub fn mark_detail(&mut self) {
        self.has_detail = true;
    }

    pub fn has_detail(&self) -> bool {
        self.has_detail
    }

    pub fn set_dump_path(&mut self, path: impl Into<PathBuf>) {
        self.dump_path = Some(path.into());
    }

    pub fn dump_path(&self) -> Option<&Path> {
        self.dump_path.as_deref()
    }

    /// Every field, internal ones (prefixed `_`) included.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.prefill();
        map.insert(HAS_JOBPOSTING_KEY.to_string(), self.has_jobposting.to_string());
        map.insert(HAS_DETAIL_KEY.to_string(), self.has_detail.to_string());
        if let Some(og_description) = &self.og_description {
            map.insert(OG_DESCRIPTION_KEY.to_string(), og_description.clone());
        }
        if let Some(path) = &self.dump_path {
            map.insert(DUMP_PATH_KEY.to_string(), path.display().to_string());
        }
        map
    }

    /// Only the fields meant to prefill a posting form.
    pub fn prefill(&self) -> BTreeMap<String, String> {
        self.fields.iter().map(|(field, value)| (field.key().to_string(), value.clone())).collect()
    }
}
