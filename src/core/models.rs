// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::wire::de_flex_epoch;

/// A healthcare provider record from the NPI Registry.
///
/// Covers both individual providers (`NPI-1`) and organizations (`NPI-2`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Provider {
    /// The unique 10-digit NPI number.
    pub number: String,
    /// `NPI-1` for individuals, `NPI-2` for organizations.
    pub enumeration_type: String,
    pub basic: BasicInfo,
    pub addresses: Vec<Address>,
    pub taxonomies: Vec<Taxonomy>,
    pub identifiers: Vec<Identifier>,
    pub endpoints: Vec<Endpoint>,
    pub practice_locations: Vec<PracticeLocation>,
    pub other_names: Vec<OtherName>,
    /// Creation time as Unix milliseconds.
    #[serde(deserialize_with = "de_flex_epoch")]
    pub created_epoch: i64,
    pub last_updated: String,
    /// Last update time as Unix milliseconds.
    #[serde(deserialize_with = "de_flex_epoch")]
    pub last_updated_epoch: i64,
}

impl Provider {
    /// The record's creation time, if the registry supplied one.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        epoch_millis(self.created_epoch)
    }

    /// The record's last update time, if the registry supplied one.
    #[must_use]
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        epoch_millis(self.last_updated_epoch)
    }

    /// The taxonomy flagged as primary, falling back to the first one listed.
    #[must_use]
    pub fn primary_taxonomy(&self) -> Option<&Taxonomy> {
        self.taxonomies
            .iter()
            .find(|t| t.primary)
            .or_else(|| self.taxonomies.first())
    }

    /// The practice (`LOCATION`) address, if any.
    #[must_use]
    pub fn location_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.address_purpose.eq_ignore_ascii_case("LOCATION"))
    }

    /// Organization name for `NPI-2` records, `first [middle] last` for individuals.
    #[must_use]
    pub fn display_name(&self) -> String {
        let b = &self.basic;
        if !b.organization_name.is_empty() {
            return b.organization_name.clone();
        }
        [&b.first_name, &b.middle_name, &b.last_name]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms == 0 {
        return None;
    }
    DateTime::from_timestamp_millis(ms)
}

/// Basic information about the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicInfo {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub credential: String,
    pub sole_proprietor: String,
    pub gender: String,
    pub enumeration_date: String,
    pub last_updated: String,
    pub status: String,
    pub name: String,
    pub name_prefix: String,
    pub name_suffix: String,
    pub organization_name: String,
    pub organizational_subpart: String,
    pub authorized_official_first_name: String,
    pub authorized_official_last_name: String,
    pub authorized_official_middle_name: String,
    pub authorized_official_telephone_number: String,
    pub authorized_official_title_or_position: String,
    pub authorized_official_credential: String,
    pub certification_date: String,
}

/// A mailing (`MAILING`) or practice (`LOCATION`) address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub country_code: String,
    pub country_name: String,
    pub address_purpose: String,
    pub address_type: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub telephone_number: String,
    pub fax_number: String,
}

/// A specialty from the Healthcare Provider Taxonomy Code Set (e.g. `207Q00000X`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    pub code: String,
    pub taxonomy_group: String,
    pub desc: String,
    pub state: String,
    pub license: String,
    pub primary: bool,
}

/// An identifier beyond the NPI, such as a state license.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Identifier {
    pub code: String,
    pub desc: String,
    pub identifier: String,
    pub state: String,
    pub issuer: String,
}

/// An electronic endpoint (Direct address, FHIR server, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoint {
    pub endpoint_type: String,
    pub endpoint_type_description: String,
    pub endpoint: String,
    pub affiliation: String,
    pub use_description: String,
    pub content_type: String,
    pub content_type_description: String,
    pub country: String,
    pub country_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// A location where the provider practices.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PracticeLocation {
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country_code: String,
    pub country_name: String,
    pub telephone_number: String,
    pub fax_number: String,
}

/// An alternative name for the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherName {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    pub credential: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub prefix: String,
    pub suffix: String,
    pub organization_name: String,
}
