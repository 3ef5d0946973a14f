use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;
use crate::entity::entity_type::EntityType;

/// A Jira issue as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    pub fields: JiraFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraFields {
    pub summary: String,
    #[serde(default)]
    pub status: Option<NamedField>,
    #[serde(default)]
    pub issuetype: Option<NamedField>,
    #[serde(with = "jira_datetime")]
    pub created: DateTime<Utc>,
    #[serde(with = "jira_datetime")]
    pub updated: DateTime<Utc>,
    #[serde(default, with = "jira_datetime::option")]
    pub resolutiondate: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
}

/// Any `{ "name": ... }` field (status, issue type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedField {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub display_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl Document for JiraIssue {
    const ENTITY_TYPE: EntityType = EntityType::JiraIssue;

    fn natural_key(&self) -> String {
        self.key.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.fields.created
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.fields.updated
    }
}

/// Jira timestamps look like `2024-01-31T10:00:00.000+0000`, which is not
/// RFC 3339. Cached payloads are written back as RFC 3339, so both forms
/// are accepted on the way in.
mod jira_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const JIRA_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

    pub(super) fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_str(raw, JIRA_FORMAT))
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
