pub(crate) mod shared;
pub(crate) mod status;

#[cfg(feature = "github")]
pub(crate) mod github;

#[cfg(feature = "jira")]
pub(crate) mod jira;
