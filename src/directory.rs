#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Remote operations the workflows depend on.

use std::fmt::Display;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConduitError;

/// Opaque Phabricator object identifier, eg. `PHID-USER-abc123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Phid(String);

impl Phid {
    /// Wraps a raw identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Phid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Phid {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Phid {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Account to create.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct NewUser {
    /// Login name.
    pub username:  String,
    /// Initial password.
    pub password:  String,
    /// Display name.
    pub real_name: String,
    /// Contact address.
    pub email:     String,
}

/// Project to create.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct NewProject {
    /// Project name.
    pub name:    String,
    /// Icon key, eg. `policy`.
    pub icon:    String,
    /// Color key, eg. `red`.
    pub color:   String,
    /// Initial members.
    #[builder(default)]
    pub members: Vec<Phid>,
}

/// Identifiers of an object that has both a numeric id and a PHID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Numeric id, eg. the `12` of `D12`.
    pub id:   u64,
    /// PHID of the object.
    pub phid: Phid,
}

/// Create and lookup operations against the review platform.
#[allow(async_fn_in_trait)]
pub trait RemoteDirectory {
    /// Creates a user account and returns its PHID.
    async fn create_user(&self, user: &NewUser) -> Result<Phid, ConduitError>;

    /// Looks up the PHID of `username`.
    async fn user_phid(&self, username: &str) -> Result<Phid, ConduitError>;

    /// Looks up the PHID of the project named `name`.
    async fn project_phid(&self, name: &str) -> Result<Phid, ConduitError>;

    /// Creates a project and returns its PHID.
    async fn create_project(&self, project: &NewProject) -> Result<Phid, ConduitError>;

    /// Uploads raw diff text.
    async fn create_raw_diff(&self, diff: &str) -> Result<ObjectRef, ConduitError>;

    /// Opens a revision for `diff` titled `title`.
    async fn create_revision(
        &self,
        diff: &ObjectRef,
        title: &str,
    ) -> Result<ObjectRef, ConduitError>;

    /// Creates a policy that allows only members of `projects`.
    async fn create_project_policy(&self, projects: &[Phid]) -> Result<Phid, ConduitError>;

    /// Sets the view and edit policies of `revision`.
    async fn set_revision_policy(
        &self,
        revision: &ObjectRef,
        view_policy: &Phid,
        edit_policy: &Phid,
    ) -> Result<(), ConduitError>;
}
