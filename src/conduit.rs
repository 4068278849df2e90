#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Conduit, Phabricator's HTTP API.

use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};

use crate::{
    config::PhabricatorEnv,
    constants::{
        DIFF_CREATE_RAW, POLICY_CREATE, PROJECT_EDIT, PROJECT_SEARCH, PROJECTS_POLICY_RULE,
        REVISION_EDIT, REVISION_OBJECT_TYPE, USER_CREATE, USER_SEARCH,
    },
    directory::{NewProject, NewUser, ObjectRef, Phid, RemoteDirectory},
    error::ConduitError,
};

/// Response envelope shared by every Conduit method.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    /// Method result, null on error.
    result:     Option<T>,
    /// Error code, null on success.
    error_code: Option<String>,
    /// Error description, null on success.
    error_info: Option<String>,
}

/// Result of `*.search` methods.
#[derive(Debug, Deserialize)]
struct SearchResult {
    /// Matching objects.
    data: Vec<SearchItem>,
}

/// One object of a search result.
#[derive(Debug, Deserialize)]
struct SearchItem {
    /// PHID of the object.
    phid:   Phid,
    /// Object fields, varies by object type.
    #[serde(default)]
    fields: Map<String, Value>,
}

impl SearchItem {
    /// True when string field `field` equals `expected`, ignoring case.
    fn field_matches(&self, field: &str, expected: &str) -> bool {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|v| v.eq_ignore_ascii_case(expected))
    }
}

/// Result of `*.edit` methods.
#[derive(Debug, Deserialize)]
struct EditResult {
    /// The created or edited object.
    object: ObjectRef,
}

/// Result of methods that only report a PHID.
#[derive(Debug, Deserialize)]
struct PhidResult {
    /// PHID of the created object.
    phid: Phid,
}

/// Flattens a JSON object into the PHP-style form keys Conduit expects, eg.
/// `{"members": ["a"]}` becomes `members[0]=a`. Nulls are left out.
pub fn flatten_params(params: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(String::new(), params, &mut out);
    out
}

/// Recursive worker for [`flatten_params`].
fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix, b.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(format!("{prefix}[{i}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}[{key}]")
                };
                flatten_into(key, item, out);
            }
        }
    }
}

/// [`RemoteDirectory`] backed by a Phabricator instance.
#[derive(Clone)]
pub struct ConduitClient {
    /// Shared HTTP client.
    http: Client,
    /// Instance URL and token.
    env:  PhabricatorEnv,
}

impl ConduitClient {
    /// Creates a client for the instance described by `env`.
    pub fn new(http: Client, env: PhabricatorEnv) -> Self {
        Self { http, env }
    }

    /// Calls `method` with `params` and decodes its result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ConduitError> {
        let transport = |source: reqwest::Error| ConduitError::Transport {
            method: method.to_string(),
            source,
        };

        let mut form = vec![("api.token".to_string(), self.env.api_token().to_string())];
        form.extend(flatten_params(&params));

        tracing::debug!(method, fields = form.len() - 1, "calling conduit");
        let envelope: Envelope<T> = self
            .http
            .post(self.env.endpoint(method))
            .form(&form)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if let Some(code) = envelope.error_code {
            return Err(ConduitError::Api {
                method: method.to_string(),
                code,
                info: envelope.error_info.unwrap_or_default(),
            });
        }

        envelope
            .result
            .ok_or_else(|| ConduitError::MissingResult(method.to_string()))
    }
}

impl RemoteDirectory for ConduitClient {
    async fn create_user(&self, user: &NewUser) -> Result<Phid, ConduitError> {
        let created: PhidResult = self
            .call(
                USER_CREATE,
                json!({
                    "username": user.username,
                    "password": user.password,
                    "realName": user.real_name,
                    "email": user.email,
                }),
            )
            .await?;
        Ok(created.phid)
    }

    async fn user_phid(&self, username: &str) -> Result<Phid, ConduitError> {
        let found: SearchResult = self
            .call(USER_SEARCH, json!({ "constraints": { "usernames": [username] } }))
            .await?;

        found
            .data
            .into_iter()
            .find(|item| item.field_matches("username", username))
            .map(|item| item.phid)
            .ok_or_else(|| ConduitError::UnknownUser(username.to_string()))
    }

    async fn project_phid(&self, name: &str) -> Result<Phid, ConduitError> {
        let found: SearchResult = self
            .call(PROJECT_SEARCH, json!({ "constraints": { "name": name } }))
            .await?;

        found
            .data
            .into_iter()
            .find(|item| item.field_matches("name", name))
            .map(|item| item.phid)
            .ok_or_else(|| ConduitError::UnknownProject(name.to_string()))
    }

    async fn create_project(&self, project: &NewProject) -> Result<Phid, ConduitError> {
        let mut transactions = vec![
            json!({ "type": "name", "value": project.name }),
            json!({ "type": "icon", "value": project.icon }),
            json!({ "type": "color", "value": project.color }),
        ];
        if !project.members.is_empty() {
            transactions.push(json!({ "type": "members.set", "value": project.members }));
        }

        let edited: EditResult = self
            .call(PROJECT_EDIT, json!({ "transactions": transactions }))
            .await?;
        Ok(edited.object.phid)
    }

    async fn create_raw_diff(&self, diff: &str) -> Result<ObjectRef, ConduitError> {
        self.call(DIFF_CREATE_RAW, json!({ "diff": diff })).await
    }

    async fn create_revision(
        &self,
        diff: &ObjectRef,
        title: &str,
    ) -> Result<ObjectRef, ConduitError> {
        let edited: EditResult = self
            .call(
                REVISION_EDIT,
                json!({
                    "transactions": [
                        { "type": "update", "value": diff.phid },
                        { "type": "title", "value": title },
                    ]
                }),
            )
            .await?;
        Ok(edited.object)
    }

    async fn create_project_policy(&self, projects: &[Phid]) -> Result<Phid, ConduitError> {
        let created: PhidResult = self
            .call(
                POLICY_CREATE,
                json!({
                    "objectType": REVISION_OBJECT_TYPE,
                    "default": "deny",
                    "policy": [{
                        "action": "allow",
                        "rule": PROJECTS_POLICY_RULE,
                        "value": projects,
                    }],
                }),
            )
            .await?;
        Ok(created.phid)
    }

    async fn set_revision_policy(
        &self,
        revision: &ObjectRef,
        view_policy: &Phid,
        edit_policy: &Phid,
    ) -> Result<(), ConduitError> {
        let _: EditResult = self
            .call(
                REVISION_EDIT,
                json!({
                    "objectIdentifier": revision.phid,
                    "transactions": [
                        { "type": "view", "value": view_policy },
                        { "type": "edit", "value": edit_policy },
                    ]
                }),
            )
            .await?;
        Ok(())
    }
}
