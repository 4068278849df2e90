#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// File extensions picked up by `load-diffs`.
pub const DIFF_EXTENSIONS: [&str; 2] = ["diff", "patch"];

/// Default icon for created projects.
pub const DEFAULT_PROJECT_ICON: &str = "policy";

/// Default color for created projects.
pub const DEFAULT_PROJECT_COLOR: &str = "red";

/// Default timeout for a single Conduit request, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Conduit method creating a user account.
pub const USER_CREATE: &str = "user.create";

/// Conduit method searching users.
pub const USER_SEARCH: &str = "user.search";

/// Conduit method searching projects.
pub const PROJECT_SEARCH: &str = "project.search";

/// Conduit method creating or editing a project.
pub const PROJECT_EDIT: &str = "project.edit";

/// Conduit method uploading a raw diff.
pub const DIFF_CREATE_RAW: &str = "differential.createrawdiff";

/// Conduit method creating or editing a revision.
pub const REVISION_EDIT: &str = "differential.revision.edit";

/// Conduit method creating a custom policy.
pub const POLICY_CREATE: &str = "policy.create";

/// Policy object type of differential revisions.
pub const REVISION_OBJECT_TYPE: &str = "DREV";

/// Policy rule matching members of the listed projects.
pub const PROJECTS_POLICY_RULE: &str = "PhabricatorProjectsPolicyRule";
