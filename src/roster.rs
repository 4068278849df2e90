#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use bon::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigurationError, parsers::parser};

/// Header of the username column.
pub const USERNAME_COLUMN: &str = "User Name";
/// Header of the password column.
pub const PASSWORD_COLUMN: &str = "Password";
/// Header of the first name column.
pub const FIRST_NAME_COLUMN: &str = "First Name";
/// Header of the last name column.
pub const LAST_NAME_COLUMN: &str = "Last Name";
/// Header of the email column.
pub const EMAIL_COLUMN: &str = "Email";
/// Header of the group column.
pub const GROUP_COLUMN: &str = "Group";

/// A CSV document split into a header row and data rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Where the document came from, used in error messages.
    origin:  String,
    /// Trimmed header names.
    headers: Vec<String>,
    /// Data rows, each as wide as `headers`.
    rows:    Vec<Vec<String>>,
}

impl CsvTable {
    /// Parses `source`. Blank lines are ignored; every other row must have as
    /// many fields as the header.
    pub fn parse(origin: impl Into<String>, source: &str) -> Result<Self, ConfigurationError> {
        let origin = origin.into();
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let mut records = parser::csv_document(source)
            .map_err(|e| ConfigurationError::MalformedCsv {
                origin: origin.clone(),
                reason: e.to_string(),
            })?
            .into_iter()
            .filter(|record| !(record.len() == 1 && record[0].trim().is_empty()));

        let headers: Vec<String> = match records.next() {
            Some(h) => h.into_iter().map(|h| h.trim().to_string()).collect(),
            None => {
                return Err(ConfigurationError::MalformedCsv {
                    origin,
                    reason: "document is empty".into(),
                });
            }
        };

        let mut rows = Vec::new();
        for (index, record) in records.enumerate() {
            if record.len() != headers.len() {
                return Err(ConfigurationError::MalformedCsv {
                    origin,
                    reason: format!(
                        "row {} has {} fields, expected {}",
                        index + 2,
                        record.len(),
                        headers.len()
                    ),
                });
            }
            rows.push(record);
        }

        Ok(Self {
            origin,
            headers,
            rows,
        })
    }

    /// Reads and parses the file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let source =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::UnreadableFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path.display().to_string(), &source)
    }

    /// Index of `column`, if the header has it.
    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Index of `column`, or a `MissingColumn` error.
    fn require(&self, column: &'static str) -> Result<usize, ConfigurationError> {
        self.position(column)
            .ok_or_else(|| ConfigurationError::MissingColumn {
                origin: self.origin.clone(),
                column,
            })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row of a roster.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct UserRecord {
    /// Login name on the platform.
    pub username:   String,
    /// Initial password.
    pub password:   String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name:  String,
    /// Contact address.
    pub email:      String,
    /// Group code, when the roster assigns one.
    pub group:      Option<String>,
}

impl UserRecord {
    /// Full name as shown on the platform.
    pub fn real_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Group membership loaded from a roster CSV.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// All rows, in file order.
    users: Vec<UserRecord>,
}

impl Roster {
    /// Builds a roster from already loaded records.
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    /// Builds a roster from a parsed CSV table. The `Group` column is optional.
    pub fn from_table(table: &CsvTable) -> Result<Self, ConfigurationError> {
        let username = table.require(USERNAME_COLUMN)?;
        let password = table.require(PASSWORD_COLUMN)?;
        let first_name = table.require(FIRST_NAME_COLUMN)?;
        let last_name = table.require(LAST_NAME_COLUMN)?;
        let email = table.require(EMAIL_COLUMN)?;
        let group = table.position(GROUP_COLUMN);

        let users = table
            .rows
            .iter()
            .map(|row| UserRecord {
                username:   row[username].trim().to_string(),
                password:   row[password].clone(),
                first_name: row[first_name].trim().to_string(),
                last_name:  row[last_name].trim().to_string(),
                email:      row[email].trim().to_string(),
                group:      group
                    .map(|i| row[i].trim().to_string())
                    .filter(|g| !g.is_empty()),
            })
            .collect();

        Ok(Self { users })
    }

    /// Reads a roster CSV from disk.
    pub fn from_csv(path: &Path) -> Result<Self, ConfigurationError> {
        Self::from_table(&CsvTable::from_path(path)?)
    }

    /// All user records, in file order.
    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    /// Distinct group codes in order of first appearance. Users without a
    /// group are ignored.
    pub fn unique_groups(&self) -> Vec<String> {
        self.users
            .iter()
            .filter_map(|u| u.group.clone())
            .unique()
            .collect()
    }

    /// Usernames of every member of `group`.
    pub fn users_for_group(&self, group: &str) -> Vec<String> {
        self.users
            .iter()
            .filter(|u| u.group.as_deref() == Some(group))
            .map(|u| u.username.clone())
            .collect()
    }
}

/// Reads only the usernames of a CSV, eg. the markers list. Blank usernames
/// are dropped.
pub fn usernames(table: &CsvTable) -> Result<Vec<String>, ConfigurationError> {
    let column = table.require(USERNAME_COLUMN)?;
    Ok(table
        .rows
        .iter()
        .map(|row| row[column].trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

/// Reads the usernames column of the CSV at `path`.
pub fn usernames_from_csv(path: &Path) -> Result<Vec<String>, ConfigurationError> {
    usernames(&CsvTable::from_path(path)?)
}
