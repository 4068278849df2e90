#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use crate::parsers::trailing_number;

/// Who a project is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The students of a group.
    Student,
    /// The marker assigned to a group.
    Marker,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Marker => write!(f, "marker"),
        }
    }
}

/// Builds the project name for group number `group_num` in course part
/// `part`.
pub fn project_name(group_num: u32, part: u32, role: Role) -> String {
    match role {
        Role::Student => format!("Part {part} Group {group_num:02}"),
        Role::Marker => format!("Part {part} Group {group_num:02} Marking"),
    }
}

/// Builds the project name for a roster group code. Codes without a group
/// number in them (eg. `unallocated`) have no project.
pub fn project_name_for_code(group_code: &str, part: u32, role: Role) -> Option<String> {
    trailing_number(group_code).map(|n| project_name(n, part, role))
}
