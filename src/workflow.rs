#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The four course administration workflows. Each one runs its items in
//! order and records an [`Outcome`] per item instead of stopping at the first
//! failure.

use std::path::Path;

use anyhow::{Context, Result};
use bon::Builder;

use crate::{
    allocation::{Allocation, allocate_with_seed},
    diffs,
    directory::{NewProject, NewUser, Phid, RemoteDirectory},
    error::ConfigurationError,
    names::{Role, project_name, project_name_for_code},
    report::{Outcome, Report},
    roster::Roster,
};

/// Appearance of created projects.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct ProjectStyle {
    /// Icon key.
    pub icon:  String,
    /// Color key.
    pub color: String,
}

impl ProjectStyle {
    /// Builds a project named `name` with `members`.
    fn project(&self, name: &str, members: Vec<Phid>) -> NewProject {
        NewProject::builder()
            .name(name)
            .icon(self.icon.as_str())
            .color(self.color.as_str())
            .members(members)
            .build()
    }
}

/// Creates an account for every roster row.
pub async fn enroll<D: RemoteDirectory>(directory: &D, roster: &Roster) -> Report {
    tracing::info!(users = roster.users().len(), "enrolling users");
    let mut report = Report::default();

    for user in roster.users() {
        let request = NewUser::builder()
            .username(user.username.as_str())
            .password(user.password.as_str())
            .real_name(user.real_name())
            .email(user.email.as_str())
            .build();

        let outcome = match directory.create_user(&request).await {
            Ok(_) => Outcome::succeeded(
                &user.username,
                format!("{} ({}) successfully created.", user.username, user.real_name()),
            ),
            Err(e) => {
                tracing::warn!(username = %user.username, "user creation failed: {e}");
                Outcome::failed(
                    &user.username,
                    format!(
                        "Creating user {} ({}) failed, attention is required: {e}",
                        user.username,
                        user.real_name()
                    ),
                )
            }
        };
        report.push(outcome);
    }

    report
}

/// Creates one project per roster group, with the group's students and the
/// `admins` as members.
pub async fn create_student_groups<D: RemoteDirectory>(
    directory: &D,
    roster: &Roster,
    part: u32,
    admins: &[Phid],
    style: &ProjectStyle,
) -> Report {
    let groups = roster.unique_groups();
    tracing::info!(groups = groups.len(), part, "creating student groups");
    let mut report = Report::default();

    for group in groups {
        let Some(name) = project_name_for_code(&group, part, Role::Student) else {
            tracing::warn!(group = %group, "no project name for group, skipping");
            report.push(Outcome::skipped(&group, "no project name for this group code"));
            continue;
        };

        let outcome = match student_members(directory, roster, &group).await {
            Ok(mut members) => {
                members.extend(admins.iter().cloned());
                match directory.create_project(&style.project(&name, members)).await {
                    Ok(_) => Outcome::succeeded(&group, format!("Created group: {name}")),
                    Err(e) => Outcome::failed(&group, format!("Could not create {name}: {e}")),
                }
            }
            Err(e) => Outcome::failed(&group, format!("{e:#}")),
        };

        if outcome.is_failure() {
            tracing::warn!(group = %group, "student group creation failed");
        }
        report.push(outcome);
    }

    report
}

/// Resolves the PHIDs of every member of `group`.
async fn student_members<D: RemoteDirectory>(
    directory: &D,
    roster: &Roster,
    group: &str,
) -> Result<Vec<Phid>> {
    let mut members = Vec::new();
    for username in roster.users_for_group(group) {
        let phid = directory
            .user_phid(&username)
            .await
            .with_context(|| format!("Could not resolve member {username} of group {group}"))?;
        members.push(phid);
    }
    Ok(members)
}

/// Allocates the roster's groups to `markers`. Fails when there are no
/// markers.
pub fn plan_marker_groups(
    roster: &Roster,
    markers: &[String],
    seed: Option<u64>,
) -> Result<Allocation, ConfigurationError> {
    let allocation = allocate_with_seed(markers, &roster.unique_groups(), seed)?;
    for (marker, groups) in allocation.iter() {
        tracing::debug!(marker, ?groups, "allocated");
    }
    Ok(allocation)
}

/// Creates one marking project per allocated group, with its marker as the
/// only member.
pub async fn create_marker_groups<D: RemoteDirectory>(
    directory: &D,
    allocation: &Allocation,
    part: u32,
    style: &ProjectStyle,
) -> Report {
    tracing::info!(
        markers = allocation.markers().count(),
        groups = allocation.total(),
        part,
        "creating marker groups"
    );
    let mut report = Report::default();

    for (marker, groups) in allocation.iter() {
        let marker_phid = match directory.user_phid(marker).await {
            Ok(phid) => phid,
            Err(e) => {
                tracing::warn!(marker, "could not resolve marker: {e}");
                report.extend(groups.iter().map(|group| {
                    match project_name_for_code(group, part, Role::Marker) {
                        Some(_) => Outcome::failed(
                            group,
                            format!("Could not resolve marker {marker}: {e}"),
                        ),
                        None => Outcome::skipped(group, "no project name for this group code"),
                    }
                }));
                continue;
            }
        };

        for group in groups {
            let Some(name) = project_name_for_code(group, part, Role::Marker) else {
                tracing::warn!(group = %group, "no project name for group, skipping");
                report.push(Outcome::skipped(group, "no project name for this group code"));
                continue;
            };

            let project = style.project(&name, vec![marker_phid.clone()]);
            let outcome = match directory.create_project(&project).await {
                Ok(_) => Outcome::succeeded(group, format!("Created group: {name} ({marker})")),
                Err(e) => {
                    tracing::warn!(group = %group, "marker group creation failed: {e}");
                    Outcome::failed(group, format!("Could not create {name}: {e}"))
                }
            };
            report.push(outcome);
        }
    }

    report
}

/// Uploads every diff file in `dir` as a revision of its group's project,
/// visible only to that project. Fails when `dir` is missing, is not a
/// directory, or cannot be listed.
pub async fn load_diffs<D: RemoteDirectory>(
    directory: &D,
    dir: &Path,
    part: u32,
) -> Result<Report> {
    let files = diffs::get_all(dir)
        .with_context(|| format!("Could not list diff files in {}", dir.display()))?;
    tracing::info!(files = files.len(), part, "loading diffs");

    let mut report = Report::default();
    for file in files {
        report.push(load_diff(directory, &file, part).await);
    }
    Ok(report)
}

/// Runs the upload steps for a single diff file.
async fn load_diff<D: RemoteDirectory>(directory: &D, file: &Path, part: u32) -> Outcome {
    let key = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let Some(group_num) = diffs::group_number(file) else {
        tracing::warn!(file = %key, "could not determine group number from file name");
        return Outcome::skipped(key, "could not determine group number from file name");
    };

    let name = project_name(group_num, part, Role::Student);
    match submit_diff(directory, file, &name).await {
        Ok(detail) => Outcome::succeeded(key, detail),
        Err(e) => {
            tracing::warn!(file = %key, "diff upload failed: {e:#}");
            Outcome::failed(key, format!("{e:#}"))
        }
    }
}

/// Creates the diff, its revision and policy, stopping at the first failing
/// step.
async fn submit_diff<D: RemoteDirectory>(
    directory: &D,
    file: &Path,
    project_name: &str,
) -> Result<String> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Could not read {}", file.display()))?;

    let diff = directory
        .create_raw_diff(&content)
        .await
        .with_context(|| format!("Could not create differential with file {}", file.display()))?;

    let revision = directory
        .create_revision(&diff, project_name)
        .await
        .with_context(|| format!("Unable to create revision for diff {}", diff.id))?;

    let project = directory
        .project_phid(project_name)
        .await
        .with_context(|| format!("Unable to create policy for {project_name}"))?;
    let policy = directory
        .create_project_policy(&[project])
        .await
        .with_context(|| format!("Unable to create policy for {project_name}"))?;

    directory
        .set_revision_policy(&revision, &policy, &policy)
        .await
        .with_context(|| format!("Unable to set policy on D{}", revision.id))?;

    Ok(format!(
        "Success for project {project_name} (diff_id: {} revision_id: {} policy_phid: {policy})",
        diff.id, revision.id
    ))
}
