use std::{fs, path::PathBuf};

use proph::{
    directory::Phid,
    error::ConfigurationError,
    report::Status,
    roster::{Roster, UserRecord},
    workflow::{self, ProjectStyle},
};
use uuid::Uuid;


use directory_support::FakeDirectory;

fn user(username: &str, group: Option<&str>) -> UserRecord {
    UserRecord {
        username:   username.to_string(),
        password:   "pw".to_string(),
        first_name: username.to_uppercase(),
        last_name:  "Student".to_string(),
        email:      format!("{username}@example.edu"),
        group:      group.map(str::to_string),
    }
}

fn roster() -> Roster {
    Roster::new(vec![
        user("ann", Some("G01")),
        user("ben", Some("G01")),
        user("cat", Some("G02")),
        user("dan", Some("staff")),
        user("eve", Some("G03")),
    ])
}

fn style() -> ProjectStyle {
    ProjectStyle::builder().icon("policy").color("red").build()
}

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("proph-workflow-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

#[tokio::test]
async fn enroll_records_each_user_and_continues_after_failure() {
    let mut directory = FakeDirectory::default();
    directory.failing_users.insert("ben".to_string());

    let report = workflow::enroll(&directory, &roster()).await;

    assert_eq!(report.outcomes().len(), 5);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 4);
    assert!(!report.all_succeeded());
    assert!(report.get("ben").is_some_and(|o| o.is_failure()));

    let created = directory.users.lock().unwrap().clone();
    assert_eq!(created.len(), 4);
    assert_eq!(created[0].real_name, "ANN Student");
    assert_eq!(created[0].email, "ann@example.edu");
}

#[tokio::test]
async fn student_groups_include_members_and_admins() {
    let directory = FakeDirectory::with_users(&["ann", "ben", "cat", "eve"]);
    let admins = vec![Phid::new("PHID-USER-admin")];

    let report = workflow::create_student_groups(&directory, &roster(), 2, &admins, &style()).await;

    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.skipped(), 1);
    assert!(report.get("staff").is_some_and(|o| o.is_skipped()));

    let projects = directory.projects();
    assert_eq!(projects[0].name, "Part 2 Group 01");
    assert_eq!(projects[0].icon, "policy");
    assert_eq!(projects[0].color, "red");
    assert_eq!(
        projects[0].members,
        vec![
            Phid::new("PHID-USER-ann"),
            Phid::new("PHID-USER-ben"),
            Phid::new("PHID-USER-admin"),
        ]
    );
}

#[tokio::test]
async fn student_group_with_unknown_member_is_not_created() {
    let directory = FakeDirectory::with_users(&["ann", "cat", "eve"]);

    let report = workflow::create_student_groups(&directory, &roster(), 1, &[], &style()).await;

    let outcome = report.get("G01").expect("G01 outcome");
    match &outcome.status {
        Status::Failed(reason) => assert!(reason.contains("ben"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(
        !directory
            .calls()
            .contains(&"create_project:Part 1 Group 01".to_string())
    );
    assert_eq!(report.succeeded(), 2);
}

#[tokio::test]
async fn student_group_creation_failure_does_not_stop_the_batch() {
    let mut directory = FakeDirectory::with_users(&["ann", "ben", "cat", "eve"]);
    directory
        .failing_projects
        .insert("Part 1 Group 02".to_string());

    let report = workflow::create_student_groups(&directory, &roster(), 1, &[], &style()).await;

    assert!(report.get("G02").is_some_and(|o| o.is_failure()));
    assert!(report.get("G03").is_some_and(|o| o.is_success()));
}

#[test]
fn marker_plan_without_markers_is_fatal() {
    let err = workflow::plan_marker_groups(&roster(), &[], Some(1)).unwrap_err();
    assert!(matches!(err, ConfigurationError::NoMarkers));
}

#[tokio::test]
async fn marker_groups_have_single_marker_member() {
    let directory = FakeDirectory::with_users(&["tutor1", "tutor2"]);
    let markers = vec!["tutor1".to_string(), "tutor2".to_string()];
    let allocation = workflow::plan_marker_groups(&roster(), &markers, Some(3)).expect("plan");

    assert_eq!(allocation.total(), 4);

    let report = workflow::create_marker_groups(&directory, &allocation, 1, &style()).await;

    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.skipped(), 1);
    assert!(report.get("staff").is_some_and(|o| o.is_skipped()));

    for project in directory.projects() {
        assert!(project.name.ends_with("Marking"), "{}", project.name);
        assert_eq!(project.members.len(), 1);
        let marker = project.members[0].as_str().trim_start_matches("PHID-USER-");
        let group = format!("G{}", &project.name["Part 1 Group ".len()..][..2]);
        assert_eq!(
            allocation
                .groups_for(marker)
                .map(|g| g.contains(&group)),
            Some(true)
        );
    }
}

#[tokio::test]
async fn unknown_marker_fails_only_their_groups() {
    let directory = FakeDirectory::with_users(&["tutor1"]);
    let markers = vec!["tutor1".to_string(), "ghost".to_string()];
    let allocation = workflow::plan_marker_groups(&roster(), &markers, Some(8)).expect("plan");

    let report = workflow::create_marker_groups(&directory, &allocation, 1, &style()).await;

    let ghost_groups = allocation.groups_for("ghost").expect("ghost entry");
    assert_eq!(ghost_groups.len(), 2);
    for group in ghost_groups {
        assert!(report.get(group).is_some_and(|o| o.is_failure()));
    }
    assert_eq!(report.outcomes().len(), 4);
}

#[tokio::test]
async fn load_diffs_runs_every_step() {
    let root = temp_root();
    fs::write(root.join("group4.diff"), "diff --git a/A b/A\n").expect("write");

    let directory = FakeDirectory::default();
    let report = workflow::load_diffs(&directory, &root, 2).await.expect("load");

    assert_eq!(report.succeeded(), 1);
    assert_eq!(
        directory.calls(),
        vec![
            "create_raw_diff",
            "create_revision:41:Part 2 Group 04",
            "project_phid:Part 2 Group 04",
            "create_project_policy:PHID-PROJ-Part_2_Group_04",
            "set_revision_policy:7:PHID-PLCY-1:PHID-PLCY-1",
        ]
    );

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn load_diffs_abandons_a_file_at_its_first_failure() {
    let root = temp_root();
    fs::write(root.join("group1.diff"), "bad diff\n").expect("write");
    fs::write(root.join("group2.diff"), "good diff\n").expect("write");
    fs::write(root.join("notes.diff"), "no number\n").expect("write");

    let mut directory = FakeDirectory::default();
    directory.failing_diffs.insert("bad diff\n".to_string());

    let report = workflow::load_diffs(&directory, &root, 1).await.expect("load");

    assert!(report.get("group1.diff").is_some_and(|o| o.is_failure()));
    assert!(report.get("group2.diff").is_some_and(|o| o.is_success()));
    assert!(report.get("notes.diff").is_some_and(|o| o.is_skipped()));

    let calls = directory.calls();
    assert_eq!(
        calls
            .iter()
            .filter(|c| c.starts_with("create_revision"))
            .count(),
        1
    );

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn load_diffs_stops_before_attaching_a_missing_policy() {
    let root = temp_root();
    fs::write(root.join("group5.patch"), "diff\n").expect("write");

    let directory = FakeDirectory {
        policy_fails: true,
        ..FakeDirectory::default()
    };
    let report = workflow::load_diffs(&directory, &root, 1).await.expect("load");

    match &report.outcomes()[0].status {
        Status::Failed(reason) => assert!(reason.contains("policy"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(
        directory
            .calls()
            .iter()
            .all(|c| !c.starts_with("set_revision_policy"))
    );

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn load_diffs_in_missing_directory_is_fatal() {
    let directory = FakeDirectory::default();
    let missing = temp_root().join("missing");

    let err = workflow::load_diffs(&directory, &missing, 1).await.unwrap_err();
    assert!(format!("{err:#}").contains("not a directory"), "{err:#}");
    assert!(directory.calls().is_empty());
}

#[tokio::test]
async fn load_diffs_on_a_file_path_is_fatal() {
    let root = temp_root();
    let file = root.join("group1.diff");
    fs::write(&file, "diff\n").expect("write");

    let directory = FakeDirectory::default();
    assert!(workflow::load_diffs(&directory, &file, 1).await.is_err());
    assert!(directory.calls().is_empty());

    let _ = fs::remove_dir_all(root);
}

#[tokio::test]
async fn unknown_marker_skips_groups_without_a_project_name() {
    let directory = FakeDirectory::default();
    let markers = vec!["ghost".to_string()];
    let allocation = workflow::plan_marker_groups(&roster(), &markers, Some(2)).expect("plan");

    let report = workflow::create_marker_groups(&directory, &allocation, 1, &style()).await;

    assert_eq!(report.outcomes().len(), 4);
    assert_eq!(report.failed(), 3);
    assert_eq!(report.skipped(), 1);
    assert!(report.get("staff").is_some_and(|o| o.is_skipped()));
    assert!(directory.projects().is_empty());
}
