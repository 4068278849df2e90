#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # proph
//!
//! Automates course administration on Phabricator.
//!
//! ```text
//! proph enroll group_members.csv
//! proph create-student-groups students.csv 1
//! proph create-marker-groups students.csv markers.csv 1
//! proph load-diffs diffs/ 1
//! ```
//!
//! Settings such as `PHABRICATOR_URL` and `PHABRICATOR_API_TOKEN` are read
//! from the environment or a `.env` file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use proph::{
    conduit::ConduitClient,
    config::{self, ConfigHandle},
    directory::Phid,
    report::{Report, allocation_table},
    roster::{Roster, usernames_from_csv},
    workflow::{self, ProjectStyle},
};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Create users from a roster
    Enroll(PathBuf),
    /// Create one project per student group
    CreateStudentGroups(PathBuf, u32),
    /// Allocate groups to markers and create marking projects
    CreateMarkerGroups(PathBuf, PathBuf, u32),
    /// Upload diff files as revisions
    LoadDiffs(PathBuf, u32),
}

/// Subcommand names accepted on the command line.
const COMMANDS: [&str; 4] = [
    "enroll",
    "create-student-groups",
    "create-marker-groups",
    "load-diffs",
];

/// True when the first argument names a subcommand that does not exist.
fn is_unknown_command(args: &[String]) -> bool {
    args.first()
        .is_some_and(|first| !first.starts_with('-') && !COMMANDS.contains(&first.as_str()))
}

/// Parser for the command line arguments
fn options() -> OptionParser<Cmd> {
    /// parses the roster path
    fn roster() -> impl Parser<PathBuf> {
        positional("ROSTER")
            .help("CSV with User Name, Password, First Name, Last Name, Email and Group columns")
    }

    /// parses the markers path
    fn markers() -> impl Parser<PathBuf> {
        positional("MARKERS").help("CSV with a User Name column listing markers")
    }

    /// parses the diff directory
    fn directory() -> impl Parser<PathBuf> {
        positional("DIRECTORY").help("Directory holding .diff/.patch files")
    }

    /// parses the course part number
    fn part() -> impl Parser<u32> {
        positional("PART").help("Course project part number")
    }

    let enroll = construct!(Cmd::Enroll(roster()))
        .to_options()
        .command("enroll")
        .help("Create a user for every roster row");

    let student_groups = construct!(Cmd::CreateStudentGroups(roster(), part()))
        .to_options()
        .command("create-student-groups")
        .help("Create a project for every student group");

    let marker_groups = construct!(Cmd::CreateMarkerGroups(roster(), markers(), part()))
        .to_options()
        .command("create-marker-groups")
        .help("Randomly allocate groups to markers and create marking projects");

    let load_diffs = construct!(Cmd::LoadDiffs(directory(), part()))
        .to_options()
        .command("load-diffs")
        .help("Upload diffs as revisions visible to their group");

    construct!([enroll, student_groups, marker_groups, load_diffs])
        .to_options()
        .descr("Course administration for Phabricator")
}

/// Prints every outcome, then the summary table.
fn print_report(title: &str, report: &Report) {
    for outcome in report.outcomes() {
        println!("{outcome}");
    }
    println!("{}", report.summary(title));
}

/// Last line of every successful run.
fn thanks() {
    println!();
    println!("Task complete. ( \u{ff65}\u{203f}\u{ff65} )");
}

/// Connects to Phabricator using `cfg`.
fn client(cfg: &ConfigHandle) -> Result<ConduitClient> {
    Ok(ConduitClient::new(cfg.http_client()?, cfg.phabricator().clone()))
}

/// Project appearance from `cfg`.
fn style(cfg: &ConfigHandle) -> ProjectStyle {
    ProjectStyle::builder()
        .icon(cfg.project_icon())
        .color(cfg.project_color())
        .build()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();

    let cmd = match options().run_inner(Args::current_args()) {
        Ok(cmd) => cmd,
        Err(failure) => {
            let args: Vec<String> = std::env::args().skip(1).collect();
            let unknown = matches!(failure, ParseFailure::Stderr(_)) && is_unknown_command(&args);
            failure.print_message(100);
            if unknown {
                println!("Unknown command. \u{af}\\_(\u{30c4})_/\u{af}");
            }
            return Ok(());
        }
    };

    let cfg = config::ensure_initialized()?;

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(fmt)
        .with(cfg.log_level())
        .init();

    let conduit = client(&cfg)?;

    match cmd {
        Cmd::Enroll(roster) => {
            let roster = Roster::from_csv(&roster)?;
            let report = workflow::enroll(&conduit, &roster).await;
            print_report("Enrolment", &report);
            if report.all_succeeded() {
                println!("{}", "User creation completed successfully.".green());
            } else {
                println!("{}", "User creation failed.".red());
            }
        }
        Cmd::CreateStudentGroups(roster, part) => {
            let roster = Roster::from_csv(&roster)?;
            let admins: Vec<Phid> = cfg.admin_phids().iter().cloned().map(Phid::from).collect();
            let report =
                workflow::create_student_groups(&conduit, &roster, part, &admins, &style(&cfg))
                    .await;
            print_report("Student groups", &report);
        }
        Cmd::CreateMarkerGroups(roster, markers, part) => {
            let roster = Roster::from_csv(&roster)?;
            let markers = usernames_from_csv(&markers)?;
            let allocation = workflow::plan_marker_groups(&roster, &markers, cfg.seed())
                .context("Could not allocate groups to markers")?;

            for (marker, groups) in allocation.iter() {
                println!("Tutor {marker} is marking groups: {}", groups.join(", "));
            }
            println!("{}", allocation_table(&allocation));

            let report =
                workflow::create_marker_groups(&conduit, &allocation, part, &style(&cfg)).await;
            print_report("Marker groups", &report);
        }
        Cmd::LoadDiffs(dir, part) => {
            let report = workflow::load_diffs(&conduit, &dir, part).await?;
            print_report("Diff uploads", &report);
        }
    };

    thanks();
    Ok(())
}
