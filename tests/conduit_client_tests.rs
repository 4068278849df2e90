use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::post,
};
use proph::{
    conduit::{ConduitClient, flatten_params},
    config::ConfigState,
    directory::{NewProject, Phid, RemoteDirectory},
    error::ConduitError,
    workflow,
};
use serde_json::{Value, json};
use uuid::Uuid;

type Recorded = Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>;

fn ok(result: Value) -> Value {
    json!({ "result": result, "error_code": null, "error_info": null })
}

fn err(code: &str, info: &str) -> Value {
    json!({ "result": null, "error_code": code, "error_info": info })
}

fn respond(method: &str, form: &[(String, String)]) -> Value {
    let field = |key: &str| {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    match method {
        "user.search" => match field("constraints[usernames][0]").as_deref() {
            Some("jdoe") => ok(json!({
                "data": [{ "id": 1, "phid": "PHID-USER-jdoe", "fields": { "username": "jdoe" } }]
            })),
            _ => ok(json!({ "data": [] })),
        },
        "user.create" => err("ERR-CONDUIT-CORE", "Username is already taken"),
        "project.search" => ok(json!({
            "data": [
                { "phid": "PHID-PROJ-8", "fields": { "name": "Part 1 Group 08" } },
                { "phid": "PHID-PROJ-9", "fields": { "name": "Part 1 Group 09" } }
            ]
        })),
        "project.edit" => ok(json!({
            "object": { "id": 3, "phid": "PHID-PROJ-3" },
            "transactions": []
        })),
        "differential.createrawdiff" => ok(json!({
            "id": 41,
            "phid": "PHID-DIFF-41",
            "uri": "https://phab.example.edu/differential/diff/41/"
        })),
        "differential.revision.edit" => {
            ok(json!({ "object": { "id": 7, "phid": "PHID-DREV-7" } }))
        }
        "policy.create" => ok(json!({ "phid": "PHID-PLCY-1" })),
        _ => err("ERR-CONDUIT-CALL", "Conduit method does not exist."),
    }
}

async fn conduit(
    State(recorded): State<Recorded>,
    Path(method): Path<String>,
    Form(form): Form<Vec<(String, String)>>,
) -> Json<Value> {
    let response = respond(&method, &form);
    recorded.lock().unwrap().push((method, form));
    Json(response)
}

fn client_for(url: String) -> ConduitClient {
    let cfg = ConfigState::from_lookup(|key| match key {
        "PHABRICATOR_URL" => Some(url.clone()),
        "PHABRICATOR_API_TOKEN" => Some("api-test".to_string()),
        _ => None,
    })
    .expect("config");
    ConduitClient::new(cfg.http_client().expect("http client"), cfg.phabricator().clone())
}

async fn serve() -> (ConduitClient, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/{method}", post(conduit))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (client_for(format!("http://{addr}")), recorded)
}

fn has(form: &[(String, String)], key: &str, value: &str) -> bool {
    form.iter().any(|(k, v)| k == key && v == value)
}

#[test]
fn params_flatten_to_php_style_keys() {
    let mut flat = flatten_params(&json!({
        "transactions": [
            { "type": "members.set", "value": ["PHID-USER-a", "PHID-USER-b"] },
        ],
        "limit": 5,
        "flag": true,
        "missing": null,
        "empty": [],
    }));
    flat.sort();

    let mut expected: Vec<(String, String)> = [
        ("flag", "true"),
        ("limit", "5"),
        ("transactions[0][type]", "members.set"),
        ("transactions[0][value][0]", "PHID-USER-a"),
        ("transactions[0][value][1]", "PHID-USER-b"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    expected.sort();

    assert_eq!(flat, expected);
}

#[tokio::test]
async fn user_lookup_sends_token_and_username() {
    let (client, recorded) = serve().await;

    let phid = client.user_phid("jdoe").await.expect("lookup");
    assert_eq!(phid, Phid::new("PHID-USER-jdoe"));

    let calls = recorded.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "user.search");
    assert!(has(&calls[0].1, "api.token", "api-test"));
    assert!(has(&calls[0].1, "constraints[usernames][0]", "jdoe"));
}

#[tokio::test]
async fn unknown_user_is_an_error() {
    let (client, _) = serve().await;

    let err = client.user_phid("nobody").await.unwrap_err();
    assert!(matches!(err, ConduitError::UnknownUser(name) if name == "nobody"));
}

#[tokio::test]
async fn error_envelope_becomes_api_error() {
    let (client, _) = serve().await;
    let user = proph::directory::NewUser::builder()
        .username("jdoe")
        .password("pw")
        .real_name("Jane Doe")
        .email("jdoe@example.edu")
        .build();

    match client.create_user(&user).await.unwrap_err() {
        ConduitError::Api { method, code, info } => {
            assert_eq!(method, "user.create");
            assert_eq!(code, "ERR-CONDUIT-CORE");
            assert!(info.contains("taken"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn project_creation_sends_transactions() {
    let (client, recorded) = serve().await;
    let project = NewProject::builder()
        .name("Part 1 Group 03")
        .icon("policy")
        .color("red")
        .members(vec![Phid::new("PHID-USER-jdoe")])
        .build();

    let phid = client.create_project(&project).await.expect("create");
    assert_eq!(phid.as_str(), "PHID-PROJ-3");

    let (method, form) = recorded.lock().unwrap()[0].clone();
    assert_eq!(method, "project.edit");
    assert!(has(&form, "transactions[0][type]", "name"));
    assert!(has(&form, "transactions[0][value]", "Part 1 Group 03"));
    assert!(has(&form, "transactions[3][type]", "members.set"));
    assert!(has(&form, "transactions[3][value][0]", "PHID-USER-jdoe"));
}

#[tokio::test]
async fn project_lookup_matches_exact_name() {
    let (client, _) = serve().await;

    let phid = client.project_phid("Part 1 Group 09").await.expect("lookup");
    assert_eq!(phid.as_str(), "PHID-PROJ-9");

    let err = client.project_phid("Part 1 Group 10").await.unwrap_err();
    assert!(matches!(err, ConduitError::UnknownProject(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = client_for(format!("http://{addr}"));
    let err = client.user_phid("jdoe").await.unwrap_err();
    assert!(matches!(err, ConduitError::Transport { .. }));
}

#[tokio::test]
async fn load_diffs_against_conduit() {
    let (client, recorded) = serve().await;
    let root = std::env::temp_dir().join(format!("proph-conduit-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    fs::write(root.join("group9.diff"), "diff --git a/x b/x\n").expect("write");

    let report = workflow::load_diffs(&client, &PathBuf::from(&root), 1)
        .await
        .expect("load");
    assert_eq!(report.succeeded(), 1, "{:?}", report.outcomes());

    let calls = recorded.lock().unwrap().clone();
    let methods: Vec<&str> = calls.iter().map(|(m, _)| m.as_str()).collect();
    assert_eq!(
        methods,
        vec![
            "differential.createrawdiff",
            "differential.revision.edit",
            "project.search",
            "policy.create",
            "differential.revision.edit",
        ]
    );

    assert!(has(&calls[0].1, "diff", "diff --git a/x b/x\n"));
    assert!(has(&calls[1].1, "transactions[0][value]", "PHID-DIFF-41"));
    assert!(has(&calls[1].1, "transactions[1][value]", "Part 1 Group 09"));
    assert!(has(&calls[3].1, "policy[0][value][0]", "PHID-PROJ-9"));
    assert!(has(&calls[4].1, "objectIdentifier", "PHID-DREV-7"));
    assert!(has(&calls[4].1, "transactions[0][value]", "PHID-PLCY-1"));

    let _ = fs::remove_dir_all(root);
}
