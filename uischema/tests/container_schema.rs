//! End-to-end checks against the container parameter fixture.

use std::sync::OnceLock;

use serde_json::json;
use uischema::{
    SchemaTree, ValidateOptions, ValidationEngine, Value, ValueSource, ViolationKind, Violations,
    render, validate, validate_update,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn container_tree() -> &'static SchemaTree {
    static TREE: OnceLock<SchemaTree> = OnceLock::new();
    TREE.get_or_init(|| {
        init_logger();
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/container.yaml");
        SchemaTree::from_path(path).expect("fixture schema must load")
    })
}

fn kinds(violations: &Violations) -> Vec<(String, ViolationKind)> {
    violations
        .iter()
        .map(|v| (v.path.to_string(), v.kind))
        .collect()
}

fn valid_document() -> Value {
    json!({
        "image": "nginx:latest",
        "imagePullPolicy": "Always",
        "imagePullSecrets": ["regcred"],
        "cpu": "0.5",
        "memory": "512Mi",
        "ports": [{"port": 80, "protocol": "TCP", "expose": true}],
        "exposeType": "NodePort",
        "cmd": ["nginx", "-g", "daemon off;"],
        "env": [
            {"name": "MODE", "value": "prod"},
            {"name": "TOKEN", "valueFrom": {"secretKeyRef": {"name": "creds", "key": "token"}}},
        ],
        "readinessProbe": {
            "httpGet": {
                "path": "/healthz",
                "port": 80,
                "httpHeaders": [{"name": "X-Probe", "value": "1"}],
            },
            "periodSeconds": 5,
        },
        "labels": {"app": "web"},
        "addRevisionLabel": false,
    })
}

#[test]
fn test_valid_document_has_no_violations() {
    let violations = validate(container_tree(), &valid_document(), &ValidateOptions::default());
    assert!(violations.is_empty(), "{violations}");
}

#[test]
fn test_required_image() {
    let tree = container_tree();
    let mut doc = valid_document();
    doc.as_object_mut().unwrap().remove("image");

    let violations = validate(tree, &doc, &ValidateOptions::default());
    assert_eq!(
        kinds(&violations),
        vec![("image".to_string(), ViolationKind::MissingRequired)]
    );

    doc["image"] = json!("nginx:latest");
    assert!(validate(tree, &doc, &ValidateOptions::default()).is_empty());
}

#[test]
fn test_image_pull_policy_options() {
    let tree = container_tree();
    let mut doc = valid_document();

    doc["imagePullPolicy"] = json!("Sometimes");
    let violations = validate(tree, &doc, &ValidateOptions::default());
    assert_eq!(
        kinds(&violations),
        vec![("imagePullPolicy".to_string(), ViolationKind::InvalidOption)]
    );

    doc["imagePullPolicy"] = json!("Always");
    assert!(validate(tree, &doc, &ValidateOptions::default()).is_empty());
}

#[test]
fn test_image_is_mutable_in_fixture() {
    let tree = container_tree();
    let previous = valid_document();
    let mut doc = valid_document();
    doc["image"] = json!("nginx:1.27");
    assert!(validate_update(tree, &doc, &previous, &ValidateOptions::default()).is_empty());
}

#[test]
fn test_immutable_field() {
    let tree = SchemaTree::from_value(&json!([
        {"jsonKey": "image", "uiType": "ImageInput", "validate": {"required": true, "immutable": true}},
    ]))
    .unwrap();
    let engine = ValidationEngine::new(&tree);
    let stored = json!({"image": "a"});

    let changed = engine.validate_update(&json!({"image": "b"}), &stored);
    assert_eq!(
        kinds(&changed),
        vec![("image".to_string(), ViolationKind::ImmutableViolation)]
    );

    assert!(engine.validate_update(&json!({"image": "a"}), &stored).is_empty());
    assert!(engine.validate(&json!({"image": "b"})).is_empty());
}

#[test]
fn test_nested_required_is_scoped() {
    let tree = container_tree();
    let mut doc = valid_document();
    doc["readinessProbe"] = json!({"httpGet": {"port": 8080}});

    let violations = validate(tree, &doc, &ValidateOptions::default());
    assert_eq!(
        kinds(&violations),
        vec![(
            "readinessProbe.httpGet.path".to_string(),
            ViolationKind::MissingRequired
        )]
    );
}

#[test]
fn test_env_alternatives() {
    let tree = container_tree();
    let mut doc = valid_document();

    doc["env"] = json!([{"name": "MODE", "value": "prod"}]);
    assert!(validate(tree, &doc, &ValidateOptions::default()).is_empty());

    doc["env"] = json!([{
        "name": "MODE",
        "value": "prod",
        "valueFrom": {"secretKeyRef": {"name": "creds", "key": "mode"}},
    }]);
    let violations = validate(tree, &doc, &ValidateOptions::default());
    assert_eq!(
        kinds(&violations),
        vec![("env[0]".to_string(), ViolationKind::ConflictingAlternatives)]
    );
    assert!(violations.violations()[0].message.contains("Add By Value"));
}

#[test]
fn test_key_of_unselected_alternative_is_unexpected() {
    let tree = SchemaTree::from_value(&json!([
        {"jsonKey": "source", "uiType": "Group",
         "subParameterGroupOption": [
            {"label": "Literal", "keys": ["value", "encoding"]},
            {"label": "Secret", "keys": ["encoding", "secretRef"]},
            {"label": "File", "keys": ["secretRef", "path"]},
         ],
         "subParameters": [
            {"jsonKey": "value"},
            {"jsonKey": "encoding"},
            {"jsonKey": "secretRef"},
            {"jsonKey": "path"},
         ]},
    ]))
    .unwrap();
    let doc = json!({"source": {"value": "abc", "secretRef": "creds"}});

    let violations = validate(&tree, &doc, &ValidateOptions::strict());
    assert_eq!(
        kinds(&violations),
        vec![(
            "source.secretRef".to_string(),
            ViolationKind::UnexpectedField
        )]
    );

    assert!(validate(&tree, &doc, &ValidateOptions::lenient()).is_empty());
}

#[test]
fn test_all_violations_reported_in_order() {
    let tree = container_tree();
    let doc = json!({
        "imagePullPolicy": "Sometimes",
        "ports": [{"port": "80"}],
        "extra": 1,
        "readinessProbe": {"httpGet": {}, "exec": {"command": ["true"]}},
    });
    let expected = vec![
        ("image".to_string(), ViolationKind::MissingRequired),
        ("imagePullPolicy".to_string(), ViolationKind::InvalidOption),
        ("ports[0].port".to_string(), ViolationKind::TypeMismatch),
        (
            "readinessProbe".to_string(),
            ViolationKind::ConflictingAlternatives,
        ),
        (
            "readinessProbe.httpGet.path".to_string(),
            ViolationKind::MissingRequired,
        ),
        (
            "readinessProbe.httpGet.port".to_string(),
            ViolationKind::MissingRequired,
        ),
        ("extra".to_string(), ViolationKind::UnexpectedField),
    ];

    let first = validate(tree, &doc, &ValidateOptions::default());
    assert_eq!(kinds(&first), expected);
    assert_eq!(first, validate(tree, &doc, &ValidateOptions::default()));
}

#[test]
fn test_render_root_order_and_visibility() {
    let form = render(container_tree(), None);
    assert_eq!(
        form.keys(),
        vec![
            "image",
            "imagePullPolicy",
            "imagePullSecrets",
            "cpu",
            "memory",
            "ports",
            "exposeType",
            "cmd",
            "env",
            "readinessProbe",
            "labels",
        ]
    );
    let policy = form.field("imagePullPolicy").unwrap();
    assert_eq!(policy.value, Some(json!("IfNotPresent")));
    assert_eq!(policy.value_source, ValueSource::Default);
}

#[test]
fn test_render_probe_selector() {
    let tree = container_tree();

    let form = render(tree, None);
    let probe = form.field("readinessProbe").unwrap().group.as_ref().unwrap();
    let choice = probe.choice.as_ref().unwrap();
    assert_eq!(choice.selected, 0);
    assert_eq!(choice.source, ValueSource::Default);
    assert_eq!(
        probe.keys(),
        vec![
            "httpGet",
            "initialDelaySeconds",
            "periodSeconds",
            "timeoutSeconds",
            "successThreshold",
            "failureThreshold",
        ]
    );

    let doc = json!({"readinessProbe": {"tcpSocket": {"port": 80}}});
    let form = render(tree, Some(&doc));
    let probe = form.field("readinessProbe").unwrap().group.as_ref().unwrap();
    assert_eq!(probe.choice.as_ref().unwrap().selected, 2);
    assert_eq!(probe.keys()[0], "tcpSocket");
    assert!(probe.field("httpGet").is_none());
}

#[test]
fn test_render_is_idempotent() {
    let tree = container_tree();
    let doc = valid_document();
    let first = render(tree, Some(&doc));
    let second = render(tree, Some(&doc));
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_concurrent_readers() {
    let tree = container_tree();
    let docs: Vec<Value> = (0..8)
        .map(|i| {
            let mut doc = valid_document();
            if i % 2 == 1 {
                doc["imagePullPolicy"] = json!("Sometimes");
            }
            doc
        })
        .collect();

    let counts: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = docs
            .iter()
            .map(|doc| {
                s.spawn(move || {
                    let _ = render(tree, Some(doc));
                    validate(tree, doc, &ValidateOptions::default()).len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counts, vec![0, 1, 0, 1, 0, 1, 0, 1]);
}
