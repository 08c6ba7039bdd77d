use std::io;
use std::sync::{Arc, Mutex};

use verdict::{
    always_false, always_true, deny, deny_overrides, first_applicable, is_deny,
    is_indeterminate, is_not_applicable, is_permit, not, permit, permit_overrides, predicate,
    property_equals, property_in, property_matches, resolution, resolutions, when, Context,
    Decision, DecisionKind, Policy, PolicyError, ResultRecord, Resolutions, Value,
};

fn setters() -> Resolutions<()> {
    resolutions([
        (
            "resolution_a",
            resolution(|| {
                |_: &(), mut rec: ResultRecord| {
                    rec.set("a", 1);
                    rec
                }
            }),
        ),
        (
            "resolution_b",
            resolution(|| {
                |_: &(), mut rec: ResultRecord| {
                    rec.set("b", 2);
                    rec
                }
            }),
        ),
    ])
}

fn permit_policy() -> Policy<()> {
    when(always_true()).then(permit())
}

fn deny_policy() -> Policy<()> {
    when(always_true()).then(deny())
}

fn not_applicable_policy() -> Policy<()> {
    when(always_false()).then(None)
}

fn indeterminate_policy() -> Policy<()> {
    when(always_true()).then(None)
}

#[test]
fn builder_stages_compose() {
    let policy = when::<()>(None).then(None).otherwise(None);
    assert!(!policy.has_then());
    assert!(!policy.has_otherwise());
    assert!(is_not_applicable(&policy.evaluate(&())));
}

#[test]
fn then_and_otherwise_follow_target() {
    let on_true = when(always_true()).then(permit()).otherwise(deny());
    assert!(is_permit(&on_true.evaluate(&())));

    let on_default = when(None).then(permit()).otherwise(deny());
    assert!(is_deny(&on_default.evaluate(&())));
}

#[test]
fn absent_branches() {
    assert!(is_not_applicable(&when(always_false()).then(permit()).evaluate(&())));
    assert!(is_indeterminate(&indeterminate_policy().evaluate(&())));
    assert!(is_indeterminate(
        &when(always_true()).then(None).otherwise(None).evaluate(&())
    ));
}

#[test]
fn combined_predicates_guard_policies() {
    let target = not(always_false()).and(always_true().or(always_false()));
    let policy = when(target).then(permit()).otherwise(deny());
    assert!(policy.evaluate(&()).is_permit());
}

#[test]
fn permit_overrides_scenarios() {
    let eval = |a: Policy<()>, b: Policy<()>| permit_overrides([a, b]).evaluate(&()).kind();

    assert_eq!(eval(permit_policy(), deny_policy()), DecisionKind::Permit);
    assert_eq!(eval(permit_policy(), permit_policy()), DecisionKind::Permit);
    assert_eq!(eval(deny_policy(), deny_policy()), DecisionKind::Deny);
    assert_eq!(
        eval(not_applicable_policy(), not_applicable_policy()),
        DecisionKind::NotApplicable
    );
    assert_eq!(
        eval(indeterminate_policy(), not_applicable_policy()),
        DecisionKind::Indeterminate
    );
}

#[test]
fn deny_overrides_scenarios() {
    let eval = |a: Policy<()>, b: Policy<()>| deny_overrides([a, b]).evaluate(&()).kind();

    assert_eq!(eval(permit_policy(), deny_policy()), DecisionKind::Deny);
    assert_eq!(eval(permit_policy(), permit_policy()), DecisionKind::Permit);
    assert_eq!(eval(deny_policy(), deny_policy()), DecisionKind::Deny);
    assert_eq!(eval(deny_policy(), not_applicable_policy()), DecisionKind::Deny);
    assert_eq!(
        eval(not_applicable_policy(), not_applicable_policy()),
        DecisionKind::NotApplicable
    );
    assert_eq!(
        eval(indeterminate_policy(), not_applicable_policy()),
        DecisionKind::Indeterminate
    );
}

#[test]
fn combining_policies_nest() {
    let outer_permit = permit_overrides([
        deny_overrides([permit_policy(), deny_policy()]),
        permit_overrides([permit_policy(), deny_policy()]),
    ]);
    assert!(outer_permit.evaluate(&()).is_permit());

    let outer_deny = deny_overrides([
        deny_overrides([permit_policy(), deny_policy()]),
        permit_overrides([permit_policy(), deny_policy()]),
    ]);
    assert!(outer_deny.evaluate(&()).is_deny());
}

#[test]
fn combined_policy_can_be_a_branch() {
    let guarded = when(property_equals("tenant", "acme"))
        .then(deny_overrides([
            when(property_equals("role", "admin")).then(permit()),
            when(property_equals("suspended", true)).then(deny()),
        ]))
        .otherwise(deny());

    let admin = Context::new().with("tenant", "acme").with("role", "admin");
    let suspended = admin.clone().with("suspended", true);
    let outsider = Context::new().with("tenant", "other").with("role", "admin");
    let viewer = Context::new().with("tenant", "acme").with("role", "viewer");

    assert!(guarded.evaluate(&admin).is_permit());
    assert!(guarded.evaluate(&suspended).is_deny());
    assert!(guarded.evaluate(&outsider).is_deny());
    assert!(guarded.evaluate(&viewer).is_not_applicable());
}

#[test]
fn user_defined_predicates_combine() {
    let is_one = predicate(|| |ctx: &i32| *ctx == 1);
    let policy = when(is_one().and(is_one().or(is_one())))
        .then(permit())
        .otherwise(deny());
    assert!(policy.evaluate(&1).is_permit());
    assert!(policy.evaluate(&2).is_deny());
}

#[test]
fn resolutions_fill_permit_result() {
    let r = setters();
    let policy = when(always_true())
        .then(r["resolution_a"].chain().resolve(&r["resolution_b"]).permit())
        .otherwise(deny());

    let decision = policy.evaluate(&());
    assert!(decision.is_permit());
    assert_eq!(decision.result().get("a"), Some(&Value::Int(1)));
    assert_eq!(decision.result().get("b"), Some(&Value::Int(2)));
}

#[test]
fn resolutions_fill_deny_result_on_otherwise() {
    let r = setters();
    let policy = when(always_false())
        .then(permit())
        .otherwise(r["resolution_a"].chain().resolve(&r["resolution_b"]).deny());

    let decision = policy.evaluate(&());
    assert!(decision.is_deny());
    assert_eq!(decision.result().get("a"), Some(&Value::Int(1)));
    assert_eq!(decision.result().get("b"), Some(&Value::Int(2)));
}

#[test]
fn last_terminal_wins() {
    let policy = when(always_true()).then(permit().deny()).otherwise(deny());
    assert!(policy.evaluate(&()).is_deny());
}

#[test]
fn unknown_resolution_is_reported() {
    let r = setters();
    let err = r.pipeline(["resolution_a", "resolution_c"]).unwrap_err();
    assert!(matches!(err, PolicyError::UnknownResolution { ref name } if name == "resolution_c"));
    assert!(err.to_string().contains("resolution_c"));
}

#[test]
fn policies_over_json_context() {
    let policy = first_applicable([
        when(property_equals("action", "delete")).then(deny()),
        when(property_in("role", ["admin", "editor"])).then(permit()),
        when(property_matches("path", r"^/public/").unwrap()).then(permit()),
    ]);

    let ctx = Context::from_json_str(r#"{"role": "editor", "action": "read"}"#).unwrap();
    assert!(policy.evaluate(&ctx).is_permit());

    let ctx = Context::from_json_str(r#"{"role": "admin", "action": "delete"}"#).unwrap();
    assert!(policy.evaluate(&ctx).is_deny());

    let ctx = Context::from_json_str(r#"{"role": "guest", "path": "/public/a"}"#).unwrap();
    assert!(policy.evaluate(&ctx).is_permit());

    let ctx = Context::from_json_str(r#"{"role": "guest"}"#).unwrap();
    assert!(policy.evaluate(&ctx).is_not_applicable());

    let err = Context::from_json_str("[1, 2]").unwrap_err();
    assert!(err.is_invalid_context());
}

#[test]
fn decisions_serialize_with_their_record() {
    let r = setters();
    let decision = r["resolution_b"].chain().permit().evaluate(&());
    let json = serde_json::to_value(&decision).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "Permit", "result": {"b": 2}}));

    let back: Decision = serde_json::from_value(json).unwrap();
    assert_eq!(back, decision);
}

#[test]
fn policy_functions_are_shareable_across_threads() {
    let f = Arc::new(
        when(property_equals("n", 1))
            .then(permit())
            .otherwise(deny())
            .into_fn(),
    );

    let handles: Vec<_> = (0..4_i64)
        .map(|n| {
            let f = Arc::clone(&f);
            std::thread::spawn(move || f(&Context::new().with("n", n)).kind())
        })
        .collect();

    let kinds: Vec<DecisionKind> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        kinds,
        vec![
            DecisionKind::Deny,
            DecisionKind::Permit,
            DecisionKind::Deny,
            DecisionKind::Deny
        ]
    );
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn evaluation_emits_diagnostics() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let r = setters();
    tracing::subscriber::with_default(subscriber, || {
        let policy = permit_overrides([
            deny_policy(),
            when(always_true()).then(r["resolution_a"].chain().permit()),
        ]);
        assert!(policy.evaluate(&()).is_permit());
    });

    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("combined decision"), "{logs}");
    assert!(logs.contains("permit_overrides"), "{logs}");
    assert!(logs.contains("resolution_a"), "{logs}");
}
