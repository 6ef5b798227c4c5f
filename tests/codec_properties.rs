use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use test_case::test_case;

use wharf::api::*;

fn filter_map() -> impl Strategy<Value = BTreeMap<String, BTreeSet<String>>> {
    prop::collection::btree_map(
        "[a-z][a-z_-]{0,12}",
        prop::collection::btree_set("[ -~]{0,16}", 1..4),
        0..6,
    )
}

proptest! {
    #[test]
    fn filters_survive_encode_decode(map in filter_map()) {
        let filters: Filters = map
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key.clone(), value.clone())))
            .collect();

        let decoded = Filters::decode(&filters.encode()).unwrap();
        prop_assert_eq!(&decoded, &filters);
    }

    #[test]
    fn unset_config_fields_are_omitted(
        hostname in proptest::option::of("[a-z]{1,8}"),
        user in proptest::option::of("[a-z]{1,8}"),
        working_dir in proptest::option::of("/[a-z]{1,8}"),
        mac_address in proptest::option::of("02:42:ac:11:00:0[0-9]"),
        stop_signal in proptest::option::of("SIG[A-Z]{3,4}"),
        stop_timeout in proptest::option::of(0i64..600),
        tty in any::<bool>(),
    ) {
        let config = ContainerConfig {
            hostname: hostname.clone(),
            user: user.clone(),
            working_dir: working_dir.clone(),
            mac_address: mac_address.clone(),
            stop_signal: stop_signal.clone(),
            stop_timeout,
            tty,
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        let object = json.as_object().unwrap();

        prop_assert_eq!(object.contains_key("Hostname"), hostname.is_some());
        prop_assert_eq!(object.contains_key("User"), user.is_some());
        prop_assert_eq!(object.contains_key("WorkingDir"), working_dir.is_some());
        prop_assert_eq!(object.contains_key("MacAddress"), mac_address.is_some());
        prop_assert_eq!(object.contains_key("StopSignal"), stop_signal.is_some());
        prop_assert_eq!(object.contains_key("StopTimeout"), stop_timeout.is_some());
        prop_assert_eq!(object.contains_key("Tty"), tty);
        for never_set in ["Image", "Cmd", "Entrypoint", "Healthcheck", "Env", "Labels", "Volumes"] {
            prop_assert!(!object.contains_key(never_set));
        }
    }

    #[test]
    fn empty_filters_never_reach_the_query(all in any::<bool>()) {
        let request = ContainerListOptions {
            all: Some(all),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        prop_assert!(request.query_values("filters").is_empty());
        prop_assert_eq!(request.query_values("all"), vec![if all { "1" } else { "0" }]);
    }
}

#[test_case("a" ; "single letter")]
#[test_case("ctrl-c" ; "control letter")]
#[test_case("ctrl-@" ; "control at")]
#[test_case("ctrl-p,ctrl-q" ; "default sequence")]
#[test_case("ctrl-[,x" ; "escape then letter")]
fn test_detach_keys_accepted(keys: &str) {
    assert!(validate_detach_keys(keys).is_ok());
}

#[test_case("" ; "empty")]
#[test_case("ctrl-1" ; "control digit")]
#[test_case("ab" ; "unseparated letters")]
#[test_case("ctrl-p," ; "trailing comma")]
fn test_detach_keys_rejected(keys: &str) {
    assert!(matches!(
        validate_detach_keys(keys),
        Err(ValidationError::InvalidDetachKeys { .. })
    ));
}

#[test_case(&["CMD-SHELL", "curl -f localhost"], true ; "shell form")]
#[test_case(&["CMD", "pg_isready"], true ; "exec form")]
#[test_case(&[], true ; "inherit")]
#[test_case(&["NONE"], true ; "disabled")]
#[test_case(&["CMD-SHELL", "x", "y"], false ; "shell with two commands")]
#[test_case(&["BOGUS"], false ; "unknown keyword")]
fn test_health_test_grammar(test: &[&str], valid: bool) {
    let test: Vec<String> = test.iter().map(|s| s.to_string()).collect();
    assert_eq!(HealthTest::parse(&test).is_ok(), valid);
}

#[test]
fn test_inherit_and_disable_are_distinct() {
    let inherit = HealthTest::parse(&[]).unwrap();
    let disable = HealthTest::parse(&["NONE".to_string()]).unwrap();
    assert_ne!(inherit, disable);
}
