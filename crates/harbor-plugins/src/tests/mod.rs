//! Crate-level integration and BDD tests.

use std::fs;
use std::sync::Arc;

use serde_json::json;

use crate::contract::Parameters;
use crate::discovery::discover_scripts;
use crate::host::PluginHost;
use crate::service::PluginService;
use crate::store::InMemoryStore;


#[test]
fn end_to_end_service_runs_a_discovered_script() {
    let dir = tempfile::tempdir().expect("create plugin dir");
    fs::write(
        dir.path().join("greeter.rhai"),
        r#"print("hello from greeter");"#,
    )
    .expect("write script");

    let host = Arc::new(PluginHost::with_core_bindings());
    for binding in discover_scripts(dir.path()).expect("discovery succeeds") {
        host.register_binding(binding).expect("binding registers");
    }

    let service = PluginService::new(Arc::clone(&host), Arc::new(InMemoryStore::new()));
    service.install("greeter").expect("install succeeds");

    let value = service
        .execute("greeter", Parameters::new())
        .expect("execution succeeds");
    assert_eq!(value.get("success"), Some(&json!(true)));
    assert_eq!(value.get("output"), Some(&json!("hello from greeter\n")));

    assert!(service.uninstall("greeter").expect("uninstall succeeds"));
    assert!(!host.is_loaded("greeter").expect("host query succeeds"));
}
