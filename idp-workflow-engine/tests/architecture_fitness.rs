//! Architecture fitness checks: workflow code depends on ports only, never on
//! concrete HTTP clients or adapter modules. These inspect the workflow
//! sources directly so a violation fails CI even if it would compile.

use std::fs;
use std::path::PathBuf;

fn workflow_sources() -> Vec<(String, String)> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/workflows");
    let mut sources = Vec::new();
    for entry in fs::read_dir(&dir).expect("workflows directory") {
        let path = entry.expect("dir entry").path();
        if path.extension().and_then(|e| e.to_str()) == Some("rs") {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let code = fs::read_to_string(&path).expect("workflow source");
            sources.push((name, code));
        }
    }
    assert!(!sources.is_empty(), "no workflow sources found in {dir:?}");
    sources
}

#[test]
fn workflows_do_not_construct_http_clients() {
    for (name, code) in workflow_sources() {
        assert!(
            !code.contains("reqwest"),
            "{name} must not reference an HTTP client; inject a port instead"
        );
        assert!(
            !code.contains("crate::adapters"),
            "{name} must not depend on adapter modules; inject a port instead"
        );
    }
}

#[test]
fn workflows_depend_on_their_ports() {
    let sources = workflow_sources();
    let find = |file: &str| {
        sources
            .iter()
            .find(|(name, _)| name == file)
            .unwrap_or_else(|| panic!("missing workflow source {file}"))
            .1
            .clone()
    };

    assert!(find("application_onboarding.rs").contains("ApplicationOnboardingPort"));
    assert!(find("appenv_provisioning.rs").contains("AppEnvProvisioningProvider"));
    assert!(find("appenv_provisioning.rs").contains("GitProvider"));
    assert!(find("secret_rotation.rs").contains("SecretRotationPort"));
    assert!(find("secret_rotation.rs").contains("SecretBindingsRotationPort"));
}

#[test]
fn signal_names_and_timeouts_are_stable() {
    use idp_workflow_engine::workflows;
    use std::time::Duration;

    assert_eq!(workflows::SECURITY_SCAN_PASSED_SIGNAL, "SecurityScanPassed");
    assert_eq!(workflows::ROTATION_VALIDATED_SIGNAL, "RotationValidatedExternally");
    assert_eq!(workflows::SECURITY_SCAN_TIMEOUT, Duration::from_secs(900));
    assert_eq!(workflows::ROTATION_VALIDATION_TIMEOUT, Duration::from_secs(3600));
}
