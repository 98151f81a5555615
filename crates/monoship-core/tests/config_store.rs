use std::collections::HashMap;
use std::path::Path;

use monoship_core::config::ConfigStore;
use monoship_core::deploy::DeploySettings;
use monoship_core::orchestration::PipelineSettings;
use monoship_core::registry::Authenticator;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn write_config(temp: &TempDir, content: &str) {
    std::fs::write(temp.path().join("monoship.toml"), content).unwrap();
}

#[test]
fn missing_config_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_repo_root(temp.path());

    let config = store.load_with(env(&[])).unwrap();

    assert_eq!(config.workspace.packages_root, Path::new("packages"));
    assert!(config.registry.host.is_none());
    assert!(DeploySettings::from_config(&config.remote).is_none());
}

#[test]
fn file_values_are_loaded() {
    let temp = TempDir::new().unwrap();
    write_config(
        &temp,
        r#"
[workspace]
packages_root = "apps"

[registry]
host = "123456789012.dkr.ecr.us-east-1.amazonaws.com"
prefix = "acme"

[remote]
host = "swarm.internal"
password = "hunter2"
network = "backend"
"#,
    );
    let store = ConfigStore::from_repo_root(temp.path());

    let config = store.load_with(env(&[])).unwrap();

    assert_eq!(
        config.packages_root(temp.path()),
        temp.path().join("apps")
    );
    let settings = PipelineSettings::from_config(&config, temp.path(), "abcdef0123").unwrap();
    assert_eq!(
        settings.namer.image_for("api").to_string(),
        "123456789012.dkr.ecr.us-east-1.amazonaws.com/acme/api:abcdef0"
    );
    assert!(matches!(
        settings.authenticator,
        Authenticator::CloudToken { ref region, .. } if region == "us-east-1"
    ));

    let deploy = DeploySettings::from_config(&config.remote).unwrap();
    assert_eq!(deploy.target.destination(), "root@swarm.internal");
    assert_eq!(deploy.network, "backend");
}

#[test]
fn environment_overrides_file_values() {
    let temp = TempDir::new().unwrap();
    write_config(
        &temp,
        r#"
[registry]
host = "registry.example.com"

[remote]
port = 2200
"#,
    );
    let store = ConfigStore::from_repo_root(temp.path());

    let config = store
        .load_with(env(&[
            ("MONOSHIP_REGISTRY", "ghcr.io"),
            ("MONOSHIP_REMOTE_PORT", "2222"),
            ("GITHUB_SHA", "0011223344"),
        ]))
        .unwrap();

    assert_eq!(config.registry.host.as_deref(), Some("ghcr.io"));
    assert_eq!(config.remote.port, 2222);
    assert_eq!(config.commit_sha.as_deref(), Some("0011223344"));
}

#[test]
fn explicit_config_path_is_used() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ci").join("deploy.toml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[workspace]\nbuild_file = \"Containerfile\"\n").unwrap();
    let store = ConfigStore::from_path(path.clone());

    let config = store.load_with(env(&[])).unwrap();

    assert_eq!(store.config_path(), path);
    assert_eq!(config.workspace.build_file, "Containerfile");
}

#[test]
fn syntax_errors_point_at_the_line() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "[registry]\nhost = \n");
    let store = ConfigStore::from_repo_root(temp.path());

    let err = store.load_with(env(&[])).unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("monoship.toml"));
    assert!(message.contains("line 2"));
}

#[test]
fn packages_root_outside_the_repository_is_rejected() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "[workspace]\npackages_root = \"../elsewhere\"\n");
    let store = ConfigStore::from_repo_root(temp.path());

    let err = store.load_with(env(&[])).unwrap_err();

    assert!(format!("{:#}", err).contains("packages_root"));
}

#[test]
fn invalid_environment_value_is_rejected() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_repo_root(temp.path());

    let err = store
        .load_with(env(&[("MONOSHIP_REMOTE_PORT", "not-a-port")]))
        .unwrap_err();

    assert!(err.to_string().contains("MONOSHIP_REMOTE_PORT"));
}
