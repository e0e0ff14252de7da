use std::fs;
use std::path::{Path, PathBuf};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|path| path.parent())
        .expect("crates/architect-app should have a workspace root parent")
        .to_path_buf()
}

fn crate_manifests(root: &Path) -> Vec<(String, String)> {
    let entries = fs::read_dir(root.join("crates")).expect("read crates directory");
    let mut manifests = Vec::new();
    for entry in entries {
        let path = entry.expect("read crate entry").path();
        let manifest = path.join("Cargo.toml");
        if !path.is_dir() || !manifest.exists() {
            continue;
        }
        let crate_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("crate directory name must be valid UTF-8")
            .to_owned();
        let contents = fs::read_to_string(&manifest).expect("read crate manifest");
        manifests.push((crate_name, contents));
    }
    manifests
}

#[test]
fn workspace_manifest_lists_all_crates() {
    let root = repo_root();
    let workspace_manifest =
        fs::read_to_string(root.join("Cargo.toml")).expect("read workspace Cargo.toml");

    for (crate_name, _) in crate_manifests(&root) {
        let expected_member = format!("\"crates/{crate_name}\"");
        assert!(
            workspace_manifest.contains(&expected_member),
            "workspace manifest is missing member {expected_member}",
        );
    }
}

#[test]
fn library_crates_do_not_depend_on_the_app() {
    let root = repo_root();
    for (crate_name, manifest) in crate_manifests(&root) {
        if crate_name == "architect-app" {
            continue;
        }
        assert!(
            !manifest.contains("architect-app"),
            "{crate_name} must not depend on architect-app",
        );
    }
}

#[test]
fn protocol_crate_stays_free_of_runtime_dependencies() {
    let root = repo_root();
    let manifest = fs::read_to_string(root.join("crates/architect-protocol/Cargo.toml"))
        .expect("read architect-protocol manifest");

    for forbidden in ["architect-store", "architect-watcher", "tokio"] {
        assert!(
            !manifest.contains(forbidden),
            "architect-protocol must not depend on {forbidden}",
        );
    }
}
