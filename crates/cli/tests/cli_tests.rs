use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REPO: &str = "public class Repo {
    private int count;

    public void save(Long id) {
    }
}
";

fn docforge() -> Command {
    let mut cmd = Command::cargo_bin("docforge").unwrap();
    for var in [
        "DOCFORGE_AI_ENABLED",
        "DOCFORGE_AI_PROVIDER",
        "DOCFORGE_AI_API_KEY",
        "DOCFORGE_AI_MODEL",
        "DOCFORGE_AI_BASE_URL",
        "DOCFORGE_AUTHOR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Example configuration with `edit` applied, written into `dir`.
fn write_config(dir: &Path, edit: impl Fn(String) -> String) -> PathBuf {
    let output = docforge().args(["config", "example"]).output().unwrap();
    assert!(output.status.success());
    let example = String::from_utf8(output.stdout).unwrap();
    let path = dir.join("docforge.toml");
    fs::write(&path, edit(example)).unwrap();
    path
}

#[test]
fn test_config_example_prints_toml() {
    docforge()
        .args(["config", "example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("author = \"Jane Doe\""))
        .stdout(predicate::str::contains("[ai]"));
}

#[test]
fn test_config_show_masks_api_key() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| s);

    docforge()
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("your-api-key-here").not());
}

#[test]
fn test_config_validate_rejects_bad_temperature() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| {
        s.lines()
            .map(|line| {
                if line.starts_with("temperature") {
                    "temperature = 9.0".to_string()
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    });

    docforge()
        .arg("--config")
        .arg(&config)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ai.temperature"));
}

#[test]
fn test_generate_writes_comments() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| s);
    let java = dir.path().join("Repo.java");
    fs::write(&java, REPO).unwrap();

    docforge()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .arg(&java)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 comments written"));

    let written = fs::read_to_string(&java).unwrap();
    assert!(written.starts_with("/**\n * Repo\n"));
    assert!(written.contains("    /**\n     * save method\n     * @param id id\n     */\n    public void save"));
    assert!(written.contains("     * count\n"));
    assert!(written.contains("@author Jane Doe"));
}

#[test]
fn test_generate_dry_run_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| s);
    let java = dir.path().join("Repo.java");
    fs::write(&java, REPO).unwrap();

    docforge()
        .arg("--config")
        .arg(&config)
        .args(["generate", "--dry-run"])
        .arg(dir.path())
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&java).unwrap(), REPO);
}

#[test]
fn test_generate_single_element() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| s);
    let java = dir.path().join("Repo.java");
    fs::write(&java, REPO).unwrap();

    docforge()
        .arg("--config")
        .arg(&config)
        .args(["generate", "--element", "save"])
        .arg(&java)
        .assert()
        .success();

    let written = fs::read_to_string(&java).unwrap();
    assert!(written.contains("* save method"));
    assert!(!written.contains("* count"));
    assert!(written.starts_with("public class Repo"));
}

#[test]
fn test_remove_strips_comments() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| s);
    let java = dir.path().join("Repo.java");
    fs::write(
        &java,
        "/** Old. */\npublic class Repo {\n    /** Old field. */\n    private int count;\n}\n",
    )
    .unwrap();

    docforge()
        .arg("--config")
        .arg(&config)
        .arg("remove")
        .arg(&java)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 comments removed"));

    let written = fs::read_to_string(&java).unwrap();
    assert!(!written.contains("/**"));
    assert!(written.contains("private int count;"));
}

#[test]
fn test_hook_with_disabled_listener_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| {
        s.replace("save_enabled = true", "save_enabled = false")
    });
    let java = dir.path().join("Repo.java");
    fs::write(&java, REPO).unwrap();

    docforge()
        .arg("--config")
        .arg(&config)
        .args(["hook", "before-save"])
        .arg(&java)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&java).unwrap(), REPO);
}

#[test]
fn test_hook_on_save_documents_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| s);
    let java = dir.path().join("Repo.java");
    fs::write(&java, REPO).unwrap();

    docforge()
        .arg("--config")
        .arg(&config)
        .args(["hook", "save"])
        .arg(&java)
        .assert()
        .success();

    assert!(fs::read_to_string(&java).unwrap().contains("* save method"));
}

#[test]
fn test_generate_without_java_files_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), |s| s);

    docforge()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Java sources"));
}
