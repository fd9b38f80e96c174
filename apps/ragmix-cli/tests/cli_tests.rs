use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir.join("rust")).unwrap();
    fs::create_dir_all(dir.join("garden")).unwrap();
    fs::write(dir.join("rust/ownership.txt"), "The borrow checker enforces ownership and prevents data races.").unwrap();
    fs::write(dir.join("garden/tomatoes.md"), "Tomatoes want full summer sun and deep, regular watering.").unwrap();
}

fn ragmix(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ragmix"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn offline_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("ragmix.toml");
    fs::write(&path, "[generation]\nbackend = \"disabled\"\n\n[embedding]\nbackend = \"hashing\"\ndim = 128\n").unwrap();
    path
}

#[test]
fn search_prints_the_best_passage_first() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = tmp.path().join("docs");
    write_corpus(&corpus);
    let config = offline_config(tmp.path());

    let out = ragmix(&config, &["search", corpus.to_str().unwrap(), "borrow checker", "-n", "1"]);

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Indexed 2 segments from 2 documents (0 skipped)"), "{stdout}");
    assert!(stdout.contains(" 1. ["), "{stdout}");
    assert!(stdout.contains("ownership.txt"), "{stdout}");
    assert!(!stdout.contains("tomatoes.md"), "{stdout}");
}

#[test]
fn search_can_emit_json() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = tmp.path().join("docs");
    write_corpus(&corpus);
    let config = offline_config(tmp.path());

    let out = ragmix(&config, &["search", corpus.to_str().unwrap(), "tomatoes", "--json"]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let json_start = stdout.find('[').unwrap();
    let results: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(results[0]["segment"]["metadata"]["category"], "garden");
}

#[test]
fn ask_without_a_generator_lists_the_passages() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = tmp.path().join("docs");
    write_corpus(&corpus);
    let config = offline_config(tmp.path());

    let out = ragmix(&config, &["ask", corpus.to_str().unwrap(), "When do tomatoes need sun?"]);

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("not available"), "{stdout}");
    assert!(stdout.contains("Sources:"), "{stdout}");
}

#[test]
fn empty_folder_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let corpus = tmp.path().join("empty");
    fs::create_dir_all(&corpus).unwrap();
    let config = offline_config(tmp.path());

    let out = ragmix(&config, &["search", corpus.to_str().unwrap(), "anything"]);

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no documents found"));
}
