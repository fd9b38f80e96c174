use std::path::PathBuf;

use ragmix_core::settings::{EmbeddingSettings, GenerationSettings};
use ragmix_models::{embedder_from_settings, generator_from_settings};

#[test]
fn default_embedding_backend_is_hashing() {
    let embedder = embedder_from_settings(&EmbeddingSettings::default()).unwrap();
    assert_eq!(embedder.dim(), 384);
    assert_eq!(embedder.embed("abc").unwrap().len(), 384);
}

#[test]
fn http_embedder_reports_configured_dimension() {
    let settings = EmbeddingSettings::Http {
        endpoint: "http://127.0.0.1:9/v1/embeddings".into(),
        model: "nomic-embed-text".into(),
        api_key: Some("test".into()),
        dim: 768,
        timeout_secs: 1,
    };
    assert_eq!(embedder_from_settings(&settings).unwrap().dim(), 768);
}

#[test]
fn local_backend_without_model_files_fails() {
    let dir = tempfile::tempdir().unwrap();
    let settings = EmbeddingSettings::Local { model_dir: PathBuf::from(dir.path()), max_len: 16 };
    assert!(embedder_from_settings(&settings).is_err());
}

#[test]
fn disabled_generation_yields_none() {
    assert!(generator_from_settings(&GenerationSettings::Disabled).unwrap().is_none());
}

#[test]
fn generation_backends_are_selected_by_tag() {
    let ollama = generator_from_settings(&GenerationSettings::default()).unwrap().unwrap();
    assert_eq!(ollama.name(), "ollama");

    let openai = generator_from_settings(&GenerationSettings::OpenAi {
        endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
        model: "gpt-4o-mini".into(),
        api_key: Some("test".into()),
        temperature: 0.0,
        timeout_secs: 1,
    })
    .unwrap()
    .unwrap();
    assert_eq!(openai.name(), "openai");
}
