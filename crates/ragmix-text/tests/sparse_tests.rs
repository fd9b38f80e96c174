use std::sync::Arc;
use std::thread;

use ragmix_core::settings::{Bm25Settings, StopWordsSetting};
use ragmix_core::Segment;
use ragmix_text::search::BM25_SCORE_KEY;
use ragmix_text::{Analyzer, Bm25Params, SparseIndex, StopWords};

fn index() -> SparseIndex {
    SparseIndex::new(Analyzer::new(&StopWords::English), Bm25Params::default())
}

fn texts(hits: &[ragmix_core::ScoredSegment]) -> Vec<&str> {
    hits.iter().map(|h| h.segment.text.as_str()).collect()
}

#[test]
fn scores_follow_bm25_formula() {
    let idx = index();
    idx.add(&Segment::new("rust ownership borrow")).unwrap();
    idx.add(&Segment::new("rust async runtime tasks")).unwrap();
    idx.add(&Segment::new("gardening tips")).unwrap();

    let hits = idx.search("Rust", 10).unwrap();

    // N=3, df=2, avg len=3
    let idf = 1.6f32.ln();
    assert_eq!(texts(&hits), vec!["rust ownership borrow", "rust async runtime tasks"]);
    assert!((hits[0].score - idf * 1.0).abs() < 1e-5, "score={}", hits[0].score);
    assert!((hits[1].score - idf * 0.88).abs() < 1e-5, "score={}", hits[1].score);
}

#[test]
fn ranks_by_term_overlap_and_truncates() {
    let idx = index();
    idx.add(&Segment::new("the quick brown fox jumps over the lazy dog")).unwrap();
    idx.add(&Segment::new("the lazy cat sleeps all day")).unwrap();
    idx.add(&Segment::new("quick brown rabbits hop in the garden")).unwrap();

    let hits = idx.search("quick brown fox", 2).unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].segment.text, "the quick brown fox jumps over the lazy dog");
    assert!(hits[0].score >= hits[1].score);
}

#[test]
fn ties_break_by_insertion_order() {
    let idx = index();
    idx.add(&Segment::new("alpha beta").with_meta("n", "first")).unwrap();
    idx.add(&Segment::new("alpha beta").with_meta("n", "second")).unwrap();

    let hits = idx.search("alpha", 10).unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].score, hits[1].score);
    assert_eq!(hits[0].segment.metadata["n"], "first");
    assert_eq!(hits[1].segment.metadata["n"], "second");
}

#[test]
fn re_adding_a_segment_increases_doc_freq() {
    let idx = index();
    let seg = Segment::new("Deep learning usa redes neurais");
    let first = idx.add(&seg).unwrap();
    assert_eq!(idx.doc_freq("redes"), 1);
    let second = idx.add(&seg).unwrap();

    assert_ne!(first, second, "every add gets a fresh id");
    assert_eq!(idx.doc_freq("REDES"), 2);
    assert_eq!(idx.len(), 2);
}

#[test]
fn empty_index_and_unmatched_queries_return_empty() {
    let idx = index();
    assert!(idx.search("anything", 10).unwrap().is_empty());

    idx.add(&Segment::new("some content here")).unwrap();
    assert!(idx.search("", 10).unwrap().is_empty());
    assert!(idx.search("the and of", 10).unwrap().is_empty(), "stopword-only query");
    assert!(idx.search("absent", 10).unwrap().is_empty());
    assert!(idx.search("content", 0).unwrap().is_empty());
}

#[test]
fn hits_carry_bm25_score_metadata_and_keep_source_metadata() {
    let idx = index();
    idx.add(&Segment::new("Python é popular para ciência de dados").with_meta("fonte", "programacao")).unwrap();

    let hits = idx.search("python", 1).unwrap();

    let meta = &hits[0].segment.metadata;
    assert_eq!(meta["fonte"], "programacao");
    let stored: f32 = meta[BM25_SCORE_KEY].parse().unwrap();
    assert!((stored - hits[0].score).abs() < 1e-6);
}

#[test]
fn metadata_fields_filter_exactly() {
    let idx = index();
    idx.add(&Segment::new("machine learning basics").with_meta("ano", "2022")).unwrap();
    idx.add(&Segment::new("machine learning advanced").with_meta("ano", "2023")).unwrap();

    let hits = idx.search_filtered("machine learning", 10, &[("ano", "2023")]).unwrap();
    assert_eq!(texts(&hits), vec!["machine learning advanced"]);

    let none = idx.search_filtered("machine", 10, &[("ano", "2023"), ("fonte", "wiki")]).unwrap();
    assert!(none.is_empty());
}

#[test]
fn from_settings_applies_stopword_policy() {
    let settings = Bm25Settings { stopwords: StopWordsSetting::Disabled, ..Bm25Settings::default() };
    let idx = SparseIndex::from_settings(&settings);
    idx.add(&Segment::new("the end")).unwrap();
    assert_eq!(idx.search("the", 5).unwrap().len(), 1);
    assert_eq!(idx.term_count(), 2);
    assert!((idx.avg_doc_len() - 2.0).abs() < 1e-6);
}

#[test]
fn clear_drops_everything() {
    let idx = index();
    idx.add(&Segment::new("temporary text")).unwrap();
    idx.clear();
    assert!(idx.is_empty());
    assert!(idx.search("temporary", 5).unwrap().is_empty());
}

#[test]
fn concurrent_writers_and_readers_stay_consistent() {
    let idx = Arc::new(index());
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let idx = Arc::clone(&idx);
            thread::spawn(move || {
                for i in 0..50 {
                    idx.add(&Segment::new(format!("shared token writer{w} item{i}"))).unwrap();
                }
            })
        })
        .collect();
    let reader = {
        let idx = Arc::clone(&idx);
        thread::spawn(move || {
            for _ in 0..50 {
                for hit in idx.search("shared", 1000).unwrap() {
                    assert!(hit.segment.text.starts_with("shared token"));
                }
            }
        })
    };
    for w in writers {
        w.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(idx.len(), 200);
    assert_eq!(idx.doc_freq("shared"), 200);
    assert_eq!(idx.search("shared", 1000).unwrap().len(), 200);
}
