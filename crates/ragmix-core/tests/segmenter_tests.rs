use proptest::prelude::*;

use ragmix_core::{Document, Error, Segmenter};

fn reconstruct(segmenter: &Segmenter, doc: &Document) -> String {
    segmenter.segment(doc).map(|s| s.fresh_text().to_string()).collect()
}

#[test]
fn empty_and_blank_documents_produce_nothing() {
    let segmenter = Segmenter::new(100, 10).unwrap();
    assert_eq!(segmenter.segment(&Document::new("")).count(), 0);
    assert_eq!(segmenter.segment(&Document::new("  \n\n \t")).count(), 0);
}

#[test]
fn invalid_sizes_are_rejected() {
    assert!(matches!(Segmenter::new(0, 0), Err(Error::InvalidConfig(_))));
    assert!(matches!(Segmenter::new(10, 10), Err(Error::InvalidConfig(_))));
}

#[test]
fn short_paragraphs_pack_into_one_segment() {
    let segmenter = Segmenter::new(100, 10).unwrap();
    let doc = Document::new("First paragraph.\n\nSecond paragraph.");
    let segments: Vec<_> = segmenter.segment(&doc).collect();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, doc.text);
    assert_eq!(segments[0].overlap_len, 0);
}

#[test]
fn paragraph_boundaries_win_over_filling_the_budget() {
    let segmenter = Segmenter::new(30, 0).unwrap();
    let doc = Document::new("Alpha paragraph here.\n\nBravo paragraph here.");
    let texts: Vec<String> = segmenter.segment(&doc).map(|s| s.text).collect();
    assert_eq!(texts, vec!["Alpha paragraph here.\n\n", "Bravo paragraph here."]);
}

#[test]
fn long_paragraph_splits_at_sentences_with_word_aligned_overlap() {
    let segmenter = Segmenter::new(40, 12).unwrap();
    let doc = Document::new("The fox ran far. The dog slept all day. The cat watched them both closely.");
    let segments: Vec<_> = segmenter.segment(&doc).collect();

    assert!(segments.len() > 1);
    for s in &segments {
        assert!(s.text.chars().count() <= 40, "segment too long: {:?}", s.text);
    }
    assert_eq!(segments[0].text, "The fox ran far. The dog slept all day. ");
    for pair in segments.windows(2) {
        let overlap = &pair[1].text[..pair[1].overlap_len];
        assert!(pair[0].text.ends_with(overlap));
        assert!(overlap.is_empty() || pair[0].text[..pair[0].text.len() - overlap.len()].ends_with(char::is_whitespace));
    }
    assert_eq!(reconstruct(&segmenter, &doc), doc.text);
}

#[test]
fn metadata_is_copied_to_every_segment() {
    let segmenter = Segmenter::new(20, 5).unwrap();
    let doc = Document::new("one two three four five six seven eight nine ten").with_meta("fonte", "wiki");
    let segments: Vec<_> = segmenter.segment(&doc).collect();
    assert!(segments.len() > 1);
    assert!(segments.iter().all(|s| s.metadata.get("fonte").map(String::as_str) == Some("wiki")));
    assert!(segments.iter().all(|s| s.id.is_none()));
}

#[test]
fn iterator_is_restartable() {
    let segmenter = Segmenter::new(15, 4).unwrap();
    let doc = Document::new("restartable lazy iteration over segments");
    let mut iter = segmenter.segment(&doc);
    let first = iter.next();
    let replay = iter.clone();
    let rest: Vec<_> = iter.collect();
    assert_eq!(replay.collect::<Vec<_>>(), rest);
    assert_eq!(segmenter.segment(&doc).next(), first);
}

proptest! {
    #[test]
    fn segments_reconstruct_document_without_loss(
        text in "[a-zA-Zçé .!?\n]{1,400}",
        max in 1usize..80,
        overlap_frac in 0.0f64..0.9,
    ) {
        let overlap = ((max as f64) * overlap_frac) as usize;
        prop_assume!(overlap < max);
        let doc = Document::new(text.clone());
        prop_assume!(!doc.is_blank());
        let segmenter = Segmenter::new(max, overlap).unwrap();

        prop_assert_eq!(reconstruct(&segmenter, &doc), text);
        for s in segmenter.segment(&doc) {
            prop_assert!(s.text.chars().count() <= max);
            prop_assert!(!s.fresh_text().is_empty());
        }
    }
}
