use ragmix_core::types::RankedResult;

/// Returned by `answer` when retrieval finds nothing.
pub const NO_INFORMATION: &str =
    "Sorry, I could not find information in the loaded documents to answer this question accurately.";

/// Wraps the retrieved passages in instructions that restrict the generator to
/// them.
pub fn build_prompt(query: &str, contexts: &[RankedResult]) -> String {
    let mut passages = String::new();
    for ctx in contexts {
        passages.push_str("- ");
        passages.push_str(ctx.text());
        passages.push_str("\n\n");
    }
    format!(
        "You are a helpful assistant. Use ONLY the contexts below to answer the question.\n\
         If the answer is not in the contexts, say that you do not have information to answer.\n\n\
         Contexts:\n{passages}\n\n\
         Question: {query}\n\n\
         Answer:"
    )
}

/// Answer text when passages were found but no generator could be used.
pub fn generation_unavailable(passages: usize) -> String {
    let noun = if passages == 1 { "passage" } else { "passages" };
    format!(
        "The language model is not available, so no full answer could be generated. \
         Configure a generation backend to enable complete answers.\n\n\
         However, {passages} {noun} that may be relevant were found in the documents."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragmix_core::Segment;

    fn ctx(text: &str) -> RankedResult {
        RankedResult { segment: Segment::new(text), score: 0.1 }
    }

    #[test]
    fn prompt_lists_every_context_then_the_question() {
        let prompt = build_prompt("What is RAG?", &[ctx("first passage"), ctx("second passage")]);
        assert!(prompt.starts_with("You are a helpful assistant. Use ONLY the contexts below"));
        assert!(prompt.contains("Contexts:\n- first passage\n\n- second passage\n\n\n\nQuestion: What is RAG?\n\nAnswer:"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn unavailable_text_counts_passages() {
        assert!(generation_unavailable(3).contains("3 passages"));
        assert!(generation_unavailable(1).contains("1 passage that"));
    }
}
