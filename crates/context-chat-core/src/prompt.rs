//! Augmented prompt composition.
//!
//! A best match is injected as `Info`, followed by the user's question and
//! an `Answer:` cue. The similarity score never reaches the prompt.

use crate::retrieval::RetrievalOutcome;

/// Build the prompt handed to the completion service.
///
/// With [`RetrievalOutcome::NoContext`] the query is returned unchanged.
/// Otherwise the result is exactly three lines:
///
/// ```text
/// Info: <text>
/// Question: <query>
/// Answer:
/// ```
pub fn compose(outcome: &RetrievalOutcome, query: &str) -> String {
    match outcome {
        RetrievalOutcome::NoContext => query.to_string(),
        RetrievalOutcome::BestMatch { text, .. } => {
            format!("Info: {}\nQuestion: {}\nAnswer:", text, query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_context_passes_query_through() {
        assert_eq!(compose(&RetrievalOutcome::NoContext, "hello"), "hello");
    }

    #[test]
    fn test_best_match_template() {
        let outcome = RetrievalOutcome::BestMatch {
            text: "catsleep".to_string(),
            score: 0.9,
        };
        assert_eq!(
            compose(&outcome, "what does a cat do?"),
            "Info: catsleep\nQuestion: what does a cat do?\nAnswer:"
        );
    }

    #[test]
    fn test_score_is_not_rendered() {
        let outcome = RetrievalOutcome::BestMatch {
            text: "t".to_string(),
            score: 0.123,
        };
        assert!(!compose(&outcome, "q").contains("0.123"));
    }
}
