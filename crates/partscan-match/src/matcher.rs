// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Classification of one identifier against one document text.
//
// Rules are applied in order and the first that fires wins:
//
// 1. No text for the document                     -> Unavailable
// 2. Case-insensitive literal occurrence          -> Exact
// 3. Whitespace token with similarity >= cutoff   -> PartialMatch
// 4. Otherwise                                    -> NotFound

use std::collections::BTreeSet;

use partscan_core::{ValidationConfig, ValidationOutcome};
use regex::{Regex, RegexBuilder};
use tracing::{trace, warn};

use crate::sequence::SequenceMatcher;

/// Exact/fuzzy part-number classifier. Pure and reentrant.
#[derive(Debug, Clone, Copy)]
pub struct PartNumberMatcher {
    cutoff: f64,
}

impl Default for PartNumberMatcher {
    fn default() -> Self {
        Self::new(partscan_core::config::DEFAULT_FUZZY_CUTOFF)
    }
}

impl PartNumberMatcher {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.fuzzy_cutoff)
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Classify `identifier` against the text extracted for its document.
    pub fn classify(&self, identifier: &str, text: Option<&str>) -> ValidationOutcome {
        // Empty text is a document that yielded nothing, not a missing one.
        let Some(text) = text else {
            return ValidationOutcome::unavailable();
        };

        if let Some((equivalent, similars)) = exact_match(identifier, text) {
            return ValidationOutcome::exact(equivalent, similars);
        }

        match self.best_fuzzy_token(identifier, text) {
            Some((token, score)) => {
                trace!(identifier, token, score, "fuzzy match");
                ValidationOutcome::partial(token)
            }
            None => ValidationOutcome::not_found(),
        }
    }

    /// Highest-scoring whitespace token at or above the cutoff, with its score.
    ///
    /// Tokens are compared case-sensitively. On equal scores the token that
    /// appears first in the text is kept.
    pub fn best_fuzzy_token<'t>(&self, identifier: &str, text: &'t str) -> Option<(&'t str, f64)> {
        let matcher = SequenceMatcher::new(identifier);
        let mut best: Option<(&'t str, f64)> = None;

        for token in text.split(char::is_whitespace).filter(|t| !t.is_empty()) {
            // Cheap upper bounds first; most tokens stop here.
            if matcher.real_quick_ratio(token.chars().count()) < self.cutoff
                || matcher.quick_ratio(token) < self.cutoff
            {
                continue;
            }
            let score = matcher.ratio(token);
            if score < self.cutoff {
                continue;
            }
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((token, score));
            }
        }

        best
    }
}

/// First case-insensitive literal occurrence of `identifier` in `text`, in
/// the text's own casing, plus every whole-word-ish span containing it.
///
/// `None` when the identifier does not occur, or when the pattern cannot be
/// compiled (the fuzzy rule then decides).
pub fn exact_match(identifier: &str, text: &str) -> Option<(String, BTreeSet<String>)> {
    let escaped = regex::escape(identifier);

    let literal = build_pattern(&escaped, identifier)?;
    let found = literal.find(text)?;

    let similars = build_pattern(&format!(r"\b\w*{escaped}\w*\b"), identifier)
        .map(|containing| {
            containing
                .find_iter(text)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some((found.as_str().to_string(), similars))
}

fn build_pattern(pattern: &str, identifier: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(identifier, error = %err, "identifier pattern rejected, skipping literal search");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscan_core::StatusKind;

    fn matcher() -> PartNumberMatcher {
        PartNumberMatcher::default()
    }

    #[test]
    fn exact_hit_collects_similars() {
        let outcome = matcher().classify("ABC-123", Some("Part ABC-123 and ABC-123X"));
        assert_eq!(outcome.status(), StatusKind::Exact);
        assert_eq!(outcome.equivalent(), Some("ABC-123"));
        assert_eq!(outcome.similars_joined("|").as_deref(), Some("ABC-123|ABC-123X"));
    }

    #[test]
    fn exact_hit_keeps_document_casing() {
        let outcome = matcher().classify("abc-123", Some("ordering code: ABC-123"));
        assert_eq!(outcome.status(), StatusKind::Exact);
        assert_eq!(outcome.equivalent(), Some("ABC-123"));
        let similars = outcome.similars().unwrap();
        assert!(similars.contains("ABC-123"));
    }

    #[test]
    fn similars_are_deduplicated() {
        let outcome = matcher().classify("LM317", Some("LM317T LM317 LM317T xLM317"));
        let joined = outcome.similars_joined("|").unwrap();
        assert_eq!(joined, "LM317|LM317T|xLM317");
    }

    #[test]
    fn fuzzy_hit_reports_token() {
        let outcome = matcher().classify("ABC-123", Some("Part ABC123X only"));
        assert_eq!(outcome.status(), StatusKind::PartialMatch);
        assert_eq!(outcome.equivalent(), Some("ABC123X"));
        assert!(outcome.similars().is_none());
    }

    #[test]
    fn no_close_token_is_not_found() {
        let outcome = matcher().classify("ABC-123", Some("Unrelated content"));
        assert_eq!(outcome.status(), StatusKind::NotFound);
        assert_eq!(outcome.equivalent(), None);
        assert!(outcome.similars().is_none());
    }

    #[test]
    fn missing_text_is_unavailable() {
        let outcome = matcher().classify("ABC-123", None);
        assert_eq!(outcome.status(), StatusKind::Unavailable);
        assert_eq!(outcome.equivalent(), None);
    }

    #[test]
    fn empty_text_is_not_found() {
        assert_eq!(matcher().classify("ABC-123", Some("")).status(), StatusKind::NotFound);
        assert_eq!(matcher().classify("ABC-123", Some(" \n ")).status(), StatusKind::NotFound);
    }

    #[test]
    fn metacharacters_match_literally() {
        let m = matcher();
        let hit = m.classify("A.B(1)", Some("see A.B(1) here"));
        assert_eq!(hit.status(), StatusKind::Exact);
        assert_eq!(hit.equivalent(), Some("A.B(1)"));
        // `)` is not a word character, so no word boundary follows it.
        assert!(hit.similars().is_none());

        let miss = m.classify("A.B(1)", Some("see AxB(1) here"));
        assert_ne!(miss.status(), StatusKind::Exact);
    }

    #[test]
    fn equal_scores_keep_first_token() {
        // Both tokens differ from the identifier by one character.
        let outcome = matcher().classify("ABC123", Some("ABC124 ABC125"));
        assert_eq!(outcome.status(), StatusKind::PartialMatch);
        assert_eq!(outcome.equivalent(), Some("ABC124"));
    }

    #[test]
    fn higher_score_wins_regardless_of_position() {
        let outcome = matcher().classify("ABC-1234", Some("AB-12 ABC-1235"));
        assert_eq!(outcome.equivalent(), Some("ABC-1235"));
    }

    #[test]
    fn fuzzy_is_case_sensitive() {
        // Lower-cased token shares too few characters with the identifier.
        let outcome = matcher().classify("ABC-123", Some("abc123x"));
        assert_eq!(outcome.status(), StatusKind::NotFound);
    }

    #[test]
    fn cutoff_is_inclusive() {
        // "ABCD" vs "ABCE": 2·3 / 8 = 0.75.
        let outcome = PartNumberMatcher::new(0.75).classify("ABCD", Some("ABCE"));
        assert_eq!(outcome.status(), StatusKind::PartialMatch);
        let outcome = PartNumberMatcher::new(0.76).classify("ABCD", Some("ABCE"));
        assert_eq!(outcome.status(), StatusKind::NotFound);
    }

    #[test]
    fn tokens_split_on_any_whitespace() {
        let (token, _) = matcher().best_fuzzy_token("ABC-123", "x\tABC123X\r\ny").unwrap();
        assert_eq!(token, "ABC123X");
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "REV A ABC-12 ABC-1234 abc-123x ABC-123Y";
        let first = matcher().classify("ABC-123", Some(text));
        for _ in 0..10 {
            assert_eq!(matcher().classify("ABC-123", Some(text)), first);
        }
    }
}
