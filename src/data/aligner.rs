// ============================================================
// Layer 4 — Answer-Span Aligner
// ============================================================
// Training targets for extractive QA are token indices, but the
// corpus only gives us the answer as raw text. The aligner maps
// the answer's character range inside the context onto the
// tokens of the encoded [CLS] question [SEP] context [SEP]
// sequence.
//
// Example (word-level tokens, byte offsets into the context):
//
//   context: "Tome paracetamol a cada 8 horas"
//   answer:  "paracetamol"            → bytes 5..16
//   tokens:  [CLS] q.. [SEP] Tome(0,4) paracetamol(5,16) a(17,18) ...
//   result:  start = end = index of "paracetamol"
//
// Rules, scanning context tokens left to right:
//   - the token containing the answer's first byte is the start
//   - the token containing the answer's last byte is the end
//   - until a start is found, the first token beginning after
//     the answer start becomes the start (sub-word boundaries)
//   - no end found → last context token ending at or before
//     the answer end
// Anything unresolved, or a start that lands after the end,
// yields NotFound, which trains on the degenerate (0, 0) span.
//
// Reference: Devlin et al. (2019) BERT, SQuAD preprocessing

/// Byte span of one token and whether it belongs to the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    pub start:      usize,
    pub end:        usize,
    pub is_context: bool,
}

impl TokenSpan {
    pub fn context(start: usize, end: usize) -> Self {
        Self { start, end, is_context: true }
    }

    /// Question tokens and special tokens.
    pub fn other(start: usize, end: usize) -> Self {
        Self { start, end, is_context: false }
    }
}

/// Where the answer landed in the token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Found { start: usize, end: usize },
    NotFound,
}

impl Alignment {
    /// Token indices used as the training target; NotFound is (0, 0).
    pub fn positions(self) -> (usize, usize) {
        match self {
            Alignment::Found { start, end } => (start, end),
            Alignment::NotFound             => (0, 0),
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, Alignment::Found { .. })
    }
}

/// Align `answer` (first occurrence in `context`) onto `tokens`.
pub fn align_answer(context: &str, answer: &str, tokens: &[TokenSpan]) -> Alignment {
    if answer.is_empty() {
        return Alignment::NotFound;
    }
    let Some(answer_start) = context.find(answer) else {
        return Alignment::NotFound;
    };
    let answer_end = answer_start + answer.len();

    let mut start: Option<usize> = None;
    let mut end:   Option<usize> = None;

    for (idx, tok) in tokens.iter().enumerate().filter(|(_, t)| t.is_context) {
        if tok.start <= answer_start && answer_start < tok.end {
            start = Some(idx);
        }
        if tok.start < answer_end && answer_end <= tok.end {
            end = Some(idx);
        }
        if start.is_none() && tok.start > answer_start {
            start = Some(idx);
        }
    }

    if end.is_none() {
        end = tokens
            .iter()
            .enumerate()
            .rev()
            .find(|(_, t)| t.is_context && t.end <= answer_end)
            .map(|(idx, _)| idx);
    }

    match (start, end) {
        (Some(start), Some(end)) if start <= end => Alignment::Found { start, end },
        (Some(start), Some(end)) => {
            tracing::debug!("Inverted answer span {}..{} rejected", start, end);
            Alignment::NotFound
        }
        _ => Alignment::NotFound,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = "Tome paracetamol a cada 8 horas";

    /// [CLS] + two question tokens + [SEP] + whitespace-split context + [SEP]
    fn word_tokens(context: &str) -> Vec<TokenSpan> {
        let mut tokens = vec![
            TokenSpan::other(0, 0),
            TokenSpan::other(0, 4),
            TokenSpan::other(5, 9),
            TokenSpan::other(0, 0),
        ];
        let mut offset = 0;
        for word in context.split(' ') {
            tokens.push(TokenSpan::context(offset, offset + word.len()));
            offset += word.len() + 1;
        }
        tokens.push(TokenSpan::other(0, 0));
        tokens
    }

    fn decode(context: &str, tokens: &[TokenSpan], a: Alignment) -> String {
        let (s, e) = a.positions();
        context[tokens[s].start..tokens[e].end].to_string()
    }

    #[test]
    fn test_word_level_alignment() {
        let tokens = word_tokens(CONTEXT);
        let a      = align_answer(CONTEXT, "paracetamol", &tokens);
        assert_eq!(a, Alignment::Found { start: 5, end: 5 });
        assert!(decode(CONTEXT, &tokens, a).contains("paracetamol"));
    }

    #[test]
    fn test_subword_alignment_covers_answer() {
        // "para" "##ceta" "##mol" style split of the answer word
        let tokens = vec![
            TokenSpan::other(0, 0),
            TokenSpan::other(0, 0),
            TokenSpan::context(0, 4),
            TokenSpan::context(5, 9),
            TokenSpan::context(9, 13),
            TokenSpan::context(13, 16),
            TokenSpan::context(17, 18),
            TokenSpan::context(19, 23),
            TokenSpan::context(24, 25),
            TokenSpan::context(26, 31),
            TokenSpan::other(0, 0),
        ];
        let a = align_answer(CONTEXT, "paracetamol", &tokens);
        assert_eq!(a, Alignment::Found { start: 3, end: 5 });
        assert!(decode(CONTEXT, &tokens, a).contains("paracetamol"));
    }

    #[test]
    fn test_multi_word_answer() {
        let tokens = word_tokens(CONTEXT);
        let a      = align_answer(CONTEXT, "a cada 8", &tokens);
        assert_eq!(decode(CONTEXT, &tokens, a), "a cada 8");
    }

    #[test]
    fn test_answer_starting_mid_token_keeps_that_token() {
        let tokens = word_tokens(CONTEXT);
        let a      = align_answer(CONTEXT, "cetamol a", &tokens);
        assert_eq!(decode(CONTEXT, &tokens, a), "paracetamol a");
    }

    #[test]
    fn test_start_in_gap_moves_to_next_token() {
        // Tokenizer dropped the space, so the answer's first byte
        // (the space before "paracetamol") sits in no token
        let tokens = word_tokens(CONTEXT);
        let a      = align_answer(CONTEXT, " paracetamol", &tokens);
        assert_eq!(a, Alignment::Found { start: 5, end: 5 });
    }

    #[test]
    fn test_question_tokens_are_never_chosen() {
        // Question offsets overlap the answer bytes but must be ignored
        let tokens = word_tokens(CONTEXT);
        let (s, e) = align_answer(CONTEXT, "Tome", &tokens).positions();
        assert!(tokens[s].is_context && tokens[e].is_context);
        assert_eq!((s, e), (4, 4));
    }

    #[test]
    fn test_absent_answer_is_not_found() {
        let tokens = word_tokens(CONTEXT);
        let a      = align_answer(CONTEXT, "ibuprofeno", &tokens);
        assert_eq!(a, Alignment::NotFound);
        assert_eq!(a.positions(), (0, 0));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let tokens = word_tokens(CONTEXT);
        assert_eq!(align_answer(CONTEXT, "Paracetamol", &tokens), Alignment::NotFound);
    }

    #[test]
    fn test_empty_answer_is_not_found() {
        let tokens = word_tokens(CONTEXT);
        assert_eq!(align_answer(CONTEXT, "", &tokens), Alignment::NotFound);
    }

    #[test]
    fn test_answer_past_truncated_context_is_not_found() {
        // Only the first two context words survived truncation
        let tokens = vec![
            TokenSpan::other(0, 0),
            TokenSpan::context(0, 4),
            TokenSpan::context(5, 16),
            TokenSpan::other(0, 0),
        ];
        assert_eq!(align_answer(CONTEXT, "horas", &tokens), Alignment::NotFound);
    }

    #[test]
    fn test_end_falls_back_to_last_token_before_answer_end() {
        // Trailing space of the answer is covered by no token
        let tokens = word_tokens(CONTEXT);
        let a      = align_answer(CONTEXT, "paracetamol ", &tokens);
        assert_eq!(a, Alignment::Found { start: 5, end: 5 });
    }

    #[test]
    fn test_inverted_span_is_rejected() {
        let context = "ab cd";
        let tokens  = vec![
            TokenSpan::context(0, 1),
            TokenSpan::context(3, 5),
        ];
        // answer "b" at byte 1: no token contains it, start → token 1,
        // end fallback → token 0 (ends at 1 <= 2)
        assert_eq!(align_answer(context, "b", &tokens), Alignment::NotFound);
    }
}
