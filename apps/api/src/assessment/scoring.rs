use thiserror::Error;

/// Points awarded for a fully passing question.
pub const MAX_QUESTION_SCORE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("question has no test cases; cannot score")]
    NoTestCases,
    #[error("passed count {passed} exceeds total {total}")]
    PassedExceedsTotal { passed: usize, total: usize },
}

/// Score for one question: 10 when everything passes, otherwise
/// `floor(10 * passed / total)`.
pub fn compute_score(passed: usize, total: usize) -> Result<u32, ScoringError> {
    if total == 0 {
        return Err(ScoringError::NoTestCases);
    }
    if passed > total {
        return Err(ScoringError::PassedExceedsTotal { passed, total });
    }
    if passed == total {
        return Ok(MAX_QUESTION_SCORE);
    }
    // Integer division floors; passed < total keeps this strictly below 10.
    Ok((MAX_QUESTION_SCORE as usize * passed / total) as u32)
}

/// A verdict passes when its trimmed text starts with the token `PASS`,
/// compared case-insensitively on that token only.
pub fn is_pass_verdict(response: &str) -> bool {
    response
        .trim()
        .get(..4)
        .map(|token| token.eq_ignore_ascii_case("PASS"))
        .unwrap_or(false)
}

/// Run output matches when both sides are equal after trimming leading and
/// trailing whitespace. No numeric or formatting tolerance.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}
