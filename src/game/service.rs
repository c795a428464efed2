//! The guess/score state machine, kept free of HTTP and database concerns
//! so its invariants are testable in isolation. The handler layer feeds it
//! a locked `SessionState` and applies the highscore promotion afterwards.

use crate::cards::Card;
use crate::error::AppError;
use crate::session::SessionState;

/// What a round of guessing produced.
#[derive(Debug, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct { score: i64 },
    Incorrect { answer: String },
}

/// Guesses compare trimmed and case-folded, nothing fuzzier.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Binds the fetched card's name as the answer for the next guess. The
/// caller fetches the card first; a provider failure never reaches here,
/// leaving the session untouched.
pub fn start_round(session: &mut SessionState, card: &Card) {
    session.pending_answer = Some(card.name.clone());
}

/// Applies one guess against the pending answer.
///
/// Match: score goes up by one, feedback clears and the round is consumed,
/// so replaying the same correct guess cannot farm the streak. Mismatch:
/// score resets to zero and feedback names the answer. Without an active
/// round nothing is mutated.
pub fn apply_guess(session: &mut SessionState, raw_guess: &str) -> Result<GuessOutcome, AppError> {
    let answer = session
        .pending_answer
        .clone()
        .ok_or(AppError::NoActiveRound)?;

    if normalize(raw_guess) == normalize(&answer) {
        session.current_score += 1;
        session.feedback = None;
        session.pending_answer = None;
        Ok(GuessOutcome::Correct {
            score: session.current_score,
        })
    } else {
        session.current_score = 0;
        session.feedback = Some(format!("Incorrect! The correct answer was {answer}"));
        Ok(GuessOutcome::Incorrect { answer })
    }
}
