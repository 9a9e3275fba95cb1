//! Quiz generation from article extracts.
//!
//! A purely heuristic transform: pick prose-like sentences, blank out a
//! notable-looking word and fill the remaining options with other long words
//! from the same article.

use crate::config::MAX_QUESTIONS;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

/// Marker replacing the answer in the question text
pub const BLANK: &str = "_______";

/// Number of options every question carries
pub const OPTION_COUNT: usize = 4;

/// Paragraphs at or below this many characters are skipped
const MIN_PARAGRAPH_CHARS: usize = 100;

/// Sentences must be strictly longer than this
const MIN_SENTENCE_CHARS: usize = 50;

/// Sentences must be strictly shorter than this
const MAX_SENTENCE_CHARS: usize = 200;

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Sentence with the answer replaced by [`BLANK`]
    pub question: String,
    /// Exactly [`OPTION_COUNT`] case-insensitively distinct options
    pub options: Vec<String>,
    /// The masked word
    pub answer: String,
}

impl QuizQuestion {
    /// Position of the answer among the options
    pub fn answer_index(&self) -> Option<usize> {
        self.options.iter().position(|option| *option == self.answer)
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        choice.to_lowercase() == self.answer.to_lowercase()
    }
}

/// Generate up to five questions using the thread-local RNG
pub fn generate(title: &str, extract: &str) -> Vec<QuizQuestion> {
    generate_with_rng(title, extract, MAX_QUESTIONS, &mut thread_rng())
}

/// Generate up to `limit` questions (never more than five) from an extract
pub fn generate_with_rng<R: Rng + ?Sized>(
    title: &str,
    extract: &str,
    limit: usize,
    rng: &mut R,
) -> Vec<QuizQuestion> {
    let limit = limit.min(MAX_QUESTIONS);
    let title_word = title
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let mut sentences = candidate_sentences(extract);
    sentences.shuffle(rng);

    let words: Vec<&str> = extract
        .split_whitespace()
        .filter(|word| char_len(word) > 5)
        .collect();

    log::debug!(
        "'{}': {} candidate sentences, {} distractor words",
        title,
        sentences.len(),
        words.len()
    );

    let mut questions = Vec::with_capacity(limit);
    for sentence in sentences {
        if questions.len() >= limit {
            break;
        }
        let Some(answer) = pick_answer(sentence, &title_word, rng) else {
            continue;
        };
        questions.push(QuizQuestion {
            // Literal first-occurrence replace: a longer word containing the
            // answer earlier in the sentence gets masked instead.
            question: sentence.replacen(answer, BLANK, 1),
            options: build_options(answer, &words, rng),
            answer: answer.to_string(),
        });
    }

    questions
}

/// Sentences from prose-length paragraphs that fit the length window
fn candidate_sentences(extract: &str) -> Vec<&str> {
    extract
        .split('\n')
        .filter(|paragraph| char_len(paragraph) > MIN_PARAGRAPH_CHARS)
        .flat_map(|paragraph| paragraph.split(['.', '!', '?']))
        .map(str::trim)
        .filter(|sentence| {
            let len = char_len(sentence);
            len > MIN_SENTENCE_CHARS && len < MAX_SENTENCE_CHARS
        })
        .collect()
}

/// Choose the word to blank out, preferring capitalised words unrelated to the title
fn pick_answer<'a, R: Rng + ?Sized>(
    sentence: &'a str,
    title_word: &str,
    rng: &mut R,
) -> Option<&'a str> {
    let tokens: Vec<&str> = sentence.split(' ').collect();

    let preferred: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| {
            char_len(token) > 5
                && (title_word.is_empty() || !token.to_lowercase().contains(title_word))
                && token.chars().next().is_some_and(char::is_uppercase)
        })
        .collect();

    let candidates: Vec<&str> = if preferred.is_empty() {
        tokens
            .into_iter()
            .filter(|token| char_len(token) > 6)
            .collect()
    } else {
        preferred
    };

    // Tokens made only of trailing punctuation leave no word to blank out
    let answers: Vec<&'a str> = candidates
        .into_iter()
        .map(strip_trailing_punctuation)
        .filter(|answer| !answer.is_empty())
        .collect();
    answers.choose(rng).copied()
}

/// The answer plus distractors sampled without replacement, padded and shuffled
fn build_options<R: Rng + ?Sized>(answer: &str, words: &[&str], rng: &mut R) -> Vec<String> {
    let answer_lower = answer.to_lowercase();
    let mut pool: Vec<&str> = words
        .iter()
        .copied()
        .filter(|word| word.to_lowercase() != answer_lower)
        .collect();
    pool.shuffle(rng);

    let mut options = vec![answer.to_string()];
    for word in pool {
        if options.len() >= OPTION_COUNT {
            break;
        }
        let candidate = strip_trailing_punctuation(word);
        let lower = candidate.to_lowercase();
        if candidate.is_empty() || options.iter().any(|o| o.to_lowercase() == lower) {
            continue;
        }
        options.push(candidate.to_string());
    }

    while options.len() < OPTION_COUNT {
        options.push(format!("Option {}", options.len()));
    }

    options.shuffle(rng);
    options
}

fn strip_trailing_punctuation(word: &str) -> &str {
    word.trim_end_matches([',', '.', ';'])
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const EIFFEL: &str = "The Eiffel Tower is a wrought-iron lattice tower on the Champ de Mars in Paris, France. It is named after the engineer Gustave Eiffel, whose company designed and built the tower. Locally nicknamed La dame de fer, it was constructed from 1887 to 1889.";

    const FILLER: &str = "we saw it and we ran to see it all day and all of the night too.";

    fn assert_well_formed(question: &QuizQuestion) {
        assert_eq!(question.options.len(), OPTION_COUNT);
        let unique: HashSet<String> = question.options.iter().map(|o| o.to_lowercase()).collect();
        assert_eq!(unique.len(), OPTION_COUNT, "options not unique: {:?}", question.options);
        assert_eq!(
            question.options.iter().filter(|o| **o == question.answer).count(),
            1
        );
        assert!(question.question.contains(BLANK));
    }

    #[test]
    fn short_paragraphs_produce_nothing() {
        let extract = "History\nThe tower is tall. It is in Paris.\nSee also";
        assert!(generate("Eiffel Tower", extract).is_empty());
        assert!(generate("Anything", "").is_empty());
    }

    #[test]
    fn eiffel_answers_skip_title_word() {
        let allowed = ["Paris", "France", "Gustave", "Locally"];
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let questions = generate_with_rng("Eiffel Tower", EIFFEL, 5, &mut rng);
            assert_eq!(questions.len(), 3);
            for question in &questions {
                assert!(
                    allowed.contains(&question.answer.as_str()),
                    "unexpected answer {}",
                    question.answer
                );
                assert!(!question.answer.to_lowercase().contains("eiffel"));
                assert_well_formed(question);
            }
        }
    }

    #[test]
    fn never_more_than_five_questions() {
        let paragraph: Vec<String> = (0..12)
            .map(|i| format!("The committee in Westminster{i} approved the proposal after a very long debate"))
            .collect();
        let extract = paragraph.join(". ");

        let questions = generate("Parliament", &extract);
        assert_eq!(questions.len(), 5);

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(generate_with_rng("Parliament", &extract, 2, &mut rng).len(), 2);
        assert_eq!(generate_with_rng("Parliament", &extract, 50, &mut rng).len(), 5);
    }

    #[test]
    fn options_are_padded_when_distractors_run_out() {
        let extract = format!(
            "a cat and a dog sat by the old red barn near Hampshire on a hot day. {}",
            FILLER
        );
        let mut rng = StdRng::seed_from_u64(1);
        let questions = generate_with_rng("Test", &extract, 5, &mut rng);

        assert_eq!(questions.len(), 1);
        let question = &questions[0];
        assert_eq!(question.answer, "Hampshire");
        assert_eq!(
            question.question,
            "a cat and a dog sat by the old red barn near _______ on a hot day"
        );
        let mut options = question.options.clone();
        options.sort();
        assert_eq!(options, vec!["Hampshire", "Option 1", "Option 2", "Option 3"]);
        assert_well_formed(question);
    }

    #[test]
    fn window_bounds_are_exclusive() {
        assert!(candidate_sentences(&"y".repeat(100)).is_empty());
        let paragraph = "y".repeat(101);
        assert_eq!(candidate_sentences(&paragraph), vec![paragraph.as_str()]);

        let (s50, s51, s199, s200) = (
            "a".repeat(50),
            "b".repeat(51),
            "c".repeat(199),
            "d".repeat(200),
        );
        let extract = format!("{s50}. {s51}. {s199}. {s200}.");
        assert_eq!(
            candidate_sentences(&extract),
            vec![s51.as_str(), s199.as_str()]
        );
    }

    #[test]
    fn punctuation_only_tokens_are_never_chosen() {
        let extract = format!(
            "we all ,,,,,,,, gathered in the hall by the old oak tree at noon today. {}",
            FILLER
        );
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let questions = generate_with_rng("Test", &extract, 5, &mut rng);
            assert_eq!(questions.len(), 1);
            assert_eq!(questions[0].answer, "gathered");
            assert_well_formed(&questions[0]);
        }
    }

    #[test]
    fn falls_back_to_long_lowercase_words() {
        let extract = format!(
            "our neighbours gathered outside whenever summer evenings arrived early. {}",
            FILLER
        );
        let mut rng = StdRng::seed_from_u64(3);
        let questions = generate_with_rng("Test", &extract, 5, &mut rng);

        assert_eq!(questions.len(), 1);
        let fallback = ["neighbours", "gathered", "outside", "whenever", "evenings", "arrived"];
        assert!(fallback.contains(&questions[0].answer.as_str()));
        assert_well_formed(&questions[0]);
    }

    #[test]
    fn masks_first_literal_occurrence() {
        let extract = format!(
            "every preMadrid event was held far away from Madrid in the old days. {}",
            FILLER
        );
        let mut rng = StdRng::seed_from_u64(5);
        let questions = generate_with_rng("Spain", &extract, 5, &mut rng);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].answer, "Madrid");
        assert_eq!(
            questions[0].question,
            "every pre_______ event was held far away from Madrid in the old days"
        );
    }

    #[test]
    fn trailing_punctuation_is_stripped_from_answers() {
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            for question in generate_with_rng("Eiffel Tower", EIFFEL, 5, &mut rng) {
                assert!(!question.answer.ends_with([',', '.', ';']));
                for option in &question.options {
                    assert!(!option.ends_with([',', '.', ';']), "option {option}");
                }
            }
        }
    }

    #[test]
    fn answer_index_and_correctness() {
        let question = QuizQuestion {
            question: format!("The capital of France is {BLANK}"),
            options: vec!["Lyon".into(), "Paris".into(), "Nice".into(), "Lille".into()],
            answer: "Paris".into(),
        };
        assert_eq!(question.answer_index(), Some(1));
        assert!(question.is_correct("paris"));
        assert!(!question.is_correct("Lyon"));
    }
}
