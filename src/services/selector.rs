use rand::seq::SliceRandom;
use rand::Rng;

pub const MIN_DISTRACTORS: usize = 2;
pub const MIN_SENTENCE_OPTIONS: usize = 2;

pub fn distractor_count(options_count: i32) -> usize {
    let requested = options_count.saturating_sub(1).max(0) as usize;
    requested.max(MIN_DISTRACTORS)
}

pub fn sentence_option_count(options_count: i32) -> usize {
    (options_count.max(0) as usize).max(MIN_SENTENCE_OPTIONS)
}

/// Builds the presented option set: the correct answer plus up to
/// `max(2, options_count - 1)` candidates that differ from it ignoring case,
/// shuffled on every call.
pub fn select_options(correct: &str, candidates: &[String], options_count: i32) -> Vec<String> {
    select_options_with(correct, candidates, options_count, &mut rand::rng())
}

pub fn select_options_with<R>(
    correct: &str,
    candidates: &[String],
    options_count: i32,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let pool_size = distractor_count(options_count).saturating_add(1);
    let correct_lower = correct.to_lowercase();

    let mut pool = Vec::with_capacity(pool_size.min(candidates.len() + 1));
    pool.push(correct.to_string());
    for candidate in candidates {
        if pool.len() >= pool_size {
            break;
        }
        if candidate.to_lowercase() == correct_lower {
            continue;
        }
        pool.push(candidate.clone());
    }

    pool.shuffle(rng);
    pool
}

/// Keeps the first `limit` sentences in their original order.
pub fn select_sentences(sentences: &[String], limit: usize) -> Vec<String> {
    sentences.iter().take(limit).cloned().collect()
}
