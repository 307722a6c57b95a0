//! Prompt, topic and word pools for the games

use super::kind::Difficulty;
use rand::seq::SliceRandom;
use rand::Rng;

pub const ANALOGY_PROMPTS: [&str; 20] = [
    "Business is like ___",
    "Learning is like ___",
    "Friendship is like ___",
    "Success is like ___",
    "Time is like ___",
    "Leadership is like ___",
    "Innovation is like ___",
    "Communication is like ___",
    "Trust is like ___",
    "Growth is like ___",
    "Creativity is like ___",
    "Teamwork is like ___",
    "Change is like ___",
    "Knowledge is like ___",
    "Opportunity is like ___",
    "Challenge is like ___",
    "Progress is like ___",
    "Vision is like ___",
    "Passion is like ___",
    "Excellence is like ___",
];

pub const TOPICS: [&str; 15] = [
    "Innovation in Technology",
    "The Future of Work",
    "Climate Change Solutions",
    "Personal Growth and Development",
    "The Power of Communication",
    "Building Strong Teams",
    "Overcoming Challenges",
    "The Importance of Education",
    "Health and Wellness",
    "Creative Problem Solving",
    "Leadership in Modern Times",
    "The Digital Revolution",
    "Sustainable Living",
    "The Art of Storytelling",
    "Building Confidence",
];

const EASY_WORDS: [&str; 20] = [
    "butterfly", "mountain", "coffee", "rainbow", "guitar", "ocean", "library", "garden",
    "telescope", "bicycle", "sandwich", "umbrella", "keyboard", "elephant", "chocolate",
    "adventure", "friendship", "sunshine", "mystery", "journey",
];

const MEDIUM_WORDS: [&str; 16] = [
    "serendipity", "kaleidoscope", "metamorphosis", "constellation", "archaeology",
    "philosophy", "democracy", "symphony", "architecture", "photography", "psychology",
    "geography", "astronomy", "biology", "chemistry", "mathematics",
];

const HARD_WORDS: [&str; 20] = [
    "juxtaposition", "ephemeral", "ubiquitous", "paradigm", "catalyst", "synthesis",
    "equilibrium", "phenomenon", "infrastructure", "sustainability", "optimization",
    "collaboration", "transformation", "implementation", "visualization", "crystallization",
    "diversification", "standardization", "personalization", "globalization",
];

/// Lowest and highest energy target of the conductor game
pub const ENERGY_RANGE: (u8, u8) = (1, 9);

/// Words of the given difficulty
pub fn word_pool(difficulty: Difficulty) -> &'static [&'static str] {
    match difficulty {
        Difficulty::Easy => &EASY_WORDS,
        Difficulty::Medium => &MEDIUM_WORDS,
        Difficulty::Hard => &HARD_WORDS,
    }
}

/// `count` distinct analogy prompts in random order
pub fn shuffled_prompts<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    let mut prompts = ANALOGY_PROMPTS.to_vec();
    prompts.shuffle(rng);
    prompts.truncate(count);
    prompts.into_iter().map(str::to_string).collect()
}

pub fn random_word<R: Rng + ?Sized>(rng: &mut R, difficulty: Difficulty) -> String {
    word_pool(difficulty)
        .choose(rng)
        .copied()
        .unwrap_or("journey")
        .to_string()
}

pub fn random_energy<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(ENERGY_RANGE.0..=ENERGY_RANGE.1)
}

/// Label shown next to an energy level
pub fn energy_label(level: u8) -> &'static str {
    match level {
        0..=2 => "Very Low",
        3 => "Low",
        4 => "Calm",
        5 => "Normal",
        6 => "Energetic",
        7 => "High",
        8 => "Very High",
        _ => "Maximum",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_shuffled_prompts_are_distinct() {
        let mut rng = rand::thread_rng();
        let prompts = shuffled_prompts(&mut rng, 10);
        assert_eq!(prompts.len(), 10);

        let unique: HashSet<_> = prompts.iter().collect();
        assert_eq!(unique.len(), 10);
        assert!(prompts.iter().all(|p| ANALOGY_PROMPTS.contains(&p.as_str())));
    }

    #[test]
    fn test_word_pools_follow_difficulty() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let word = random_word(&mut rng, Difficulty::Hard);
            assert!(HARD_WORDS.contains(&word.as_str()));
        }
        assert_eq!(word_pool(Difficulty::Medium).len(), 16);
    }

    #[test]
    fn test_energy_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let level = random_energy(&mut rng);
            assert!((1..=9).contains(&level));
        }
        assert_eq!(energy_label(5), "Normal");
        assert_eq!(energy_label(9), "Maximum");
    }
}
