//! Fake data generation for factory definitions

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Charlie", "Diana", "Eve", "Frank", "Grace", "Henry", "Ivy", "Jack",
    "Kate", "Liam", "Mia", "Noah", "Olivia", "Peter", "Quinn", "Ruby", "Sam", "Tina",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Brown", "Davis", "Evans", "Fisher", "Garcia", "Harris", "Johnson", "King",
    "Lopez", "Miller", "Nelson", "Parker", "Roberts", "Smith", "Taylor", "Williams", "Young",
];

const DOMAINS: &[&str] = &["example.com", "test.org", "demo.net", "sample.io", "fake.dev"];

const WORDS: &[&str] = &[
    "data", "system", "content", "service", "platform", "resource", "record", "model",
    "update", "process", "manage", "handle", "provide", "quick", "simple", "stable",
];

/// Seedable fake data generator handed to factories through the build context
#[derive(Debug, Clone)]
pub struct Faker {
    rng: StdRng,
}

impl Default for Faker {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Faker {
    /// Deterministic when a seed is given, entropy-seeded otherwise
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Random number within an inclusive range. Reversed bounds are swapped.
    pub fn number(&mut self, min: i64, max: i64) -> i64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(low..=high)
    }

    pub fn boolean(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options.choose(&mut self.rng).copied().unwrap_or_default()
    }

    /// Random v4 uuid; seeded fakers produce reproducible values
    pub fn uuid(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid().to_string()
    }

    pub fn first_name(&mut self) -> String {
        self.pick(FIRST_NAMES).to_string()
    }

    pub fn last_name(&mut self) -> String {
        self.pick(LAST_NAMES).to_string()
    }

    pub fn name(&mut self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    pub fn email(&mut self) -> String {
        let name = self.pick(FIRST_NAMES).to_lowercase();
        let number = self.number(1, 999);
        let domain = self.pick(DOMAINS);
        format!("{}{:03}@{}", name, number, domain)
    }

    pub fn username(&mut self) -> String {
        let name = self.pick(FIRST_NAMES).to_lowercase();
        format!("{}_{}", name, self.number(1, 9999))
    }

    pub fn word(&mut self) -> String {
        self.pick(WORDS).to_string()
    }

    /// Capitalized sentence of 4 to 10 words
    pub fn sentence(&mut self) -> String {
        let count = self.number(4, 10) as usize;
        let words: Vec<&str> = (0..count).map(|_| self.pick(WORDS)).collect();
        let mut sentence = words.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }

    pub fn paragraph(&mut self) -> String {
        let count = self.number(3, 7);
        (0..count)
            .map(|_| self.sentence())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Datetime within the last year
    pub fn past_datetime(&mut self) -> DateTime<Utc> {
        let minutes = self.number(1, 365 * 24 * 60);
        Utc::now() - Duration::minutes(minutes)
    }

    /// Datetime within the next year
    pub fn future_datetime(&mut self) -> DateTime<Utc> {
        let minutes = self.number(1, 365 * 24 * 60);
        Utc::now() + Duration::minutes(minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_faker_is_deterministic() {
        let mut first = Faker::new(Some(7));
        let mut second = Faker::new(Some(7));

        assert_eq!(first.name(), second.name());
        assert_eq!(first.email(), second.email());
        assert_eq!(first.uuid(), second.uuid());
    }

    #[test]
    fn test_number_stays_in_range() {
        let mut faker = Faker::default();
        for _ in 0..100 {
            let n = faker.number(1, 5);
            assert!((1..=5).contains(&n));
        }
    }

    #[test]
    fn test_number_accepts_reversed_bounds() {
        let mut faker = Faker::default();
        for _ in 0..100 {
            let n = faker.number(10, -3);
            assert!((-3..=10).contains(&n));
        }
        assert_eq!(faker.number(4, 4), 4);
    }

    #[test]
    fn test_email_shape() {
        let mut faker = Faker::default();
        let email = faker.email();
        assert!(email.contains('@'));
        assert!(DOMAINS.iter().any(|domain| email.ends_with(domain)));
    }

    #[test]
    fn test_sentence_is_capitalized() {
        let mut faker = Faker::new(Some(1));
        let sentence = faker.sentence();
        assert!(sentence.ends_with('.'));
        assert!(sentence.chars().next().unwrap().is_ascii_uppercase());
    }

    #[test]
    fn test_datetimes_relative_to_now() {
        let mut faker = Faker::default();
        assert!(faker.past_datetime() < Utc::now());
        assert!(faker.future_datetime() > Utc::now());
    }
}
