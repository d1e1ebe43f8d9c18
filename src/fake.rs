//! Plausible field values from an explicitly seeded generator
//!
//! Every random value of a run flows from one [`FakeData`] instance. Two
//! instances built with the same seed and anchor produce the same sequence,
//! which makes seeded fixtures reproducible.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Daniel", "Nancy", "Matthew", "Lisa", "Anthony", "Betty", "Mark",
    "Margaret", "Steven", "Sandra",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

const CITIES: &[&str] = &[
    "Lake Jamesberg", "North Sarah", "Port Michael", "East Linda", "West Robert",
    "New Patricia", "South Daniel", "Marystad", "Johnview", "Karenfort", "Davisburgh",
    "Lewisville",
];

const LOREM: &[&str] = &[
    "alias", "consequatur", "aut", "perferendis", "sit", "voluptatem", "accusantium",
    "doloremque", "aperiam", "eaque", "ipsa", "quae", "ab", "illo", "inventore", "veritatis",
    "et", "quasi", "architecto", "beatae", "vitae", "dicta", "sunt", "explicabo", "aspernatur",
    "odit", "fugit", "sed", "quia", "consequuntur", "magni", "dolores", "eos", "qui", "ratione",
    "sequi", "nesciunt", "neque", "dolorem", "ipsum", "quisquam", "est", "dolor", "amet",
    "consectetur", "adipisci", "velit", "numquam", "eius", "modi", "tempora", "incidunt", "ut",
    "labore", "dolore", "magnam", "aliquam", "quaerat",
];

const CATCH_PHRASE_LEAD: &[&str] = &[
    "Adaptive", "Advanced", "Automated", "Balanced", "Centralized", "Cloned", "Configurable",
    "Cross-platform", "Decentralized", "Distributed", "Enhanced", "Ergonomic", "Expanded",
    "Focused", "Integrated", "Managed", "Optimized", "Proactive", "Reactive", "Streamlined",
];

const CATCH_PHRASE_MIDDLE: &[&str] = &[
    "24/7", "asynchronous", "bi-directional", "client-driven", "contextually-based",
    "dedicated", "dynamic", "explicit", "fault-tolerant", "full-range", "global", "hybrid",
    "interactive", "local", "modular", "multi-tasking", "real-time", "scalable", "static",
    "zero-defect",
];

const CATCH_PHRASE_TAIL: &[&str] = &[
    "ability", "access", "algorithm", "architecture", "capability", "circuit", "core",
    "database", "encoding", "framework", "hierarchy", "infrastructure", "interface", "matrix",
    "middleware", "model", "paradigm", "pipeline", "protocol", "toolset",
];

const TLDS: &[&str] = &["com", "org", "net", "io", "info"];

const FILE_EXTENSIONS: &[&str] = &["pdf", "txt", "docx", "csv", "png", "json"];

const CHROME_PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "Linux; Android 13; Pixel 7",
];

const FIREFOX_PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64; rv:121.0",
    "Macintosh; Intel Mac OS X 10.15; rv:121.0",
    "X11; Ubuntu; Linux x86_64; rv:121.0",
];

/// Seeded source of synthetic values
pub struct FakeData {
    rng: StdRng,
    seed: u64,
    anchor: DateTime<Utc>,
}

impl FakeData {
    /// Deterministic generator anchored at the current time
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            anchor: Utc::now(),
        }
    }

    /// Generator seeded from OS entropy; [`FakeData::seed`] reports the value used
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// Fix the reference "now" used for every generated timestamp
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // ------------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------------

    /// Uniform choice from a fixed word list
    pub fn one_of(&mut self, items: &[&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn int_between(&mut self, low: i64, high: i64) -> i64 {
        self.rng.gen_range(low..=high)
    }

    /// Two-decimal NUMERIC between `low` and `high` hundredths, inclusive
    pub fn decimal_hundredths(&mut self, low: i64, high: i64) -> Decimal {
        Decimal::new(self.int_between(low, high), 2)
    }

    pub fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }

    /// Hex SHA-256 digest of fresh random bytes
    pub fn sha256_hex(&mut self) -> String {
        let bytes: [u8; 32] = self.rng.gen();
        hex::encode(Sha256::digest(bytes))
    }

    // ------------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------------

    /// Uniform instant within the `days` before the anchor
    pub fn date_time_within_days(&mut self, days: i64) -> DateTime<Utc> {
        let seconds = self.rng.gen_range(0..=days * 86_400);
        self.anchor - Duration::seconds(seconds)
    }

    // ------------------------------------------------------------------------
    // People and places
    // ------------------------------------------------------------------------

    pub fn first_name(&mut self) -> &'static str {
        self.one_of(FIRST_NAMES)
    }

    pub fn last_name(&mut self) -> &'static str {
        self.one_of(LAST_NAMES)
    }

    pub fn name(&mut self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    pub fn email(&mut self) -> String {
        let first = self.first_name().to_lowercase();
        let last = self.last_name().to_lowercase();
        let number = self.int_between(1, 9999);
        let domain = self.one_of(EMAIL_DOMAINS);
        format!("{first}.{last}{number}@{domain}")
    }

    pub fn city(&mut self) -> &'static str {
        self.one_of(CITIES)
    }

    pub fn ipv4(&mut self) -> String {
        let octets: [u8; 4] = self.rng.gen();
        std::net::Ipv4Addr::from(octets).to_string()
    }

    pub fn chrome(&mut self) -> String {
        let platform = self.one_of(CHROME_PLATFORMS);
        let major = self.int_between(100, 125);
        let build = self.int_between(1000, 6999);
        format!(
            "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) \
             Chrome/{major}.0.{build}.0 Safari/537.36"
        )
    }

    pub fn user_agent(&mut self) -> String {
        if self.chance(0.5) {
            self.chrome()
        } else {
            let platform = self.one_of(FIREFOX_PLATFORMS);
            format!("Mozilla/5.0 ({platform}) Gecko/20100101 Firefox/121.0")
        }
    }

    // ------------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------------

    pub fn word(&mut self) -> &'static str {
        self.one_of(LOREM)
    }

    pub fn sentence(&mut self) -> String {
        let count = self.int_between(4, 10) as usize;
        let words: Vec<&str> = (0..count).map(|_| self.word()).collect();
        capitalize_sentence(&words)
    }

    /// Sentences totalling at most `max_chars` characters
    pub fn text(&mut self, max_chars: usize) -> String {
        let mut text = String::new();
        loop {
            let sentence = self.sentence();
            let separator = usize::from(!text.is_empty());
            if text.len() + separator + sentence.len() > max_chars {
                break;
            }
            if separator == 1 {
                text.push(' ');
            }
            text.push_str(&sentence);
        }

        if text.is_empty() {
            // Budget too small for a whole sentence: trim words to fit.
            let mut words: Vec<&str> = Vec::new();
            let mut length = 1;
            loop {
                let word = self.word();
                if length + word.len() + usize::from(!words.is_empty()) > max_chars {
                    break;
                }
                length += word.len() + usize::from(!words.is_empty());
                words.push(word);
            }
            text = capitalize_sentence(&words);
        }

        text
    }

    pub fn catch_phrase(&mut self) -> String {
        format!(
            "{} {} {}",
            self.one_of(CATCH_PHRASE_LEAD),
            self.one_of(CATCH_PHRASE_MIDDLE),
            self.one_of(CATCH_PHRASE_TAIL)
        )
    }

    // ------------------------------------------------------------------------
    // Internet and files
    // ------------------------------------------------------------------------

    pub fn url(&mut self) -> String {
        let host = self.last_name().to_lowercase();
        let tld = self.one_of(TLDS);
        let path = self.word();
        format!("https://www.{host}.{tld}/{path}/")
    }

    pub fn image_url(&mut self) -> String {
        let width = self.int_between(1, 10) * 64;
        let height = self.int_between(1, 10) * 64;
        format!("https://picsum.photos/{width}/{height}")
    }

    pub fn file_name(&mut self) -> String {
        let stem = self.word();
        let extension = self.one_of(FILE_EXTENSIONS);
        format!("{stem}.{extension}")
    }
}

fn capitalize_sentence(words: &[&str]) -> String {
    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchored(seed: u64) -> FakeData {
        let anchor = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        FakeData::from_seed(seed).with_anchor(anchor)
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = anchored(7);
        let mut b = anchored(7);
        for _ in 0..20 {
            assert_eq!(a.email(), b.email());
            assert_eq!(a.uuid(), b.uuid());
            assert_eq!(a.text(100), b.text(100));
            assert_eq!(a.date_time_within_days(30), b.date_time_within_days(30));
        }
    }

    #[test]
    fn test_different_seed_diverges() {
        let mut a = anchored(1);
        let mut b = anchored(2);
        let left: Vec<String> = (0..10).map(|_| a.sha256_hex()).collect();
        let right: Vec<String> = (0..10).map(|_| b.sha256_hex()).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn test_email_shape() {
        let mut fake = anchored(3);
        for _ in 0..50 {
            let email = fake.email();
            let (local, domain) = email.split_once('@').expect("email has @");
            assert!(local.contains('.'));
            assert!(domain.contains('.'));
        }
    }

    #[test]
    fn test_sha256_hex_is_64_hex_chars() {
        let mut fake = anchored(4);
        let digest = fake.sha256_hex();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_text_respects_budget() {
        let mut fake = anchored(5);
        for budget in [5, 20, 50, 100, 200] {
            let text = fake.text(budget);
            assert!(text.len() <= budget, "{text:?} exceeds {budget}");
            assert!(text.ends_with('.') || text.is_empty());
        }
    }

    #[test]
    fn test_date_time_within_window() {
        let mut fake = anchored(6);
        let anchor = fake.anchor();
        for _ in 0..100 {
            let at = fake.date_time_within_days(30);
            assert!(at <= anchor);
            assert!(at >= anchor - Duration::days(30));
        }
    }

    #[test]
    fn test_ipv4_parses() {
        let mut fake = anchored(8);
        let ip = fake.ipv4();
        assert!(ip.parse::<std::net::Ipv4Addr>().is_ok());
    }

    #[test]
    fn test_decimal_hundredths_scale() {
        let mut fake = anchored(9);
        let version = fake.decimal_hundredths(10, 150);
        assert_eq!(version.scale(), 2);
        assert!(version >= Decimal::new(10, 2) && version <= Decimal::new(150, 2));
    }

    #[test]
    fn test_one_of_empty_list() {
        let mut fake = anchored(10);
        assert_eq!(fake.one_of(&[]), "");
    }
}
