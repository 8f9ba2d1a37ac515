use std::collections::HashMap;
use std::sync::OnceLock;

/// Action score used when no keyword matches.
pub const DEFAULT_ACTION_SCORE: f64 = 30.0;

const RATING_STRENGTH: &[(&str, u8)] = &[
    ("strong sell", 1),
    ("sell", 2),
    ("underweight", 2),
    ("hold", 3),
    ("neutral", 3),
    ("equal-weight", 3),
    ("market perform", 3),
    ("sector perform", 3),
    ("buy", 4),
    ("overweight", 4),
    ("outperform", 4),
    ("strong buy", 5),
    ("top pick", 5),
];

const ACTION_SCORES: &[(&str, f64)] = &[
    ("upgraded", 100.0),
    ("initiated", 80.0),
    ("target raised", 70.0),
    ("reiterated", 60.0),
    ("maintained", 50.0),
    ("target lowered", 30.0),
    ("downgraded", 20.0),
];

const BULLISH_KEYWORDS: &[&str] = &[
    "upgraded",
    "initiated",
    "target raised",
    "reiterated",
    "maintained",
];

static TABLES: OnceLock<LookupTables> = OnceLock::new();

/// Read-only classification tables shared by every scoring pass.
#[derive(Debug)]
pub struct LookupTables {
    rating_strength: HashMap<&'static str, u8>,
    action_scores: Vec<(&'static str, f64)>,
    bullish_keywords: Vec<&'static str>,
}

impl LookupTables {
    /// Process-wide instance, built on first use.
    pub fn global() -> &'static LookupTables {
        TABLES.get_or_init(Self::build)
    }

    fn build() -> Self {
        Self {
            rating_strength: RATING_STRENGTH.iter().copied().collect(),
            action_scores: ACTION_SCORES.to_vec(),
            bullish_keywords: BULLISH_KEYWORDS.to_vec(),
        }
    }

    /// 1 (strong sell) ..= 5 (strong buy); 0 for labels we do not recognise.
    pub fn rating_strength(&self, label: &str) -> u8 {
        let key = label.trim().to_lowercase();
        self.rating_strength.get(key.as_str()).copied().unwrap_or(0)
    }

    /// Score of the first keyword contained in the action text.
    pub fn action_score(&self, action: &str) -> Option<f64> {
        let lower = action.to_lowercase();
        self.action_scores
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, score)| *score)
    }

    pub fn is_bullish(&self, action: &str) -> bool {
        let lower = action.to_lowercase();
        self.bullish_keywords.iter().any(|k| lower.contains(k))
    }
}
