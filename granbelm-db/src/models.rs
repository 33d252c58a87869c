use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordre d'appui des trois boutons, ex. `[1, 2, 3]` pour la nav "123".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code([u8; 3]);

impl Code {
    /// Les 6 permutations valides, dans l'ordre des boutons de saisie.
    pub const ALL: [Code; 6] = [
        Code([1, 2, 3]),
        Code([1, 3, 2]),
        Code([2, 1, 3]),
        Code([2, 3, 1]),
        Code([3, 1, 2]),
        Code([3, 2, 1]),
    ];

    pub fn from_digits(digits: [u8; 3]) -> Option<Code> {
        let mut seen = [false; 3];
        for &d in &digits {
            if !(1..=3).contains(&d) || seen[(d - 1) as usize] {
                return None;
            }
            seen[(d - 1) as usize] = true;
        }
        Some(Code(digits))
    }

    pub fn digits(&self) -> [u8; 3] {
        self.0
    }

    pub fn first(&self) -> u8 {
        self.0[0]
    }

    pub fn second(&self) -> u8 {
        self.0[1]
    }

    pub fn third(&self) -> u8 {
        self.0[2]
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.0[0], self.0[1], self.0[2])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("nav invalide '{0}' (attendu une permutation de 1, 2, 3)")]
pub struct InvalidCode(pub String);

impl FromStr for Code {
    type Err = InvalidCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(InvalidCode(s.to_string()));
        }
        Code::from_digits([bytes[0] - b'0', bytes[1] - b'0', bytes[2] - b'0'])
            .ok_or_else(|| InvalidCode(s.to_string()))
    }
}

/// Nombre de positions différentes. `None` si les longueurs diffèrent (distance infinie).
pub fn hamming_distance(a: &str, b: &str) -> Option<usize> {
    if a.chars().count() != b.chars().count() {
        return None;
    }
    Some(a.chars().zip(b.chars()).filter(|(x, y)| x != y).count())
}

/// Nombre de positions identiques sur les 3 premiers indices.
pub fn positional_match_count(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take(3)
        .filter(|(x, y)| x == y)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Bonus,
    Bell,
    Replay,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Bonus, Outcome::Bell, Outcome::Replay];

    /// Libellé tel qu'il est stocké dans la colonne `role`.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Bonus => "魔力目",
            Outcome::Bell => "ベル",
            Outcome::Replay => "リプレイ",
        }
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self, Outcome::Bonus)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rôle inconnu '{0}' (attendu 魔力目, ベル ou リプレイ)")]
pub struct InvalidOutcome(pub String);

impl FromStr for Outcome {
    type Err = InvalidOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "魔力目" | "bonus" => Ok(Outcome::Bonus),
            "ベル" | "bell" => Ok(Outcome::Bell),
            "リプレイ" | "replay" => Ok(Outcome::Replay),
            _ => Err(InvalidOutcome(s.to_string())),
        }
    }
}

/// Une ligne de l'historique, conservée telle qu'elle est persistée.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub nav: String,
    pub role: String,
}

impl HistoryRecord {
    pub fn new(code: Code, outcome: Outcome) -> Self {
        Self {
            nav: code.to_string(),
            role: outcome.label().to_string(),
        }
    }

    pub fn code(&self) -> Option<Code> {
        self.nav.parse().ok()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.role.parse().ok()
    }

    pub fn is_bonus(&self) -> bool {
        self.outcome().is_some_and(|o| o.is_bonus())
    }
}

/// Les `n` derniers enregistrements (fenêtre récente).
pub fn recent_window(history: &[HistoryRecord], n: usize) -> &[HistoryRecord] {
    &history[history.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_codes_are_valid_and_distinct() {
        for (i, a) in Code::ALL.iter().enumerate() {
            assert_eq!(a.to_string().parse::<Code>().unwrap(), *a);
            for b in &Code::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_parse_code_rejects_malformed() {
        assert!("12".parse::<Code>().is_err());
        assert!("1234".parse::<Code>().is_err());
        assert!("112".parse::<Code>().is_err());
        assert!("124".parse::<Code>().is_err());
        assert!("abc".parse::<Code>().is_err());
        assert!("".parse::<Code>().is_err());
        assert_eq!(" 231 ".parse::<Code>().unwrap().digits(), [2, 3, 1]);
    }

    #[test]
    fn test_code_positions() {
        let code: Code = "312".parse().unwrap();
        assert_eq!((code.first(), code.second(), code.third()), (3, 1, 2));
    }

    #[test]
    fn test_hamming_distance_bounds() {
        for a in &Code::ALL {
            for b in &Code::ALL {
                let d = hamming_distance(&a.to_string(), &b.to_string()).unwrap();
                assert!(d <= 3);
                assert_eq!(d == 0, a == b);
            }
        }
    }

    #[test]
    fn test_hamming_distance_length_mismatch() {
        assert_eq!(hamming_distance("123", "12"), None);
        assert_eq!(hamming_distance("123", "132"), Some(2));
    }

    #[test]
    fn test_positional_match_self_is_three() {
        for c in &Code::ALL {
            let s = c.to_string();
            assert_eq!(positional_match_count(&s, &s), 3);
        }
        assert_eq!(positional_match_count("123", "132"), 1);
        assert_eq!(positional_match_count("123", "1"), 1);
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!("魔力目".parse::<Outcome>().unwrap(), Outcome::Bonus);
        assert_eq!("ベル".parse::<Outcome>().unwrap(), Outcome::Bell);
        assert_eq!("リプレイ".parse::<Outcome>().unwrap(), Outcome::Replay);
        assert_eq!("BONUS".parse::<Outcome>().unwrap(), Outcome::Bonus);
        assert!("チェリー".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_record_accessors() {
        let rec = HistoryRecord::new(Code::ALL[3], Outcome::Bonus);
        assert_eq!(rec.nav, "231");
        assert_eq!(rec.role, "魔力目");
        assert!(rec.is_bonus());

        let bad = HistoryRecord { nav: "12".to_string(), role: "?".to_string() };
        assert_eq!(bad.code(), None);
        assert!(!bad.is_bonus());
    }

    #[test]
    fn test_recent_window() {
        let history: Vec<HistoryRecord> = (0..15)
            .map(|i| HistoryRecord::new(Code::ALL[i % 6], Outcome::Bell))
            .collect();
        let window = recent_window(&history, 10);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0], history[5]);
        assert_eq!(recent_window(&history[..3], 10).len(), 3);
    }
}
