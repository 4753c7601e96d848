use serde::Serialize;
use ts_rs::TS;

const SPECIAL_CHARS: &str = "@$!%*?&";
const MIN_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub struct PasswordCriteria {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
    pub special: bool,
}

impl PasswordCriteria {
    pub fn evaluate(password: &str) -> Self {
        Self {
            length: password.chars().count() >= MIN_LENGTH,
            uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            number: password.chars().any(|c| c.is_ascii_digit()),
            special: password.chars().any(|c| SPECIAL_CHARS.contains(c)),
        }
    }

    pub fn met(&self) -> u8 {
        [
            self.length,
            self.uppercase,
            self.lowercase,
            self.number,
            self.special,
        ]
        .into_iter()
        .filter(|met| *met)
        .count() as u8
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct PasswordStrength {
    pub criteria: PasswordCriteria,
    pub score: u8,
    pub label: &'static str,
}

pub fn strength_label(score: u8) -> &'static str {
    match score {
        0 => "",
        1 => "Très faible",
        2 => "Faible",
        3 => "Moyen",
        4 => "Fort",
        _ => "Très fort",
    }
}

pub fn password_strength(password: &str) -> PasswordStrength {
    let criteria = PasswordCriteria::evaluate(password);
    let score = criteria.met();
    PasswordStrength {
        criteria,
        score,
        label: strength_label(score),
    }
}
