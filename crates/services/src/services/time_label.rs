use chrono::{DateTime, Utc};

const UNITS: &[(i64, &str)] = &[
    (31_536_000, "ans"),
    (2_592_000, "mois"),
    (86_400, "jours"),
    (3_600, "heures"),
    (60, "minutes"),
];

/// French relative label such as "il y a 5 minutes". A unit is used once
/// more than one whole unit has elapsed.
pub fn relative_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().max(0);
    for (unit_seconds, unit) in UNITS {
        if seconds > *unit_seconds {
            return format!("il y a {} {unit}", seconds / unit_seconds);
        }
    }
    "il y a quelques secondes".to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn labels_by_magnitude() {
        let now = Utc::now();
        assert_eq!(
            relative_label(now - Duration::seconds(10), now),
            "il y a quelques secondes"
        );
        assert_eq!(
            relative_label(now - Duration::seconds(60), now),
            "il y a quelques secondes"
        );
        assert_eq!(relative_label(now - Duration::minutes(5), now), "il y a 5 minutes");
        assert_eq!(relative_label(now - Duration::hours(3), now), "il y a 3 heures");
        assert_eq!(relative_label(now - Duration::days(2), now), "il y a 2 jours");
        assert_eq!(relative_label(now - Duration::days(65), now), "il y a 2 mois");
        assert_eq!(relative_label(now - Duration::days(800), now), "il y a 2 ans");
    }

    #[test]
    fn future_timestamps_clamp_to_now() {
        let now = Utc::now();
        assert_eq!(
            relative_label(now + Duration::minutes(3), now),
            "il y a quelques secondes"
        );
    }
}
