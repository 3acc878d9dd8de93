use crate::model::TaskPassword;

/// Lowercases the input and drops every character outside `[a-z0-9]`.
pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Checks a submitted password against the accepted answers of a task. Both sides are normalized
/// first. An answer that normalizes to nothing never matches.
pub fn is_correct(submitted: &str, password: &TaskPassword) -> bool {
    let submitted = normalize(submitted);
    if submitted.is_empty() {
        return false;
    }
    password
        .accepted()
        .iter()
        .any(|answer| normalize(answer) == submitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Snow-Angel!"), "snowangel");
        assert_eq!(normalize("snowangel"), "snowangel");
        assert_eq!(normalize("  Elf 42 "), "elf42");
        assert_eq!(normalize("Ünïcödé"), "ncd");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn test_is_correct_single() {
        let password = TaskPassword::One("SnowAngel".to_string());
        assert!(is_correct("Snow-Angel!", &password));
        assert!(is_correct("snowangel", &password));
        assert!(is_correct("SNOW ANGEL", &password));
        assert!(!is_correct("snow angels", &password));
    }

    #[test]
    fn test_is_correct_list() {
        let password = TaskPassword::Many(vec!["Rudolf".to_string(), "Reindeer".to_string()]);
        assert!(is_correct("reindeer ", &password));
        assert!(is_correct("RUDOLF", &password));
        assert!(!is_correct("Blitzen", &password));

        let encoded = TaskPassword::One(r#"["Rudolf", "Reindeer"]"#.to_string());
        assert!(is_correct("Rudolf!", &encoded));
        // The raw encoded text is not itself an answer.
        assert!(!is_correct(r#"["Rudolf", "Reindeer"]"#, &encoded));
    }

    #[test]
    fn test_is_correct_empty() {
        assert!(!is_correct("", &TaskPassword::default()));
        assert!(!is_correct("!!!", &TaskPassword::One("???".to_string())));
        assert!(!is_correct("anything", &TaskPassword::Many(vec![])));
    }
}
