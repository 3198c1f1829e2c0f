//! 0-100 string similarity scorers built on `strsim`

/// Case-insensitive normalized Levenshtein similarity, scaled to 0-100
pub fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase()) * 100.0
}

/// Best [`ratio`] of the shorter string against every same-length window of the longer
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let needle: String = short.iter().collect();
    let mut best = 0.0_f64;
    for start in 0..=(long.len() - short.len()) {
        let window: String = long[start..start + short.len()].iter().collect();
        let score = strsim::normalized_levenshtein(&needle, &window) * 100.0;
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// Best-scoring choice at or above `cutoff`; the first choice wins ties
pub fn best_match<'a, F>(query: &str, choices: &[&'a str], scorer: F, cutoff: f64) -> Option<(&'a str, f64)>
where
    F: Fn(&str, &str) -> f64,
{
    let mut best: Option<(&'a str, f64)> = None;
    for choice in choices {
        let score = scorer(query, choice);
        if score >= cutoff && best.map_or(true, |(_, s)| score > s) {
            best = Some((choice, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("Cardiology", "cardiology"), 100.0);
        assert!(ratio("Cardiology", "Nephrology") < 80.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("board certified in dermatology", "Dermatology"), 100.0);
        assert!(partial_ratio("xyz", "Radiology") < 50.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_best_match_respects_cutoff() {
        let choices = ["Cardiology", "Neurology", "Urology"];
        let hit = best_match("cardiolgy", &choices, ratio, 80.0);
        assert_eq!(hit.map(|(c, _)| c), Some("Cardiology"));
        assert!(best_match("plumbing", &choices, ratio, 80.0).is_none());
    }
}
