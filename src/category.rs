use std::collections::BTreeMap;

/// Normalization applied wherever category values are compared: stringify
/// and trim. Numbers keep their plain string form. Applying this everywhere
/// (order lookup, filter matching, label lookup) keeps categories with
/// incidental whitespace from splitting into duplicate buckets.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_string()
}

/// Establish the display order of categorical keys.
///
/// With an explicit order list, listed keys follow the list exactly and
/// unlisted keys sort after all of them in first-seen order (stable sort
/// keyed by list index, `usize::MAX` for unlisted). Without one, first-seen
/// order wins.
pub fn order_categories<'a, I>(raw: I, explicit: Option<&[String]>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = Vec::new();
    for value in raw {
        let key = normalize_category(value);
        if !seen.contains(&key) {
            seen.push(key);
        }
    }

    if let Some(order) = explicit {
        let rank = |key: &String| {
            order
                .iter()
                .position(|o| normalize_category(o) == *key)
                .unwrap_or(usize::MAX)
        };
        seen.sort_by_key(rank);
    }

    seen
}

/// Display label for a category key: the label map entry if present,
/// otherwise the key itself.
pub fn display_label(labels: Option<&BTreeMap<String, String>>, key: &str) -> String {
    labels
        .and_then(|map| map.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let cats = order_categories(["B", "A", "B", "C"], None);
        assert_eq!(cats, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_explicit_order_listed_first() {
        let order = vec!["B".to_string(), "A".to_string()];
        let cats = order_categories(["A", "C", "B"], Some(&order));
        assert_eq!(cats, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_unlisted_keep_first_seen_order() {
        let order = vec!["Z".to_string()];
        let cats = order_categories(["C", "Z", "A", "B"], Some(&order));
        assert_eq!(cats, vec!["Z", "C", "A", "B"]);
    }

    #[test]
    fn test_whitespace_variants_merge() {
        let cats = order_categories(["Assam", " Assam ", "Assam"], None);
        assert_eq!(cats, vec!["Assam"]);
    }

    #[test]
    fn test_display_label_fallback() {
        let mut labels = BTreeMap::new();
        labels.insert("stg".to_string(), "Small Tea Growers".to_string());
        assert_eq!(display_label(Some(&labels), "stg"), "Small Tea Growers");
        assert_eq!(display_label(Some(&labels), "estates"), "estates");
        assert_eq!(display_label(None, "estates"), "estates");
    }
}
