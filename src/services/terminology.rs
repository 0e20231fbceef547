use std::collections::BTreeMap;

/// UI wording used when a tenant has not customised a term.
pub const DEFAULT_TERMINOLOGY: [(&str, &str); 8] = [
    ("volunteer", "Volunteer"),
    ("volunteers", "Volunteers"),
    ("opportunity", "Opportunity"),
    ("opportunities", "Opportunities"),
    ("organization", "Organization"),
    ("coordinator", "Coordinator"),
    ("signup", "Sign Up"),
    ("apply", "Apply"),
];

/// Looks a term up: tenant override, then default, then the key itself.
pub fn term<'a>(custom: &'a BTreeMap<String, String>, key: &'a str) -> &'a str {
    custom
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            DEFAULT_TERMINOLOGY
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
        })
        .unwrap_or(key)
}

/// Full terminology map: every default key plus any extra tenant keys.
pub fn resolve(custom: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut resolved: BTreeMap<String, String> = DEFAULT_TERMINOLOGY
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for (k, v) in custom.iter().filter(|(_, v)| !v.is_empty()) {
        resolved.insert(k.clone(), v.clone());
    }
    resolved
}
