use once_cell::sync::Lazy;
use regex::Regex;

/// One leading label followed by either a short alphabetic TLD or a
/// `<suffix>.<tld>` pair.
///
/// Leading label forms: a single letter, two letters, letter+digit,
/// digit+letter, or 3..=63 characters bounded by alphanumerics with `-`/`_`
/// allowed inside.
static HOSTNAME_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:[a-zA-Z]|[a-zA-Z]{2}|[a-zA-Z][0-9]|[0-9][a-zA-Z]",
        r"|[a-zA-Z0-9][a-zA-Z0-9_-]{1,61}[a-zA-Z0-9])",
        r"\.(?:[a-zA-Z]{2,6}|[a-zA-Z0-9-]{2,30}\.[a-zA-Z]{2,255})$",
    ))
    .expect("hostname grammar must compile")
});

pub fn is_valid_domain(domain: &str) -> bool {
    HOSTNAME_GRAMMAR.is_match(domain)
}

/// Every entry of `domains` that fails the grammar, in input order.
pub fn invalid_domains(domains: &[String]) -> Vec<String> {
    domains
        .iter()
        .filter(|domain| !is_valid_domain(domain))
        .cloned()
        .collect()
}
