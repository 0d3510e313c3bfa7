use std::collections::BTreeMap;

use anyhow::Context;
use regex::Regex;
use toml::Value;

use crate::config::Config;

/// Auto categorisation service. Picks a category for a transaction from its description using
/// the regex rules in the `[categories]` config table.
pub(crate) struct Labeller {
    category_regex_map: BTreeMap<String, Vec<Regex>>,
}

impl Labeller {
    pub(crate) fn new(config: &Config) -> anyhow::Result<Labeller> {
        let mut category_regex_map = BTreeMap::new();
        for (category, value) in &config.categories {
            let mut regex_vec = vec![];
            match value {
                Value::Array(regex_array) => {
                    for regex in regex_array {
                        if let Value::String(regex) = regex {
                            regex_vec.push(case_insensitive(regex)?);
                        }
                    }
                },
                Value::String(regex) => {
                    regex_vec.push(case_insensitive(regex)?);
                },
                _ => {}
            }

            category_regex_map.insert(category.clone(), regex_vec);
        }

        Ok(Labeller { category_regex_map })
    }

    /// Labeller without rules, never suggests anything
    #[cfg(test)]
    pub(crate) fn empty() -> Labeller {
        Labeller { category_regex_map: BTreeMap::new() }
    }

    /// Try categorise a transaction based on given description. First matching category wins,
    /// categories are tried in name order.
    pub(crate) fn categorise(&self, description: &str) -> Option<String> {
        for (category, regex_vec) in &self.category_regex_map {
            if regex_vec.iter().any(|regex| regex.is_match(description)) {
                return Some(category.clone());
            }
        }

        None
    }
}

fn case_insensitive(regex: &str) -> anyhow::Result<Regex> {
    Regex::new(&format!("(?i){regex}")).with_context(|| format!("Invalid category rule '{regex}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorise() {
        let config = Config::parse(r#"
            [categories]
            tools = ["github", "jet ?brains"]
            marketing = "google ads|linkedin"
        "#).unwrap();
        let labeller = Labeller::new(&config).unwrap();

        assert_eq!(labeller.categorise("GitHub Copilot"), Some("tools".to_string()));
        assert_eq!(labeller.categorise("JetBrains renewal"), Some("tools".to_string()));
        assert_eq!(labeller.categorise("LinkedIn campaign"), Some("marketing".to_string()));
        assert_eq!(labeller.categorise("Coffee"), None);
        assert_eq!(Labeller::empty().categorise("GitHub"), None);
    }

    #[test]
    fn test_invalid_rule() {
        let config = Config::parse("[categories]\ntools = \"(unclosed\"").unwrap();
        assert!(Labeller::new(&config).is_err());
    }
}
