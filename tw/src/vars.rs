//! `:name` placeholder substitution for resource identifiers.
//!
//! Variables arrive from the command line as `name=value` pairs. When a name is
//! given more than once the last pair wins. Each surviving pair is applied as a
//! literal replacement of `:name` with `value`, longest name first so `:env`
//! never eats the front of `:env_suffix`. Placeholders that no pair resolves
//! are left untouched.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Matches `:name` tokens left over after substitution.
static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex pattern"));

/// A single `name=value` substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn token(&self) -> String {
        format!(":{}", self.name)
    }
}

impl FromStr for Variable {
    type Err = String;

    /// Splits on the first `=`; everything after it is the value
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, _)) if name.is_empty() => Err(format!("Variable name is empty in '{}'", s)),
            Some((name, value)) => Ok(Self::new(name, value)),
            None => Err(format!("Expected name=value, got '{}'", s)),
        }
    }
}

/// Collapse repeated names (last wins) and order longest name first
fn effective(variables: &[Variable]) -> Vec<&Variable> {
    let mut kept: Vec<&Variable> = Vec::new();
    for var in variables {
        match kept.iter_mut().find(|k| k.name == var.name) {
            Some(slot) => *slot = var,
            None => kept.push(var),
        }
    }
    kept.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
    kept
}

/// Replace every `:name` token in `input`
pub fn substitute(input: &str, variables: &[Variable]) -> String {
    let mut out = input.to_string();
    for var in effective(variables) {
        out = out.replace(&var.token(), &var.value);
    }
    out
}

/// Placeholder names still present in `input`
pub fn unresolved(input: &str) -> Vec<String> {
    PLACEHOLDER_PATTERN
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_equals() {
        let var: Variable = "filter=a=b".parse().unwrap();
        assert_eq!(var.name, "filter");
        assert_eq!(var.value, "a=b");
    }

    #[test]
    fn test_parse_allows_empty_value() {
        let var: Variable = "suffix=".parse().unwrap();
        assert_eq!(var, Variable::new("suffix", ""));
    }

    #[test]
    fn test_parse_rejects_missing_equals() {
        assert!("env".parse::<Variable>().is_err());
        assert!("=prod".parse::<Variable>().is_err());
    }

    #[test]
    fn test_substitute_prefix_placeholder() {
        let vars = vec![Variable::new("env", "prod")];
        assert_eq!(substitute(":env.schema.table", &vars), "prod.schema.table");
    }

    #[test]
    fn test_substitute_later_pair_overrides_same_name() {
        let vars = vec![Variable::new("env", "dev"), Variable::new("env", "prod")];
        assert_eq!(substitute(":env.tbl", &vars), "prod.tbl");
    }

    #[test]
    fn test_substitute_longer_name_not_clobbered() {
        let vars = vec![Variable::new("env", "prod"), Variable::new("env_schema", "sales")];
        assert_eq!(substitute(":env.:env_schema.tbl", &vars), "prod.sales.tbl");
    }

    #[test]
    fn test_substituted_value_is_not_expanded_again() {
        // `region` is applied before `env`, so the token inside env's value survives
        let vars = vec![Variable::new("env", ":region"), Variable::new("region", "us")];
        assert_eq!(substitute(":env.tbl", &vars), ":region.tbl");
        assert_eq!(substitute(":region.:env", &vars), "us.:region");
    }

    #[test]
    fn test_substitute_leaves_unknown_placeholders() {
        let vars = vec![Variable::new("env", "prod")];
        let out = substitute(":env.:region_schema.tbl", &vars);
        assert_eq!(out, "prod.:region_schema.tbl");
        assert_eq!(unresolved(&out), vec!["region_schema".to_string()]);
    }

    #[test]
    fn test_unresolved_empty_for_plain_identifier() {
        assert!(unresolved("db.schema.tbl").is_empty());
    }
}
