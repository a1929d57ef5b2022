//! `--rule` argument parsing
//!
//! Format: `ROLE:TYPE:VALUE[:cs][:pN]`. The value may itself contain `:`;
//! only recognised trailing flags are stripped.

use crate::cli::error::HelpfulError;
use groupwise_core::{ImageRole, RoleRule, RuleType};

pub fn parse_rule(rule_arg: &str) -> Result<RoleRule, HelpfulError> {
    let mut parts = rule_arg.splitn(3, ':');
    let (Some(role), Some(rule_type), Some(rest)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HelpfulError::invalid_rule(rule_arg, "expected ROLE:TYPE:VALUE"));
    };

    let invalid = |e: String| HelpfulError::invalid_rule(rule_arg, &e);
    let role: ImageRole = role.parse().map_err(invalid)?;
    let rule_type: RuleType = rule_type.parse().map_err(invalid)?;

    let mut value = rest;
    let mut case_sensitive = false;
    let mut priority = 0;
    while let Some((head, flag)) = value.rsplit_once(':') {
        if flag == "cs" {
            case_sensitive = true;
        } else if let Some(Ok(p)) = flag.strip_prefix('p').map(str::parse::<i32>) {
            priority = p;
        } else {
            break;
        }
        value = head;
    }

    if value.trim().is_empty() {
        return Err(HelpfulError::invalid_rule(rule_arg, "rule value is empty"));
    }

    Ok(RoleRule::new(role, rule_type, value)
        .case_sensitive(case_sensitive)
        .priority(priority))
}

pub fn parse_rules(specs: &[String]) -> Result<Vec<RoleRule>, HelpfulError> {
    specs.iter().map(|s| parse_rule(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rule() {
        let rule = parse_rule("front:contains:front").unwrap();
        assert_eq!(rule.target_role, ImageRole::Front);
        assert_eq!(rule.rule_type, RuleType::Contains);
        assert_eq!(rule.value, "front");
        assert!(!rule.case_sensitive);
        assert_eq!(rule.priority, 0);
    }

    #[test]
    fn test_flags_in_any_order() {
        let rule = parse_rule("rear:ends_with:_r:p2:cs").unwrap();
        assert_eq!(rule.value, "_r");
        assert!(rule.case_sensitive);
        assert_eq!(rule.priority, 2);

        let rule = parse_rule("overview:eq:scene:cs:p-1").unwrap();
        assert_eq!(rule.rule_type, RuleType::Equals);
        assert_eq!(rule.priority, -1);
    }

    #[test]
    fn test_value_keeps_inner_colons() {
        let rule = parse_rule(r"front:regex:^(?i:.*_f)\.jpg$").unwrap();
        assert_eq!(rule.rule_type, RuleType::RegexOverride);
        assert_eq!(rule.value, r"^(?i:.*_f)\.jpg$");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_rule("front:contains").is_err());
        assert!(parse_rule("side:contains:x").is_err());
        assert!(parse_rule("front:like:x").is_err());
        assert!(parse_rule("front:contains::cs").is_err());
    }
}
