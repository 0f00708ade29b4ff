mod access;
mod injection;
mod secrets;
mod xss;

use crate::rules::types::Rule;
use std::sync::LazyLock;

static ALL_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let mut rules = Vec::with_capacity(16);
    rules.extend(injection::rules());
    rules.extend(xss::rules());
    rules.extend(access::rules());
    rules.extend(secrets::rules());
    rules
});

pub fn all_rules() -> &'static [Rule] {
    &ALL_RULES
}
