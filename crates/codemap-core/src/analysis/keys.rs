//! Deterministic node keys.
//!
//! Every node's identity is derived from its structural position so that
//! re-importing an unchanged analysis MERGEs onto the same nodes.

/// `path#name`
pub fn class_key(path: &str, class: &str) -> String {
    format!("{path}#{class}")
}

/// `path#name`
pub fn function_key(path: &str, function: &str) -> String {
    format!("{path}#{function}")
}

/// `path#Class::property`
pub fn property_key(class_key: &str, property: &str) -> String {
    format!("{class_key}::{property}")
}

/// `path#function(param)`
pub fn parameter_key(function_key: &str, param: &str) -> String {
    format!("{function_key}({param})")
}

/// `path->source`
pub fn import_key(path: &str, source: &str) -> String {
    format!("{path}->{source}")
}

/// Prefix shared by every function key declared in `path`.
pub fn file_scope_prefix(path: &str) -> String {
    format!("{path}#")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        let class = class_key("src/user.ts", "User");
        assert_eq!(class, "src/user.ts#User");
        assert_eq!(property_key(&class, "email"), "src/user.ts#User::email");

        let func = function_key("a.js", "foo");
        assert_eq!(func, "a.js#foo");
        assert_eq!(parameter_key(&func, "x"), "a.js#foo(x)");
        assert_eq!(import_key("a.js", "lodash"), "a.js->lodash");
        assert!(func.starts_with(&file_scope_prefix("a.js")));
    }
}
