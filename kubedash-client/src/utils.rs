/// Splits a target path `"ns/name"` into its namespace and name.
/// Paths without a namespace yield an empty namespace.
pub fn namespaced(path: &str) -> (String, String) {
    match path.split_once('/') {
        Some((ns, name)) => (ns.to_string(), name.to_string()),
        None => (String::new(), path.to_string()),
    }
}

/// Joins a namespace and name back into a target path.
pub fn fqn(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced() {
        assert_eq!(
            namespaced("kube-system/coredns-5d78c9869d-x2x9k"),
            ("kube-system".to_string(), "coredns-5d78c9869d-x2x9k".to_string())
        );
        assert_eq!(namespaced("node-1"), (String::new(), "node-1".to_string()));
    }

    #[test]
    fn test_fqn() {
        assert_eq!(fqn("default", "nginx"), "default/nginx");
        assert_eq!(fqn("", "node-1"), "node-1");
    }
}
