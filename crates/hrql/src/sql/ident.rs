//! Centralized SQL identifier quoting (spec §9: "All identifier insertion
//! into emitted SQL MUST go through it; this is a security-critical
//! invariant"; grounded in `postrust_sql::identifier::escape_ident`).

/// Wraps an identifier in double quotes, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn quote_qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(quote_ident("employees"), "\"employees\"");
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote_ident("weird\"name"), "\"weird\"\"name\"");
    }

    #[test]
    fn qualifies_schema_and_table() {
        assert_eq!(quote_qualified("core", "employees"), "\"core\".\"employees\"");
    }
}
