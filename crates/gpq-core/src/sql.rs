//! SQL quoting shared by the query builder and the engine adapters

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a string literal, escaping embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("geometry"), "\"geometry\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_identifier("a b:c"), "\"a b:c\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("s3://bucket/x.parquet"), "'s3://bucket/x.parquet'");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }
}
