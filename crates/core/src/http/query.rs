use std::collections::HashMap;

use url::form_urlencoded;

/// Percent-decode a string (RFC 3986 §2.1).
///
/// `%XX` escapes become the byte they encode. `+` is left as-is, which is
/// what a path component wants; query strings go through
/// [`decode_query_component`] instead. Malformed escapes are copied through
/// literally and the decoded bytes are converted to UTF-8 lossily.
pub fn url_decode(input: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(input.as_bytes())).into_owned()
}

/// Decode one `application/x-www-form-urlencoded` key or value:
/// percent-decoding plus `+` to space.
pub fn decode_query_component(input: &str) -> String {
    url_decode(&input.replace('+', " "))
}

/// Parse a query string (`a=1&b=two`) into a map.
///
/// Pairs are split on `&`, then on the first `=`, and decoded as form
/// data. A pair without `=` maps to an empty value. When a key repeats,
/// the last occurrence wins.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(url_decode("%20"), " ");
        assert_eq!(url_decode("a%2Bb"), "a+b");
        assert_eq!(url_decode("caf%C3%A9"), "café");
    }

    #[test]
    fn plus_is_literal_outside_queries() {
        assert_eq!(url_decode("a+b"), "a+b");
        assert_eq!(decode_query_component("a+b"), "a b");
        assert_eq!(decode_query_component("a%2Bb"), "a+b");
    }

    #[test]
    fn decoding_is_idempotent_without_escapes() {
        let plain = "/icons/phone.svg";
        assert_eq!(url_decode(plain), plain);
        assert_eq!(url_decode(&url_decode(plain)), plain);
    }

    #[test]
    fn malformed_escapes_pass_through() {
        assert_eq!(url_decode("100%"), "100%");
        assert_eq!(url_decode("%G1x"), "%G1x");
        assert_eq!(url_decode("%4"), "%4");
    }

    #[test]
    fn parses_pairs() {
        let q = parse_query("a=1&b=2");
        assert_eq!(q.len(), 2);
        assert_eq!(q["a"], "1");
        assert_eq!(q["b"], "2");
    }

    #[test]
    fn key_without_value_is_empty() {
        let q = parse_query("a");
        assert_eq!(q.len(), 1);
        assert_eq!(q["a"], "");
    }

    #[test]
    fn splits_on_first_equals_and_decodes() {
        let q = parse_query("expr=x%3D1=2&name=John+Doe&&lang=FR");
        assert_eq!(q["expr"], "x=1=2");
        assert_eq!(q["name"], "John Doe");
        assert_eq!(q["lang"], "FR");
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn component_decoding_agrees_with_query_parsing() {
        for raw in ["John+Doe", "a%2Bb", "caf%C3%A9", "100%", "%G1x"] {
            let q = parse_query(&format!("k={raw}"));
            assert_eq!(q["k"], decode_query_component(raw), "{raw}");
        }
    }

    #[test]
    fn last_duplicate_wins() {
        let q = parse_query("action=left&action=stop");
        assert_eq!(q["action"], "stop");
    }
}
