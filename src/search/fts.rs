//! FTS5 query sanitizing.
//!
//! User search input goes straight into `MATCH`, whose grammar rejects
//! barewords like `c++` or a lone `"`. [`safe_query`] rewrites any input into
//! a query FTS5 accepts while keeping the user's terms and boolean operators.

/// Boolean operators recognized by FTS5, in canonical form.
const OPERATORS: [&str; 3] = ["AND", "OR", "NOT"];

/// Rewrites raw user input into a valid FTS5 query.
///
/// Terms are split on whitespace outside double quotes; a quoted span stays
/// one term and `""` inside it is a literal quote. `and`/`or`/`not` in any
/// case become operators, every other term is wrapped in quotes (embedded
/// quotes doubled), and a trailing operator is quoted back into a word.
///
/// Never fails: unbalanced quotes end the span at end of input. A leading
/// operator is left as is and FTS5 will reject it.
///
/// # Examples
///
/// ```
/// use monet::safe_query;
///
/// assert_eq!(safe_query("hello world"), r#""hello" "world""#);
/// assert_eq!(safe_query("x and y"), r#""x" AND "y""#);
/// assert_eq!(safe_query("c++"), r#""c++""#);
/// assert_eq!(safe_query("x and y and not"), r#""x" AND "y" AND "NOT""#);
/// assert_eq!(safe_query("   "), "");
/// ```
#[must_use]
pub fn safe_query(query: &str) -> String {
    let mut tokens: Vec<String> = tokenize(query)
        .into_iter()
        .map(normalize_operator)
        .map(|token| {
            if is_operator(&token) {
                token
            } else {
                quote(&token)
            }
        })
        .collect();

    fix_trailing_operator(&mut tokens);
    tokens.join(" ")
}

/// Splits input into terms, honoring quoted spans.
///
/// Returned terms never contain the delimiting quotes; an escaped `""`
/// contributes a single `"`.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c != '"' {
                current.push(c);
            } else if chars.next_if_eq(&'"').is_some() {
                current.push('"');
            } else {
                in_quote = false;
                flush(&mut current, &mut tokens);
            }
        } else if c == '"' {
            flush(&mut current, &mut tokens);
            in_quote = true;
        } else if c.is_whitespace() {
            flush(&mut current, &mut tokens);
        } else {
            current.push(c);
        }
    }

    flush(&mut current, &mut tokens);
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

fn normalize_operator(token: String) -> String {
    let upper = token.to_uppercase();
    if is_operator(&upper) { upper } else { token }
}

fn is_operator(token: &str) -> bool {
    OPERATORS.contains(&token)
}

fn quote(token: &str) -> String {
    format!("\"{}\"", token.replace('"', "\"\""))
}

/// A trailing operator has no right operand; FTS5 rejects it.
fn fix_trailing_operator(tokens: &mut [String]) {
    if let Some(last) = tokens.last_mut().filter(|t| is_operator(t)) {
        *last = quote(last);
    }
}
