pub mod mysql;
pub mod postgres;

/// Wrap `name` in `quote`, doubling any embedded quote character.
pub fn escape_identifier(name: &str, quote: char) -> String {
    let doubled = format!("{}{}", quote, quote);
    format!(
        "{}{}{}",
        quote,
        name.replace(quote, &doubled),
        quote
    )
}

/// `'a', 'b'` with embedded single quotes doubled.
pub fn quote_literals(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}
