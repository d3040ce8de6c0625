use pluralizer::pluralize;

/// Converts a camelCase or PascalCase string to snake_case.
///
/// An underscore is inserted before an uppercase letter that follows a
/// lowercase letter or digit, and before the last letter of an acronym that
/// starts a new word (`HTTPServer` becomes `http_server`).
///
/// # Examples
///
/// ```
/// use extended_db::utils::strings::camel_to_snake_case;
///
/// assert_eq!(camel_to_snake_case("camelCase"), "camel_case");
/// assert_eq!(camel_to_snake_case("ThisIsATest"), "this_is_a_test");
/// ```
pub fn camel_to_snake_case(camel: &str) -> String {
    let chars: Vec<char> = camel.chars().collect();
    let mut snake = String::with_capacity(camel.len() + 4);

    for (i, current) in chars.iter().enumerate() {
        if current.is_ascii_uppercase() && i > 0 {
            let previous = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase());
            if previous.is_ascii_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_ascii_uppercase() && next_is_lower)
            {
                snake.push('_');
            }
        }
        snake.push(current.to_ascii_lowercase());
    }

    snake
}

/// The last path segment of a type name, without generic arguments.
///
/// `my_app::models::UserAccount` becomes `UserAccount`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Table name derived from a type name: snake_case, then pluralized.
pub fn table_name_for(type_name: &str) -> String {
    pluralize(&camel_to_snake_case(short_type_name(type_name)), 2, false)
}

/// Whether `name` can be used unquoted as a table or column name.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
