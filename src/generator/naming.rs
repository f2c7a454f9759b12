//! Identifier helpers shared by the built-in layers.

use crate::schema::{Field, FieldType, ScalarType};

/// Convert a snake_case or camelCase name to PascalCase.
///
/// ```rust,ignore
/// assert_eq!(to_pascal_case("user_profile"), "UserProfile");
/// assert_eq!(to_pascal_case("blogPost"), "BlogPost");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-'])
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert a PascalCase or camelCase name to snake_case.
///
/// Runs of capitals stay together: `HTTPRequest` becomes `http_request`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

pub fn to_kebab_case(s: &str) -> String {
    to_snake_case(s).replace('_', "-")
}

/// English plural good enough for route segments and method names.
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Escape Rust keywords as raw identifiers.
pub fn sanitize_rust_identifier(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
        "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
        "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
        "await", "dyn",
    ];
    // `self`, `Self`, `super` and `crate` cannot be raw identifiers.
    const RESERVED: &[&str] = &["self", "Self", "super", "crate"];
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else if RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Field name as a Rust struct member.
pub fn field_ident(name: &str) -> String {
    sanitize_rust_identifier(&to_snake_case(name))
}

/// Rust type of a scalar column in generated code.
pub fn scalar_rust_type(ty: ScalarType) -> &'static str {
    match ty {
        ScalarType::String | ScalarType::Decimal => "String",
        ScalarType::Boolean => "bool",
        ScalarType::Int => "i32",
        ScalarType::BigInt => "i64",
        ScalarType::Float => "f64",
        ScalarType::DateTime => "chrono::DateTime<chrono::Utc>",
        ScalarType::Json => "serde_json::Value",
        ScalarType::Bytes => "Vec<u8>",
    }
}

/// Rust type of a non-relation field, without the `Option` wrapper.
///
/// Enum values travel as strings; the validator layer checks membership.
pub fn base_rust_type(field: &Field) -> Option<String> {
    let inner = match &field.field_type {
        FieldType::Scalar(ty) => scalar_rust_type(*ty).to_string(),
        FieldType::Enum(_) => "String".to_string(),
        FieldType::Relation(_) => return None,
    };
    Some(if field.is_list {
        format!("Vec<{inner}>")
    } else {
        inner
    })
}
