/// A lazily compiled, process-wide `Regex` for a literal pattern.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("static regex"));
        &*RE
    }};
}

/// Build a `UserContext` from JSON literal syntax.
#[cfg(test)]
macro_rules! context {
    ($($json:tt)+) => {
        serde_json::from_value::<$crate::facts::UserContext>(serde_json::json!($($json)+))
            .expect("valid user context")
    };
}
