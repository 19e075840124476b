use symbol_index::TypeRef;

pub const SYNTHETIC_PREFIX: &str = "Observe";
pub const SYNTHETIC_SUFFIX: &str = "SideEffectService";

/// `cache-invalidate` → `CacheInvalidate`. Splits on `-`, `_`, `.` and spaces.
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `Observe{Aspect}{ObservedType}SideEffectService`
pub fn synthetic_step_name(aspect: &str, observed: &TypeRef) -> String {
    format!(
        "{}{}{}{}",
        SYNTHETIC_PREFIX,
        pascal_case(aspect),
        observed.simple_name(),
        SYNTHETIC_SUFFIX
    )
}
