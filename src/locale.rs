//! Host locale preference snapshot, used by `NATIVE_LANGS` filtering.
//!
//! Read once at the start of a compile and captured in the compile helper;
//! later changes to the host environment do not affect an in-flight compile.

/// Ordered list of acceptable `xml:lang` values, derived from `LANG`/`LC_ALL`.
/// Falls back to `["C"]` when nothing useful is set, mirroring
/// `g_get_language_names`'s behavior in the untranslated case.
pub fn snapshot_preferred_locales() -> Vec<String> {
    let raw = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LC_MESSAGES"))
        .or_else(|_| std::env::var("LANG"))
        .unwrap_or_default();

    let mut out = Vec::new();
    // "en_US.UTF-8" -> "en_US", "en", "C"
    let lang_part = raw.split('.').next().unwrap_or("");
    if !lang_part.is_empty() && lang_part != "C" && lang_part != "POSIX" {
        out.push(lang_part.to_string());
        if let Some((base, _)) = lang_part.split_once('_') {
            out.push(base.to_string());
        }
    }
    out.push("C".to_string());
    out
}
