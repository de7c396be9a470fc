//! Language tag display names.
//!
//! Containers tag streams with ISO 639-2 codes (`jpn`, `chi`/`zho`), and
//! sometimes ISO 639-1 (`ja`). Unknown tags are shown verbatim.

/// (code, English name); bibliographic and terminological 639-2 codes both listed.
const LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("ara", "Arabic"),
    ("ca", "Catalan"),
    ("cat", "Catalan"),
    ("chi", "Chinese"),
    ("zho", "Chinese"),
    ("zh", "Chinese"),
    ("cze", "Czech"),
    ("ces", "Czech"),
    ("cs", "Czech"),
    ("dan", "Danish"),
    ("da", "Danish"),
    ("dut", "Dutch"),
    ("nld", "Dutch"),
    ("nl", "Dutch"),
    ("eng", "English"),
    ("en", "English"),
    ("fin", "Finnish"),
    ("fi", "Finnish"),
    ("fre", "French"),
    ("fra", "French"),
    ("fr", "French"),
    ("ger", "German"),
    ("deu", "German"),
    ("de", "German"),
    ("gre", "Greek"),
    ("ell", "Greek"),
    ("el", "Greek"),
    ("heb", "Hebrew"),
    ("he", "Hebrew"),
    ("hin", "Hindi"),
    ("hi", "Hindi"),
    ("hun", "Hungarian"),
    ("hu", "Hungarian"),
    ("ind", "Indonesian"),
    ("id", "Indonesian"),
    ("ita", "Italian"),
    ("it", "Italian"),
    ("jpn", "Japanese"),
    ("ja", "Japanese"),
    ("kor", "Korean"),
    ("ko", "Korean"),
    ("may", "Malay"),
    ("msa", "Malay"),
    ("ms", "Malay"),
    ("nor", "Norwegian"),
    ("no", "Norwegian"),
    ("pol", "Polish"),
    ("pl", "Polish"),
    ("por", "Portuguese"),
    ("pt", "Portuguese"),
    ("rum", "Romanian"),
    ("ron", "Romanian"),
    ("ro", "Romanian"),
    ("rus", "Russian"),
    ("ru", "Russian"),
    ("spa", "Spanish"),
    ("es", "Spanish"),
    ("swe", "Swedish"),
    ("sv", "Swedish"),
    ("tha", "Thai"),
    ("th", "Thai"),
    ("tur", "Turkish"),
    ("tr", "Turkish"),
    ("ukr", "Ukrainian"),
    ("uk", "Ukrainian"),
    ("vie", "Vietnamese"),
    ("vi", "Vietnamese"),
    ("mul", "Multiple languages"),
    ("und", "Undetermined"),
    ("zxx", "No linguistic content"),
];

/// English name for a stream language tag, or the tag itself when unknown.
pub fn language_name(tag: &str) -> String {
    let lower = tag.trim().to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(code, _)| *code == lower)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| tag.trim().to_string())
}
