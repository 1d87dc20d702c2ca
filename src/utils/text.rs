use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical form of a city name.
///
/// Decomposes to NFKD, drops combining marks, lowercases and collapses
/// whitespace. Every city name stored in the gazetteer, the route index, the
/// nearby index and on cargo locations goes through this before comparison.
pub fn normalize_city_name(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        match fold_letter(c) {
            Some(ascii) => folded.push_str(ascii),
            None => folded.push(c),
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase letters with no NFKD decomposition.
fn fold_letter(c: char) -> Option<&'static str> {
    Some(match c {
        'ł' => "l",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ħ' => "h",
        'ı' => "i",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        _ => return None,
    })
}

/// Country codes are compared upper-case without surrounding whitespace.
pub fn normalize_country_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accents_and_case_fold_away() {
        assert_eq!(normalize_city_name("Poznań"), "poznan");
        assert_eq!(normalize_city_name("POZNAN"), "poznan");
        assert_eq!(normalize_city_name("Győr"), "gyor");
        assert_eq!(normalize_city_name("Zürich"), "zurich");
    }

    #[test]
    fn test_letters_without_decomposition() {
        assert_eq!(normalize_city_name("Łódź"), "lodz");
        assert_eq!(normalize_city_name("Białystok"), normalize_city_name("BIALYSTOK"));
        assert_eq!(normalize_city_name("Gießen"), "giessen");
        assert_eq!(normalize_city_name("Tønder"), "tonder");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(normalize_city_name("  Frankfurt   (Oder) "), "frankfurt (oder)");
        assert_eq!(normalize_city_name("   "), "");
    }

    #[test]
    fn test_country_code() {
        assert_eq!(normalize_country_code(" de "), "DE");
    }
}
