use url::Url;

/// Normalizes a discovered href: strips any `#fragment` and resolves
/// relative paths against the base URL. Best effort; malformed input
/// passes through with only the fragment removed.
pub fn normalize(raw: &str, base: &str) -> String {
    let trimmed = raw.trim();
    let without_fragment = match trimmed.find('#') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };

    if without_fragment.starts_with("http://") || without_fragment.starts_with("https://") {
        return without_fragment.to_string();
    }

    match Url::parse(base) {
        Ok(base_url) => base_url
            .join(without_fragment)
            .map(|joined| joined.to_string())
            .unwrap_or_else(|_| format!("{}{}", base, without_fragment)),
        Err(_) => format!("{}{}", base, without_fragment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://news.example.com.br";

    #[test]
    fn test_strips_fragment() {
        assert_eq!(
            normalize("https://news.example.com.br/mercados/dolar#comentarios", BASE),
            "https://news.example.com.br/mercados/dolar"
        );
    }

    #[test]
    fn test_resolves_relative_path() {
        assert_eq!(
            normalize("/mercados/dolar", BASE),
            "https://news.example.com.br/mercados/dolar"
        );
    }

    #[test]
    fn test_relative_with_fragment() {
        assert_eq!(
            normalize("/mercados/dolar#topo", BASE),
            "https://news.example.com.br/mercados/dolar"
        );
    }

    #[test]
    fn test_absolute_url_untouched() {
        assert_eq!(
            normalize("https://outro.site/noticia", BASE),
            "https://outro.site/noticia"
        );
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(
            normalize("  /mercados/dolar  ", BASE),
            "https://news.example.com.br/mercados/dolar"
        );
    }

    #[test]
    fn test_malformed_base_falls_back_to_concat() {
        assert_eq!(normalize("/a", "not a url"), "not a url/a");
    }
}
