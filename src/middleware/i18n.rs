// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const SUPPORTED_LANGS: [&str; 2] = ["en", "pt"];

// Extrator de idioma (usado só para as mensagens de erro)
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale("en".to_string())
    }
}

impl Locale {
    pub fn from_header(header_str: &str) -> Self {
        accept_language::intersection(header_str, &SUPPORTED_LANGS)
            .into_iter()
            .next()
            .map(Locale)
            .or_else(|| {
                // "pt-BR" -> "pt"
                accept_language::parse(header_str)
                    .first()
                    .and_then(|tag| tag.split('-').next())
                    .filter(|lang| SUPPORTED_LANGS.contains(lang))
                    .map(|lang| Locale(lang.to_string()))
            })
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regional_tag_falls_back_to_language() {
        assert_eq!(Locale::from_header("pt-BR,pt;q=0.9").0, "pt");
    }

    #[test]
    fn unsupported_language_uses_english() {
        assert_eq!(Locale::from_header("de-DE").0, "en");
    }
}
