//! Keyword-rule classifier.

use brain_core::{
    async_trait, tags, BrainError, Classification, Entities, HistoryMessage, IntentClassifier,
};
use regex::Regex;

/// Keywords per tag, English and Portuguese. Matched on word boundaries,
/// case-insensitively.
const TAG_KEYWORDS: &[(&str, &[&str])] = &[
    (
        tags::CLOSING_INTENT,
        &[
            "want to buy",
            "let's close",
            "close the deal",
            "ready to sign",
            "where do i sign",
            "quero fechar",
            "vamos fechar",
            "quero comprar",
            "pode instalar",
        ],
    ),
    (
        tags::OWN_THEFT,
        &["stole", "stolen", "robbed", "roubaram", "fui roubado", "levaram"],
    ),
    (
        tags::QUOTE_REQUEST,
        &[
            "price",
            "how much",
            "cost",
            "quote",
            "preço",
            "valor",
            "quanto custa",
            "orçamento",
        ],
    ),
    (
        tags::REGIONAL_INSECURITY,
        &[
            "neighbor",
            "neighbour",
            "in the region",
            "around here",
            "na região",
            "vizinho",
        ],
    ),
    (
        tags::OPERATIONAL_LOSS,
        &[
            "downtime",
            "pivot stopped",
            "lose the harvest",
            "pivô parado",
            "perder a safra",
        ],
    ),
    (
        tags::PREVENTION,
        &["protect", "prevent", "peace of mind", "proteger", "ficar tranquilo"],
    ),
    (
        tags::PRICE_OBJECTION,
        &["expensive", "too much", "can't afford", "caro", "muito caro"],
    ),
    (
        tags::DEFERRAL_OBJECTION,
        &[
            "later",
            "next month",
            "think about it",
            "depois",
            "mais tarde",
            "vou pensar",
        ],
    ),
    (
        tags::DELIVERY_TIMELINE_QUESTION,
        &[
            "how long",
            "delivery",
            "when can you",
            "lead time",
            "prazo",
            "entrega",
            "quando chega",
        ],
    ),
    (tags::VIDEO_REQUEST, &["video", "vídeo", "demo"]),
    (
        tags::GENERAL_INFO_REQUEST,
        &[
            "how does it work",
            "tell me more",
            "more information",
            "como funciona",
            "me explica",
            "saber mais",
        ],
    ),
    (
        tags::GREETING,
        &[
            "hi",
            "hello",
            "hey",
            "good morning",
            "good afternoon",
            "oi",
            "olá",
            "bom dia",
            "boa tarde",
        ],
    ),
    (
        tags::CURIOSITY_ONLY,
        &["just curious", "just looking", "só curiosidade", "só olhando"],
    ),
    (
        tags::COMPETITOR_MENTIONED,
        &["competitor", "another company", "concorrente", "outra empresa"],
    ),
    (
        tags::OUT_OF_SCOPE,
        &["weather", "football", "futebol", "previsão do tempo"],
    ),
];

/// Profile keywords with weights. Ties resolve in this order.
const PROFILE_RULES: &[(&str, &[(&str, i32)])] = &[
    (
        "skeptical",
        &[
            ("price", 2),
            ("how much", 2),
            ("preço", 2),
            ("quanto custa", 2),
            ("does it work", 1),
            ("is it safe", 1),
            ("warranty", 1),
            ("garantia", 1),
        ],
    ),
    (
        "technical",
        &[
            ("system", 2),
            ("technology", 2),
            ("sistema", 2),
            ("tecnologia", 2),
            ("satellite", 1),
            ("satélite", 1),
            ("integrate", 1),
            ("how it works", 1),
        ],
    ),
    (
        "curious",
        &[
            ("tell me more", 2),
            ("saber mais", 2),
            ("me explica", 2),
            ("details", 1),
            ("detalhes", 1),
        ],
    ),
    (
        "informal",
        &[
            ("hey", 1),
            ("oi", 1),
            ("e aí", 1),
            ("bom dia", 1),
            ("tudo bem", 1),
            ("theft", -1),
            ("roubo", -1),
        ],
    ),
];

fn keyword_pattern(keywords: &[&str]) -> String {
    let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    format!(r"(?i)\b(?:{})\b", alternatives.join("|"))
}

/// Score `text` against the profile rules.
///
/// Returns `"neutral"` when no rule scores above zero.
pub fn classify_profile(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let mut best = ("neutral", 0);

    for (profile, rules) in PROFILE_RULES {
        let score: i32 = rules
            .iter()
            .filter(|(keyword, _)| lower.contains(keyword))
            .map(|(_, weight)| weight)
            .sum();
        if score > best.1 {
            best = (profile, score);
        }
    }

    best.0
}

struct TagRule {
    tag: &'static str,
    pattern: Regex,
}

/// A classifier built from fixed keyword rules.
///
/// It never fails and is fully deterministic, so it doubles as an offline
/// backend for the live bot.
pub struct KeywordClassifier {
    rules: Vec<TagRule>,
    pivots: Option<Regex>,
    pumps: Option<Regex>,
    name: Option<Regex>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordClassifier {
    pub fn new() -> Self {
        let rules = TAG_KEYWORDS
            .iter()
            .filter_map(|(tag, keywords)| {
                Regex::new(&keyword_pattern(keywords))
                    .ok()
                    .map(|pattern| TagRule { tag, pattern })
            })
            .collect();

        Self {
            rules,
            pivots: Regex::new(r"(?i)(\d+)\s*(?:pivots?|piv[oô]s?)").ok(),
            pumps: Regex::new(r"(?i)(\d+)\s*(?:pump|bomba|casas? de bomba)").ok(),
            name: Regex::new(r"(?i)\b(?:my name is|meu nome é|me chamo)\s+(\p{L}+(?:\s+\p{L}+)?)")
                .ok(),
        }
    }

    fn capture_count(pattern: &Option<Regex>, text: &str) -> Option<u32> {
        pattern
            .as_ref()?
            .captures(text)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
    }

    fn extract_entities(&self, text: &str) -> Entities {
        let name = self
            .name
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        Entities {
            name,
            pivot_count: Self::capture_count(&self.pivots, text),
            pump_count: Self::capture_count(&self.pumps, text),
            ..Default::default()
        }
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(
        &self,
        text: &str,
        _history: &[HistoryMessage],
    ) -> Result<Classification, BrainError> {
        let mut classification = Classification::default();

        for rule in &self.rules {
            if rule.pattern.is_match(text) {
                classification.tags.insert(rule.tag.to_string());
            }
        }

        classification.entities = self.extract_entities(text);
        if classification.entities.pivot_count.is_some()
            || classification.entities.pump_count.is_some()
        {
            classification.tags.insert(tags::QUANTITY_GIVEN.to_string());
        }

        let profile = classify_profile(text);
        if profile != "neutral" {
            classification.profile = Some(profile.to_string());
        }

        Ok(classification)
    }

    fn name(&self) -> &str {
        "KeywordClassifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_rules_compile() {
        let classifier = KeywordClassifier::new();
        assert_eq!(classifier.rules.len(), TAG_KEYWORDS.len());
        assert!(classifier.pivots.is_some());
        assert!(classifier.pumps.is_some());
        assert!(classifier.name.is_some());
    }

    #[tokio::test]
    async fn test_detects_tags() {
        let classifier = KeywordClassifier::new();

        let result = classifier
            .classify("They stole the cables last week, how much is it?", &[])
            .await
            .unwrap();
        assert!(result.has_tag(tags::OWN_THEFT));
        assert!(result.has_tag(tags::QUOTE_REQUEST));
        assert!(!result.has_tag(tags::GREETING));
    }

    #[tokio::test]
    async fn test_word_boundaries() {
        let classifier = KeywordClassifier::new();

        // "this" must not match the "hi" greeting
        let result = classifier.classify("this is odd", &[]).await.unwrap();
        assert!(!result.has_tag(tags::GREETING));

        let result = classifier.classify("Oi, bom dia!", &[]).await.unwrap();
        assert!(result.has_tag(tags::GREETING));
    }

    #[tokio::test]
    async fn test_extracts_quantities() {
        let classifier = KeywordClassifier::new();
        let result = classifier
            .classify("I have 3 pivots and 2 pumps", &[])
            .await
            .unwrap();

        assert_eq!(result.entities.pivot_count, Some(3));
        assert_eq!(result.entities.pump_count, Some(2));
        assert!(result.has_tag(tags::QUANTITY_GIVEN));
    }

    #[tokio::test]
    async fn test_extracts_name() {
        let classifier = KeywordClassifier::new();
        let result = classifier.classify("Hello, my name is João", &[]).await.unwrap();
        assert_eq!(result.entities.name.as_deref(), Some("João"));
    }

    #[test]
    fn test_classify_profile() {
        assert_eq!(classify_profile("What technology does the system use?"), "technical");
        assert_eq!(classify_profile("quanto custa? tem garantia?"), "skeptical");
        assert_eq!(classify_profile("ok"), "neutral");
        // Theft words pull the informal score down.
        assert_eq!(classify_profile("oi, teve roubo aqui"), "neutral");
    }
}
