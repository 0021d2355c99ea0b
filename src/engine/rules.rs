//! Rule-based German and English tagger

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use regex::Regex;

use crate::cas::{AnnotationKind, Document, TextIndex, Timex3};

use super::normalize::{normalize, Anchor, Fields, RuleKind};
use super::{check_input, EngineConfig, EngineError, Language, TimexEngine};

// ============================================================================
// Patterns
// ============================================================================

const DE_PREPOSITION: &str = r"(?:(?P<prep>am|im|vom|seit|bis|ab|um|gegen|zum|zur|an|in)\s+)?";
const DE_MONTH: &str =
    "januar|jänner|februar|märz|april|mai|juni|juli|august|september|oktober|november|dezember";
const DE_NUMBER: &str =
    r"\d{1,3}|eine[nmr]?|ein|zwei|drei|vier|fünf|sechs|sieben|acht|neun|zehn|elf|zwölf";
const DE_CALENDAR_UNIT: &str = r"tag(?:e|en|es)?|woche(?:n)?|monat(?:e|en|s|es)?|jahr(?:e|en|s|es)?";
const DE_CLOCK_UNIT: &str = r"stunde(?:n)?|minute(?:n)?";

const EN_PREPOSITION: &str = r"(?:(?P<prep>on|in|at|since|until|from|by|during)\s+)?";
const EN_MONTH: &str =
    "january|february|march|april|may|june|july|august|september|october|november|december";
const EN_NUMBER: &str =
    r"\d{1,3}|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";
const EN_CALENDAR_UNIT: &str = r"days?|weeks?|months?|years?";
const EN_CLOCK_UNIT: &str = r"hours?|minutes?";

const YEAR: &str = r"(?P<year>1\d{3}|20\d{2})";

fn german_rules() -> Vec<(&'static str, RuleKind, String)> {
    let p = DE_PREPOSITION;
    vec![
        (
            "date_numeric",
            RuleKind::ExplicitDate,
            format!(r"{p}(?P<day>\d{{1,2}})\.\s?(?P<month>\d{{1,2}})\.\s?(?P<year>\d{{4}})\b"),
        ),
        (
            "date_iso",
            RuleKind::ExplicitDate,
            format!(r"{p}(?P<year>\d{{4}})-(?P<month>\d{{1,2}})-(?P<day>\d{{1,2}})\b"),
        ),
        (
            "date_month_name",
            RuleKind::ExplicitDate,
            format!(r"{p}(?P<day>\d{{1,2}})\.\s*(?P<month_name>{DE_MONTH})(?:\s+(?P<year>\d{{4}}))?\b"),
        ),
        (
            "month_year",
            RuleKind::MonthYear,
            format!(r"{p}(?:(?P<modifier>anfang|mitte|ende)\s+)?(?P<month_name>{DE_MONTH})(?:\s+(?P<year>\d{{4}}))?\b"),
        ),
        (
            "year",
            RuleKind::Year,
            format!(r"{p}(?:(?P<modifier>anfang|mitte|ende)\s+)?(?:(?:des\s+)?jahre?s?\s+)?{YEAR}\b"),
        ),
        (
            "relative_day_word",
            RuleKind::RelativeWord,
            format!(r"{p}(?P<word>vorgestern|gestern|heute|übermorgen|morgen)\b"),
        ),
        (
            "relative_unit",
            RuleKind::RelativeUnit,
            format!(
                r"{p}(?:(?:der|die|das|den|dem|des)\s+)?(?P<rel>(?:vorig|vorherig|letzt|vergangen|nächst|kommend|darauffolgend|folgend|dies)(?:e|en|er|es|em)?)\s+(?P<unit>{DE_CALENDAR_UNIT})\b"
            ),
        ),
        (
            "relative_compound",
            RuleKind::CompoundRelative,
            format!(r"{p}(?P<rel>vorjahres|vor|folge)(?P<unit>tag|woche|monat|jahr)(?:e?s)?\b"),
        ),
        (
            "relative_ago",
            RuleKind::Ago,
            format!(r"vor\s+(?P<amount>{DE_NUMBER})\s+(?P<unit>{DE_CALENDAR_UNIT})\b"),
        ),
        (
            "clock_time",
            RuleKind::ClockTime,
            format!(r"{p}(?P<hour>\d{{1,2}})(?:[:.](?P<minute>\d{{2}}))?\s*uhr\b"),
        ),
        (
            "duration",
            RuleKind::Duration,
            format!(r"(?P<amount>{DE_NUMBER})\s+(?P<unit>{DE_CALENDAR_UNIT}|{DE_CLOCK_UNIT})\b"),
        ),
        (
            "set_each",
            RuleKind::Set,
            r"(?P<quant>jede[nrs]?)\s+(?P<unit>tag|woche|monat|jahr)\b".to_string(),
        ),
        (
            "set_adverb",
            RuleKind::Set,
            r"(?P<word>täglich|wöchentlich|monatlich|jährlich)\b".to_string(),
        ),
    ]
}

fn english_rules() -> Vec<(&'static str, RuleKind, String)> {
    let p = EN_PREPOSITION;
    vec![
        (
            "date_month_day",
            RuleKind::ExplicitDate,
            format!(r"{p}(?P<month_name>{EN_MONTH})\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(?P<year>\d{{4}}))?\b"),
        ),
        (
            "date_day_month",
            RuleKind::ExplicitDate,
            format!(r"{p}(?:the\s+)?(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<month_name>{EN_MONTH})(?:,?\s+(?P<year>\d{{4}}))?\b"),
        ),
        (
            "date_slash",
            RuleKind::ExplicitDate,
            format!(r"{p}(?P<month>\d{{1,2}})/(?P<day>\d{{1,2}})/(?P<year>\d{{4}})\b"),
        ),
        (
            "date_iso",
            RuleKind::ExplicitDate,
            format!(r"{p}(?P<year>\d{{4}})-(?P<month>\d{{1,2}})-(?P<day>\d{{1,2}})\b"),
        ),
        (
            "month_year",
            RuleKind::MonthYear,
            format!(r"{p}(?:(?P<modifier>early|mid|late)[\s-]+)?(?P<month_name>{EN_MONTH}),?\s+(?P<year>\d{{4}})\b"),
        ),
        (
            "year",
            RuleKind::Year,
            format!(r"{p}(?:(?P<modifier>early|mid|late)[\s-]+)?(?:the\s+year\s+)?{YEAR}\b"),
        ),
        (
            "relative_day_word",
            RuleKind::RelativeWord,
            format!(r"{p}(?P<word>yesterday|today|tomorrow)\b"),
        ),
        (
            "relative_unit",
            RuleKind::RelativeUnit,
            format!(
                r"{p}(?:the\s+)?(?P<rel>last|previous|past|next|following|coming|this|current)\s+(?P<unit>day|week|month|year)\b"
            ),
        ),
        (
            "relative_ago",
            RuleKind::Ago,
            format!(r"(?P<amount>{EN_NUMBER})\s+(?P<unit>{EN_CALENDAR_UNIT})\s+ago\b"),
        ),
        (
            "clock_time",
            RuleKind::ClockTime,
            format!(r"{p}(?P<hour>\d{{1,2}})(?::(?P<minute>\d{{2}}))?\s*(?P<meridiem>[ap]\.m\.|[ap]m\b)"),
        ),
        (
            "duration",
            RuleKind::Duration,
            format!(r"(?P<amount>{EN_NUMBER})\s+(?P<unit>{EN_CALENDAR_UNIT}|{EN_CLOCK_UNIT})\b"),
        ),
        (
            "set_each",
            RuleKind::Set,
            r"(?P<quant>every|each)\s+(?P<unit>day|week|month|year)\b".to_string(),
        ),
        (
            "set_adverb",
            RuleKind::Set,
            r"(?P<word>daily|weekly|monthly|yearly|annually)\b".to_string(),
        ),
    ]
}

// ============================================================================
// Tagger
// ============================================================================

struct Rule {
    name: &'static str,
    kind: RuleKind,
    regex: Regex,
}

/// Match of one rule, in byte offsets of the document text
struct Candidate {
    start: usize,
    end: usize,
    rule: usize,
    fields: Fields,
}

/// Regex tagger for German and English time expressions
///
/// Expressions are searched sentence by sentence. Where matches overlap the
/// longest one wins, so `Am 19.12.1984` is a single date and not a date plus
/// a year.
pub struct RuleTagger {
    config: EngineConfig,
    default_language: Language,
    rules: HashMap<Language, Vec<Rule>>,
}

impl std::fmt::Debug for RuleTagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleTagger")
            .field("config", &self.config)
            .field("languages", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleTagger {
    /// Compile the rule sets of all languages
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let default_language = Language::from_tag(&config.default_language)?;

        let mut rules = HashMap::new();
        for language in Language::ALL {
            let patterns = match language {
                Language::German => german_rules(),
                Language::English => english_rules(),
            };
            let compiled = patterns
                .into_iter()
                .map(|(name, kind, pattern)| {
                    Regex::new(&format!(r"(?i)\b{pattern}"))
                        .map(|regex| Rule { name, kind, regex })
                        .map_err(|e| EngineError::Rule {
                            rule: format!("{}/{name}", language.code()),
                            reason: e.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rules.insert(language, compiled);
        }

        tracing::debug!(
            default_language = default_language.code(),
            reference_date = ?config.reference_date,
            "Compiled tagger rules"
        );

        Ok(Self {
            config,
            default_language,
            rules,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn candidates(&self, doc: &Document, index: &TextIndex, rules: &[Rule]) -> Vec<Candidate> {
        let text = doc.text();
        let mut candidates = Vec::new();

        for sentence in doc.sentences() {
            let Some(range) = index.byte_range(sentence.begin, sentence.end) else {
                continue;
            };
            let sentence_text = &text[range.clone()];

            for (rule_index, rule) in rules.iter().enumerate() {
                for captures in rule.regex.captures_iter(sentence_text) {
                    let Some(whole) = captures.get(0) else {
                        continue;
                    };
                    candidates.push(Candidate {
                        start: range.start + whole.start(),
                        end: range.start + whole.end(),
                        rule: rule_index,
                        fields: Fields::from_captures(&captures),
                    });
                }
            }
        }

        resolve_overlaps(candidates)
    }
}

/// Keep the longest of overlapping matches, earlier rules first on ties, and
/// return the survivors in text order
fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
            .then(a.rule.cmp(&b.rule))
    });

    let mut accepted: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.start == candidate.end {
            continue;
        }
        let free = accepted
            .iter()
            .all(|kept| candidate.end <= kept.start || candidate.start >= kept.end);
        if free {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|candidate| candidate.start);
    accepted
}

impl TimexEngine for RuleTagger {
    fn name(&self) -> &str {
        "rule-tagger"
    }

    fn process(&mut self, doc: &mut Document) -> Result<usize, EngineError> {
        check_input(doc)?;
        if doc.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let language = Language::for_document(doc.language(), self.default_language)?;
        let rules = self
            .rules
            .get(&language)
            .ok_or_else(|| EngineError::UnsupportedLanguage(doc.language().to_string()))?;

        let index = doc.text_index();
        let candidates = self.candidates(doc, &index, rules);

        // Re-tagging a document must not duplicate expressions
        let existing: HashSet<(usize, usize)> =
            doc.timexes().map(|(annotation, _)| annotation.span()).collect();
        let mut next_id = doc.timexes().count() + 1;

        let mut anchor = Anchor::new(self.config.reference_date);
        let mut added = 0;

        for candidate in candidates {
            let rule = &rules[candidate.rule];
            let Some(normalized) = normalize(rule.kind, &candidate.fields, &mut anchor) else {
                tracing::trace!(rule = rule.name, start = candidate.start, "Discarded match");
                continue;
            };

            let begin = index.utf16_offset(candidate.start);
            let end = index.utf16_offset(candidate.end);
            if existing.contains(&(begin, end)) {
                continue;
            }

            doc.add(
                begin,
                end,
                AnnotationKind::Timex3(Timex3 {
                    timex_id: format!("t{next_id}"),
                    timex_type: normalized.timex_type.to_string(),
                    timex_value: normalized.value,
                    timex_quant: normalized.quant.map(str::to_string),
                    timex_freq: None,
                    timex_mod: normalized.modifier.map(str::to_string),
                    found_by_rule: Some(rule.name.to_string()),
                }),
            )?;
            next_id += 1;
            added += 1;
        }

        tracing::debug!(
            language = language.code(),
            timexes = added,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tagged document"
        );

        Ok(added)
    }
}
