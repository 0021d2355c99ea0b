//! TIMEX3 value normalization with narrative anchoring
//!
//! Relative expressions resolve against the most recent explicit date, month
//! or year seen earlier in the document. Parts that cannot be resolved are
//! written as `X`.

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::Captures;

use super::lexicon::{self, Unit};

/// Normalization strategy of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleKind {
    /// Day, month and optional year
    ExplicitDate,
    /// Month name with optional year
    MonthYear,
    Year,
    /// `heute`, `yesterday`
    RelativeWord,
    /// `nächstes Jahr`, `the previous day`
    RelativeUnit,
    /// `Vortag`, `Folgejahr`, `Vorjahresmonat`
    CompoundRelative,
    /// `vor drei Jahren`, `two weeks ago`
    Ago,
    ClockTime,
    Duration,
    Set,
}

/// Named capture groups of a rule match
#[derive(Debug, Clone, Default)]
pub(crate) struct Fields {
    pub(crate) day: Option<String>,
    pub(crate) month: Option<String>,
    pub(crate) month_name: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) modifier: Option<String>,
    pub(crate) rel: Option<String>,
    pub(crate) unit: Option<String>,
    pub(crate) amount: Option<String>,
    pub(crate) hour: Option<String>,
    pub(crate) minute: Option<String>,
    pub(crate) meridiem: Option<String>,
    pub(crate) quant: Option<String>,
    pub(crate) word: Option<String>,
}

impl Fields {
    pub(crate) fn from_captures(captures: &Captures<'_>) -> Self {
        let group = |name: &str| captures.name(name).map(|m| m.as_str().to_string());
        Self {
            day: group("day"),
            month: group("month"),
            month_name: group("month_name"),
            year: group("year"),
            modifier: group("modifier"),
            rel: group("rel"),
            unit: group("unit"),
            amount: group("amount"),
            hour: group("hour"),
            minute: group("minute"),
            meridiem: group("meridiem"),
            quant: group("quant"),
            word: group("word"),
        }
    }
}

/// Result of normalizing one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Normalized {
    pub(crate) timex_type: &'static str,
    pub(crate) value: String,
    pub(crate) modifier: Option<&'static str>,
    pub(crate) quant: Option<&'static str>,
}

impl Normalized {
    fn new(timex_type: &'static str, value: String) -> Self {
        Self {
            timex_type,
            value,
            modifier: None,
            quant: None,
        }
    }

    fn date(value: String) -> Self {
        Self::new("DATE", value)
    }
}

/// Most specific point in time mentioned so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Anchor {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl Anchor {
    pub(crate) fn new(reference: Option<NaiveDate>) -> Self {
        let mut anchor = Self::default();
        if let Some(date) = reference {
            anchor.set_date(date);
        }
        anchor
    }

    fn set_date(&mut self, date: NaiveDate) {
        self.year = Some(date.year());
        self.month = Some(date.month());
        self.day = Some(date.day());
    }

    fn set_month(&mut self, year: i32, month: u32) {
        self.year = Some(year);
        self.month = Some(month);
        self.day = None;
    }

    fn set_year(&mut self, year: i32) {
        self.year = Some(year);
        self.month = None;
        self.day = None;
    }

    fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }

    /// The same point one or more years earlier or later
    fn shift_years(&self, years: i32) -> Self {
        let mut shifted = *self;
        shifted.year = self.year.map(|year| year + years);
        if let Some(date) = self.date() {
            let months = Months::new(years.unsigned_abs() * 12);
            let date = if years < 0 {
                date.checked_sub_months(months)
            } else {
                date.checked_add_months(months)
            };
            match date {
                Some(date) => shifted.set_date(date),
                None => shifted.day = None,
            }
        }
        shifted
    }

    /// Value of the period `amount` units away from the anchor
    ///
    /// Clock units have no calendar value and yield `None`.
    fn relative(&self, unit: Unit, amount: i64) -> Option<String> {
        let value = match unit {
            Unit::Day => self
                .date()
                .and_then(|date| shift_days(date, amount))
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "XXXX-XX-XX".to_string()),
            Unit::Week => self
                .date()
                .and_then(|date| shift_days(date, amount * 7))
                .map(|date| {
                    let week = date.iso_week();
                    format!("{:04}-W{:02}", week.year(), week.week())
                })
                .unwrap_or_else(|| "XXXX-WXX".to_string()),
            Unit::Month => match (self.year, self.month) {
                (Some(year), Some(month)) => {
                    let total = i64::from(year) * 12 + i64::from(month) - 1 + amount;
                    format!("{:04}-{:02}", total.div_euclid(12), total.rem_euclid(12) + 1)
                }
                _ => "XXXX-XX".to_string(),
            },
            Unit::Year => match self.year {
                Some(year) => format!("{:04}", i64::from(year) + amount),
                None => "XXXX".to_string(),
            },
            Unit::Hour | Unit::Minute => return None,
        };
        Some(value)
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let delta = Days::new(days.unsigned_abs());
    if days < 0 {
        date.checked_sub_days(delta)
    } else {
        date.checked_add_days(delta)
    }
}

fn duration(amount: u32, unit: Unit) -> String {
    if unit.is_clock() {
        format!("PT{amount}{}", unit.designator())
    } else {
        format!("P{amount}{}", unit.designator())
    }
}

/// Normalize a match, updating `anchor` with explicit dates
///
/// Returns `None` for matches that do not denote a valid point or period,
/// such as `31.02.1984`.
pub(crate) fn normalize(kind: RuleKind, fields: &Fields, anchor: &mut Anchor) -> Option<Normalized> {
    let modifier = fields.modifier.as_deref().and_then(lexicon::modifier);
    let unit = fields.unit.as_deref().and_then(Unit::parse);

    let normalized = match kind {
        RuleKind::ExplicitDate => {
            let day: u32 = fields.day.as_deref()?.parse().ok()?;
            let month = month_of(fields)?;
            match fields.year.as_deref() {
                Some(year) => {
                    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month, day)?;
                    anchor.set_date(date);
                    Normalized::date(date.format("%Y-%m-%d").to_string())
                }
                None => match anchor.year {
                    Some(year) => {
                        let date = NaiveDate::from_ymd_opt(year, month, day)?;
                        anchor.set_date(date);
                        Normalized::date(date.format("%Y-%m-%d").to_string())
                    }
                    // Leap year so that 29 February is accepted
                    None => {
                        NaiveDate::from_ymd_opt(2000, month, day)?;
                        Normalized::date(format!("XXXX-{month:02}-{day:02}"))
                    }
                },
            }
        }
        RuleKind::MonthYear => {
            let month = month_of(fields)?;
            let value = match fields.year.as_deref() {
                Some(year) => {
                    let year = year.parse().ok()?;
                    anchor.set_month(year, month);
                    format!("{year:04}-{month:02}")
                }
                None => match anchor.year {
                    Some(year) => format!("{year:04}-{month:02}"),
                    None => format!("XXXX-{month:02}"),
                },
            };
            Normalized::date(value)
        }
        RuleKind::Year => {
            let year: i32 = fields.year.as_deref()?.parse().ok()?;
            anchor.set_year(year);
            Normalized::date(format!("{year:04}"))
        }
        RuleKind::RelativeWord => {
            let offset = lexicon::relative_day(fields.word.as_deref()?)?;
            Normalized::date(anchor.relative(Unit::Day, offset)?)
        }
        RuleKind::RelativeUnit => {
            let offset = lexicon::direction(fields.rel.as_deref()?)?;
            Normalized::date(anchor.relative(unit?, offset)?)
        }
        RuleKind::CompoundRelative => {
            let value = match fields.rel.as_deref()?.to_lowercase().as_str() {
                "vorjahres" => anchor.shift_years(-1).relative(unit?, 0)?,
                "vor" => anchor.relative(unit?, -1)?,
                "folge" => anchor.relative(unit?, 1)?,
                _ => return None,
            };
            Normalized::date(value)
        }
        RuleKind::Ago => {
            let amount = lexicon::number(fields.amount.as_deref()?)?;
            Normalized::date(anchor.relative(unit?, -i64::from(amount))?)
        }
        RuleKind::ClockTime => {
            let mut hour: u32 = fields.hour.as_deref()?.parse().ok()?;
            let minute: u32 = match fields.minute.as_deref() {
                Some(minute) => minute.parse().ok()?,
                None => 0,
            };
            if let Some(meridiem) = fields.meridiem.as_deref() {
                if hour == 0 || hour > 12 {
                    return None;
                }
                let pm = meridiem.to_lowercase().starts_with('p');
                hour = match (pm, hour) {
                    (false, 12) => 0,
                    (true, 12) => 12,
                    (true, hour) => hour + 12,
                    (false, hour) => hour,
                };
            }
            if hour > 24 || minute > 59 {
                return None;
            }
            let date = anchor
                .date()
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "XXXX-XX-XX".to_string());
            Normalized::new("TIME", format!("{date}T{hour:02}:{minute:02}"))
        }
        RuleKind::Duration => {
            let amount = lexicon::number(fields.amount.as_deref()?)?;
            Normalized::new("DURATION", duration(amount, unit?))
        }
        RuleKind::Set => {
            let unit = match unit {
                Some(unit) => unit,
                None => Unit::from_adverb(fields.word.as_deref()?)?,
            };
            let mut normalized = Normalized::new("SET", duration(1, unit));
            normalized.quant = fields.quant.as_ref().map(|_| "EACH");
            normalized
        }
    };

    Some(Normalized {
        modifier,
        ..normalized
    })
}

fn month_of(fields: &Fields) -> Option<u32> {
    let month = match (&fields.month, &fields.month_name) {
        (Some(month), _) => month.parse().ok()?,
        (None, Some(name)) => lexicon::month(name)?,
        (None, None) => return None,
    };
    (1..=12).contains(&month).then_some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        let mut fields = Fields::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "day" => fields.day = value,
                "month" => fields.month = value,
                "month_name" => fields.month_name = value,
                "year" => fields.year = value,
                "modifier" => fields.modifier = value,
                "rel" => fields.rel = value,
                "unit" => fields.unit = value,
                "amount" => fields.amount = value,
                "hour" => fields.hour = value,
                "minute" => fields.minute = value,
                "meridiem" => fields.meridiem = value,
                "quant" => fields.quant = value,
                "word" => fields.word = value,
                _ => panic!("unknown field {key}"),
            }
        }
        fields
    }

    fn value(kind: RuleKind, pairs: &[(&str, &str)], anchor: &mut Anchor) -> Option<String> {
        normalize(kind, &fields(pairs), anchor).map(|n| n.value)
    }

    #[test]
    fn test_explicit_date_sets_anchor() {
        let mut anchor = Anchor::default();
        let date = value(
            RuleKind::ExplicitDate,
            &[("day", "19"), ("month", "12"), ("year", "1984")],
            &mut anchor,
        );
        assert_eq!(date.as_deref(), Some("1984-12-19"));
        assert_eq!(anchor.date(), NaiveDate::from_ymd_opt(1984, 12, 19));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let mut anchor = Anchor::default();
        assert!(value(
            RuleKind::ExplicitDate,
            &[("day", "31"), ("month", "2"), ("year", "1984")],
            &mut anchor,
        )
        .is_none());
        assert_eq!(anchor, Anchor::default());
    }

    #[test]
    fn test_relative_expressions_use_anchor() {
        let mut anchor = Anchor::new(NaiveDate::from_ymd_opt(1984, 12, 19));

        let day_before = value(
            RuleKind::RelativeUnit,
            &[("rel", "vorherigen"), ("unit", "Tag")],
            &mut anchor,
        );
        assert_eq!(day_before.as_deref(), Some("1984-12-18"));

        let next_year = value(
            RuleKind::RelativeUnit,
            &[("rel", "nächstes"), ("unit", "Jahr")],
            &mut anchor,
        );
        assert_eq!(next_year.as_deref(), Some("1985"));

        let last_year_month = value(
            RuleKind::CompoundRelative,
            &[("rel", "Vorjahres"), ("unit", "monat")],
            &mut anchor,
        );
        assert_eq!(last_year_month.as_deref(), Some("1983-12"));

        let next_month = value(
            RuleKind::CompoundRelative,
            &[("rel", "Folge"), ("unit", "monat")],
            &mut anchor,
        );
        assert_eq!(next_month.as_deref(), Some("1985-01"));

        let week = value(RuleKind::RelativeUnit, &[("rel", "next"), ("unit", "week")], &mut anchor);
        assert_eq!(week.as_deref(), Some("1984-W52"));

        // relative expressions never move the anchor
        assert_eq!(anchor.date(), NaiveDate::from_ymd_opt(1984, 12, 19));
    }

    #[test]
    fn test_unanchored_values_use_placeholders() {
        let mut anchor = Anchor::default();
        assert_eq!(
            value(RuleKind::RelativeWord, &[("word", "gestern")], &mut anchor).as_deref(),
            Some("XXXX-XX-XX")
        );
        assert_eq!(
            value(RuleKind::RelativeUnit, &[("rel", "last"), ("unit", "month")], &mut anchor).as_deref(),
            Some("XXXX-XX")
        );
        assert_eq!(
            value(RuleKind::MonthYear, &[("month_name", "Mai")], &mut anchor).as_deref(),
            Some("XXXX-05")
        );
    }

    #[test]
    fn test_year_resets_finer_anchor() {
        let mut anchor = Anchor::new(NaiveDate::from_ymd_opt(1984, 12, 19));
        value(RuleKind::Year, &[("year", "1990")], &mut anchor);
        assert_eq!(
            value(RuleKind::RelativeWord, &[("word", "heute")], &mut anchor).as_deref(),
            Some("XXXX-XX-XX")
        );
        assert_eq!(
            value(RuleKind::Ago, &[("amount", "drei"), ("unit", "Jahren")], &mut anchor).as_deref(),
            Some("1987")
        );
    }

    #[test]
    fn test_clock_time() {
        let mut anchor = Anchor::default();
        assert_eq!(
            value(RuleKind::ClockTime, &[("hour", "14"), ("minute", "30")], &mut anchor).as_deref(),
            Some("XXXX-XX-XXT14:30")
        );
        assert_eq!(
            value(RuleKind::ClockTime, &[("hour", "5"), ("meridiem", "p.m.")], &mut anchor).as_deref(),
            Some("XXXX-XX-XXT17:00")
        );
        assert!(value(RuleKind::ClockTime, &[("hour", "27")], &mut anchor).is_none());
    }

    #[test]
    fn test_duration_and_set() {
        let mut anchor = Anchor::default();
        let duration = normalize(
            RuleKind::Duration,
            &fields(&[("amount", "drei"), ("unit", "Jahre")]),
            &mut anchor,
        )
        .unwrap();
        assert_eq!(duration.timex_type, "DURATION");
        assert_eq!(duration.value, "P3Y");

        assert_eq!(
            value(RuleKind::Duration, &[("amount", "2"), ("unit", "Stunden")], &mut anchor).as_deref(),
            Some("PT2H")
        );

        let set = normalize(
            RuleKind::Set,
            &fields(&[("quant", "jeden"), ("unit", "Tag")]),
            &mut anchor,
        )
        .unwrap();
        assert_eq!(set.timex_type, "SET");
        assert_eq!(set.value, "P1D");
        assert_eq!(set.quant, Some("EACH"));

        let adverb = normalize(RuleKind::Set, &fields(&[("word", "weekly")]), &mut anchor).unwrap();
        assert_eq!(adverb.value, "P1W");
        assert_eq!(adverb.quant, None);
    }

    #[test]
    fn test_modifier() {
        let mut anchor = Anchor::default();
        let normalized = normalize(
            RuleKind::Year,
            &fields(&[("modifier", "Ende"), ("year", "1985")]),
            &mut anchor,
        )
        .unwrap();
        assert_eq!(normalized.modifier, Some("END"));
    }
}
