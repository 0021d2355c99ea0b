//! Word lists shared by the German and English rules

/// Calendar and clock units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    /// Parse a unit noun in any inflection (`Tage`, `Jahres`, `months`)
    pub(crate) fn parse(word: &str) -> Option<Self> {
        let word = word.to_lowercase();
        [
            ("tag", Self::Day),
            ("day", Self::Day),
            ("woche", Self::Week),
            ("week", Self::Week),
            ("monat", Self::Month),
            ("month", Self::Month),
            ("jahr", Self::Year),
            ("year", Self::Year),
            ("stunde", Self::Hour),
            ("hour", Self::Hour),
            ("minute", Self::Minute),
        ]
        .into_iter()
        .find(|(prefix, _)| word.starts_with(prefix))
        .map(|(_, unit)| unit)
    }

    /// Unit of a frequency adverb (`täglich`, `weekly`)
    pub(crate) fn from_adverb(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "täglich" | "daily" => Some(Self::Day),
            "wöchentlich" | "weekly" => Some(Self::Week),
            "monatlich" | "monthly" => Some(Self::Month),
            "jährlich" | "yearly" | "annually" => Some(Self::Year),
            _ => None,
        }
    }

    /// TIMEX3 duration designator
    pub(crate) fn designator(self) -> &'static str {
        match self {
            Self::Minute | Self::Month => "M",
            Self::Hour => "H",
            Self::Day => "D",
            Self::Week => "W",
            Self::Year => "Y",
        }
    }

    pub(crate) fn is_clock(self) -> bool {
        matches!(self, Self::Minute | Self::Hour)
    }
}

/// Month number of a German or English month name
pub(crate) fn month(word: &str) -> Option<u32> {
    let stem: String = word.to_lowercase().chars().take(3).collect();
    let month = match stem.as_str() {
        "jan" | "jän" => 1,
        "feb" => 2,
        "mär" | "mar" => 3,
        "apr" => 4,
        "mai" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "okt" | "oct" => 10,
        "nov" => 11,
        "dez" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Value of a cardinal written as digits or as a word
pub(crate) fn number(word: &str) -> Option<u32> {
    if let Ok(value) = word.parse() {
        return Some(value);
    }
    let value = match word.to_lowercase().as_str() {
        "a" | "an" | "one" | "ein" | "eine" | "einen" | "einem" | "einer" => 1,
        "two" | "zwei" => 2,
        "three" | "drei" => 3,
        "four" | "vier" => 4,
        "five" | "fünf" => 5,
        "six" | "sechs" => 6,
        "seven" | "sieben" => 7,
        "eight" | "acht" => 8,
        "nine" | "neun" => 9,
        "ten" | "zehn" => 10,
        "eleven" | "elf" => 11,
        "twelve" | "zwölf" => 12,
        _ => return None,
    };
    Some(value)
}

/// Direction of a relative determiner: -1 past, 0 current, 1 future
pub(crate) fn direction(word: &str) -> Option<i64> {
    let word = word.to_lowercase();
    let starts = |prefixes: &[&str]| prefixes.iter().any(|prefix| word.starts_with(prefix));

    if starts(&["vorig", "vorherig", "letzt", "vergangen", "last", "previous", "past"]) {
        Some(-1)
    } else if starts(&[
        "nächst",
        "kommend",
        "folgend",
        "darauffolgend",
        "next",
        "following",
        "coming",
    ]) {
        Some(1)
    } else if starts(&["dies", "this", "current"]) {
        Some(0)
    } else {
        None
    }
}

/// Day offset of deictic day words
pub(crate) fn relative_day(word: &str) -> Option<i64> {
    let offset = match word.to_lowercase().as_str() {
        "vorgestern" => -2,
        "gestern" | "yesterday" => -1,
        "heute" | "today" => 0,
        "morgen" | "tomorrow" => 1,
        "übermorgen" => 2,
        _ => return None,
    };
    Some(offset)
}

/// TIMEX3 `mod` of a part-of-period modifier
pub(crate) fn modifier(word: &str) -> Option<&'static str> {
    match word.to_lowercase().as_str() {
        "anfang" | "early" => Some("START"),
        "mitte" | "mid" => Some("MID"),
        "ende" | "late" => Some("END"),
        _ => None,
    }
}
