//! Natural-language date and time normalization
//!
//! Turns loosely formatted phrases (typically produced by an LLM or typed by
//! a user) into canonical values: dates as `YYYY-MM-DD`, times as `HH:MM`.
//! Relative phrases are resolved against a caller-supplied `today` so the
//! functions stay pure.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use jot_common::natural_time::{format_date, format_time, parse_date, parse_time};
//!
//! let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(); // a Wednesday
//!
//! assert_eq!(format_date(parse_date("tomorrow", today).unwrap()), "2026-03-05");
//! assert_eq!(format_date(parse_date("next friday", today).unwrap()), "2026-03-06");
//! assert_eq!(format_date(parse_date("March 5th, 2027", today).unwrap()), "2027-03-05");
//! assert_eq!(format_time(parse_time("2:30 pm").unwrap()), "14:30");
//! assert_eq!(parse_date("sometime", today), None);
//! ```

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime, Weekday};

/// Words an LLM uses for "no value"
const NULL_WORDS: &[&str] = &["none", "null", "nil", "n/a", "na", "unknown", "tbd", "-"];

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Named times of day
const NAMED_TIMES: &[(&str, u32)] = &[
    ("noon", 12),
    ("midday", 12),
    ("midnight", 0),
    ("morning", 9),
    ("afternoon", 14),
    ("evening", 18),
    ("night", 20),
    ("tonight", 20),
];

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a time as `HH:MM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parse a natural-language or numeric date relative to `today`
///
/// Returns `None` for empty input, "null" words and anything unrecognized.
/// When a year is omitted the next occurrence on or after `today` is chosen.
pub fn parse_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let cleaned = clean(raw);
    let text = cleaned.strip_prefix("on ").unwrap_or(&cleaned);
    if is_null_word(text) {
        return None;
    }

    relative_keyword(text, today)
        .or_else(|| relative_offset(text, today))
        .or_else(|| weekday_reference(text, today))
        .or_else(|| iso_date(text))
        .or_else(|| numeric_date(text, today))
        .or_else(|| month_name_date(text, today))
}

/// Parse a natural-language or clock time
///
/// Seconds are dropped; the result always has zero seconds.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let cleaned = clean(raw);
    let text = cleaned.strip_prefix("at ").unwrap_or(&cleaned);
    if is_null_word(text) {
        return None;
    }

    let named = text
        .strip_prefix("this ")
        .or_else(|| text.strip_prefix("in the "))
        .unwrap_or(text);
    if let Some((_, hour)) = NAMED_TIMES.iter().find(|(name, _)| *name == named) {
        return NaiveTime::from_hms_opt(*hour, 0, 0);
    }
    if text == "12 noon" {
        return NaiveTime::from_hms_opt(12, 0, 0);
    }

    // ISO date-time: use the clock part
    if iso_date(text).is_some() {
        let date_len = text.find(['t', ' ']).unwrap_or(text.len());
        let rest = text[date_len..].trim_start_matches(['t', ' ']);
        return parse_clock(&strip_zone(rest));
    }

    parse_clock(text)
}

/// Drop a `z` or `±hh:mm` suffix and fractional seconds from a clock
fn strip_zone(clock: &str) -> String {
    let mut clock = clock.trim().trim_end_matches('z').to_string();
    if let Some(offset) = clock.find(['+', '-']) {
        clock.truncate(offset);
    }

    // "19:00:00.250" but not the dot in "p.m"
    if let Some(colon) = clock.rfind(':') {
        if let Some(dot) = clock[colon..].find('.').map(|i| colon + i) {
            let end = clock[dot + 1..]
                .find(|c: char| !c.is_ascii_digit())
                .map_or(clock.len(), |i| dot + 1 + i);
            if end > dot + 1 {
                clock.replace_range(dot..end, "");
            }
        }
    }

    clock.trim().to_string()
}

/// Lowercase, trim, collapse whitespace and drop trailing punctuation
fn clean(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let trimmed = lowered.trim_end_matches(['.', ',', '!', '?', ';']);
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_null_word(text: &str) -> bool {
    text.is_empty() || NULL_WORDS.contains(&text)
}

fn relative_keyword(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.strip_prefix("the ").unwrap_or(text);
    match text {
        "today" | "tonight" | "now" => Some(today),
        "tomorrow" => today.checked_add_signed(Duration::days(1)),
        "yesterday" => today.checked_sub_signed(Duration::days(1)),
        "day after tomorrow" => today.checked_add_signed(Duration::days(2)),
        "day before yesterday" => today.checked_sub_signed(Duration::days(2)),
        "next week" => today.checked_add_signed(Duration::days(7)),
        "next month" => today.checked_add_months(Months::new(1)),
        "next year" => today.checked_add_months(Months::new(12)),
        _ => None,
    }
}

/// `in N units` and `N units from now`
fn relative_offset(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let tokens: Vec<&str> = text.split(' ').collect();
    let (count, unit) = match tokens.as_slice() {
        ["in", count, unit] => (*count, *unit),
        [count, unit, "from", "now"] => (*count, *unit),
        _ => return None,
    };

    let n = parse_count(count)?;
    match unit.strip_suffix('s').unwrap_or(unit) {
        "day" => today.checked_add_signed(Duration::days(i64::from(n))),
        "week" => today.checked_add_signed(Duration::weeks(i64::from(n))),
        "fortnight" => today.checked_add_signed(Duration::weeks(2 * i64::from(n))),
        "month" => today.checked_add_months(Months::new(n)),
        "year" => today.checked_add_months(Months::new(n.checked_mul(12)?)),
        _ => None,
    }
}

fn parse_count(word: &str) -> Option<u32> {
    if let Ok(n) = word.parse::<u32>() {
        return Some(n);
    }
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        _ => return None,
    };
    Some(n)
}

/// Bare or `this <day>` is on-or-after today; `next <day>` is strictly after
fn weekday_reference(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (day_word, strictly_after) = if let Some(rest) = text.strip_prefix("next ") {
        (rest, true)
    } else if let Some(rest) = text
        .strip_prefix("this coming ")
        .or_else(|| text.strip_prefix("coming "))
        .or_else(|| text.strip_prefix("this "))
    {
        (rest, false)
    } else {
        (text, false)
    };

    let target = parse_weekday(day_word)?;
    let mut ahead = (7 + target.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    if strictly_after && ahead == 0 {
        ahead = 7;
    }
    today.checked_add_signed(Duration::days(i64::from(ahead)))
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    match word {
        "weds" => return Some(Weekday::Wed),
        "thur" | "thurs" => return Some(Weekday::Thu),
        _ => {}
    }
    if word.len() < 3 {
        return None;
    }
    WEEKDAYS
        .iter()
        .find(|(name, _)| name.starts_with(word))
        .map(|(_, day)| *day)
}

/// `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`, optionally followed by a time
fn iso_date(text: &str) -> Option<NaiveDate> {
    let date_part = text.split(['t', ' ']).next()?;
    let parts: Vec<&str> = date_part.split(['-', '/', '.']).collect();
    match parts.as_slice() {
        [y, m, d] if y.len() == 4 && all_digits(y) && all_digits(m) && all_digits(d) => {
            NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
        }
        _ => None,
    }
}

/// US-ordered `M/D[/Y]` or `M-D-Y`; day-first when the first field can't be a month
fn numeric_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let parts: Vec<&str> = if text.contains('/') {
        text.split('/').collect()
    } else if text.contains('-') {
        let parts: Vec<&str> = text.split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        parts
    } else {
        return None;
    };

    if !(2..=3).contains(&parts.len()) || !parts.iter().all(|p| all_digits(p)) {
        return None;
    }
    if parts[0].len() > 2 || parts[1].len() > 2 {
        return None;
    }

    let a: u32 = parts[0].parse().ok()?;
    let b: u32 = parts[1].parse().ok()?;
    let (month, day) = if a > 12 && b <= 12 { (b, a) } else { (a, b) };

    match parts.get(2) {
        Some(year) => NaiveDate::from_ymd_opt(parse_year(year)?, month, day),
        None => resolve_yearless(month, day, today),
    }
}

/// `March 5`, `Mar 5th, 2026`, `5 March`, `the 5th of March 2026`
fn month_name_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let normalized = text.replace(',', " ");
    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|t| *t != "of" && *t != "the")
        .collect();

    let (month, day, year) = match tokens.as_slice() {
        [first, second] => {
            let (month, day) = month_and_day(first, second)?;
            (month, day, None)
        }
        [first, second, year] => {
            let (month, day) = month_and_day(first, second)?;
            (month, day, Some(parse_year(year)?))
        }
        _ => return None,
    };

    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => resolve_yearless(month, day, today),
    }
}

fn month_and_day(first: &str, second: &str) -> Option<(u32, u32)> {
    if let Some(month) = parse_month(first) {
        return Some((month, parse_day(second)?));
    }
    Some((parse_month(second)?, parse_day(first)?))
}

fn parse_month(word: &str) -> Option<u32> {
    let word = word.trim_end_matches('.');
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|name| name.starts_with(word))
        .map(|idx| idx as u32 + 1)
}

/// Day of month with optional ordinal suffix
fn parse_day(word: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .unwrap_or(word);
    if digits.is_empty() || digits.len() > 2 || !all_digits(digits) {
        return None;
    }
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

/// Four-digit year, or two-digit year taken as 20YY
fn parse_year(word: &str) -> Option<i32> {
    if !all_digits(word) {
        return None;
    }
    match word.len() {
        4 => word.parse().ok(),
        2 => word.parse::<i32>().ok().map(|y| 2000 + y),
        _ => None,
    }
}

/// Next occurrence of `month`/`day` on or after today
///
/// February 29 may be up to eight years away across a skipped century leap
/// year; dates that never exist give None.
fn resolve_yearless(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    (today.year()..=today.year() + 8)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|candidate| *candidate >= today)
}

/// `H`, `HH:MM[:SS]`, `H.MM`, `HHMM`, each optionally with am/pm
fn parse_clock(text: &str) -> Option<NaiveTime> {
    let text = text.replace("o'clock", "").replace("oclock", "");
    let text = text.trim();

    let mut meridiem = None;
    let mut body = text;
    for (suffix, is_pm) in [("a.m", false), ("p.m", true), ("am", false), ("pm", true)] {
        if let Some(rest) = text.strip_suffix(suffix) {
            meridiem = Some(is_pm);
            body = rest.trim();
            break;
        }
    }

    if body.is_empty() {
        return None;
    }

    let (hour, minute) = if body.contains(':') {
        let parts: Vec<&str> = body.split(':').collect();
        match parts.as_slice() {
            [h, m] | [h, m, _] => (clock_field(h, 1..=2)?, clock_field(m, 2..=2)?),
            _ => return None,
        }
    } else if body.contains('.') {
        let (h, m) = body.split_once('.')?;
        (clock_field(h, 1..=2)?, clock_field(m, 2..=2)?)
    } else if all_digits(body) {
        match body.len() {
            1 | 2 => (body.parse().ok()?, 0),
            3 | 4 => {
                let split = body.len() - 2;
                (body[..split].parse().ok()?, body[split..].parse().ok()?)
            }
            _ => return None,
        }
    } else {
        return None;
    };

    if let [_, _, seconds] = body.split(':').collect::<Vec<_>>().as_slice() {
        let seconds: u32 = clock_field(seconds, 2..=2)?;
        if seconds > 59 {
            return None;
        }
    }

    let hour = match meridiem {
        Some(is_pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            if is_pm {
                hour % 12 + 12
            } else {
                hour % 12
            }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn clock_field(field: &str, len: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !len.contains(&field.len()) || !all_digits(field) {
        return None;
    }
    field.parse().ok()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
