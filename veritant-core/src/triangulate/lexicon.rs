//! Normalization lexicons — alias tables for metrics, geographies, and time
//! periods, plus number/unit normalization.
//!
//! The lexicon is an immutable configuration object injected into the
//! extraction and triangulation stages. Matching policy: an exact alias
//! match wins outright; otherwise the longest contained alias wins, so
//! "international tourist arrivals" beats "arrivals" inside the same
//! sentence. Containment is word-boundary aware: "us" never matches inside
//! "status".

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unit attached to a normalized number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberUnit {
    Percent,
    PercentagePoint,
    Thousand,
    Million,
    Billion,
    Trillion,
    Plain,
}

impl NumberUnit {
    /// Base-10 multiplier for magnitude units. Percent-family units and
    /// plain numbers scale by 1.
    pub fn scale(&self) -> f64 {
        match self {
            NumberUnit::Thousand => 1e3,
            NumberUnit::Million => 1e6,
            NumberUnit::Billion => 1e9,
            NumberUnit::Trillion => 1e12,
            _ => 1.0,
        }
    }

    /// Percent and percentage-point values form a separate category that
    /// never compares against magnitudes.
    pub fn is_percent_family(&self) -> bool {
        matches!(self, NumberUnit::Percent | NumberUnit::PercentagePoint)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            NumberUnit::Percent => "%",
            NumberUnit::PercentagePoint => "pp",
            NumberUnit::Thousand => "K",
            NumberUnit::Million => "M",
            NumberUnit::Billion => "B",
            NumberUnit::Trillion => "T",
            NumberUnit::Plain => "",
        }
    }
}

/// A metric or geography alias match with its position in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasMatch {
    pub canonical: String,
    pub start: usize,
    pub end: usize,
}

/// A number found in text, with its normalized value and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberMatch {
    pub value: f64,
    pub unit: NumberUnit,
    pub start: usize,
    pub end: usize,
}

/// Immutable alias tables and parsing rules.
pub struct Lexicon {
    /// (alias, canonical), sorted longest alias first for greedy matching.
    metric_aliases: Vec<(String, String)>,
    metric_exact: HashMap<String, String>,
    geo_aliases: Vec<(String, String)>,
    geo_exact: HashMap<String, String>,
    quarter_re: Regex,
    quarter_suffix_re: Regex,
    half_re: Regex,
    half_word_re: Regex,
    fiscal_re: Regex,
    month_range_re: Regex,
    month_re: Regex,
    year_re: Regex,
    number_re: Regex,
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn default_metric_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("international tourist arrivals", "international_tourist_arrivals"),
        ("tourist arrivals", "international_tourist_arrivals"),
        ("visitor arrivals", "international_tourist_arrivals"),
        ("visitor inflows", "international_tourist_arrivals"),
        ("international arrivals", "international_tourist_arrivals"),
        ("tourism receipts", "tourism_receipts"),
        ("tourism revenue", "tourism_receipts"),
        ("hotel occupancy rate", "hotel_occupancy_rate"),
        ("hotel occupancy", "hotel_occupancy_rate"),
        ("gdp growth rate", "gdp_growth"),
        ("gdp growth", "gdp_growth"),
        ("economic growth", "gdp_growth"),
        ("gross domestic product", "gdp"),
        ("gdp", "gdp"),
        ("inflation rate", "inflation_rate"),
        ("inflation", "inflation_rate"),
        ("consumer price index", "inflation_rate"),
        ("unemployment rate", "unemployment_rate"),
        ("unemployment", "unemployment_rate"),
        ("jobless rate", "unemployment_rate"),
        ("corporate tax rate", "corporate_tax_rate"),
        ("effective tax rate", "effective_tax_rate"),
        ("tax rate", "tax_rate"),
        ("tax revenue", "tax_revenue"),
        ("interest rate", "interest_rate"),
        ("policy rate", "interest_rate"),
        ("median household income", "median_household_income"),
        ("median income", "median_household_income"),
        ("household income", "median_household_income"),
        ("vaccination rate", "vaccination_rate"),
        ("vaccination coverage", "vaccination_rate"),
        ("mortality rate", "mortality_rate"),
        ("death rate", "mortality_rate"),
        ("case fatality rate", "case_fatality_rate"),
        ("life expectancy", "life_expectancy"),
        ("population growth", "population_growth"),
        ("population", "population"),
        ("labor force participation", "labor_force_participation"),
        ("trade deficit", "trade_deficit"),
        ("trade surplus", "trade_surplus"),
        ("carbon emissions", "carbon_emissions"),
        ("co2 emissions", "carbon_emissions"),
    ]
}

fn default_geo_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("united states of america", "united states"),
        ("the united states", "united states"),
        ("united states", "united states"),
        ("u.s.a.", "united states"),
        ("u.s.", "united states"),
        ("usa", "united states"),
        ("america", "united states"),
        ("united kingdom", "united kingdom"),
        ("great britain", "united kingdom"),
        ("u.k.", "united kingdom"),
        ("gbr", "united kingdom"),
        ("britain", "united kingdom"),
        ("european union", "european union"),
        ("eurozone", "european union"),
        ("eu", "european union"),
        ("deu", "germany"),
        ("germany", "germany"),
        ("fra", "france"),
        ("france", "france"),
        ("esp", "spain"),
        ("spain", "spain"),
        ("ita", "italy"),
        ("italy", "italy"),
        ("jpn", "japan"),
        ("japan", "japan"),
        ("chn", "china"),
        ("china", "china"),
        ("ind", "india"),
        ("india", "india"),
        ("bra", "brazil"),
        ("brazil", "brazil"),
        // "can" is left out: as an ISO code it collides with the English verb.
        ("canada", "canada"),
        ("mex", "mexico"),
        ("mexico", "mexico"),
        ("worldwide", "world"),
        ("globally", "world"),
        ("global", "world"),
        ("world", "world"),
    ]
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::with_tables(default_metric_aliases(), default_geo_aliases())
    }
}

impl Lexicon {
    /// Build a lexicon from explicit alias tables. Aliases are lowercased;
    /// longer aliases take precedence during containment matching, with
    /// alphabetical order as a deterministic tie-break.
    pub fn with_tables(
        metrics: Vec<(&str, &str)>,
        geos: Vec<(&str, &str)>,
    ) -> Self {
        let mut metric_aliases: Vec<(String, String)> = metrics
            .iter()
            .map(|(a, c)| (a.to_lowercase(), c.to_string()))
            .collect();
        metric_aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        let metric_exact = metric_aliases.iter().cloned().collect();

        let mut geo_aliases: Vec<(String, String)> = geos
            .iter()
            .map(|(a, c)| (a.to_lowercase(), c.to_string()))
            .collect();
        geo_aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        let geo_exact = geo_aliases.iter().cloned().collect();

        let month_alt = MONTHS.join("|");
        Self {
            metric_aliases,
            metric_exact,
            geo_aliases,
            geo_exact,
            quarter_re: Regex::new(r"(?i)\bq([1-4])\s*[-/ ]?\s*((?:19|20)\d{2})\b").unwrap(),
            quarter_suffix_re: Regex::new(r"(?i)\b((?:19|20)\d{2})\s*[-/ ]?\s*q([1-4])\b").unwrap(),
            half_re: Regex::new(r"(?i)\bh([12])\s*[-/ ]?\s*((?:19|20)\d{2})\b").unwrap(),
            half_word_re: Regex::new(
                r"(?i)\b(first|second)\s+half\s+of\s+((?:19|20)\d{2})\b",
            )
            .unwrap(),
            fiscal_re: Regex::new(r"(?i)\b(?:fy|fiscal\s+year)\s*[-/ ]?\s*((?:19|20)\d{2})\b")
                .unwrap(),
            month_range_re: Regex::new(&format!(
                r"(?i)\b({m})\s*(?:-|–|—|to|through)\s*({m})\s+((?:19|20)\d{{2}})\b",
                m = month_alt
            ))
            .unwrap(),
            month_re: Regex::new(&format!(r"(?i)\b({m})\s+((?:19|20)\d{{2}})\b", m = month_alt))
                .unwrap(),
            year_re: Regex::new(r"\b((?:19|20)\d{2})\b").unwrap(),
            number_re: Regex::new(
                r"(?i)(-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?)\s*(percentage\s+points?|percent|%|pp\b|thousand\b|million\b|billion\b|trillion\b|k\b|m\b|bn\b|b\b|tn\b|t\b)?",
            )
            .unwrap(),
        }
    }

    /// Normalize a full metric phrase. Exact alias match first, otherwise
    /// the longest alias contained in the phrase.
    pub fn normalize_metric(&self, text: &str) -> Option<String> {
        let lowered = text.trim().to_lowercase();
        if let Some(canonical) = self.metric_exact.get(&lowered) {
            return Some(canonical.clone());
        }
        self.find_metric(&lowered).map(|m| m.canonical)
    }

    /// Find the best metric alias contained in the text, with its span.
    pub fn find_metric(&self, text: &str) -> Option<AliasMatch> {
        find_alias(&self.metric_aliases, text)
    }

    /// Normalize a geography/entity phrase.
    pub fn normalize_geography(&self, text: &str) -> Option<String> {
        let lowered = text.trim().to_lowercase();
        if let Some(canonical) = self.geo_exact.get(&lowered) {
            return Some(canonical.clone());
        }
        self.find_geography(&lowered).map(|m| m.canonical)
    }

    /// Find the best geography alias contained in the text, with its span.
    pub fn find_geography(&self, text: &str) -> Option<AliasMatch> {
        find_alias(&self.geo_aliases, text)
    }

    /// Extract a canonical period label from text, if one is present.
    ///
    /// Precedence: quarter > half > fiscal year > month range > single
    /// month > bare year. Month ranges that exactly span a calendar quarter
    /// collapse to that quarter's label.
    pub fn find_period(&self, text: &str) -> Option<String> {
        if let Some(caps) = self.quarter_re.captures(text) {
            return Some(format!("Q{} {}", &caps[1], &caps[2]));
        }
        if let Some(caps) = self.quarter_suffix_re.captures(text) {
            return Some(format!("Q{} {}", &caps[2], &caps[1]));
        }
        if let Some(caps) = self.half_re.captures(text) {
            return Some(format!("H{} {}", &caps[1], &caps[2]));
        }
        if let Some(caps) = self.half_word_re.captures(text) {
            let half = if caps[1].eq_ignore_ascii_case("first") { 1 } else { 2 };
            return Some(format!("H{} {}", half, &caps[2]));
        }
        if let Some(caps) = self.fiscal_re.captures(text) {
            return Some(format!("FY{}", &caps[1]));
        }
        if let Some(caps) = self.month_range_re.captures(text) {
            let a = month_index(&caps[1]);
            let b = month_index(&caps[2]);
            let year = &caps[3];
            if let Some(q) = quarter_for_range(a, b) {
                return Some(format!("Q{} {}", q, year));
            }
            return Some(format!("{:02}-{:02} {}", a + 1, b + 1, year));
        }
        if let Some(caps) = self.month_re.captures(text) {
            let m = month_index(&caps[1]);
            return Some(format!("{}-{:02}", &caps[2], m + 1));
        }
        if let Some(caps) = self.year_re.captures(text) {
            return Some(caps[1].to_string());
        }
        None
    }

    /// Find all numbers in the text, each normalized to `(value, unit)`.
    ///
    /// Bare four-digit years are skipped so "grew 4% in 2024" yields one
    /// number, not two.
    pub fn find_numbers(&self, text: &str) -> Vec<NumberMatch> {
        let mut out = Vec::new();
        for caps in self.number_re.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let num = caps.get(1).unwrap();
            // Skip digits glued to a word, like the "2" in "Q2".
            if num.start() > 0
                && text[..num.start()]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric())
            {
                continue;
            }
            let digits: String = num.as_str().replace(',', "");
            let Ok(value) = digits.parse::<f64>() else {
                continue;
            };
            let unit = caps
                .get(2)
                .map(|u| parse_unit(u.as_str()))
                .unwrap_or(NumberUnit::Plain);
            if unit == NumberUnit::Plain && looks_like_year(&digits) {
                continue;
            }
            out.push(NumberMatch {
                value,
                unit,
                start: num.start(),
                end: whole.end(),
            });
        }
        out
    }

    /// Decide whether two `(value, unit)` pairs express the same quantity
    /// within a relative tolerance.
    ///
    /// One rule for every unit pair: scale both values to a common base-10
    /// magnitude, then require `|a - b| <= tol * max(|a|, |b|)`. Percent
    /// and percentage-point values are categorically distinct: they only
    /// compare against their own unit, never against each other or against
    /// magnitudes, regardless of tolerance.
    pub fn numbers_compatible(
        &self,
        a: (f64, NumberUnit),
        b: (f64, NumberUnit),
        tolerance: f64,
    ) -> bool {
        let (av, au) = a;
        let (bv, bu) = b;
        if au.is_percent_family() || bu.is_percent_family() {
            if au != bu {
                return false;
            }
            return relative_close(av, bv, tolerance);
        }
        relative_close(av * au.scale(), bv * bu.scale(), tolerance)
    }
}

/// Relative closeness with a symmetric denominator; two zeros are close.
fn relative_close(a: f64, b: f64, tolerance: f64) -> bool {
    let denom = a.abs().max(b.abs());
    if denom < f64::EPSILON {
        return true;
    }
    (a - b).abs() <= tolerance * denom
}

/// Word-boundary-aware containment search over a longest-first alias table.
fn find_alias(aliases: &[(String, String)], text: &str) -> Option<AliasMatch> {
    let lowered = text.to_lowercase();
    for (alias, canonical) in aliases {
        let mut from = 0;
        while let Some(pos) = lowered[from..].find(alias.as_str()) {
            let start = from + pos;
            let end = start + alias.len();
            if is_word_boundary(&lowered, start, end) {
                return Some(AliasMatch {
                    canonical: canonical.clone(),
                    start,
                    end,
                });
            }
            from = start + 1;
        }
    }
    None
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || !text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
    let after_ok = end == text.len()
        || !text[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
    before_ok && after_ok
}

fn month_index(name: &str) -> usize {
    let lowered = name.to_lowercase();
    MONTHS.iter().position(|m| *m == lowered).unwrap_or(0)
}

/// Quarter number when a zero-based month range spans exactly one calendar
/// quarter.
fn quarter_for_range(start: usize, end: usize) -> Option<usize> {
    match (start, end) {
        (0, 2) => Some(1),
        (3, 5) => Some(2),
        (6, 8) => Some(3),
        (9, 11) => Some(4),
        _ => None,
    }
}

fn looks_like_year(digits: &str) -> bool {
    digits.len() == 4
        && (digits.starts_with("19") || digits.starts_with("20"))
        && !digits.contains('.')
}

fn parse_unit(token: &str) -> NumberUnit {
    let lowered = token.trim().to_lowercase();
    match lowered.as_str() {
        "%" | "percent" => NumberUnit::Percent,
        "pp" => NumberUnit::PercentagePoint,
        "k" | "thousand" => NumberUnit::Thousand,
        "m" | "million" => NumberUnit::Million,
        "b" | "bn" | "billion" => NumberUnit::Billion,
        "t" | "tn" | "trillion" => NumberUnit::Trillion,
        other if other.starts_with("percentage") => NumberUnit::PercentagePoint,
        _ => NumberUnit::Plain,
    }
}
