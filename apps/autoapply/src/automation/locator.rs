//! Apply-control location on a fetched page.
//!
//! First pass: a fixed list of text matches, then any button-like control whose
//! accessible name mentions "apply". Fallback: a best-match search over every
//! clickable element where a lower score is a better match.

use scraper::{ElementRef, Html, Selector};

const CLICKABLE_SELECTOR: &str =
    "a, button, input[type='submit'], input[type='button'], [role='button']";
const APPLY_TEXT_PATTERNS: [&str; 3] = ["apply now", "quick apply", "submit application"];
const BEST_MATCH_TARGETS: [&str; 2] = ["apply", "apply now"];
/// Score given to controls whose id/class/name mentions "apply".
const ATTRIBUTE_HINT_SCORE: f64 = 0.25;
/// Matches scoring above this are rejected.
const BEST_MATCH_THRESHOLD: f64 = 0.4;

/// What activating a control leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    /// A link to follow.
    Navigate(String),
    /// The control belongs to the form at this index (document order).
    Form(usize),
    /// In-page control; the application form is expected on the same page.
    Reveal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedControl {
    pub label: String,
    pub action: ControlAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub control: LocatedControl,
    /// Lower is better; 0.0 is an exact match.
    pub score: f64,
}

struct Clickable {
    label: String,
    attribute_hints: String,
    is_button: bool,
    action: ControlAction,
}

impl Clickable {
    fn located(&self) -> LocatedControl {
        LocatedControl {
            label: self.label.clone(),
            action: self.action.clone(),
        }
    }
}

/// Fixed text/role matches, in priority order.
pub fn locate_apply_control(html: &str) -> Option<LocatedControl> {
    let document = Html::parse_document(html);
    let clickables = collect_clickables(&document);

    for pattern in APPLY_TEXT_PATTERNS {
        if let Some(found) = clickables.iter().find(|c| c.label.contains(pattern)) {
            return Some(found.located());
        }
    }
    clickables
        .iter()
        .find(|c| c.is_button && c.label.contains("apply"))
        .map(Clickable::located)
}

/// Closest clickable to an apply control, if any scores under the threshold.
pub fn best_match(html: &str) -> Option<MatchResult> {
    let document = Html::parse_document(html);
    let mut best: Option<MatchResult> = None;

    for clickable in collect_clickables(&document) {
        let score = match_score(&clickable);
        if score > BEST_MATCH_THRESHOLD {
            continue;
        }
        if best.as_ref().map_or(true, |b| score < b.score) {
            best = Some(MatchResult {
                control: clickable.located(),
                score,
            });
        }
    }
    best
}

fn match_score(clickable: &Clickable) -> f64 {
    let label_score = if clickable.label.is_empty() {
        1.0
    } else {
        BEST_MATCH_TARGETS
            .iter()
            .map(|target| normalised_distance(&clickable.label, target))
            .fold(1.0, f64::min)
    };
    if clickable.attribute_hints.contains("apply") {
        label_score.min(ATTRIBUTE_HINT_SCORE)
    } else {
        label_score
    }
}

fn collect_clickables(document: &Html) -> Vec<Clickable> {
    let (Ok(clickable), Ok(form)) = (Selector::parse(CLICKABLE_SELECTOR), Selector::parse("form"))
    else {
        return Vec::new();
    };
    let forms: Vec<ElementRef> = document.select(&form).collect();

    document
        .select(&clickable)
        .map(|element| {
            let value = element.value();
            let label = normalise(&format!(
                "{} {} {}",
                element.text().collect::<Vec<_>>().join(" "),
                value.attr("value").unwrap_or(""),
                value.attr("aria-label").unwrap_or("")
            ));
            let attribute_hints = ["id", "class", "name"]
                .iter()
                .filter_map(|attr| value.attr(attr))
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            let is_button = matches!(value.name(), "button" | "input")
                || value.attr("role").is_some_and(|r| r.eq_ignore_ascii_case("button"));

            Clickable {
                label,
                attribute_hints,
                is_button,
                action: control_action(&element, &forms),
            }
        })
        .collect()
}

fn control_action(element: &ElementRef, forms: &[ElementRef]) -> ControlAction {
    if element.value().name() == "a" {
        if let Some(href) = element.value().attr("href").map(str::trim) {
            let lower = href.to_lowercase();
            if !href.is_empty() && !href.starts_with('#') && !lower.starts_with("javascript:") {
                return ControlAction::Navigate(href.to_string());
            }
        }
    }

    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "form")
        .and_then(|form| forms.iter().position(|candidate| candidate.id() == form.id()))
        .map(ControlAction::Form)
        .unwrap_or(ControlAction::Reveal)
}

fn normalise(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Levenshtein distance divided by the longer length.
fn normalised_distance(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()] as f64 / longest as f64
}
