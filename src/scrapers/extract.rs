//! Structural assignment extraction over a page snapshot.
//!
//! Matchers are tried in order and the first one that yields any element
//! wins; results from different matchers are never merged. Everything here
//! is pure so it runs against fixture HTML in tests.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::classify::{classify_priority, classify_status, classify_type};
use crate::types::{Assignment, StatusKind, NO_DUE_DATE, UNKNOWN_COURSE};

use super::text_scan;

const MIN_ELEMENT_CHARS: usize = 6;
const MAX_FALLBACK_TITLE_CHARS: usize = 100;

const TITLE_SELECTORS: &[&str] = &[
    ".title",
    ".assignment-title",
    ".homework-title",
    "h1",
    "h2",
    "h3",
    "h4",
    "a",
];
const COURSE_SELECTORS: &[&str] = &[
    ".course",
    ".course-name",
    ".class-name",
    ".subject",
    "[class*=course]",
];
const DUE_SELECTORS: &[&str] = &[".due-date", "[class*=due]", ".date", ".deadline"];
const STATUS_SELECTORS: &[&str] = &[".status", "[class*=status]", ".label"];

static WEEKDAY_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b[^\n]{0,40}")
        .unwrap()
});

/// HTML source and visible body text of the page, captured together.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
    pub body_text: String,
}

/// Per-run inputs shared by every extracted record.
#[derive(Debug, Clone)]
pub struct ExtractContext<'a> {
    pub priority_keywords: &'a [String],
    pub fetched_at: DateTime<Utc>,
}

type Matcher = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

/// Each entry is its own step; a comma group matches as one step.
const SELECTOR_MATCHERS: &[&str] = &[
    ".assignment",
    ".assignment-item",
    ".task-item",
    ".homework-item",
    "li[class*=assignment]",
    ".assignment-list li",
    ".homework-list li",
    "tr[class*=assignment], tr[class*=task], tr[class*=homework]",
];

/// Tried after every selector step comes up empty.
const STRUCTURE_MATCHERS: &[(&str, Matcher)] = &[
    ("due cards", match_due_cards),
    ("due blocks", match_due_blocks),
];

/// Structural pass first; the text scan only runs when it yields nothing.
pub fn extract_assignments(snapshot: &PageSnapshot, ctx: &ExtractContext<'_>) -> Vec<Assignment> {
    let document = Html::parse_document(&snapshot.html);
    let structured = extract_structured(&document, ctx);
    if !structured.is_empty() {
        return structured;
    }

    tracing::info!(url = %snapshot.url, "No structured assignment list found, scanning page text");
    text_scan::scan_text(&snapshot.body_text, ctx)
}

pub fn extract_structured(document: &Html, ctx: &ExtractContext<'_>) -> Vec<Assignment> {
    let Some((name, elements)) = SELECTOR_MATCHERS
        .iter()
        .map(|css| (*css, select_all(document, css)))
        .chain(
            STRUCTURE_MATCHERS
                .iter()
                .map(|(name, matcher)| (*name, matcher(document))),
        )
        .find(|(_, elements)| !elements.is_empty())
    else {
        return Vec::new();
    };

    tracing::debug!(matcher = name, elements = elements.len(), "Matched assignment elements");

    let mut seen = HashSet::new();
    let mut assignments = Vec::new();
    for element in elements {
        if let Some(assignment) = build_assignment(element, ctx) {
            push_unique(&mut assignments, &mut seen, assignment);
        }
    }
    assignments
}

/// Appends unless an assignment with the same identifier was already kept.
pub fn push_unique(assignments: &mut Vec<Assignment>, seen: &mut HashSet<String>, assignment: Assignment) {
    if seen.insert(assignment.identifier.clone()) {
        assignments.push(assignment);
    } else {
        tracing::debug!(id = %assignment.identifier, "Skipping duplicate assignment");
    }
}

/// Tiny untitled records with no status or course carry no information.
pub fn is_noise(assignment: &Assignment) -> bool {
    assignment.title.trim().chars().count() < 3
        && classify_status(&assignment.status) == StatusKind::Unknown
        && assignment.course == UNKNOWN_COURSE
}

fn match_due_cards(document: &Html) -> Vec<ElementRef<'_>> {
    let Ok(due) = Selector::parse("[class*=due]") else {
        return Vec::new();
    };
    select_all(document, ".card")
        .into_iter()
        .filter(|card| has_descendant(*card, &due))
        .collect()
}

fn match_due_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    let Ok(marker) = Selector::parse("[class*=due], [class*=status]") else {
        return Vec::new();
    };
    select_all(document, "div")
        .into_iter()
        .filter(|div| is_due_block(*div, &marker))
        .filter(|div| !descendant_elements(*div).any(|inner| is_due_block(inner, &marker)))
        .collect()
}

fn is_due_block(element: ElementRef<'_>, marker: &Selector) -> bool {
    element.value().name() == "div" && has_descendant(element, marker)
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Strict descendants; the element itself is never included.
fn descendant_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.descendants().skip(1).filter_map(ElementRef::wrap)
}

fn has_descendant(element: ElementRef<'_>, selector: &Selector) -> bool {
    descendant_elements(element).any(|d| selector.matches(&d))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn node_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// One entry per non-blank text node.
fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Text of the first descendant matching each selector in turn, accepted when
/// longer than `min_chars`.
fn first_descendant_text(element: ElementRef<'_>, selectors: &[&str], min_chars: usize) -> Option<String> {
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(node) = descendant_elements(element).find(|d| selector.matches(d)) {
            let text = node_text(node);
            if text.chars().count() > min_chars {
                return Some(text);
            }
        }
    }
    None
}

fn first_link(element: ElementRef<'_>) -> Option<String> {
    descendant_elements(element)
        .filter(|d| d.value().name() == "a")
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty() && !href.to_ascii_lowercase().starts_with("javascript:"))
        .map(str::to_string)
}

fn build_assignment(element: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Option<Assignment> {
    let lines = text_lines(element);
    let text = lines.join("\n");
    if text.chars().count() < MIN_ELEMENT_CHARS {
        return None;
    }

    let title = first_descendant_text(element, TITLE_SELECTORS, 2).unwrap_or_else(|| {
        lines
            .first()
            .map(|line| line.chars().take(MAX_FALLBACK_TITLE_CHARS).collect())
            .unwrap_or_default()
    });

    let course = first_descendant_text(element, COURSE_SELECTORS, 0)
        .unwrap_or_else(|| UNKNOWN_COURSE.to_string());

    let due_date = first_descendant_text(element, DUE_SELECTORS, 0)
        .or_else(|| {
            WEEKDAY_PHRASE_RE
                .find(&text)
                .map(|m| m.as_str().trim().to_string())
        })
        .unwrap_or_else(|| NO_DUE_DATE.to_string());

    let inferred = classify_status(&text);
    let status = first_descendant_text(element, STATUS_SELECTORS, 0)
        .unwrap_or_else(|| inferred.label().to_string());

    let mut assignment = Assignment::new(title, course, status, due_date, ctx.fetched_at);
    assignment.submitted = inferred == StatusKind::Submitted;
    assignment.overdue = inferred == StatusKind::Overdue;
    assignment.assignment_type = classify_type(&text);
    assignment.priority = classify_priority(&assignment.title, ctx.priority_keywords);
    assignment.link = first_link(element);
    assignment.raw_text = Some(text);
    Some(assignment)
}

/// Absolute URL for a scraped href, relative to the portal base URL.
pub fn resolve_link(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    let scheme_end = base_url.find("://");
    if let Some(rest) = href.strip_prefix("//") {
        let scheme = scheme_end.map(|idx| &base_url[..idx]).unwrap_or("https");
        return format!("{}://{}", scheme, rest);
    }

    if href.starts_with('/') {
        let origin = match scheme_end {
            Some(idx) => match base_url[idx + 3..].find('/') {
                Some(host_end) => &base_url[..idx + 3 + host_end],
                None => base_url,
            },
            None => base_url.trim_end_matches('/'),
        };
        return format!("{}{}", origin, href);
    }

    format!("{}/{}", base_url.trim_end_matches('/'), href)
}
