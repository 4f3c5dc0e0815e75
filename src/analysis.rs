//! Assignment Analysis Module
//!
//! Pure classification of a scraped assignment list:
//! - status buckets: submitted > overdue > pending > unknown
//! - urgency buckets against a single captured "now":
//!   urgent (due within 2 days), soon (within `days_ahead`), later
//! - running counters by course, type, due-date text and priority

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::classify::{classify_status, normalize_keywords};
use crate::due_date::DueDate;
use crate::types::{Assignment, Priority, StatusBucket, StatusKind, Urgency, NO_DUE_DATE};

/// Urgent cutoff, in days from "now".
pub const URGENT_DAYS: i64 = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusGroups {
    pub submitted: Vec<Assignment>,
    pub pending: Vec<Assignment>,
    pub overdue: Vec<Assignment>,
    pub unknown: Vec<Assignment>,
}

impl StatusGroups {
    fn push(&mut self, bucket: StatusBucket, assignment: Assignment) {
        match bucket {
            StatusBucket::Submitted => self.submitted.push(assignment),
            StatusBucket::Pending => self.pending.push(assignment),
            StatusBucket::Overdue => self.overdue.push(assignment),
            StatusBucket::Unknown => self.unknown.push(assignment),
        }
    }

    pub fn len(&self) -> usize {
        self.submitted.len() + self.pending.len() + self.overdue.len() + self.unknown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrgencyGroups {
    pub urgent: Vec<Assignment>,
    pub soon: Vec<Assignment>,
    pub later: Vec<Assignment>,
}

impl UrgencyGroups {
    fn push(&mut self, urgency: Urgency, assignment: Assignment) {
        match urgency {
            Urgency::Urgent => self.urgent.push(assignment),
            Urgency::Soon => self.soon.push(assignment),
            Urgency::Later => self.later.push(assignment),
        }
    }

    pub fn len(&self) -> usize {
        self.urgent.len() + self.soon.len() + self.later.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub total_assignments: usize,
    pub by_priority: PriorityCounts,
    pub by_course: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_due_date: BTreeMap<String, usize>,
    pub grouped_by_status: StatusGroups,
    pub assignments_by_urgency: UrgencyGroups,
    pub urgent_count: usize,
    pub overdue_count: usize,
    pub submitted_count: usize,
    pub pending_count: usize,
    pub priority_keywords: Vec<String>,
    pub days_ahead: i64,
    pub analysed_at: DateTime<Utc>,
}

/// Classifies every assignment into one status bucket and one urgency bucket.
/// Deterministic for a fixed `now`.
pub fn analyse_assignments<S: AsRef<str>>(
    assignments: &[Assignment],
    priority_keywords: &[S],
    days_ahead: i64,
    now: DateTime<Utc>,
) -> Analysis {
    let urgent_cutoff = cutoff(now, URGENT_DAYS);
    let soon_cutoff = cutoff(now, days_ahead);

    let mut analysis = Analysis {
        total_assignments: assignments.len(),
        by_priority: PriorityCounts::default(),
        by_course: BTreeMap::new(),
        by_type: BTreeMap::new(),
        by_due_date: BTreeMap::new(),
        grouped_by_status: StatusGroups::default(),
        assignments_by_urgency: UrgencyGroups::default(),
        urgent_count: 0,
        overdue_count: 0,
        submitted_count: 0,
        pending_count: 0,
        priority_keywords: normalize_keywords(priority_keywords),
        days_ahead,
        analysed_at: now,
    };

    for assignment in assignments {
        *analysis.by_course.entry(assignment.course.clone()).or_insert(0) += 1;
        *analysis
            .by_type
            .entry(assignment.assignment_type.to_string())
            .or_insert(0) += 1;

        let due_key = if assignment.due_date.trim().is_empty() {
            NO_DUE_DATE.to_string()
        } else {
            assignment.due_date.clone()
        };
        *analysis.by_due_date.entry(due_key).or_insert(0) += 1;

        match assignment.priority {
            Priority::High => analysis.by_priority.high += 1,
            Priority::Medium => analysis.by_priority.medium += 1,
            Priority::Low => analysis.by_priority.low += 1,
        }

        let status = status_bucket(assignment);
        match status {
            StatusBucket::Submitted => analysis.submitted_count += 1,
            StatusBucket::Pending => analysis.pending_count += 1,
            StatusBucket::Overdue => analysis.overdue_count += 1,
            StatusBucket::Unknown => {}
        }
        analysis.grouped_by_status.push(status, assignment.clone());

        let urgency = urgency_bucket(&assignment.due_date, now, urgent_cutoff, soon_cutoff);
        if urgency == Urgency::Urgent {
            analysis.urgent_count += 1;
        }
        analysis.assignments_by_urgency.push(urgency, assignment.clone());
    }

    analysis
}

/// submitted > overdue > pending > unknown, from the flags and the status text.
pub fn status_bucket(assignment: &Assignment) -> StatusBucket {
    let inferred = classify_status(&assignment.status);
    if assignment.submitted || inferred == StatusKind::Submitted {
        StatusBucket::Submitted
    } else if assignment.overdue || inferred == StatusKind::Overdue {
        StatusBucket::Overdue
    } else if inferred == StatusKind::Pending {
        StatusBucket::Pending
    } else {
        StatusBucket::Unknown
    }
}

fn urgency_bucket(
    due_text: &str,
    now: DateTime<Utc>,
    urgent_cutoff: DateTime<Utc>,
    soon_cutoff: DateTime<Utc>,
) -> Urgency {
    match DueDate::parse(due_text).resolve(now) {
        Some(due) if due <= urgent_cutoff => Urgency::Urgent,
        Some(due) if due <= soon_cutoff => Urgency::Soon,
        _ => Urgency::Later,
    }
}

/// Urgency of a single assignment with the same cutoffs the analysis uses.
pub fn classify_urgency(assignment: &Assignment, now: DateTime<Utc>, days_ahead: i64) -> Urgency {
    urgency_bucket(
        &assignment.due_date,
        now,
        cutoff(now, URGENT_DAYS),
        cutoff(now, days_ahead),
    )
}

/// `now` plus `days`, saturating at the far end of the calendar.
fn cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|window| now.checked_add_signed(window))
        .unwrap_or(if days < 0 { DateTime::<Utc>::MIN_UTC } else { DateTime::<Utc>::MAX_UTC })
}
