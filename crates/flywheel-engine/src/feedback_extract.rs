// flywheel-engine/src/feedback_extract.rs
// ============================================================================
// Module: Feedback Extractor (C7)
// Description: Normalizes, deduplicates, and ranks runner feedback gathered
//              across a crank's traces.
// Purpose: Implement §4.5's extraction pipeline.
// Dependencies: flywheel-core
// ============================================================================

//! ## Overview
//! [`extract_feedback`] takes every [`FeedbackEntryRaw`] across a crank's
//! traces, normalizes area and title, drops entries with no usable title,
//! merges entries sharing a dedup key, and stable-sorts the result into a
//! deterministic, `fb-NNN`-numbered output list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use flywheel_core::FeedbackArea;
use flywheel_core::FeedbackEntryNormalized;
use flywheel_core::FeedbackEntryRaw;
use flywheel_core::FeedbackId;
use flywheel_core::TestId;

// ============================================================================
// SECTION: Dedup Key
// ============================================================================

/// `(area, lowercased first 40 characters of title, trimmed)` (§4.5).
const TITLE_PREFIX_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DedupKey {
    area: AreaKey,
    title_prefix: String,
}

/// A sortable stand-in for [`FeedbackArea`], used only to order the final
/// output by area (§4.5: "stable-sorted by count desc, then area, then id").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct AreaKey(u8);

impl From<FeedbackArea> for AreaKey {
    fn from(area: FeedbackArea) -> Self {
        let rank = match area {
            FeedbackArea::Actions => 0,
            FeedbackArea::Snapshot => 1,
            FeedbackArea::Navigation => 2,
            FeedbackArea::Iframe => 3,
            FeedbackArea::Input => 4,
            FeedbackArea::ErrorHandling => 5,
            FeedbackArea::ShadowDom => 6,
            FeedbackArea::Timing => 7,
            FeedbackArea::Other => 8,
        };
        Self(rank)
    }
}

fn dedup_key(area: FeedbackArea, title: &str) -> DedupKey {
    let prefix: String = title.trim().to_lowercase().chars().take(TITLE_PREFIX_LEN).collect();
    DedupKey { area: area.into(), title_prefix: prefix }
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

struct Accumulator {
    feedback_type: flywheel_core::FeedbackType,
    area: FeedbackArea,
    title: String,
    detail: String,
    files: Vec<String>,
    count: u64,
    tests: Vec<TestId>,
}

/// Normalizes, deduplicates, and ranks every feedback entry across `traces`'
/// raw entries (§4.5). Deterministic given identical input order.
#[must_use]
pub fn extract_feedback(entries: &[FeedbackEntryRaw]) -> Vec<FeedbackEntryNormalized> {
    let mut groups: BTreeMap<DedupKey, Accumulator> = BTreeMap::new();
    let mut insertion_order: Vec<DedupKey> = Vec::new();

    for entry in entries {
        let area = resolve_area(entry);
        let title = resolve_title(entry);
        let Some(title) = title else {
            continue;
        };

        let key = dedup_key(area, &title);
        match groups.get_mut(&key) {
            Some(group) => {
                group.count += 1;
                if !group.tests.contains(&entry.test_id) {
                    group.tests.push(entry.test_id.clone());
                }
                for file in entry.files.iter().flatten() {
                    if !group.files.contains(file) {
                        group.files.push(file.clone());
                    }
                }
            }
            None => {
                insertion_order.push(key.clone());
                groups.insert(
                    key,
                    Accumulator {
                        feedback_type: entry.feedback_type,
                        area,
                        title,
                        detail: entry.detail.clone(),
                        files: entry.files.clone().unwrap_or_default(),
                        count: 1,
                        tests: vec![entry.test_id.clone()],
                    },
                );
            }
        }
    }

    let mut ranked: Vec<(DedupKey, Accumulator)> = insertion_order
        .into_iter()
        .filter_map(|key| groups.remove_entry(&key))
        .collect();

    ranked.sort_by(|(left_key, left), (right_key, right)| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left_key.area.cmp(&right_key.area))
            .then_with(|| left_key.title_prefix.cmp(&right_key.title_prefix))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(index, (_, group))| FeedbackEntryNormalized {
            id: FeedbackId::for_rank(u64::try_from(index).unwrap_or(u64::MAX) + 1),
            feedback_type: group.feedback_type,
            area: group.area,
            title: group.title,
            detail: group.detail,
            files: group.files,
            count: group.count,
            tests: group.tests,
        })
        .collect()
}

/// Accepted areas pass through; unknown or absent ones are normalized via
/// keyword inference (§4.5). `FeedbackArea` is already a closed serde enum,
/// so any value that deserialized at all is accepted; only the `None` case
/// needs inference here.
fn resolve_area(entry: &FeedbackEntryRaw) -> FeedbackArea {
    entry.area.unwrap_or_else(|| FeedbackArea::infer_from(&entry.title, &entry.detail))
}

/// Drops entries with no usable title after a best-effort derivation from
/// the first sentence of `detail` (§4.5).
fn resolve_title(entry: &FeedbackEntryRaw) -> Option<String> {
    if !entry.title.trim().is_empty() {
        return Some(entry.title.trim().to_string());
    }
    let first_sentence = entry.detail.split(['.', '!', '?']).next().unwrap_or("").trim();
    if first_sentence.is_empty() {
        None
    } else {
        Some(first_sentence.to_string())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
