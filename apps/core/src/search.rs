use serde::{Deserialize, Serialize};

use crate::model::{ClosedTab, TabRecord};
use crate::tab_store::TabCollection;

/// How the open-tab list is arranged before any query is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Most recently updated tab first, like cmd-tab.
    #[default]
    LastSeen,
    /// The order the browser reported the tabs in.
    BrowserOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOrigin {
    Open,
    Closed { url: String },
}

/// A tab annotated for one query evaluation. Always rebuilt, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub record: TabRecord,
    pub score: i64,
    pub origin: CandidateOrigin,
}

impl Candidate {
    pub fn open(record: TabRecord) -> Self {
        Self {
            record,
            score: 0,
            origin: CandidateOrigin::Open,
        }
    }

    pub fn closed(tab: &ClosedTab) -> Self {
        Self {
            record: tab.to_record(),
            score: 0,
            origin: CandidateOrigin::Closed {
                url: tab.url.clone(),
            },
        }
    }

    pub fn render_index(&self) -> usize {
        self.record.render_index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchQuery {
    whole: String,
    words: Vec<String>,
}

impl SearchQuery {
    /// `None` when the query has no non-empty word.
    fn parse(query: &str) -> Option<Self> {
        let whole = query.to_lowercase();
        let words: Vec<String> = whole
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        if words.is_empty() {
            return None;
        }
        Some(Self { whole, words })
    }

    fn whole_without_last_char(&self) -> &str {
        match self.whole.char_indices().last() {
            Some((index, _)) => &self.whole[..index],
            None => "",
        }
    }
}

pub fn order_for_sort_mode(tabs: &TabCollection, mode: SortMode) -> Vec<TabRecord> {
    match mode {
        SortMode::LastSeen => tabs.iter().rev().cloned().collect(),
        SortMode::BrowserOrder => tabs.iter().cloned().collect(),
    }
}

/// Filters and ranks `candidates` for `query`, assigning render indices in
/// output order. An empty query returns the input unchanged apart from
/// indexing.
pub fn rank(query: &str, candidates: &[TabRecord]) -> Vec<TabRecord> {
    let wrapped = candidates.iter().cloned().map(Candidate::open).collect();
    rank_candidates(query, wrapped)
        .into_iter()
        .map(|candidate| candidate.record)
        .collect()
}

pub fn rank_candidates(query: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let Some(query) = SearchQuery::parse(query) else {
        let mut unscored = candidates;
        for candidate in &mut unscored {
            candidate.score = 0;
        }
        return reindex(unscored);
    };

    let mut ranked: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| passes_coarse_filter(&candidate.record, &query))
        .filter_map(|mut candidate| {
            let score = score_record(&candidate.record, &query);
            if score <= 0 {
                return None;
            }
            candidate.score = score;
            Some(candidate)
        })
        .collect();

    // `sort_by` is stable: equal scores keep their incoming order.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    reindex(ranked)
}

/// Ranks open and closed tabs independently, then lists open results first.
pub fn build_candidate_list(query: &str, open: &[TabRecord], closed: &[ClosedTab]) -> Vec<Candidate> {
    let open_candidates = open.iter().cloned().map(Candidate::open).collect();
    let closed_candidates = closed.iter().map(Candidate::closed).collect();

    let mut combined = rank_candidates(query, open_candidates);
    combined.extend(rank_candidates(query, closed_candidates));
    reindex(combined)
}

/// Relevance of one record; zero or less means "not a match".
pub fn score(query: &str, record: &TabRecord) -> i64 {
    match SearchQuery::parse(query) {
        Some(query) => score_record(record, &query),
        None => 0,
    }
}

fn reindex(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.record.render_index = index;
    }
    candidates
}

fn passes_coarse_filter(record: &TabRecord, query: &SearchQuery) -> bool {
    let haystack = format!("{} {}", record.host, record.title).to_lowercase();
    query.words.iter().all(|word| haystack.contains(word.as_str()))
}

fn score_for_match(text: &str, query: &SearchQuery) -> i64 {
    let tokens: Vec<&str> = text.split(' ').filter(|token| !token.is_empty()).collect();
    let mut score = 0;

    let every_word_in_a_token = query
        .words
        .iter()
        .all(|word| tokens.iter().any(|token| token.contains(word.as_str())));
    if every_word_in_a_token {
        score += 1;
    }

    if text.contains(&query.whole) || tokens.join(" ").contains(&query.whole) {
        score += 1;
    }

    score
}

fn score_record(record: &TabRecord, query: &SearchQuery) -> i64 {
    let host = record.host.to_lowercase();
    let title = record.title.to_lowercase();
    let whole = query.whole.as_str();

    let mut score = score_for_match(&host, query);
    score += score_for_match(&format!("{title} {host}"), query);

    if title.starts_with(whole) {
        score += 5;
    }

    let mut parts: Vec<&str> = host.split('.').collect();
    let domain_zone = parts.pop().unwrap_or_default();
    parts.reverse();

    let single_part = parts.len() == 1;
    let truncated = query.whole_without_last_char();
    for (index, part) in parts.iter().enumerate() {
        let multiplier = if single_part {
            20
        } else if index == 0 {
            10
        } else {
            1
        };

        if part.is_empty() {
            continue;
        }

        if *part == whole || *part == truncated {
            score += 10 * multiplier;
        }

        if part.starts_with(whole) {
            score += 5 * multiplier;
        } else if part.contains(whole) {
            score += 2;
        }
    }

    if score == 0 && host.contains(whole) {
        score += 1;
    }

    if domain_zone.contains(whole) {
        score += 1;
    }

    score
}
