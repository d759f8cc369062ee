use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::application::ports::chat_model::{GroundingChunk, GroundingEvidence};

/// Delimiter the retrieval backend inserts between source pages.
static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)-{3}\s*PAGE\s+(\d+)\s*-{3}").expect("page marker pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CitationConfig {
    /// References scored below this are ignored during extraction.
    pub min_confidence: f64,
    /// Citations at or above this are displayed as strong evidence.
    pub high_confidence: f64,
    pub snippet_max_chars: usize,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.1,
            high_confidence: 0.7,
            snippet_max_chars: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCitation {
    pub document_id: Uuid,
    pub pages: Vec<i32>,
    pub snippet: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Default)]
struct Accumulator {
    pages: BTreeSet<i32>,
    snippet: Option<String>,
    confidence: Option<f64>,
    first_seen: usize,
}

/// Folds grounding evidence into one citation per resolved local document.
#[derive(Debug, Clone)]
pub struct CitationExtractor {
    config: CitationConfig,
}

impl CitationExtractor {
    pub fn new(config: CitationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> CitationConfig {
        self.config
    }

    /// Distinct document display names the chunks point at.
    pub fn referenced_titles(&self, evidence: &GroundingEvidence) -> BTreeSet<String> {
        evidence
            .chunks
            .iter()
            .filter_map(|chunk| chunk.title.as_deref())
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// `catalog` maps display names to local document ids; chunks whose title is
    /// not in it are dropped. Output is ranked by confidence, highest first.
    pub fn extract(
        &self,
        evidence: &GroundingEvidence,
        catalog: &HashMap<String, Uuid>,
    ) -> Vec<ExtractedCitation> {
        let mut by_document: HashMap<Uuid, Accumulator> = HashMap::new();

        match evidence.supports.as_deref() {
            Some(supports) if !supports.is_empty() => {
                for support in supports {
                    for (position, &chunk_index) in support.chunk_indices.iter().enumerate() {
                        let score = support.confidence_scores.get(position).copied();
                        if score.is_some_and(|s| s < self.config.min_confidence) {
                            continue;
                        }
                        let Some(chunk) = evidence.chunks.get(chunk_index) else {
                            continue;
                        };
                        self.accumulate(&mut by_document, chunk, catalog, score);
                    }
                }
            }
            _ => {
                for chunk in &evidence.chunks {
                    self.accumulate(&mut by_document, chunk, catalog, None);
                }
            }
        }

        let mut ranked: Vec<(Uuid, Accumulator)> = by_document.into_iter().collect();
        ranked.sort_by_key(|(_, acc)| acc.first_seen);
        // Stable: equal confidences keep first-appearance order.
        ranked.sort_by(|(_, a), (_, b)| match (a.confidence, b.confidence) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        ranked
            .into_iter()
            .map(|(document_id, acc)| ExtractedCitation {
                document_id,
                pages: acc.pages.into_iter().collect(),
                snippet: acc.snippet,
                confidence: acc.confidence,
            })
            .collect()
    }

    fn accumulate(
        &self,
        by_document: &mut HashMap<Uuid, Accumulator>,
        chunk: &GroundingChunk,
        catalog: &HashMap<String, Uuid>,
        score: Option<f64>,
    ) {
        let Some(document_id) = chunk
            .title
            .as_deref()
            .and_then(|title| catalog.get(title.trim()))
            .copied()
        else {
            return;
        };

        let next_order = by_document.len();
        let acc = by_document.entry(document_id).or_insert_with(|| Accumulator {
            first_seen: next_order,
            ..Default::default()
        });

        if let Some(text) = chunk.text.as_deref() {
            acc.pages.extend(extract_pages(text));
            if acc.snippet.is_none() {
                acc.snippet = make_snippet(text, self.config.snippet_max_chars);
            }
        }

        if let Some(score) = score {
            acc.confidence = Some(acc.confidence.map_or(score, |best| best.max(score)));
        }
    }
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new(CitationConfig::default())
    }
}

/// Page numbers named by page markers in `text`, sorted and deduplicated.
pub fn extract_pages(text: &str) -> Vec<i32> {
    let pages: BTreeSet<i32> = PAGE_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .collect();
    pages.into_iter().collect()
}

/// Marker-free, whitespace-collapsed excerpt; `None` when nothing remains.
pub fn make_snippet(text: &str, max_chars: usize) -> Option<String> {
    let stripped = PAGE_MARKER.replace_all(text, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.chars().count() <= max_chars {
        return Some(trimmed.to_string());
    }

    let cut: String = trimmed.chars().take(max_chars).collect();
    Some(format!("{}...", cut.trim_end()))
}
