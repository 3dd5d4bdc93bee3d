//! Character n-gram TF-IDF vector space
//!
//! Built fresh for every comparison: the vocabulary spans only the documents
//! passed to [`TfidfSpace::fit`]. Term frequencies are raw counts, idf is
//! smoothed (`ln((1 + n) / (1 + df)) + 1`) and every vector is L2-normalised,
//! so the cosine of two vectors is their dot product.

use std::collections::HashMap;

/// Inclusive n-gram length range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramRange {
    pub min: usize,
    pub max: usize,
}

impl NgramRange {
    pub fn new(min: usize, max: usize) -> Self {
        let min = min.max(1);
        Self {
            min,
            max: max.max(min),
        }
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self { min: 2, max: 4 }
    }
}

/// Sparse, L2-normalised document vector
pub type SparseVector = HashMap<String, f64>;

/// Count character n-grams of `text` (whitespace runs count as one space)
pub fn char_ngrams(text: &str, range: NgramRange) -> HashMap<String, usize> {
    let chars: Vec<char> = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();

    let mut counts = HashMap::new();
    for n in range.min..=range.max {
        if n > chars.len() {
            break;
        }
        for window in chars.windows(n) {
            *counts.entry(window.iter().collect::<String>()).or_insert(0) += 1;
        }
    }
    counts
}

/// Document vectors of one fitted space
#[derive(Debug, Clone)]
pub struct TfidfSpace {
    vectors: Vec<SparseVector>,
}

impl TfidfSpace {
    /// Fit idf over `documents` and transform each of them
    pub fn fit<S: AsRef<str>>(documents: &[S], range: NgramRange) -> Self {
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| char_ngrams(doc.as_ref(), range))
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: HashMap<&str, f64> = document_frequency
            .iter()
            .map(|(term, df)| (*term, ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0))
            .collect();

        let vectors = counts
            .iter()
            .map(|doc| {
                let mut vector: SparseVector = doc
                    .iter()
                    .map(|(term, tf)| {
                        let weight = *tf as f64 * idf.get(term.as_str()).copied().unwrap_or(1.0);
                        (term.clone(), weight)
                    })
                    .collect();
                let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for weight in vector.values_mut() {
                        *weight /= norm;
                    }
                }
                vector
            })
            .collect();

        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vector(&self, index: usize) -> Option<&SparseVector> {
        self.vectors.get(index)
    }

    /// Cosine similarity between two fitted documents; 0.0 if either is out of range
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        match (self.vectors.get(a), self.vectors.get(b)) {
            (Some(a), Some(b)) => cosine(a, b),
            _ => 0.0,
        }
    }
}

/// Cosine similarity of two L2-normalised sparse vectors, clamped to [0, 1]
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();
    if dot.is_finite() {
        dot.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
