use std::fmt::Write as _;
use std::path::Path;

use crate::error::BenchError;

pub const OCCURRENCES_HEADER: &str = "Word occurrences in responses:";
pub const CONTAINMENT_HEADER: &str = "Number of responses containing each word:";

/// Counts for one configured word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTally {
    pub word: String,
    /// Total substring matches across all responses.
    pub occurrences: usize,
    /// Responses with at least one match.
    pub responses_containing: usize,
}

/// Lexical report for one model, in configured word order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    tallies: Vec<WordTally>,
}

/// Non-overlapping substring matches of `needle` in `haystack`.
/// Both arguments are expected to be case-folded already.
pub fn count_substring(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

impl Report {
    /// Case-insensitive substring counts. Partial-word hits count:
    /// "cat" matches inside "category".
    pub fn compute<'a, I>(responses: I, words: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let folded_words: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let mut tallies: Vec<WordTally> = words
            .iter()
            .map(|w| WordTally {
                word: w.clone(),
                occurrences: 0,
                responses_containing: 0,
            })
            .collect();

        for response in responses {
            let text = response.to_lowercase();
            for (tally, word) in tallies.iter_mut().zip(&folded_words) {
                let hits = count_substring(&text, word);
                tally.occurrences += hits;
                if hits > 0 {
                    tally.responses_containing += 1;
                }
            }
        }

        Self { tallies }
    }

    pub fn tallies(&self) -> &[WordTally] {
        &self.tallies
    }

    pub fn occurrences(&self, word: &str) -> Option<usize> {
        self.find(word).map(|t| t.occurrences)
    }

    pub fn responses_containing(&self, word: &str) -> Option<usize> {
        self.find(word).map(|t| t.responses_containing)
    }

    fn find(&self, word: &str) -> Option<&WordTally> {
        self.tallies.iter().find(|t| t.word == word)
    }

    /// Two labeled sections, one `<word>: <count>` line per word each.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{OCCURRENCES_HEADER}");
        for t in &self.tallies {
            let _ = writeln!(out, "{}: {}", t.word, t.occurrences);
        }
        let _ = writeln!(out, "{CONTAINMENT_HEADER}");
        for t in &self.tallies {
            let _ = writeln!(out, "{}: {}", t.word, t.responses_containing);
        }
        out
    }

    /// Same sections as `render`, with the model named in each header.
    pub fn render_for_model(&self, model: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Word occurrences in responses for model {model}:");
        for t in &self.tallies {
            let _ = writeln!(out, "{}: {}", t.word, t.occurrences);
        }
        let _ = writeln!(out, "Number of responses containing each word for model {model}:");
        for t in &self.tallies {
            let _ = writeln!(out, "{}: {}", t.word, t.responses_containing);
        }
        out
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), BenchError> {
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}
