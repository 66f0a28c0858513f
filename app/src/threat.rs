//! Threat narrative segmentation
//!
//! The threat assessment comes back from the model as free text. The
//! prompt asks for labelled lines (`Threat:`, `Risk:`, `Explanation:`,
//! `Suggestions:` followed by `- ` bullets), and when the model obliges
//! the presentation layer can style each segment. When it does not,
//! every unmatched line is kept as plain prose; segmentation never
//! fails and never drops content.

/// One displayable piece of a threat narrative, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreatSegment {
    Threat(String),
    Risk(String),
    Explanation(String),
    SuggestionsHeading,
    Suggestion(String),
    Prose(String),
}

/// Split a narrative into styled segments.
///
/// Blank lines are dropped. A labelled line with empty content after the
/// label is dropped too, except `Suggestions:` which stands alone as a
/// heading for the bullets that follow.
pub fn segment_narrative(narrative: &str) -> Vec<ThreatSegment> {
    let mut segments = Vec::new();

    for line in narrative.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = labelled(line, "Threat:") {
            push_if_nonempty(&mut segments, rest, ThreatSegment::Threat);
        } else if let Some(rest) = labelled(line, "Risk:") {
            push_if_nonempty(&mut segments, rest, ThreatSegment::Risk);
        } else if let Some(rest) = labelled(line, "Explanation:") {
            push_if_nonempty(&mut segments, rest, ThreatSegment::Explanation);
        } else if let Some(rest) = labelled(line, "Suggestions:") {
            segments.push(ThreatSegment::SuggestionsHeading);
            push_if_nonempty(&mut segments, rest, ThreatSegment::Suggestion);
        } else if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            push_if_nonempty(&mut segments, rest, ThreatSegment::Suggestion);
        } else {
            segments.push(ThreatSegment::Prose(line.to_string()));
        }
    }

    segments
}

fn labelled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label).map(str::trim)
}

fn push_if_nonempty(
    segments: &mut Vec<ThreatSegment>,
    content: &str,
    make: fn(String) -> ThreatSegment,
) {
    if !content.is_empty() {
        segments.push(make(content.to_string()));
    }
}
