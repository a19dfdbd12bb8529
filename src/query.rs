//! Sample and region extraction from consensus sequence names.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::SampleContext;

/// `Consensus_<sample>_<region>_...`; both segments exclude `_`.
static QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Consensus_([^_]+)_([^_]+)_").expect("valid regex"));

/// Parse a gofasta `query` value. Returns `None` for names not following the
/// consensus naming scheme.
#[must_use]
pub fn parse_query(query: &str) -> Option<SampleContext> {
    let caps = QUERY_RE.captures(query)?;
    Some(SampleContext {
        sample: caps[1].to_string(),
        region: caps[2].to_string(),
    })
}

/// Second `_`-delimited segment of a consensus name, or an empty string.
#[must_use]
pub fn sample_segment(consensus: &str) -> &str {
    consensus.split('_').nth(1).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consensus_name() {
        let context = parse_query("Consensus_SRR123_HA_threshold_0.5_quality_20").unwrap();
        assert_eq!(context.sample, "SRR123");
        assert_eq!(context.region, "HA");
    }

    #[test]
    fn requires_trailing_separator() {
        assert!(parse_query("Consensus_SRR123_HA").is_none());
        assert!(parse_query("Consensus_SRR123_HA_").is_some());
    }

    #[test]
    fn rejects_other_names() {
        assert!(parse_query("SRR123_HA_consensus").is_none());
        assert!(parse_query("consensus_SRR123_HA_x").is_none());
        assert!(parse_query("Consensus__HA_x").is_none());
    }

    #[test]
    fn sample_segment_lookup() {
        assert_eq!(sample_segment("Consensus_SRR123_HA_x"), "SRR123");
        assert_eq!(sample_segment("Consensus"), "");
    }
}
