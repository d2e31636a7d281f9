//! Parsing of the denormalized `votes` column of `hive_posts_cache`.
//!
//! The indexer stores one voter per line as `voter,rshares,percent,reputation`.
//! The reputation field is dropped from the API output.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub voter: String,
    pub rshares: String,
    pub percent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line} has {fields} fields, expected 4")]
pub struct VoteParseError {
    pub line: usize,
    pub fields: usize,
}

/// Parses a votes blob. Any line without exactly four fields fails the
/// whole blob.
pub fn parse_votes(blob: &str) -> Result<Vec<Vote>, VoteParseError> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }

    blob.lines()
        .enumerate()
        .map(|(idx, line)| {
            let fields: Vec<&str> = line.split(',').collect();
            match fields.as_slice() {
                [voter, rshares, percent, _reputation] => Ok(Vote {
                    voter: voter.to_string(),
                    rshares: rshares.to_string(),
                    percent: percent.to_string(),
                }),
                _ => Err(VoteParseError {
                    line: idx + 1,
                    fields: fields.len(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(voter: &str, rshares: &str, percent: &str) -> Vote {
        Vote {
            voter: voter.into(),
            rshares: rshares.into(),
            percent: percent.into(),
        }
    }

    #[test]
    fn parses_lines_and_drops_reputation() {
        let votes = parse_votes("alice,100,50,25\nbob,-10,0,10").unwrap();
        assert_eq!(votes, vec![vote("alice", "100", "50"), vote("bob", "-10", "0")]);
    }

    #[test]
    fn serializes_as_voter_rshares_percent() {
        let votes = parse_votes("alice,100,50,25").unwrap();
        let json = serde_json::to_value(&votes).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"voter": "alice", "rshares": "100", "percent": "50"}])
        );
    }

    #[test]
    fn empty_blob_is_empty_sequence() {
        assert!(parse_votes("").unwrap().is_empty());
        assert!(parse_votes("  \n").unwrap().is_empty());
    }

    #[test]
    fn trailing_newline_is_not_a_record() {
        let votes = parse_votes("alice,100,50,25\n").unwrap();
        assert_eq!(votes.len(), 1);
    }

    #[test]
    fn wrong_field_count_fails_whole_blob() {
        let err = parse_votes("alice,100,50,25\nbob,-10,0").unwrap_err();
        assert_eq!(err, VoteParseError { line: 2, fields: 3 });

        let err = parse_votes("alice,100,50,25,extra").unwrap_err();
        assert_eq!(err.fields, 5);
    }

    #[test]
    fn blank_line_in_the_middle_fails() {
        let err = parse_votes("alice,100,50,25\n\nbob,-10,0,10").unwrap_err();
        assert_eq!(err, VoteParseError { line: 2, fields: 1 });
    }
}
