// Primitives for reading election files in the PrefLib style (.soc, .soi, .toc, .toi).

use std::collections::{BTreeSet, HashMap};

use tied_stv::builder::Builder;

use crate::election::*;

/// The content of a dataset file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Dataset {
    /// Sorted and unique.
    pub candidates: Vec<CandidateId>,
    /// Display names. Not all the candidates may have a name.
    pub names: HashMap<CandidateId, String>,
    /// The ballot types, in the order of the file.
    pub ballots: Vec<Ballot>,
}

pub fn read_preflib(path: &str) -> TsResult<Dataset> {
    info!("Attempting to read dataset {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningDatasetSnafu { path })?;
    parse_dataset(contents.as_str())
}

pub fn parse_dataset(contents: &str) -> TsResult<Dataset> {
    let mut declared: BTreeSet<u32> = BTreeSet::new();
    let mut names: HashMap<CandidateId, String> = HashMap::new();
    let mut parsed_ballots: Vec<(u64, Vec<Vec<u32>>)> = Vec::new();

    for (idx, raw_line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(meta) = line.strip_prefix('#') {
            if meta.contains("ALTERNATIVE NAME") {
                let (cid, name) = parse_alternative_name(meta, lineno)?;
                declared.insert(cid);
                names.insert(CandidateId(cid), name);
            }
            continue;
        }

        if let Some((count_s, pref_s)) = line.split_once(':') {
            let count: u64 = count_s
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|c| *c > 0)
                .context(ParsingCountSnafu {
                    lineno,
                    content: count_s.trim(),
                })?;
            let ranking = parse_preferences(pref_s.trim(), lineno)?;
            debug!(
                "parse_dataset: lineno: {:?} count: {:?} ranking: {:?}",
                lineno, count, ranking
            );
            for group in ranking.iter() {
                declared.extend(group.iter().cloned());
            }
            parsed_ballots.push((count, ranking));
        } else {
            warn!("parse_dataset: lineno {}: skipping line {:?}", lineno, line);
        }
    }

    let candidate_ids: Vec<u32> = declared.into_iter().collect();
    let mut builder = Builder::new()
        .candidates(&candidate_ids)
        .context(VotingSnafu {})?;
    for (count, ranking) in parsed_ballots.iter() {
        builder
            .add_ballot(*count, ranking)
            .context(VotingSnafu {})?;
    }
    let election = builder.build().context(VotingSnafu {})?;

    Ok(Dataset {
        candidates: election.candidates,
        names,
        ballots: election.ballots,
    })
}

// Reads a line such as "ALTERNATIVE NAME 3: Charlie" (without the leading '#').
fn parse_alternative_name(meta: &str, lineno: usize) -> TsResult<(u32, String)> {
    let (left, name) = meta.split_once(':').context(ParsingAlternativeSnafu {
        lineno,
        content: meta,
    })?;
    let cid: u32 = left
        .split_whitespace()
        .last()
        .and_then(|s| s.parse::<u32>().ok())
        .context(ParsingAlternativeSnafu {
            lineno,
            content: meta,
        })?;
    Ok((cid, name.trim().to_string()))
}

/// Parses the preferences of a ballot into tie groups, the most preferred first.
///
/// Groups are separated by commas or spaces. A bare number is a group on its own, and
/// a tie group is written between braces: `1,{2,3},4`. Empty braces are ignored.
pub fn parse_preferences(pref: &str, lineno: usize) -> TsResult<Vec<Vec<u32>>> {
    let mut ranking: Vec<Vec<u32>> = Vec::new();
    let mut chars = pref.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ',' => {
                chars.next();
            }
            '{' => {
                chars.next();
                let mut group: Vec<u32> = Vec::new();
                let mut num = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) if d.is_ascii_digit() => num.push(d),
                        Some(d) if d.is_whitespace() || d == ',' => {
                            flush_number(&mut num, &mut group, pref, lineno)?;
                        }
                        // Unknown character or unterminated group
                        _ => {
                            return ParsingPreferenceSnafu {
                                lineno,
                                content: pref,
                            }
                            .fail();
                        }
                    }
                }
                flush_number(&mut num, &mut group, pref, lineno)?;
                if !group.is_empty() {
                    ranking.push(group);
                }
            }
            d if d.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    num.push(d);
                    chars.next();
                }
                let mut group: Vec<u32> = Vec::new();
                flush_number(&mut num, &mut group, pref, lineno)?;
                ranking.push(group);
            }
            _ => {
                return ParsingPreferenceSnafu {
                    lineno,
                    content: pref,
                }
                .fail();
            }
        }
    }
    Ok(ranking)
}

fn flush_number(
    num: &mut String,
    group: &mut Vec<u32>,
    pref: &str,
    lineno: usize,
) -> TsResult<()> {
    if num.is_empty() {
        return Ok(());
    }
    let cid = num.parse::<u32>().ok().context(ParsingPreferenceSnafu {
        lineno,
        content: pref,
    })?;
    group.push(cid);
    num.clear();
    Ok(())
}
