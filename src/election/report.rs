// Console report and JSON summary of a run.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;
use serde_json::Map as JSMap;

use crate::election::*;

const UNKNOWN_NAME: &str = "UNKNOWN";

fn display_name(names: &HashMap<CandidateId, String>, cid: &CandidateId) -> String {
    names
        .get(cid)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

fn groups_to_ids(groups: &[Vec<CandidateId>]) -> Vec<Vec<u32>> {
    groups
        .iter()
        .map(|g| g.iter().map(|cid| cid.0).collect())
        .collect()
}

fn ids(cids: &[CandidateId]) -> Vec<u32> {
    cids.iter().map(|cid| cid.0).collect()
}

pub fn print_tabulation(result: &TabulationResult, names: &HashMap<CandidateId, String>) {
    println!("Original elimination order (first out -> last out):");
    println!("{:?}", groups_to_ids(&result.elimination_order));
    println!("Original winner(s) by ID: {:?}", ids(&result.winners));
    println!("Original winner(s) by name:");
    for w in result.winners.iter() {
        println!("{}: {}", w, display_name(names, w));
    }
    println!();
}

pub fn print_manipulation(
    result: &TabulationResult,
    manipulation: Option<&ManipulationResult>,
    names: &HashMap<CandidateId, String>,
    runtime: Duration,
) {
    println!(
        "Manipulation search runtime: {:.4} seconds",
        runtime.as_secs_f64()
    );
    println!();

    match manipulation {
        None if result.winners.len() != 1 => {
            println!(
                "The original election has {} winners; the manipulation search requires a single winner.",
                result.winners.len()
            );
        }
        None => {
            println!(
                "No manipulating coalition found under the search model (single ballot type, common ballot)."
            );
        }
        Some(m) => {
            println!("Election is manipulable under the search model.");
            println!();
            println!(
                "True winner (before manipulation): {} ({})",
                m.original_winner,
                display_name(names, &m.original_winner)
            );
            println!("Smallest coalition size: {} voters", m.coalition_size);
            println!("Coalition comes from ballot type index: {}", m.type_index);
            println!("True ranking of that type: {:?}", m.sincere_ranking.to_ids());
            println!(
                "Strategic ballot they all submit: {:?}",
                m.strategic_ranking.to_ids()
            );
            println!(
                "New winner after manipulation: {} ({})",
                m.target,
                display_name(names, &m.target)
            );
            println!("New elimination order under manipulation:");
            println!("{:?}", groups_to_ids(&m.elimination_order));
        }
    }
}

fn result_stats_to_json(rs: &TabulationResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (cid, score) in round_stat.scores.iter() {
            tally.insert(cid.to_string(), json!(score.to_string()));
        }
        let js = json!({
            "round": round_stat.round,
            "tally": tally,
            "exhausted": round_stat.exhausted.to_string(),
            "eliminated": ids(&round_stat.eliminated),
        });
        l.push(js);
    }
    l
}

fn manipulation_to_json(m: &ManipulationResult) -> JSValue {
    json!({
        "originalWinner": m.original_winner.0,
        "coalitionSize": m.coalition_size,
        "target": m.target.0,
        "typeIndex": m.type_index,
        "sincereRanking": m.sincere_ranking.to_ids(),
        "strategicRanking": m.strategic_ranking.to_ids(),
        "eliminationOrder": groups_to_ids(&m.elimination_order),
    })
}

fn total_voters(ballots: &[Ballot]) -> TsResult<u64> {
    let mut total: u64 = 0;
    for (idx, b) in ballots.iter().enumerate() {
        total = match total.checked_add(b.count) {
            Some(t) => t,
            None => whatever!("The number of voters overflows at ballot type {}", idx),
        };
    }
    Ok(total)
}

/// The summary of a run.
///
/// `manipulation` is `None` when the search was not run. The search runtime is not
/// included so that summaries can be compared between runs.
pub fn build_summary_js(
    contest: &str,
    dataset: &Dataset,
    result: &TabulationResult,
    manipulation: Option<Option<&ManipulationResult>>,
) -> TsResult<JSValue> {
    let c = OutputConfig {
        contest: contest.to_string(),
        ballot_types: dataset.ballots.len(),
        voters: total_voters(&dataset.ballots)?,
    };
    let candidates: Vec<JSValue> = dataset
        .candidates
        .iter()
        .map(|cid| json!({"id": cid.0, "name": display_name(&dataset.names, cid)}))
        .collect();

    let mut js = json!({
        "config": c,
        "candidates": candidates,
        "results": result_stats_to_json(result),
        "winners": ids(&result.winners),
        "eliminationOrder": groups_to_ids(&result.elimination_order),
    });
    if let Some(found) = manipulation {
        js["manipulation"] = match found {
            Some(m) => manipulation_to_json(m),
            None => JSValue::Null,
        };
    }
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_without_search() {
        let dataset = parse_dataset("# ALTERNATIVE NAME 1: Alice\n2: 1,{2,3}\n1: 3\n").unwrap();
        let result = tabulate(&dataset.candidates, &dataset.ballots).unwrap();
        let js = build_summary_js("test", &dataset, &result, None).unwrap();
        assert!(js.get("manipulation").is_none());
        assert_eq!(js["config"]["voters"], json!(3));
        assert_eq!(js["candidates"][1], json!({"id": 2, "name": "UNKNOWN"}));
        assert_eq!(
            js["results"][0],
            json!({"round": 1, "tally": {"1": "2", "2": "0", "3": "1"}, "exhausted": "0", "eliminated": [2]})
        );
        assert_eq!(js["winners"], json!([1]));
        assert_eq!(js["eliminationOrder"], json!([[2], [3], [1]]));
    }

    #[test]
    fn summary_with_empty_search() {
        let dataset = parse_dataset("2: 1\n2: 2\n").unwrap();
        let result = tabulate(&dataset.candidates, &dataset.ballots).unwrap();
        let js = build_summary_js("test", &dataset, &result, Some(None)).unwrap();
        assert_eq!(js["manipulation"], JSValue::Null);
        assert_eq!(js["winners"], json!([1, 2]));
    }

    #[test]
    fn voter_total_overflow_is_an_error() {
        let dataset = parse_dataset("18446744073709551615: 1\n1: 2\n").unwrap();
        let result = tabulate(&dataset.candidates, &dataset.ballots).unwrap();
        assert_eq!(result.winners, vec![CandidateId(1)]);
        let res = build_summary_js("test", &dataset, &result, None);
        assert!(matches!(res, Err(TiedStvError::Whatever { .. })));
    }

    #[test]
    fn voter_total_at_the_limit() {
        let dataset = parse_dataset("18446744073709551614: 1\n1: 2\n").unwrap();
        let result = tabulate(&dataset.candidates, &dataset.ballots).unwrap();
        let js = build_summary_js("test", &dataset, &result, None).unwrap();
        assert_eq!(js["config"]["voters"], json!(u64::MAX));
    }
}
