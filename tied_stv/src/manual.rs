/*!

This is the long-form manual for `tied_stv` and `tiedstv`.

## Counting rule

Every voter ranks some of the candidates. Several candidates may share the same
rank (a tie group), and candidates may be left out.

The count proceeds in rounds. In each round, every ballot goes to the most
preferred tie group that still contains a running candidate, and its weight is
split evenly between the running candidates of that group. A ballot that ranks
no running candidate is exhausted for that round.

All the candidates with the lowest score are then removed together. Scores that
differ by less than `1e-9` count as equal. The count stops when no candidate is
left: the winners are the candidates removed in the last round. When more than
one candidate is removed in that round, the election has joint winners.

This is not conventional STV: there are no seats or quotas, and co-lowest
candidates are never separated by a tie-break.

## Manipulation search

Given an election with a single winner `W`, the search looks for the smallest
number of voters who, by all casting the same insincere ballot, make another
candidate `T` the single winner.

- The voters all come from the same ballot type, and this ballot type must rank
  `T` strictly above `W`.
- Their ballot ranks `T` first and `W` last, and keeps the order of their
  sincere ballot for everybody else. Ties are resolved in the order in which the
  candidates were listed, and unranked candidates come next by increasing
  identifier.
- Among coalitions of the same size, targets are examined by increasing
  identifier, then ballot types in input order. The first one found is kept.

The search is exhaustive: it runs one count for every target, every ballot type
and every coalition size up to the weight of that ballot type. The combinations
can be examined in parallel with the `--parallel` flag, without changing the result.

## Input format

The program reads files in the style of PrefLib (`.toi`, `.soi`, `.toc`, `.soc`):

```text
# NUMBER ALTERNATIVES: 3
# ALTERNATIVE NAME 1: Alice
# ALTERNATIVE NAME 2: Bob
# ALTERNATIVE NAME 3: Charlie
3: 1,2,3
2: 2,{1,3}
1: 3
```

Lines starting with `#` are metadata. Only the candidate names are read, other
metadata is ignored. Other lines are `count: preferences`, where the preferences
are separated by commas or spaces and a tie group is written between braces.
The candidates are all the named ones and all the ranked ones.

## Configuration

`tiedstv` can be run with command line flags only, or with a configuration file
in JSON:

```text
{
  "outputSettings": { "contestName": "Board election", "outputPath": "summary.json" },
  "datasetSource": { "filePath": "ballots.toi", "provider": "preflib" },
  "search": { "enabled": true, "parallel": false }
}
```

The path of the dataset is relative to the directory of the configuration file.
Flags given on the command line take precedence over the configuration file.

## Output

The outcome of the count and of the search is printed on the standard output.
With `--out`, a summary in JSON format is also written, with the scores of every
round, the elimination order and the coalition found. With `--reference`, this
summary is compared to a previously saved one, and the program fails if they differ.

 */
