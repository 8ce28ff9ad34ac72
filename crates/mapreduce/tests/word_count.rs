//! End-to-end scenario 1 from the job engine's testable properties: word count.

use mapreduce::{start, MapContext, MapReduceClient, ReduceContext};

struct WordCount;

impl MapReduceClient for WordCount {
    type K1 = String;
    type V1 = String;
    type K2 = String;
    type V2 = u32;
    type K3 = String;
    type V3 = u32;

    fn map(&self, _key: &String, value: &String, context: &mut MapContext<'_, Self>) {
        for word in value.split_whitespace() {
            context.emit2(word.to_string(), 1);
        }
    }

    fn reduce(&self, group: &[(String, u32)], context: &mut ReduceContext<'_, Self>) {
        let key = group[0].0.clone();
        let total: u32 = group.iter().map(|(_, count)| count).sum();
        context.emit3(key, total);
    }
}

#[test]
fn counts_words_across_two_lines() {
    let _ = env_logger::try_init();

    let input = vec![
        ("line1".to_string(), "the cat".to_string()),
        ("line2".to_string(), "the dog".to_string()),
    ];

    let handle = start(WordCount, input, 2).expect("workers should spawn");
    let mut output = handle.close().expect("job should not fail");
    output.sort();

    let mut expected = vec![
        ("cat".to_string(), 1),
        ("dog".to_string(), 1),
        ("the".to_string(), 2),
    ];
    expected.sort();

    assert_eq!(output, expected);
}

#[test]
fn single_worker_produces_the_same_counts() {
    let input = vec![
        ("line1".to_string(), "the cat".to_string()),
        ("line2".to_string(), "the dog".to_string()),
    ];

    let handle = start(WordCount, input, 1).expect("workers should spawn");
    let mut output = handle.close().expect("job should not fail");
    output.sort();

    let mut expected = vec![
        ("cat".to_string(), 1),
        ("dog".to_string(), 1),
        ("the".to_string(), 2),
    ];
    expected.sort();

    assert_eq!(output, expected);
}
