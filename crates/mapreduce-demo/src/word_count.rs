use mapreduce::{MapContext, MapReduceClient, ReduceContext};

/// Splits each line into whitespace-delimited words and sums their occurrences.
pub struct WordCount;

impl MapReduceClient for WordCount {
    type K1 = usize;
    type V1 = String;
    type K2 = String;
    type V2 = u32;
    type K3 = String;
    type V3 = u32;

    fn map(&self, _line_number: &usize, line: &String, context: &mut MapContext<'_, Self>) {
        for word in line.split_whitespace() {
            context.emit2(word.to_lowercase(), 1);
        }
    }

    fn reduce(&self, group: &[(String, u32)], context: &mut ReduceContext<'_, Self>) {
        let word = group[0].0.clone();
        let total: u32 = group.iter().map(|(_, count)| count).sum();
        context.emit3(word, total);
    }
}
