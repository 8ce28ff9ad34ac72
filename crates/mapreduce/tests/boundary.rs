//! End-to-end scenarios 3 and 4: empty input, and a comparator under which every key
//! collapses into a single group.

use mapreduce::{start, MapContext, MapReduceClient, ReduceContext, Stage};

struct Identity;

impl MapReduceClient for Identity {
    type K1 = i32;
    type V1 = i32;
    type K2 = i32;
    type V2 = i32;
    type K3 = i32;
    type V3 = i32;

    fn map(&self, key: &i32, value: &i32, context: &mut MapContext<'_, Self>) {
        context.emit2(*key, *value);
    }

    fn reduce(&self, group: &[(i32, i32)], context: &mut ReduceContext<'_, Self>) {
        for (key, value) in group {
            context.emit3(*key, *value);
        }
    }
}

#[test]
fn empty_input_yields_empty_output_and_a_finished_state() {
    let _ = env_logger::try_init();

    let handle = start(Identity, Vec::new(), 4).expect("workers should spawn");
    handle.wait().expect("job should not fail");

    let state = handle.get_state();
    assert_eq!(state.stage, Stage::Reduce);
    assert!((state.percentage - 100.0).abs() < f64::EPSILON);

    let output = handle.close().expect("job should not fail");
    assert!(output.is_empty());
}

/// Every intermediate pair is grouped under the same key, regardless of its input value,
/// so the shuffle phase collapses everything into a single reduce group.
struct AllEqual;

impl MapReduceClient for AllEqual {
    type K1 = i32;
    type V1 = i32;
    type K2 = ();
    type V2 = i32;
    type K3 = i32;
    type V3 = ();

    fn map(&self, _key: &i32, value: &i32, context: &mut MapContext<'_, Self>) {
        context.emit2((), *value);
    }

    fn reduce(&self, group: &[((), i32)], context: &mut ReduceContext<'_, Self>) {
        assert_eq!(group.len(), 100, "degenerate comparator should yield one group of 100");
        for (_, value) in group {
            context.emit3(*value, ());
        }
    }
}

#[test]
fn degenerate_comparator_collapses_every_key_into_one_group() {
    let input: Vec<(i32, i32)> = (0..100).map(|n| (n, n)).collect();

    let handle = start(AllEqual, input, 4).expect("workers should spawn");
    let output = handle.close().expect("job should not fail");

    assert_eq!(output.len(), 100);
}
