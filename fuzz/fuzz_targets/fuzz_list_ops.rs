//! Arbitrary mutation sequences against the list invariants.
//!
//! Every op sequence must leave the adapter with pairwise-distinct ids,
//! positions that resolve back to their ids, type indices below the type
//! count, and every position renderable.

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use medley::testing::{CounterConverter, LabelConverter, SeparatorConverter, StubEnv, StubView};
use medley::{Medley, ViewDispatch};

#[derive(Arbitrary, Debug)]
enum Op {
    AppendLabel(String),
    AppendCounter(u32),
    AppendSeparator,
    AppendCounters(Vec<u32>),
    InsertLabel(usize, String),
    RemoveAt(usize),
    RemoveById(usize),
    RemoveFirstCounter(u32),
    Clear,
    Render(usize),
}

fuzz_target!(|ops: Vec<Op>| {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    let mut env = StubEnv::default();
    let mut issued = Vec::new();

    for op in ops {
        match op {
            Op::AppendLabel(text) => {
                issued.push(feed.append(LabelConverter::default(), text).unwrap());
            }
            Op::AppendCounter(n) => {
                issued.push(feed.append(CounterConverter::default(), n).unwrap());
            }
            Op::AppendSeparator => {
                issued.push(feed.append(SeparatorConverter::default(), ()).unwrap());
            }
            Op::AppendCounters(items) => {
                let before = feed.len();
                let count = items.len();
                feed.append_all_of::<CounterConverter>(items).unwrap();
                assert_eq!(feed.len(), before + count);
                issued.extend(feed.ids().skip(before));
            }
            Op::InsertLabel(index, text) => {
                // Mix of in-range and one-past-range inserts.
                let index = index % (feed.len() + 2);
                match feed.insert(index, LabelConverter::default(), text) {
                    Ok(id) => issued.push(id),
                    Err(_) => assert!(index > feed.len()),
                }
            }
            Op::RemoveAt(index) => {
                let len = feed.len();
                let index = index % (len + 2);
                assert_eq!(feed.remove_at(index).is_ok(), index < len);
            }
            Op::RemoveById(seed) => {
                if !issued.is_empty() {
                    // May be live or long retired; both must succeed.
                    feed.remove_by_id(issued[seed % issued.len()]).unwrap();
                }
            }
            Op::RemoveFirstCounter(n) => {
                feed.remove_first_value(&n).unwrap();
            }
            Op::Clear => {
                feed.clear().unwrap();
                assert!(feed.is_empty());
            }
            Op::Render(position) => {
                if !feed.is_empty() {
                    let view = feed
                        .create_or_rebind(position % feed.len(), None, &mut env)
                        .unwrap();
                    assert_eq!(view.log.len(), 1);
                }
            }
        }
        assert_eq!(feed.count(), feed.len());
    }

    let ids: Vec<_> = feed.ids().collect();
    let distinct: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(ids.len(), distinct.len());
    let issued_distinct: HashSet<_> = issued.iter().copied().collect();
    assert_eq!(issued.len(), issued_distinct.len());

    for (position, id) in ids.iter().enumerate() {
        assert_eq!(feed.index_of_id(*id), Some(position));
        assert_eq!(feed.id_at(position), Some(*id));
        let slot = feed.view_type_of(position).unwrap().get();
        assert!(slot < feed.view_type_count());
        assert_eq!(feed.item_id(position).unwrap(), position as u64);
    }
});
