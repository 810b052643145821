//! End-to-end contract tests: the adapter as a host widget consumes it.
//!
//! These tests drive the public surface only — list mutation, the connection
//! guard, and the dispatch contract — the way a recycling host would, with a
//! type-keyed view cache standing in for the host's recycled-view pool.

#![forbid(unsafe_code)]

use std::collections::HashSet;

use medley::testing::{
    CounterConverter, LabelConverter, RecordingListener, SeparatorConverter, StubEnv, StubView,
};
use medley::{
    AdapterContext, BinderId, Converter, ListChange, Medley, MedleyError, OwnerContext, TypeIndex,
    ViewDispatch,
};

// =============================================================================
// Host-side helpers
// =============================================================================

/// The host's recycled-view pool: one shelf per view type.
struct RowCache {
    shelves: Vec<Vec<StubView>>,
}

impl RowCache {
    fn new(view_types: usize) -> Self {
        Self {
            shelves: vec![Vec::new(); view_types],
        }
    }

    fn take(&mut self, type_index: TypeIndex) -> Option<StubView> {
        self.shelves[type_index.get()].pop()
    }

    fn put(&mut self, type_index: TypeIndex, view: StubView) {
        self.shelves[type_index.get()].push(view);
    }
}

/// Render every row once, recycling from `cache` where the type matches.
fn render_pass(
    feed: &Medley<StubView, StubEnv>,
    cache: &mut RowCache,
    env: &mut StubEnv,
) -> Vec<(TypeIndex, StubView)> {
    (0..feed.count())
        .map(|position| {
            let type_index = feed.view_type_of(position).expect("position in range");
            let recycled = cache.take(type_index);
            let view = feed
                .create_or_rebind(position, recycled, env)
                .expect("position in range");
            (type_index, view)
        })
        .collect()
}

fn shelve(cache: &mut RowCache, rows: Vec<(TypeIndex, StubView)>) {
    for (type_index, view) in rows {
        cache.put(type_index, view);
    }
}

fn mixed_feed() -> Medley<StubView, StubEnv> {
    let mut feed = Medley::new();
    feed.append(LabelConverter::default(), String::from("alpha"))
        .expect("append label");
    feed.append(CounterConverter::default(), 1)
        .expect("append counter");
    feed.append(SeparatorConverter::default(), ())
        .expect("append separator");
    feed.append(LabelConverter::default(), String::from("omega"))
        .expect("append label");
    feed
}

// =============================================================================
// List contract
// =============================================================================

#[test]
fn count_tracks_every_structural_mutation() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    assert_eq!(feed.count(), 0);

    feed.append(LabelConverter::default(), String::from("a"))
        .expect("append");
    feed.insert(0, LabelConverter::default(), String::from("b"))
        .expect("insert");
    feed.append_all(CounterConverter::default(), vec![1, 2, 3])
        .expect("batch append");
    assert_eq!(feed.count(), 5);

    feed.remove_at(4).expect("remove at");
    assert_eq!(feed.count(), 4);
    feed.remove_first_value(&String::from("b"))
        .expect("remove by value");
    assert_eq!(feed.count(), 3);

    feed.clear().expect("clear");
    assert_eq!(feed.count(), 0);
}

#[test]
fn single_type_feed_add_then_remove_by_id() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    let first = feed
        .append(LabelConverter::default(), String::from("x"))
        .expect("append x");
    let second = feed
        .append(LabelConverter::default(), String::from("y"))
        .expect("append y");

    assert_eq!(feed.count(), 2);
    assert_eq!(feed.view_type_of(0).expect("row 0").get(), 0);
    assert_eq!(feed.view_type_of(1).expect("row 1").get(), 0);

    feed.remove_by_id(first).expect("remove first");
    assert_eq!(feed.count(), 1);
    assert_eq!(feed.index_of(&String::from("y")), Some(0));
    assert_eq!(feed.index_of_id(second), Some(0));
}

#[test]
fn live_ids_stay_pairwise_distinct() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    let mut handed_out = HashSet::new();

    for round in 0..4u32 {
        for value in 0..8u32 {
            let id = feed
                .append(CounterConverter::default(), round * 8 + value)
                .expect("append");
            assert!(handed_out.insert(id), "id {id} handed out twice");
        }
        for _ in 0..4 {
            feed.remove_at(0).expect("remove");
        }
    }

    let live: Vec<BinderId> = feed.ids().collect();
    let distinct: HashSet<BinderId> = live.iter().copied().collect();
    assert_eq!(live.len(), distinct.len());
}

#[test]
fn id_lookup_sentinel_tracks_presence() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    let id = feed
        .append(LabelConverter::default(), String::from("here"))
        .expect("append");

    assert_eq!(feed.index_of_id(id), Some(0));
    assert_eq!(feed.id_at(0), Some(id));

    feed.remove_by_id(id).expect("remove");
    assert_eq!(feed.index_of_id(id), None);
    assert_eq!(feed.id_at(0), None);
}

#[test]
fn value_lookups_respect_payload_types() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.append(CounterConverter::default(), 7)
        .expect("append counter");
    feed.append(LabelConverter::default(), String::from("7"))
        .expect("append label");

    // Same-looking values of different payload types stay distinct.
    assert_eq!(feed.index_of(&7u32), Some(0));
    assert_eq!(feed.index_of(&String::from("7")), Some(1));

    feed.remove_first_value(&String::from("7"))
        .expect("remove label");
    assert_eq!(feed.len(), 1);
    assert_eq!(feed.data_at::<u32>(0), Some(&7));
}

#[test]
fn rejected_insert_leaves_no_trace() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.append(LabelConverter::default(), String::from("only"))
        .expect("append");

    let err = feed
        .insert(3, CounterConverter::default(), 9)
        .expect_err("out-of-range insert");
    assert_eq!(err, MedleyError::IndexOutOfRange { index: 3, len: 1 });

    // The rejected call must not have registered the new converter type.
    assert_eq!(feed.view_type_count(), 1);
    assert!(feed.type_index_of::<CounterConverter>().is_none());
}

// =============================================================================
// Registry contract
// =============================================================================

#[test]
fn type_indices_follow_first_use_order() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.append(CounterConverter::default(), 9)
        .expect("append counter");
    feed.append(LabelConverter::default(), String::from("after"))
        .expect("append label");

    assert_eq!(feed.type_index_of::<CounterConverter>().map(TypeIndex::get), Some(0));
    assert_eq!(feed.type_index_of::<LabelConverter>().map(TypeIndex::get), Some(1));
    assert_eq!(feed.view_type_count(), 2);
}

#[test]
fn type_indices_survive_data_churn() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.append(CounterConverter::default(), 1).expect("append");
    let counter_index = feed.type_index_of::<CounterConverter>().expect("registered");
    feed.append(LabelConverter::default(), String::from("x"))
        .expect("append");
    let label_index = feed.type_index_of::<LabelConverter>().expect("registered");

    for n in 0..16u32 {
        feed.append(CounterConverter::default(), n).expect("append");
    }
    feed.clear().expect("clear");
    feed.append(LabelConverter::default(), String::from("back"))
        .expect("append");

    assert_eq!(feed.type_index_of::<CounterConverter>(), Some(counter_index));
    assert_eq!(feed.type_index_of::<LabelConverter>(), Some(label_index));
    assert_eq!(feed.view_type_count(), 2);
}

#[test]
fn clear_empties_rows_but_keeps_view_types() {
    let mut feed = mixed_feed();
    feed.clear().expect("clear");

    assert!(feed.is_empty());
    assert_eq!(feed.view_type_count(), 3);
}

#[test]
fn registry_clear_requires_empty_list_and_no_listeners() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.append(LabelConverter::default(), String::from("a"))
        .expect("append");
    assert_eq!(
        feed.clear_registry(),
        Err(MedleyError::RegistryInUse { binders: 1 })
    );

    feed.clear().expect("clear");
    {
        let _conn = feed.connect(|_| {});
        assert_eq!(
            feed.clear_registry(),
            Err(MedleyError::RegistryInUse { binders: 0 })
        );
    }

    feed.clear_registry().expect("legal clear");
    assert_eq!(feed.view_type_count(), 0);

    // Numbering starts over after a legal clear.
    feed.append(CounterConverter::default(), 5).expect("append");
    assert_eq!(feed.type_index_of::<CounterConverter>().map(TypeIndex::get), Some(0));
}

// =============================================================================
// Connection guard
// =============================================================================

#[test]
fn connected_adapter_freezes_the_type_set() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.prepare_of::<LabelConverter>().expect("prepare label");

    let recorder = RecordingListener::new();
    let _conn = feed.connect(recorder.callback());

    assert_eq!(
        feed.prepare_of::<CounterConverter>(),
        Err(MedleyError::DuplicateTypeRegistration)
    );
    let err = feed
        .append(CounterConverter::default(), 1)
        .expect_err("new type while connected");
    assert_eq!(err, MedleyError::DuplicateTypeRegistration);

    assert_eq!(feed.view_type_count(), 1);
    assert!(recorder.is_empty());

    // Already-registered types keep flowing.
    feed.append_of::<LabelConverter>(String::from("fine"))
        .expect("known type");
    assert_eq!(recorder.len(), 1);
}

#[test]
fn owner_context_gates_connected_mutations() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.prepare_of::<LabelConverter>().expect("prepare label");
    let owner = feed.owner();
    let _conn = feed.connect(|_| {});

    let foreign = std::thread::scope(|scope| {
        scope
            .spawn(|| feed.append_of::<LabelConverter>(String::from("intruder")))
            .join()
            .expect("mutation thread panicked")
    });
    match foreign {
        Err(MedleyError::InvalidThreadAccess {
            owner: reported,
            caller,
        }) => {
            assert_eq!(reported, owner);
            assert_ne!(caller, owner);
        }
        other => panic!("expected InvalidThreadAccess, got {other:?}"),
    }
    assert!(feed.is_empty());

    // The identical mutation from the owner context goes through.
    feed.append_of::<LabelConverter>(String::from("resident"))
        .expect("owner-context mutation");
    assert_eq!(feed.len(), 1);
}

#[test]
fn unconnected_mutations_flow_from_any_thread() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    std::thread::scope(|scope| {
        scope
            .spawn(|| {
                feed.append(LabelConverter::default(), String::from("built elsewhere"))
                    .expect("unconnected append");
                feed.append(CounterConverter::default(), 7)
                    .expect("unconnected append");
                feed.remove_at(0).expect("unconnected remove");
            })
            .join()
            .expect("setup thread panicked");
    });

    assert_eq!(feed.len(), 1);
    assert_eq!(feed.data_at::<u32>(0), Some(&7));
}

#[test]
fn explicit_owner_context_moves_mutation_rights() {
    let owner = OwnerContext::current();

    let (mut feed, _conn) = std::thread::spawn(move || {
        let mut feed: Medley<StubView, StubEnv> = Medley::with_owner(owner);
        feed.prepare_of::<LabelConverter>().expect("prepare label");
        let conn = feed.connect(|_| {});

        // The constructing thread is not the owner here.
        let err = feed
            .append_of::<LabelConverter>(String::from("far away"))
            .expect_err("non-owner mutation");
        assert!(matches!(err, MedleyError::InvalidThreadAccess { .. }));

        (feed, conn)
    })
    .join()
    .expect("setup thread panicked");

    feed.append_of::<LabelConverter>(String::from("home"))
        .expect("owner mutates");
    assert_eq!(feed.len(), 1);
}

#[test]
fn connection_dropped_on_another_thread_disconnects() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    let conn = feed.connect(|_| {});
    assert!(feed.is_connected());

    std::thread::spawn(move || drop(conn))
        .join()
        .expect("drop thread panicked");
    assert!(!feed.is_connected());

    // Unseen type, fine again now that every listener is gone.
    feed.append(LabelConverter::default(), String::from("free again"))
        .expect("unconnected append");
}

#[test]
fn every_successful_mutation_notifies_exactly_once() {
    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.prepare_of::<LabelConverter>().expect("prepare label");
    feed.prepare_of::<CounterConverter>().expect("prepare counter");

    let recorder = RecordingListener::new();
    let _conn = feed.connect(recorder.callback());

    let id = feed
        .append_of::<LabelConverter>(String::from("a"))
        .expect("append");
    feed.append_all_of::<CounterConverter>(vec![1, 2, 3])
        .expect("batch");
    feed.insert_of::<LabelConverter>(0, String::from("b"))
        .expect("insert");
    feed.remove_by_id(id).expect("remove by id");
    feed.remove_by_id(id).expect("absent id is a no-op");
    feed.remove_first_value(&String::from("ghost"))
        .expect("absent value is a no-op");
    feed.remove_at(0).expect("remove at");
    feed.clear().expect("clear");

    assert_eq!(
        recorder.take(),
        vec![
            ListChange::Inserted { index: 0, count: 1 },
            ListChange::Inserted { index: 1, count: 3 },
            ListChange::Inserted { index: 0, count: 1 },
            ListChange::Removed { index: 1 },
            ListChange::Removed { index: 0 },
            ListChange::Cleared,
        ]
    );
}

// =============================================================================
// Dispatch contract
// =============================================================================

#[test]
fn dispatch_surface_matches_list_shape() {
    let feed = mixed_feed();

    assert_eq!(feed.count(), 4);
    assert_eq!(feed.view_type_count(), 3);
    assert_eq!(
        feed.view_type_of(2).expect("separator row"),
        feed.type_index_of::<SeparatorConverter>().expect("registered")
    );

    assert!(feed.is_enabled(0).expect("label row"));
    assert!(!feed.is_enabled(2).expect("separator row"));
    assert!(!feed.all_enabled());

    assert!(!feed.has_stable_ids());
    assert_eq!(feed.item_id(3).expect("in range"), 3);
    assert_eq!(
        feed.item_id(9),
        Err(MedleyError::IndexOutOfRange { index: 9, len: 4 })
    );
}

#[test]
fn host_render_loop_recycles_by_type() {
    let feed = mixed_feed();
    let mut env = StubEnv::default();
    let mut cache = RowCache::new(feed.view_type_count());

    let rows = render_pass(&feed, &mut cache, &mut env);
    assert_eq!(env.created, 4);
    assert_eq!(env.bound, 4);
    shelve(&mut cache, rows);

    // Second pass finds a shelved view for every type: nothing new is built.
    let rows = render_pass(&feed, &mut cache, &mut env);
    assert_eq!(env.created, 4);
    assert_eq!(env.bound, 8);

    // Position 0 got the label view shelved by position 3's first pass.
    assert_eq!(rows[0].1.log, vec!["label[3] omega", "label[0] alpha"]);
}

#[test]
fn environment_change_defeats_recycling_per_converter() {
    let feed = mixed_feed();
    let mut env = StubEnv::default();
    let mut cache = RowCache::new(feed.view_type_count());

    let rows = render_pass(&feed, &mut cache, &mut env);
    shelve(&mut cache, rows);

    // Label views refuse recycling across generations; counters and
    // separators accept any shelved view.
    env.generation += 1;
    let rows = render_pass(&feed, &mut cache, &mut env);
    assert_eq!(env.created, 6);

    assert_eq!(rows[0].1.generation, env.generation);
    assert_eq!(rows[0].1.log, vec!["label[0] alpha"]);
    assert_eq!(rows[1].1.log, vec!["counter[1] 1", "counter[1] 1"]);
}

#[test]
fn converters_observe_adapter_facts_during_bind() {
    struct ContextProbe;

    impl Converter<StubView, StubEnv> for ContextProbe {
        type Data = u8;

        fn create(&self, env: &mut StubEnv) -> StubView {
            env.created += 1;
            StubView {
                log: Vec::new(),
                generation: env.generation,
            }
        }

        fn bind(
            &self,
            view: &mut StubView,
            data: &u8,
            position: usize,
            _env: &mut StubEnv,
            ctx: &AdapterContext<'_>,
        ) {
            view.log.push(format!(
                "row {data} at {position}/{} types {} connected {}",
                ctx.len(),
                ctx.view_type_count(),
                ctx.is_connected()
            ));
        }
    }

    let mut feed: Medley<StubView, StubEnv> = Medley::new();
    feed.append(ContextProbe, 11u8).expect("append");
    feed.append(ContextProbe, 22u8).expect("append");
    let _conn = feed.connect(|_| {});

    let mut env = StubEnv::default();
    let view = feed
        .create_or_rebind(1, None, &mut env)
        .expect("render probe row");
    assert_eq!(view.log, vec!["row 22 at 1/2 types 1 connected true"]);
}
