#![forbid(unsafe_code)]

//! Property tests over the dispatch/history pipeline.

use proptest::prelude::*;
use vireo::prelude::*;
use vireo::{list, map};

#[derive(Debug, Clone)]
enum Step {
    Push(String),
    Pop,
    Rotate,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(Step::Push),
        Just(Step::Pop),
        Just(Step::Rotate),
    ]
}

fn stack_store() -> Store {
    let mut store = Store::with_config(StoreConfig::with_history_capacity(64));
    store.on_scoped("push", Path::root().key("items"), |items, params| {
        let mut v = items.as_list().map_or_else(Vec::new, <[Value]>::to_vec);
        v.push(params.clone());
        Value::from(v)
    });
    store.on_scoped("pop", Path::root().key("items"), |items, _| {
        let mut v = items.as_list().map_or_else(Vec::new, <[Value]>::to_vec);
        v.pop();
        Value::from(v)
    });
    store.on_scoped("rotate", Path::root().key("items"), |items, _| {
        let mut v = items.as_list().map_or_else(Vec::new, <[Value]>::to_vec);
        if let Some(last) = v.pop() {
            v.insert(0, last);
        }
        Value::from(v)
    });
    store
}

proptest! {
    /// Undoing every committed action restores the initial state exactly.
    #[test]
    fn full_undo_restores_initial_state(steps in proptest::collection::vec(step_strategy(), 0..40)) {
        let mut store = stack_store();
        let initial = map([("items", list([]))]);
        store.set_state(initial.clone()).expect("init");

        let mut commits = 0usize;
        for step in steps {
            let committed = match step {
                Step::Push(s) => store.dispatch("push", Value::from(s)),
                Step::Pop => store.dispatch("pop", Value::Null),
                Step::Rotate => store.dispatch("rotate", Value::Null),
            }
            .expect("dispatch");
            if committed {
                commits += 1;
            }
        }
        for _ in 0..commits {
            store.undo().expect("undo");
        }
        prop_assert_eq!(store.state().expect("ready"), &initial);
    }

    /// Undo then redo is the identity on the current state.
    #[test]
    fn undo_redo_round_trips(steps in proptest::collection::vec(step_strategy(), 1..20)) {
        let mut store = stack_store();
        store.set_state(map([("items", list([]))])).expect("init");
        for step in steps {
            match step {
                Step::Push(s) => store.dispatch("push", Value::from(s)),
                Step::Pop => store.dispatch("pop", Value::Null),
                Step::Rotate => store.dispatch("rotate", Value::Null),
            }
            .expect("dispatch");
        }
        let before = store.state().expect("ready").clone();
        store.undo().expect("undo");
        store.redo().expect("redo");
        prop_assert_eq!(store.state().expect("ready"), &before);
    }
}
