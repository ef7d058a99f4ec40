//! Property-based tests for knockup-reactive using proptest.

use knockup_reactive::{Computed, Observable, ObservableList, Splice};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug)]
enum Op {
    Push(i64),
    Insert(usize, i64),
    Remove(usize),
    Splice(usize, usize, Vec<i64>),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<i64>().prop_map(Op::Push),
        (0usize..20, any::<i64>()).prop_map(|(i, v)| Op::Insert(i, v)),
        (0usize..20).prop_map(Op::Remove),
        (0usize..20, 0usize..5, prop::collection::vec(any::<i64>(), 0..4))
            .prop_map(|(i, n, items)| Op::Splice(i, n, items)),
    ]
}

fn apply(list: &ObservableList<i64>, op: &Op) {
    match op {
        Op::Push(v) => list.push(*v),
        Op::Insert(i, v) => list.insert(*i, *v),
        Op::Remove(i) => {
            list.remove(*i);
        }
        Op::Splice(i, n, items) => {
            list.splice(*i, *n, items.clone());
        }
    }
}

proptest! {
    /// Replaying every splice notification on a shadow copy reproduces the list.
    #[test]
    fn splices_replay_to_same_contents(ops in prop::collection::vec(op_strategy(), 0..50)) {
        let list = ObservableList::new(Vec::new());
        let shadow = Rc::new(RefCell::new(Vec::<i64>::new()));
        let shadow_clone = shadow.clone();
        list.subscribe(move |splice: &Splice<i64>| {
            let mut shadow = shadow_clone.borrow_mut();
            let end = splice.index + splice.removed.len();
            shadow.splice(splice.index..end, splice.inserted.iter().copied());
        });

        for op in &ops {
            apply(&list, op);
        }

        prop_assert_eq!(list.peek(), shadow.borrow().clone());
    }

    /// A computed sum always agrees with the list it reads.
    #[test]
    fn computed_sum_tracks_list(ops in prop::collection::vec(op_strategy(), 0..50)) {
        let list = ObservableList::new(Vec::new());
        let reader = list.clone();
        let sum = Computed::read_only(move || {
            reader.get().iter().fold(0i64, |acc, v| acc.wrapping_add(*v))
        });
        let last = Rc::new(RefCell::new(None));
        let last_clone = last.clone();
        sum.subscribe(move |v| *last_clone.borrow_mut() = Some(*v));
        sum.get();

        for op in &ops {
            apply(&list, op);
            let expected = list.peek().iter().fold(0i64, |acc, v| acc.wrapping_add(*v));
            prop_assert_eq!(sum.get(), expected);
        }
        if let Some(seen) = *last.borrow() {
            prop_assert_eq!(seen, sum.get());
        };
    }

    /// Setting an observable notifies only when the value changes.
    #[test]
    fn observable_notifies_on_change_only(values in prop::collection::vec(0i64..4, 0..40)) {
        let value = Observable::new(0i64);
        let count = Rc::new(RefCell::new(0usize));
        let count_clone = count.clone();
        value.subscribe(move |_| *count_clone.borrow_mut() += 1);

        let mut expected = 0;
        let mut current = 0;
        for v in values {
            if v != current {
                expected += 1;
                current = v;
            }
            value.set(v);
        }

        prop_assert_eq!(*count.borrow(), expected);
    }
}
