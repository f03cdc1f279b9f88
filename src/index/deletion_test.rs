use super::*;

#[test]
fn test_deletable_epochs() {
    struct Case {
        name: &'static str,
        n: usize,
        known: Vec<u64>,
        deletable: Vec<u64>,
    }

    let cases = vec![
        Case {
            name: "empty",
            n: 1,
            known: vec![],
            deletable: vec![],
        },
        Case {
            name: "one",
            n: 1,
            known: vec![1],
            deletable: vec![],
        },
        Case {
            name: "many",
            n: 1,
            known: vec![1, 2, 3, 4],
            deletable: vec![1, 2, 3],
        },
        Case {
            name: "keep-two",
            n: 2,
            known: vec![1, 2, 3, 4],
            deletable: vec![1, 2],
        },
    ];

    for case in cases.into_iter() {
        let mut policy = KeepNLatest::new(case.n);
        for epoch in case.known.iter() {
            policy.commit(*epoch);
        }
        assert_eq!(policy.deletable(), case.deletable.as_slice(), "{}", case.name);
    }
}

#[test]
fn test_removed() {
    let mut policy = KeepNLatest::new(1);
    for epoch in 1..=4 {
        policy.commit(epoch);
    }
    assert_eq!(policy.deletable(), &[1, 2, 3]);

    policy.removed(2);
    assert_eq!(policy.deletable(), &[1, 3]);

    policy.commit(5);
    assert_eq!(policy.deletable(), &[1, 3, 4]);
}
