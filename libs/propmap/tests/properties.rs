//! Property-based tests for field copy and round-trip mapping.

use std::sync::Arc;

use proptest::prelude::*;
use propmap::{ConverterRegistry, FieldValues, MapOptions, Mapper, Shape};

#[derive(Debug, Clone, PartialEq, Default, Shape)]
struct Account {
    pub id: u64,
    pub owner: String,
    pub balance: i64,
    pub nickname: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Shape)]
struct AccountRecord {
    pub tags: Vec<String>,
    pub nickname: Option<String>,
    pub balance: i64,
    pub owner: String,
    pub id: u64,
}

fn account_strategy() -> impl Strategy<Value = Account> {
    (
        any::<u64>(),
        "[a-z]{0,12}",
        any::<i64>(),
        proptest::option::of("[a-zA-Z ]{0,8}"),
        proptest::collection::vec("[a-z]{1,5}", 0..4),
    )
        .prop_map(|(id, owner, balance, nickname, tags)| Account {
            id,
            owner,
            balance,
            nickname,
            tags,
        })
}

fn mapper() -> Mapper {
    Mapper::new(Arc::new(ConverterRegistry::new()))
}

proptest! {
    #[test]
    fn shared_fields_are_copied(account in account_strategy()) {
        let record: AccountRecord = mapper().map(&account).unwrap();
        prop_assert_eq!(record.id, account.id);
        prop_assert_eq!(&record.owner, &account.owner);
        prop_assert_eq!(record.balance, account.balance);
        prop_assert_eq!(&record.nickname, &account.nickname);
        prop_assert_eq!(&record.tags, &account.tags);
    }

    #[test]
    fn round_trip_is_identity(account in account_strategy()) {
        let mapper = mapper();
        let record: AccountRecord = mapper.map(&account).unwrap();
        let back: Account = mapper.map(&record).unwrap();
        let again: AccountRecord = mapper.map(&back).unwrap();
        prop_assert_eq!(&back, &account);
        prop_assert_eq!(again, record);
    }

    #[test]
    fn collection_keeps_order_and_length(accounts in proptest::collection::vec(account_strategy(), 0..16)) {
        let records: Vec<AccountRecord> = mapper()
            .map_objects(Some(accounts.as_slice()), &MapOptions::default())
            .unwrap()
            .unwrap();
        prop_assert_eq!(records.len(), accounts.len());
        for (record, account) in records.iter().zip(&accounts) {
            prop_assert_eq!(record.id, account.id);
        }
    }

    #[test]
    fn producer_overrides_apply_per_index(accounts in proptest::collection::vec(account_strategy(), 1..16)) {
        let mut next = 0_i64;
        let records: Vec<AccountRecord> = mapper()
            .map_objects_with(
                Some(accounts.as_slice()),
                |_| {
                    let overrides = FieldValues::new().with("balance", next);
                    next += 1;
                    overrides
                },
                &MapOptions::default(),
            )
            .unwrap()
            .unwrap();
        for (i, record) in records.iter().enumerate() {
            prop_assert_eq!(record.balance, i as i64);
        }
    }
}
