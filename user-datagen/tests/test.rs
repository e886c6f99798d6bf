use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use csv::ReaderBuilder;

use user_datagen::error::GenError;
use user_datagen::fetch::{UserSource, MAX_BATCH_SIZE};
use user_datagen::generator::Generator;
use user_datagen::record::{
    RawDob, RawId, RawLocation, RawName, RawPicture, RawStreet, RawUser, UserRecord,
};

fn make_raw_user(email: &str, ssn: &str, state: &str) -> RawUser {
    RawUser {
        name: RawName {
            first: "Jennie".to_owned(),
            last: "Nichols".to_owned(),
        },
        location: RawLocation {
            street: RawStreet {
                number: 8929,
                name: "Valwood Pkwy".to_owned(),
            },
            city: "Billings".to_owned(),
            state: state.to_owned(),
            postcode: "63104".to_owned(),
        },
        phone: "(272) 790-0888".to_owned(),
        email: email.to_owned(),
        dob: RawDob {
            date: "1992-03-08T15:13:16.688Z".to_owned(),
        },
        id: RawId {
            value: ssn.to_owned(),
        },
        picture: RawPicture {
            large: "https://randomuser.me/api/portraits/men/75.jpg".to_owned(),
        },
    }
}

/// Serves scripted batches instead of hitting the network, recording every
/// requested batch size.
struct CannedSource {
    batches: VecDeque<Vec<RawUser>>,
    requested: Vec<usize>,
}

impl CannedSource {
    fn new(batches: Vec<Vec<RawUser>>) -> Self {
        CannedSource {
            batches: batches.into(),
            requested: Vec::new(),
        }
    }
}

impl UserSource for CannedSource {
    fn fetch_users(&mut self, count: usize) -> Result<Vec<RawUser>, GenError> {
        self.requested.push(count);
        Ok(self.batches.pop_front().expect("ran out of canned batches"))
    }
}

fn read_records(path: &Path) -> Vec<UserRecord> {
    let mut reader = ReaderBuilder::new().from_path(path).unwrap();
    reader
        .deserialize::<UserRecord>()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn test_single_oversized_batch_reaches_target_without_sleeping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.csv");

    // 5000 raw records where only the first 5 are unique
    let batch: Vec<RawUser> = (0..5000)
        .map(|i| {
            let n = i % 5;
            make_raw_user(&format!("user{n}@x.com"), &format!("{n:09}"), "Texas")
        })
        .collect();
    let mut source = CannedSource::new(vec![batch]);

    let mut generator = Generator::load(&path, 5).unwrap();
    // a 45s sleep would stall the test; reaching the target on the first
    // batch must skip it
    generator
        .run(&mut source, &path, Duration::from_secs(45))
        .unwrap();

    assert_eq!(source.requested, vec![10]);
    let records = read_records(&path);
    assert_eq!(records.len(), 5);
}

#[test]
fn test_requested_batch_sizes_track_remaining_need() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.csv");

    let first = vec![
        make_raw_user("a@x.com", "111-11-1111", "Ohio"),
        make_raw_user("b@x.com", "222-22-2222", "Ohio"),
    ];
    let second = vec![
        make_raw_user("c@x.com", "333-33-3333", "Ohio"),
        make_raw_user("d@x.com", "444-44-4444", "Ohio"),
    ];
    let mut source = CannedSource::new(vec![first, second]);

    let mut generator = Generator::load(&path, 4).unwrap();
    generator
        .run(&mut source, &path, Duration::ZERO)
        .unwrap();

    assert_eq!(source.requested, vec![8, 4]);
    for (request, remaining) in source.requested.iter().zip([4_usize, 2]) {
        assert!(*request <= MAX_BATCH_SIZE);
        assert!(*request <= remaining * 2);
    }
    assert_eq!(read_records(&path).len(), 4);
}

#[test]
fn test_idempotent_restart_never_duplicates_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.csv");

    // first run: three unique records
    let batch = vec![
        make_raw_user("a@x.com", "111-11-1111", "Maine"),
        make_raw_user("b@x.com", "222-22-2222", "Maine"),
        make_raw_user("c@x.com", "333-33-3333", "Maine"),
    ];
    let mut source = CannedSource::new(vec![batch]);
    let mut generator = Generator::load(&path, 3).unwrap();
    generator
        .run(&mut source, &path, Duration::from_secs(45))
        .unwrap();

    // second run against the same file: two repeats, three fresh
    let batch = vec![
        make_raw_user("a@x.com", "111-11-1111", "Maine"),
        make_raw_user("b@x.com", "999-99-9999", "Maine"),
        make_raw_user("d@x.com", "444-44-4444", "Maine"),
        make_raw_user("e@x.com", "555-55-5555", "Maine"),
    ];
    let mut source = CannedSource::new(vec![batch]);
    let mut generator = Generator::load(&path, 5).unwrap();
    assert_eq!(generator.count(), 3);
    generator
        .run(&mut source, &path, Duration::from_secs(45))
        .unwrap();

    let records = read_records(&path);
    assert_eq!(records.len(), 5);

    let emails: HashSet<&str> = records.iter().map(|r| r.email.as_str()).collect();
    let ssns: HashSet<&str> = records.iter().map(|r| r.ssn.as_str()).collect();
    assert_eq!(emails.len(), records.len());
    assert_eq!(ssns.len(), records.len());
    assert_eq!(
        records.iter().filter(|r| r.email == "a@x.com").count(),
        1,
        "duplicate must not be rewritten"
    );
}

#[test]
fn test_output_rows_carry_valid_codes_and_dates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.csv");

    let batch = vec![
        make_raw_user("a@x.com", "111-11-1111", "Texas"),
        make_raw_user("b@x.com", "222-22-2222", "District of Columbia"),
        make_raw_user("c@x.com", "333-33-3333", "Puerto Rico"),
    ];
    let mut source = CannedSource::new(vec![batch]);
    let mut generator = Generator::load(&path, 3).unwrap();
    generator
        .run(&mut source, &path, Duration::from_secs(45))
        .unwrap();

    for record in read_records(&path) {
        assert_eq!(record.state.len(), 2);
        assert!(record.state.chars().all(|c| c.is_ascii_uppercase()));
        assert!(NaiveDate::parse_from_str(&record.dob, "%m/%d/%Y").is_ok());
    }
}

#[test]
fn test_fetch_error_aborts_but_keeps_rows_on_disk() {
    struct FailingSource {
        batches: VecDeque<Vec<RawUser>>,
    }

    impl UserSource for FailingSource {
        fn fetch_users(&mut self, _count: usize) -> Result<Vec<RawUser>, GenError> {
            match self.batches.pop_front() {
                Some(batch) => Ok(batch),
                None => Err(GenError::ApiError {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    body: "Service Unavailable".to_owned(),
                }),
            }
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.csv");

    let batch = vec![
        make_raw_user("a@x.com", "111-11-1111", "Iowa"),
        make_raw_user("b@x.com", "222-22-2222", "Iowa"),
    ];
    let mut source = FailingSource {
        batches: VecDeque::from([batch]),
    };

    let mut generator = Generator::load(&path, 4).unwrap();
    let result = generator.run(&mut source, &path, Duration::ZERO);
    assert!(matches!(result, Err(GenError::ApiError { .. })));

    // the rows written before the failure survive and reseed the next run
    assert_eq!(read_records(&path).len(), 2);
    let generator = Generator::load(&path, 4).unwrap();
    assert_eq!(generator.count(), 2);
}
