use leadflow::workflows::prospecting::ContactStatus;
use leadflow::workflows::seed::{ContactSeedError, ContactSeedLoader};

#[test]
fn sample_seed_loads_every_row() {
    let data = include_bytes!("../data/contacts_sample.csv");
    let contacts = ContactSeedLoader::from_reader(&data[..]).expect("sample seed imports");

    assert_eq!(contacts.len(), 8);
    assert!(contacts
        .iter()
        .all(|contact| contact.invariant_violation().is_none()));

    let blacklisted = contacts
        .iter()
        .find(|contact| contact.id.0 == "c-0005")
        .expect("blacklisted row present");
    assert_eq!(blacklisted.status, ContactStatus::Blacklisted);
    assert!(blacklisted.do_not_contact);
}

#[test]
fn seed_errors_report_the_offending_row() {
    let csv = "id,campaign,status,do_not_contact\n\
c-1,idf,NEW,\n\
c-2,idf,REFUS_ARGU,no\n";

    let err = ContactSeedLoader::from_reader(csv.as_bytes()).expect_err("invariant violated");
    match &err {
        ContactSeedError::InvalidRow { row, .. } => assert_eq!(*row, 3),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("contact row 3 rejected"));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        ContactSeedLoader::from_path("does/not/exist.csv"),
        Err(ContactSeedError::Io(_))
    ));
}
