use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use ljtasks_core::{
    ClientCall, Clock, Credentials, EntryValidationError, InMemoryJournalClient, Properties,
    Security, TaskFacade, TasksError,
};

struct FixedClock(DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2009, 1, 1, 12, 0, 0).unwrap()
}

fn connect(client: &InMemoryJournalClient) -> TaskFacade<&InMemoryJournalClient, FixedClock> {
    let clock = FixedClock(noon().fixed_offset());
    let tasks = TaskFacade::connect_with_clock(client, &Credentials::new("frank", "pw"), clock)
        .unwrap();
    client.clear_calls();
    tasks
}

#[test]
fn created_entry_reads_back_body_and_subject() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let tasks = connect(&client);

    let id = tasks
        .create(Properties::new().with("body", "x").with("subject", "y"))
        .unwrap();

    let entry = tasks.entry(id).unwrap();
    assert_eq!(entry.id(), Some(id));
    assert_eq!(entry.body(), "x");
    assert_eq!(entry.subject.as_deref(), Some("y"));
}

#[test]
fn create_defaults_time_and_is_not_backdated() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let tasks = connect(&client);

    let id = tasks.create(Properties::new().with("body", "<p>hi</p>")).unwrap();

    let entry = tasks.entry(id).unwrap();
    assert_eq!(entry.time, Some(noon()));
    assert!(!entry.backdated);
    assert!(entry.preformatted);
}

#[test]
fn create_with_other_time_is_backdated() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let tasks = connect(&client);

    let past = noon() - Duration::days(365);
    let id = tasks
        .create(Properties::new().with("body", "old news").with("time", past))
        .unwrap();

    let entry = tasks.entry(id).unwrap();
    assert!(entry.backdated);
    assert_eq!(entry.time, Some(past));
}

#[test]
fn create_accepts_canonical_body_key() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let tasks = connect(&client);

    let id = tasks
        .create(Properties::new().with("event", "canonical").with("tags", ["a", "b"]))
        .unwrap();

    let entry = tasks.entry(id).unwrap();
    assert_eq!(entry.body(), "canonical");
    assert_eq!(entry.tags(), ["a", "b"]);
}

#[test]
fn create_without_body_makes_no_remote_call() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let tasks = connect(&client);

    let err = tasks
        .create(Properties::new().with("subject", "no body"))
        .unwrap_err();

    assert!(matches!(err, TasksError::BodyRequired));
    assert!(err.is_local());
    assert!(client.calls().is_empty());
}

#[test]
fn create_with_unknown_key_makes_no_remote_call() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let tasks = connect(&client);

    let err = tasks
        .create(Properties::new().with("body", "x").with("colour", "red"))
        .unwrap_err();

    assert!(matches!(err, TasksError::NoSuchProperty(ref key) if key == "colour"));
    assert!(client.calls().is_empty());
    assert!(client.is_empty());
}

#[test]
fn custom_security_without_mask_is_rejected_before_posting() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let tasks = connect(&client);

    let err = tasks
        .create(
            Properties::new()
                .with("body", "x")
                .with("security", Security::Custom),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TasksError::Validation(EntryValidationError::MissingAllowMask)
    ));
    assert_eq!(client.write_count(), 0);

    let id = tasks
        .create(
            Properties::new()
                .with("body", "x")
                .with("security", Security::Custom)
                .with("allowmask", 4_u32),
        )
        .unwrap();
    let entry = tasks.entry(id).unwrap();
    assert_eq!(entry.security, Security::Custom);
    assert_eq!(entry.allowmask, Some(4));
    assert_eq!(client.calls()[0], ClientCall::Post);
}

#[test]
fn url_combines_journal_and_display_itemid() {
    let client = InMemoryJournalClient::new("frank_n", "pw");
    let tasks = TaskFacade::connect(&client, &Credentials::new("frank_n", "pw")).unwrap();

    let id = tasks.create(Properties::new().with("body", "x")).unwrap();
    let entry = tasks.entry(id).unwrap();

    let expected = format!(
        "https://frank-n.livejournal.com/{}.html",
        entry.display_itemid().unwrap()
    );
    assert_eq!(tasks.url(id).unwrap(), expected);
}

#[test]
fn defaulted_time_keeps_local_wall_clock_like_an_explicit_time() {
    let client = InMemoryJournalClient::new("frank", "pw");
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let local_now = Utc
        .with_ymd_and_hms(2009, 1, 1, 10, 0, 0)
        .unwrap()
        .with_timezone(&plus_two);
    let clock = FixedClock(local_now);
    let tasks = TaskFacade::connect_with_clock(&client, &Credentials::new("frank", "pw"), clock)
        .unwrap();

    let explicit = tasks
        .create(Properties::new().with("body", "explicit").with("time", local_now))
        .unwrap();
    let defaulted = tasks.create(Properties::new().with("body", "defaulted")).unwrap();

    let explicit = client.remote(explicit).unwrap();
    let defaulted = client.remote(defaulted).unwrap();
    assert_eq!(explicit.eventtime, "2009-01-01 12:00:00");
    assert_eq!(defaulted.eventtime, explicit.eventtime);
    assert!(!explicit.props.contains_key("opt_backdated"));
    assert!(!defaulted.props.contains_key("opt_backdated"));
}
