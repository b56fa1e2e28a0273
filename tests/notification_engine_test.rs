//! Integration tests for the notification engine
//!
//! These tests drive the engine against the in-memory store with recording
//! transports and verify:
//! - one threshold fires per run, least urgent first
//! - a notified threshold never fires again
//! - passed tickets are marked without an alert
//! - every send attempt leaves a completed log row

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use queuewatch::adapters::database::{ClinicStore, InMemoryClinicStore};
use queuewatch::adapters::messaging::{EmailSender, InstantMessenger};
use queuewatch::core::notify::NotificationEngine;
use queuewatch::domain::{
    Channel, DeliveryReport, DepartmentId, DepartmentRecord, DoctorId, DoctorProfile, FixedClock,
    QueueEntry, SessionType, SnapshotRow, SubscriptionId, ThresholdFlags, TrackingSubscription,
};
use std::sync::{Arc, Mutex};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

#[derive(Default)]
struct RecordingEmail {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send_email(&self, to: &str, subject: &str, _html_body: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        !self.fail
    }
}

struct RecordingMessenger {
    sent: Mutex<Vec<(String, String)>>,
    status: u16,
}

impl RecordingMessenger {
    fn answering(status: u16) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            status,
        }
    }
}

#[async_trait]
impl InstantMessenger for RecordingMessenger {
    async fn send_message(&self, user_id: &str, text: &str) -> DeliveryReport {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), text.to_string()));
        if self.status == 200 {
            DeliveryReport::delivered(Some(200))
        } else {
            DeliveryReport::failed(Some(self.status), format!("HTTP {}", self.status))
        }
    }
}

struct Fixture {
    store: InMemoryClinicStore,
    email: Arc<RecordingEmail>,
    messenger: Arc<RecordingMessenger>,
    doctor_id: DoctorId,
    department_id: DepartmentId,
}

impl Fixture {
    async fn new(email: RecordingEmail, messenger: RecordingMessenger) -> Self {
        let store = InMemoryClinicStore::new();
        let hospital_id = store.add_hospital("CMUH", "中國醫藥大學附設醫院").await;
        let department_id = store
            .upsert_department(hospital_id, &DepartmentRecord::new("CMUH", "0100", "家醫科"))
            .await
            .unwrap();
        let doctor_id = store
            .upsert_doctor(
                hospital_id,
                department_id,
                &DoctorProfile {
                    doctor_no: "1234".to_string(),
                    name: "王小明".to_string(),
                    specialty: None,
                },
            )
            .await
            .unwrap();

        Self {
            store,
            email: Arc::new(email),
            messenger: Arc::new(messenger),
            doctor_id,
            department_id,
        }
    }

    fn engine(&self) -> NotificationEngine {
        NotificationEngine::new(
            Arc::new(self.store.clone()),
            self.email.clone(),
            self.messenger.clone(),
            Arc::new(FixedClock::at_local(today(), 10, 0).unwrap()),
        )
    }

    async fn snapshot(&self, current: Option<i32>, waiting: Option<Vec<i32>>) {
        let row = SnapshotRow {
            doctor_id: self.doctor_id,
            department_id: self.department_id,
            session_date: today(),
            session_type: SessionType::Morning,
            clinic_room: "101".to_string(),
            total_quota: Some(40),
            registered: Some(35),
            current_number: current,
            is_full: false,
            status: None,
            waiting_list: waiting,
            queue_details: None,
            scraped_at: Utc::now(),
        };
        self.store.upsert_snapshots(&[row]).await.unwrap();
    }

    async fn subscribe(
        &self,
        email: Option<&str>,
        line: Option<&str>,
        target: Option<i32>,
    ) -> SubscriptionId {
        self.subscribe_armed(email, line, target, ThresholdFlags::all())
            .await
    }

    async fn subscribe_armed(
        &self,
        email: Option<&str>,
        line: Option<&str>,
        target: Option<i32>,
        notify_at: ThresholdFlags,
    ) -> SubscriptionId {
        let user_id = self.store.add_user(email, line).await;
        let subscription = TrackingSubscription {
            id: SubscriptionId::generate(),
            user_id,
            doctor_id: self.doctor_id,
            department_id: None,
            session_date: today(),
            session_type: SessionType::Morning,
            target_number: target,
            notify_at,
            notified: ThresholdFlags::default(),
            notify_email: email.is_some(),
            notify_line: line.is_some(),
            is_active: true,
        };
        let id = subscription.id;
        self.store.add_subscription(subscription).await;
        id
    }

    async fn notified(&self, id: SubscriptionId) -> ThresholdFlags {
        self.store.subscription(id).await.unwrap().notified
    }
}

#[tokio::test]
async fn test_thresholds_fire_once_each_in_order() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture
        .subscribe(Some("patient@example.com"), None, Some(30))
        .await;
    fixture.snapshot(Some(26), None).await;
    let engine = fixture.engine();

    // Four ahead: only the least urgent threshold fires on the first run
    let first = engine.run().await.unwrap();
    assert_eq!(first.alerts_fired, 1);
    assert_eq!(
        fixture.notified(id).await,
        ThresholdFlags {
            at_20: true,
            at_10: false,
            at_5: false
        }
    );

    engine.run().await.unwrap();
    engine.run().await.unwrap();
    assert_eq!(fixture.notified(id).await, ThresholdFlags::all());

    // Terminal: nothing left to fire
    let last = engine.run().await.unwrap();
    assert_eq!(last.alerts_fired, 0);
    assert_eq!(fixture.email.sent.lock().unwrap().len(), 3);
    assert_eq!(fixture.store.notification_logs().await.len(), 3);
}

#[tokio::test]
async fn test_oscillating_queue_alerts_once() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let only_ten = ThresholdFlags {
        at_20: false,
        at_10: true,
        at_5: false,
    };
    let id = fixture
        .subscribe_armed(Some("patient@example.com"), None, Some(30), only_ten)
        .await;
    let engine = fixture.engine();

    // The counter drifts back and forth across the ten-ahead boundary
    for current in [22, 15, 23, 14] {
        fixture.snapshot(Some(current), None).await;
        engine.run().await.unwrap();
    }

    assert_eq!(fixture.email.sent.lock().unwrap().len(), 1);
    assert_eq!(fixture.store.notification_logs().await.len(), 1);
    assert!(fixture.notified(id).await.at_10);
}

#[tokio::test]
async fn test_far_from_target_sends_nothing() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture
        .subscribe(Some("patient@example.com"), None, Some(35))
        .await;
    fixture.snapshot(Some(3), None).await;

    let summary = fixture.engine().run().await.unwrap();

    assert_eq!(summary.subscriptions, 1);
    assert_eq!(summary.alerts_fired, 0);
    assert_eq!(fixture.notified(id).await, ThresholdFlags::default());
    assert!(fixture.store.notification_logs().await.is_empty());
}

#[tokio::test]
async fn test_passed_ticket_is_marked_without_alert() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture
        .subscribe(Some("patient@example.com"), Some("U1"), Some(30))
        .await;
    fixture.snapshot(Some(31), None).await;

    let summary = fixture.engine().run().await.unwrap();

    assert_eq!(summary.alerts_fired, 0);
    assert_eq!(fixture.notified(id).await, ThresholdFlags::all());
    assert!(fixture.email.sent.lock().unwrap().is_empty());
    assert!(fixture.messenger.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_both_channels_logged() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture
        .subscribe(Some("patient@example.com"), Some("U42"), Some(30))
        .await;
    fixture.snapshot(Some(26), None).await;

    let summary = fixture.engine().run().await.unwrap();
    assert_eq!(summary.sends_attempted, 2);
    assert_eq!(summary.sends_failed, 0);

    let logs = fixture.store.notification_logs().await;
    assert_eq!(logs.len(), 2);

    let email = logs.iter().find(|l| l.channel == Channel::Email).unwrap();
    assert!(email.success);
    assert_eq!(email.error_message, None);
    assert_eq!(email.recipient, "patient@example.com");
    assert!(email.message.starts_with("Email: ⏰ 門診提醒：王小明 醫師"));
    assert_eq!(email.threshold, 20);
    assert_eq!(email.subscription_id, id);
    assert_eq!(email.clinic_room.as_deref(), Some("101"));
    assert_eq!(email.current_number, Some(26));
    assert_eq!(email.hospital_name.as_deref(), Some("中國醫藥大學附設醫院"));
    assert_eq!(email.department_name.as_deref(), Some("家醫科"));

    let line = logs.iter().find(|l| l.channel == Channel::Line).unwrap();
    assert!(line.success);
    assert_eq!(line.status_code, Some(200));
    assert!(line.message.starts_with("LINE: "));

    let sent = fixture.messenger.sent.lock().unwrap();
    assert_eq!(sent[0].0, "U42");
    assert!(sent[0].1.contains("距您還剩：4 號"));
}

#[tokio::test]
async fn test_failed_send_still_marks_threshold() {
    let email = RecordingEmail {
        fail: true,
        ..RecordingEmail::default()
    };
    let fixture = Fixture::new(email, RecordingMessenger::answering(400)).await;
    let id = fixture
        .subscribe(Some("patient@example.com"), Some("U1"), Some(30))
        .await;
    fixture.snapshot(Some(26), None).await;

    let summary = fixture.engine().run().await.unwrap();

    assert_eq!(summary.sends_failed, 2);
    assert!(fixture.notified(id).await.at_20);

    let logs = fixture.store.notification_logs().await;
    assert!(logs.iter().all(|l| !l.success));
    let line = logs.iter().find(|l| l.channel == Channel::Line).unwrap();
    assert_eq!(line.status_code, Some(400));
    assert_eq!(line.error_message.as_deref(), Some("HTTP 400"));
}

#[tokio::test]
async fn test_no_recipient_leaves_threshold_open() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture.subscribe(None, None, Some(30)).await;
    fixture.snapshot(Some(26), None).await;

    let summary = fixture.engine().run().await.unwrap();

    assert_eq!(summary.sends_attempted, 0);
    assert_eq!(fixture.notified(id).await, ThresholdFlags::default());
}

#[tokio::test]
async fn test_waiting_list_drives_remaining() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture.subscribe(None, Some("U7"), Some(30)).await;
    // Arithmetic would say 20 ahead; the waiting list says 4
    fixture
        .snapshot(Some(10), Some(vec![12, 15, 22, 29, 31, 33]))
        .await;

    fixture.engine().run().await.unwrap();

    assert!(fixture.notified(id).await.at_20);
    let sent = fixture.messenger.sent.lock().unwrap();
    assert!(sent[0].1.contains("距您還剩：4 號"));
}

#[tokio::test]
async fn test_queue_details_take_precedence() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    fixture.subscribe(None, Some("U7"), Some(12)).await;

    let mut row = SnapshotRow {
        doctor_id: fixture.doctor_id,
        department_id: fixture.department_id,
        session_date: today(),
        session_type: SessionType::Morning,
        clinic_room: "101".to_string(),
        total_quota: None,
        registered: None,
        current_number: Some(8),
        is_full: false,
        status: None,
        waiting_list: Some(vec![9, 10, 11]),
        queue_details: None,
        scraped_at: Utc::now(),
    };
    row.queue_details = Some(vec![
        QueueEntry {
            number: 9,
            status: "完成".to_string(),
        },
        QueueEntry {
            number: 10,
            status: "未看診".to_string(),
        },
        QueueEntry {
            number: 11,
            status: "未看診".to_string(),
        },
    ]);
    fixture.store.upsert_snapshots(&[row]).await.unwrap();

    fixture.engine().run().await.unwrap();

    let sent = fixture.messenger.sent.lock().unwrap();
    assert!(sent[0].1.contains("距您還剩：2 號"));
}

#[tokio::test]
async fn test_missing_snapshot_or_current_is_noop() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture.subscribe(Some("a@b.c"), None, Some(5)).await;

    fixture.engine().run().await.unwrap();
    assert_eq!(fixture.notified(id).await, ThresholdFlags::default());

    fixture.snapshot(None, None).await;
    fixture.engine().run().await.unwrap();
    assert_eq!(fixture.notified(id).await, ThresholdFlags::default());
}

#[tokio::test]
async fn test_target_falls_back_to_total_quota() {
    let fixture = Fixture::new(RecordingEmail::default(), RecordingMessenger::answering(200)).await;
    let id = fixture.subscribe(Some("a@b.c"), None, None).await;
    // Quota 40, current 25: 15 ahead fires 20 only
    fixture.snapshot(Some(25), None).await;

    fixture.engine().run().await.unwrap();

    let flags = fixture.notified(id).await;
    assert!(flags.at_20);
    assert!(!flags.at_10);
}
