//! Threshold evaluation and alert dispatch

use crate::adapters::database::ClinicStore;
use crate::adapters::messaging::{EmailSender, InstantMessenger};
use crate::core::notify::message::AlertContent;
use crate::core::notify::remaining::remaining_for_snapshot;
use crate::domain::{
    Channel, Clock, DeliveryReport, NotificationLogEntry, Result, SnapshotRow,
    SubscriptionContext, Threshold, TrackingSubscription,
};
use futures::future::join_all;
use std::sync::Arc;

/// What the threshold walk decided for one subscription
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThresholdEvaluation {
    /// Thresholds to mark notified without an alert because the ticket was passed
    pub passed: Vec<Threshold>,
    /// Threshold to alert on
    pub fire: Option<Threshold>,
}

/// Walk thresholds 20 → 10 → 5 and stop at the first one due.
///
/// Disabled or already-notified thresholds are never revisited, which makes
/// each alert fire at most once per day.
pub fn evaluate_thresholds(
    subscription: &TrackingSubscription,
    current: i32,
    target: i32,
    remaining: i32,
) -> ThresholdEvaluation {
    let mut evaluation = ThresholdEvaluation::default();

    for threshold in Threshold::ORDER {
        if !subscription.notify_at.get(threshold) || subscription.notified.get(threshold) {
            continue;
        }
        if current > target {
            evaluation.passed.push(threshold);
            continue;
        }
        if remaining > threshold.value() {
            continue;
        }
        evaluation.fire = Some(threshold);
        break;
    }

    evaluation
}

/// Counts from one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    /// Subscriptions examined
    pub subscriptions: usize,
    /// Thresholds that fired
    pub alerts_fired: usize,
    /// Channel sends attempted
    pub sends_attempted: usize,
    /// Channel sends that failed
    pub sends_failed: usize,
    /// Subscriptions that could not be processed
    pub errors: Vec<String>,
}

/// Decides and sends queue alerts for today's subscriptions
pub struct NotificationEngine {
    store: Arc<dyn ClinicStore>,
    email: Arc<dyn EmailSender>,
    messenger: Arc<dyn InstantMessenger>,
    clock: Arc<dyn Clock>,
}

impl NotificationEngine {
    /// Create an engine over its collaborators
    pub fn new(
        store: Arc<dyn ClinicStore>,
        email: Arc<dyn EmailSender>,
        messenger: Arc<dyn InstantMessenger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            email,
            messenger,
            clock,
        }
    }

    /// Evaluate every active subscription dated today, one at a time
    ///
    /// # Errors
    ///
    /// Returns an error only if the subscription list cannot be loaded. A
    /// failure on one subscription is logged and recorded in the summary.
    pub async fn run(&self) -> Result<NotificationSummary> {
        let today = self.clock.today();
        let contexts = self.store.active_subscriptions(today).await?;
        tracing::info!(date = %today, subscriptions = contexts.len(), "Evaluating subscriptions");

        let mut summary = NotificationSummary::default();
        for context in &contexts {
            summary.subscriptions += 1;
            if let Err(e) = self.process(context, &mut summary).await {
                tracing::error!(
                    subscription = %context.subscription.id.short(),
                    error = %e,
                    "Subscription evaluation failed"
                );
                summary
                    .errors
                    .push(format!("{}: {e}", context.subscription.id));
            }
        }

        tracing::info!(
            subscriptions = summary.subscriptions,
            alerts = summary.alerts_fired,
            sends = summary.sends_attempted,
            failed = summary.sends_failed,
            "Notification run completed"
        );
        Ok(summary)
    }

    async fn process(
        &self,
        context: &SubscriptionContext,
        summary: &mut NotificationSummary,
    ) -> Result<()> {
        let subscription = &context.subscription;
        let short_id = subscription.id.short();

        let Some(snapshot) = self
            .store
            .latest_snapshot(
                subscription.doctor_id,
                self.clock.today(),
                subscription.session_type,
            )
            .await?
        else {
            tracing::debug!(subscription = %short_id, "No snapshot for today");
            return Ok(());
        };

        let Some(current) = snapshot.current_number else {
            tracing::debug!(subscription = %short_id, "No current number yet");
            return Ok(());
        };

        let target = subscription
            .target_number
            .or(snapshot.total_quota)
            .unwrap_or(0);
        let remaining = remaining_for_snapshot(&snapshot, current, target);

        tracing::info!(
            subscription = %short_id,
            current,
            target,
            remaining = remaining.count,
            source = ?remaining.source,
            "Remaining ahead computed"
        );

        let evaluation = evaluate_thresholds(subscription, current, target, remaining.count);

        for threshold in &evaluation.passed {
            tracing::info!(
                subscription = %short_id,
                threshold = threshold.value(),
                "Ticket passed, marking threshold without alert"
            );
            self.store
                .mark_threshold_notified(subscription.id, *threshold)
                .await?;
        }

        if let Some(threshold) = evaluation.fire {
            summary.alerts_fired += 1;
            let reports = self
                .dispatch(context, &snapshot, current, remaining.count, threshold)
                .await;

            summary.sends_attempted += reports.len();
            summary.sends_failed += reports.iter().filter(|r| !r.success).count();

            if reports.is_empty() {
                tracing::warn!(
                    subscription = %short_id,
                    threshold = threshold.value(),
                    "No channel enabled with a recipient, threshold left open"
                );
            } else {
                self.store
                    .mark_threshold_notified(subscription.id, threshold)
                    .await?;
            }
        }

        Ok(())
    }

    /// Send every enabled channel concurrently, one log row per attempt
    async fn dispatch(
        &self,
        context: &SubscriptionContext,
        snapshot: &SnapshotRow,
        current: i32,
        remaining: i32,
        threshold: Threshold,
    ) -> Vec<DeliveryReport> {
        let subscription = &context.subscription;
        let content = AlertContent::new(
            context,
            &snapshot.clinic_room,
            current,
            remaining,
            threshold.value(),
        );

        let email = context
            .email
            .as_deref()
            .filter(|e| subscription.notify_email && !e.trim().is_empty());
        let line_user = context
            .line_user_id
            .as_deref()
            .filter(|u| subscription.notify_line && !u.trim().is_empty());

        let mut sends = Vec::new();
        if let Some(to) = email {
            sends.push(self.send_and_log(
                context,
                snapshot,
                current,
                threshold,
                Channel::Email,
                to,
                &content,
            ));
        }
        if let Some(user_id) = line_user {
            sends.push(self.send_and_log(
                context,
                snapshot,
                current,
                threshold,
                Channel::Line,
                user_id,
                &content,
            ));
        }

        join_all(sends).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_and_log(
        &self,
        context: &SubscriptionContext,
        snapshot: &SnapshotRow,
        current: i32,
        threshold: Threshold,
        channel: Channel,
        recipient: &str,
        content: &AlertContent,
    ) -> DeliveryReport {
        let subscription = &context.subscription;
        let logged_message = match channel {
            Channel::Email => format!("Email: {}", content.email_subject()),
            Channel::Line => format!("LINE: {}", content.line_message()),
        };

        let mut entry = NotificationLogEntry::pending(
            subscription.id,
            threshold,
            channel,
            recipient,
            logged_message,
            self.clock.now(),
        );
        entry.doctor_id = Some(subscription.doctor_id);
        entry.hospital_name = context.hospital_name.clone();
        entry.department_name = context.department_name.clone();
        entry.clinic_room = Some(snapshot.clinic_room.clone()).filter(|r| !r.is_empty());
        entry.session_date = Some(subscription.session_date);
        entry.current_number = Some(current);

        let log_id = match self.store.insert_notification_log(&entry).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(
                    subscription = %subscription.id.short(),
                    channel = %channel,
                    error = %e,
                    "Failed to insert notification log row"
                );
                None
            }
        };

        let report = match channel {
            Channel::Email => {
                let sent = self
                    .email
                    .send_email(recipient, &content.email_subject(), &content.email_body())
                    .await;
                if sent {
                    DeliveryReport::delivered(None)
                } else {
                    DeliveryReport::failed(None, "Email delivery failed")
                }
            }
            Channel::Line => {
                self.messenger
                    .send_message(recipient, &content.line_message())
                    .await
            }
        };

        crate::log_alert_sent!(
            subscription.id.short(),
            threshold.value(),
            channel,
            report.success
        );

        if let Some(id) = log_id {
            entry.complete(&report);
            if let Err(e) = self.store.update_notification_log(id, &entry).await {
                tracing::error!(log_id = %id, error = %e, "Failed to update notification log row");
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DoctorId, SessionType, SubscriptionId, ThresholdFlags, UserId};
    use chrono::NaiveDate;

    fn subscription() -> TrackingSubscription {
        TrackingSubscription {
            id: SubscriptionId::generate(),
            user_id: UserId::generate(),
            doctor_id: DoctorId::generate(),
            department_id: None,
            session_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            session_type: SessionType::Morning,
            target_number: Some(30),
            notify_at: ThresholdFlags::all(),
            notified: ThresholdFlags::default(),
            notify_email: true,
            notify_line: false,
            is_active: true,
        }
    }

    #[test]
    fn test_least_urgent_threshold_fires_first() {
        let evaluation = evaluate_thresholds(&subscription(), 26, 30, 4);
        assert_eq!(evaluation.fire, Some(Threshold::Twenty));
        assert!(evaluation.passed.is_empty());
    }

    #[test]
    fn test_notified_thresholds_are_skipped() {
        let mut sub = subscription();
        sub.notified.at_20 = true;
        let evaluation = evaluate_thresholds(&sub, 26, 30, 4);
        assert_eq!(evaluation.fire, Some(Threshold::Ten));
    }

    #[test]
    fn test_disabled_thresholds_are_skipped() {
        let mut sub = subscription();
        sub.notify_at.at_20 = false;
        sub.notify_at.at_10 = false;
        assert_eq!(evaluate_thresholds(&sub, 20, 30, 12).fire, None);
        assert_eq!(evaluate_thresholds(&sub, 26, 30, 4).fire, Some(Threshold::Five));
    }

    #[test]
    fn test_nothing_due_above_all_thresholds() {
        assert_eq!(
            evaluate_thresholds(&subscription(), 1, 30, 25),
            ThresholdEvaluation::default()
        );
    }

    #[test]
    fn test_passed_ticket_marks_without_alert() {
        let mut sub = subscription();
        sub.notified.at_20 = true;
        let evaluation = evaluate_thresholds(&sub, 31, 30, 0);
        assert_eq!(evaluation.fire, None);
        assert_eq!(evaluation.passed, vec![Threshold::Ten, Threshold::Five]);
    }

    #[test]
    fn test_all_notified_is_terminal() {
        let mut sub = subscription();
        sub.notified = ThresholdFlags::all();
        assert_eq!(evaluate_thresholds(&sub, 29, 30, 0), ThresholdEvaluation::default());
        assert_eq!(evaluate_thresholds(&sub, 35, 30, 0), ThresholdEvaluation::default());
    }
}
