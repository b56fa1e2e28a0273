//! Alert message texts

use crate::domain::{SessionType, SubscriptionContext};
use chrono::NaiveDate;

const UNKNOWN_DOCTOR: &str = "未知醫師";
const UNKNOWN_DEPARTMENT: &str = "未知科別";
const UNKNOWN_HOSPITAL: &str = "未知醫院";
const NOT_PROVIDED: &str = "未提供";

/// Display fields of one alert, with defaults already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertContent {
    pub hospital_name: String,
    pub doctor_name: String,
    pub department_name: String,
    pub clinic_room: String,
    pub session_date: NaiveDate,
    pub session_type: SessionType,
    pub current_number: i32,
    pub remaining: i32,
    pub threshold: i32,
    pub appointment_number: Option<i32>,
}

fn or_default(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

impl AlertContent {
    /// Build display fields from a subscription context and the live state
    pub fn new(
        context: &SubscriptionContext,
        clinic_room: &str,
        current_number: i32,
        remaining: i32,
        threshold: i32,
    ) -> Self {
        let subscription = &context.subscription;
        Self {
            hospital_name: or_default(context.hospital_name.as_deref(), UNKNOWN_HOSPITAL),
            doctor_name: or_default(context.doctor_name.as_deref(), UNKNOWN_DOCTOR),
            department_name: or_default(context.department_name.as_deref(), UNKNOWN_DEPARTMENT),
            clinic_room: or_default(Some(clinic_room), NOT_PROVIDED),
            session_date: subscription.session_date,
            session_type: subscription.session_type,
            current_number,
            remaining,
            threshold,
            appointment_number: subscription.target_number,
        }
    }

    fn appointment_display(&self) -> String {
        self.appointment_number
            .map_or_else(|| NOT_PROVIDED.to_string(), |n| n.to_string())
    }

    /// Email subject line
    pub fn email_subject(&self) -> String {
        format!(
            "⏰ 門診提醒：{} 醫師 – 還剩 {} 號！",
            self.doctor_name, self.remaining
        )
    }

    /// Email HTML body
    pub fn email_body(&self) -> String {
        let rows = [
            ("醫院", self.hospital_name.clone()),
            ("醫師", self.doctor_name.clone()),
            ("科別", self.department_name.clone()),
            ("診間", self.clinic_room.clone()),
            (
                "日期",
                format!("{} {}", self.session_date, self.session_type.label()),
            ),
            ("您的號碼", self.appointment_display()),
            ("目前號碼", self.current_number.to_string()),
            ("距您還剩", format!("{} 號", self.remaining)),
        ];

        let table: String = rows
            .iter()
            .map(|(label, value)| {
                format!(
                    "<tr><td style=\"padding:6px 0; color:#666;\">{label}</td>\
                     <td style=\"padding:6px 0; font-weight:bold;\">{}</td></tr>",
                    escape_html(value)
                )
            })
            .collect();

        format!(
            "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
             <div style=\"max-width:480px; margin:0 auto; padding:24px; \
             border:1px solid #e0e0e0; border-radius:12px;\">\
             <h2 style=\"color:#1976D2;\">🏥 門診進度提醒</h2>\
             <table style=\"width:100%; border-collapse:collapse;\">{table}</table>\
             <p style=\"margin-top:20px; padding:12px; background:#FFF3E0; border-radius:8px;\">\
             📍 您設定的提醒門檻為 <strong>前 {} 號</strong>，請儘快前往醫院候診！</p>\
             <p style=\"font-size:12px; color:#aaa;\">此為系統自動通知，請勿直接回覆。</p>\
             </div></body></html>",
            self.threshold
        )
    }

    /// LINE text message
    pub fn line_message(&self) -> String {
        format!(
            "⏰ 門診進度提醒\n\
             ━━━━━━━━━━━━━━━\n\
             🏥 醫院：{}\n\
             👨‍⚕️ 醫師：{}\n\
             🩺 科別：{}\n\
             🚪 診間：{}\n\
             📅 日期：{} {}\n\
             📍 目前號碼：{}\n\
             ⚡ 距您還剩：{} 號\n\
             ━━━━━━━━━━━━━━━\n\
             您設定的提醒門檻為前 {} 號，請儘快前往候診！",
            self.hospital_name,
            self.doctor_name,
            self.department_name,
            self.clinic_room,
            self.session_date,
            self.session_type.label(),
            self.current_number,
            self.remaining,
            self.threshold
        )
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
