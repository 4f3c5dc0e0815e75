use anyhow::{anyhow, Context, Result};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::analysis::Analysis;
use crate::config::SmtpSettings;
use crate::report::escape_html;
use crate::types::Assignment;

/// Urgent items listed in the email body.
const EMAIL_ITEM_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// Nothing urgent; no SMTP connection was made.
    Skipped,
}

pub fn email_subject(analysis: &Analysis) -> String {
    format!(
        "ManageBac: {} urgent assignment(s) due soon",
        analysis.assignments_by_urgency.urgent.len()
    )
}

fn generate_html_email(analysis: &Analysis) -> String {
    let urgent = &analysis.assignments_by_urgency.urgent;
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 700px; margin: 0 auto; padding: 20px; }
    h1 { color: #b91c1c; border-bottom: 3px solid #f87171; padding-bottom: 10px; }
    .item { margin: 12px 0; padding: 12px; background: #fef2f2; border-radius: 5px; border-left: 3px solid #dc2626; }
    .item-meta { font-size: 13px; color: #6b7280; }
    .footer { margin-top: 32px; padding-top: 16px; border-top: 1px solid #e5e7eb; color: #6b7280; font-size: 12px; }
  </style>
</head>
<body>
  <h1>Urgent ManageBac assignments</h1>
"#,
    );

    html.push_str(&format!(
        "  <p>{} urgent out of {} assignment(s).</p>\n",
        urgent.len(),
        analysis.total_assignments
    ));

    for item in urgent.iter().take(EMAIL_ITEM_LIMIT) {
        html.push_str(&email_item(item));
    }
    if urgent.len() > EMAIL_ITEM_LIMIT {
        html.push_str(&format!(
            "  <p>... and {} more</p>\n",
            urgent.len() - EMAIL_ITEM_LIMIT
        ));
    }

    html.push_str(&format!(
        "  <div class=\"footer\">\n    <p>Generated by ManageBac Assignment Checker at {}.</p>\n  </div>\n</body>\n</html>\n",
        analysis.analysed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html
}

fn email_item(item: &Assignment) -> String {
    format!(
        "  <div class=\"item\">\n    <strong>{}</strong>\n    <div class=\"item-meta\">Course: {} | Due: {}</div>\n  </div>\n",
        escape_html(&item.title),
        escape_html(&item.course),
        escape_html(&item.due_date)
    )
}

fn generate_plain_email(analysis: &Analysis) -> String {
    let urgent = &analysis.assignments_by_urgency.urgent;
    let mut text = format!(
        "{} urgent out of {} assignment(s).\n\n",
        urgent.len(),
        analysis.total_assignments
    );
    for item in urgent.iter().take(EMAIL_ITEM_LIMIT) {
        text.push_str(&format!("- {} (due: {})\n", item.title, item.due_date));
    }
    text
}

/// Emails a summary of the urgent bucket. Returns `Skipped` before touching
/// the network when nothing is urgent.
pub async fn notify_urgent(smtp: &SmtpSettings, analysis: &Analysis) -> Result<NotifyOutcome> {
    let urgent_count = analysis.assignments_by_urgency.urgent.len();
    if urgent_count == 0 {
        tracing::info!("No urgent assignments to notify about");
        return Ok(NotifyOutcome::Skipped);
    }

    let email = Message::builder()
        .from(
            smtp.username
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid sender address {:?}", smtp.username))?,
        )
        .to(smtp
            .recipient
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid recipient address {:?}", smtp.recipient))?)
        .subject(email_subject(analysis))
        .multipart(MultiPart::alternative_plain_html(
            generate_plain_email(analysis),
            generate_html_email(analysis),
        ))?;

    let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());

    let mailer = if smtp.port == 465 {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.server)
            .map_err(|err| anyhow!("Failed to create SMTP transport: {}", err))?
            .port(smtp.port)
            .credentials(creds)
            .build()
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)
            .map_err(|err| anyhow!("Failed to create SMTP transport: {}", err))?
            .port(smtp.port)
            .credentials(creds)
            .build()
    };

    tracing::info!(
        urgent = urgent_count,
        recipient = %smtp.recipient,
        server = %smtp.server,
        "Sending email notification"
    );

    mailer
        .send(email)
        .await
        .map_err(|err| anyhow!("SMTP send failed: {}", err))?;

    tracing::info!(recipient = %smtp.recipient, "Email notification sent successfully");
    Ok(NotifyOutcome::Sent)
}
