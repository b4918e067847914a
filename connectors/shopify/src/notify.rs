//! Email delivery of finished reports.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use crate::config::{AuditConfig, RequirementsConfig, SmtpConfig};
use crate::error::{AuditError, AuditResult};
use crate::types::{ResourceType, ScanSummary};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Announces a finished report to stakeholders.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &ScanSummary) -> AuditResult<()>;
}

/// Sends the report as an email attachment over SMTP with STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    smtp: SmtpConfig,
    from: Option<String>,
    recipients: Vec<String>,
    requirements: RequirementsConfig,
    schedule: String,
    timezone: Tz,
}

impl SmtpNotifier {
    pub fn from_config(config: &AuditConfig) -> AuditResult<Self> {
        Ok(Self {
            smtp: config.smtp.clone(),
            from: config.report.from.clone(),
            recipients: config.report.recipients.clone(),
            requirements: config.requirements.clone(),
            schedule: config.schedule.cron.clone(),
            timezone: config.schedule.tz()?,
        })
    }

    fn ensure_recipients(&self) -> AuditResult<()> {
        if self.recipients.is_empty() {
            return Err(AuditError::config("REPORT_TO_EMAIL has no recipients"));
        }
        Ok(())
    }

    /// Assemble the email for `summary` with `content` as the attachment.
    pub fn build_message(
        &self,
        summary: &ScanSummary,
        content: Vec<u8>,
        generated_at: DateTime<Utc>,
    ) -> AuditResult<Message> {
        self.ensure_recipients()?;
        let sender = self
            .from
            .as_deref()
            .or(self.smtp.username.as_deref())
            .ok_or_else(|| AuditError::config("REPORT_FROM_EMAIL or SMTP_USER must be set"))?;

        let mut builder = Message::builder()
            .from(parse_mailbox(sender)?)
            .subject(compose_subject(summary));
        for recipient in &self.recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        let file_name = attachment_name(&summary.report_path);
        let content_type = ContentType::parse(XLSX_MIME)
            .map_err(|err| AuditError::Notify(format!("invalid attachment type: {err}")))?;

        let body = compose_body(
            summary,
            &self.requirements,
            &self.schedule,
            self.timezone,
            generated_at,
        );
        let message = builder.multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body))
                .singlepart(Attachment::new(file_name).body(content, content_type)),
        )?;
        Ok(message)
    }

    fn transport(&self) -> AuditResult<AsyncSmtpTransport<Tokio1Executor>> {
        let (Some(host), Some(username), Some(password)) = (
            self.smtp.host.as_deref(),
            self.smtp.username.as_deref(),
            self.smtp.password.as_deref(),
        ) else {
            return Err(AuditError::config(
                "SMTP_HOST, SMTP_USER and SMTP_PASS must be set",
            ));
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(self.smtp.port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(transport)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip_all, fields(total = summary.total))]
    async fn notify(&self, summary: &ScanSummary) -> AuditResult<()> {
        self.ensure_recipients()?;
        let content = tokio::fs::read(&summary.report_path).await.map_err(|err| {
            AuditError::Notify(format!(
                "cannot read report {}: {err}",
                summary.report_path.display()
            ))
        })?;
        let message = self.build_message(summary, content, Utc::now())?;
        let transport = self.transport()?;
        transport.send(message).await?;
        info!(recipients = self.recipients.len(), "report email sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> AuditResult<Mailbox> {
    address
        .parse()
        .map_err(|err| AuditError::config(format!("invalid email address `{address}`: {err}")))
}

fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Subject line with per-type and total counts.
#[must_use]
pub fn compose_subject(summary: &ScanSummary) -> String {
    format!(
        "[Shopify] Metafields faltantes — Prod {} · Col {} · Pág {} (Total {})",
        summary.counts.products, summary.counts.collections, summary.counts.pages, summary.total
    )
}

/// Plaintext body summarizing counts and what each type requires.
#[must_use]
pub fn compose_body(
    summary: &ScanSummary,
    requirements: &RequirementsConfig,
    schedule: &str,
    timezone: Tz,
    generated_at: DateTime<Utc>,
) -> String {
    let mut lines = vec!["Resumen rápido:".to_string()];
    for resource_type in ResourceType::ALL {
        let required: Vec<String> = requirements
            .metafields(resource_type)
            .map(|m| m.requirements().map(|r| format!("'{r}'")).collect())
            .unwrap_or_default();
        let need = if required.is_empty() {
            "sin metafields requeridos".to_string()
        } else {
            format!("falta {}", required.join(", "))
        };
        lines.push(format!(
            "• {}: {} → {need}",
            resource_type.audience(),
            summary.counts.get(resource_type)
        ));
    }

    lines.push(String::new());
    lines.push(format!("Adjunto: {}", attachment_name(&summary.report_path)));
    lines.push("Acción: rellenar los metafields indicados en el Excel.".to_string());
    lines.push(String::new());
    lines.push(format!("Frecuencia: {schedule} ({timezone})."));
    lines.push(format!(
        "Generado: {}",
        generated_at.with_timezone(&timezone).format("%d/%m/%Y, %H:%M:%S")
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::TimeZone;

    use super::*;
    use crate::types::TypeCounts;

    fn summary(path: PathBuf) -> ScanSummary {
        ScanSummary {
            report_path: path,
            total: 3,
            counts: TypeCounts {
                products: 2,
                collections: 0,
                pages: 1,
            },
        }
    }

    fn notifier(recipients: &[&str]) -> SmtpNotifier {
        let mut config = AuditConfig::default();
        config.smtp.username = Some("informes@example.com".into());
        config.report.recipients = recipients.iter().map(|r| (*r).to_string()).collect();
        SmtpNotifier::from_config(&config).expect("notifier")
    }

    #[test]
    fn subject_embeds_counts() {
        let subject = compose_subject(&summary(PathBuf::from("/tmp/r.xlsx")));
        assert_eq!(
            subject,
            "[Shopify] Metafields faltantes — Prod 2 · Col 0 · Pág 1 (Total 3)"
        );
    }

    #[test]
    fn body_lists_counts_requirements_and_attachment() {
        let generated_at = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap();
        let body = compose_body(
            &summary(PathBuf::from("/tmp/missing-metafields_2026-10-17.xlsx")),
            &RequirementsConfig::default(),
            "0 0 9 * * Mon",
            chrono_tz::Europe::Madrid,
            generated_at,
        );

        assert!(body.contains("• Productos (Activos y publicados): 2 → falta 'custom.newsection'"));
        assert!(body.contains("• Colecciones (Publicadas): 0 → falta 'custom.coleccion'"));
        assert!(body.contains("• Páginas (Visibles): 1 → falta 'custom.familia'"));
        assert!(body.contains("Adjunto: missing-metafields_2026-10-17.xlsx"));
        assert!(body.contains("Frecuencia: 0 0 9 * * Mon (Europe/Madrid)."));
        assert!(body.contains("Generado: 17/10/2026, 12:00:00"));
    }

    #[test]
    fn disabled_type_is_described() {
        let requirements = RequirementsConfig {
            collection: String::new(),
            ..RequirementsConfig::default()
        };
        let body = compose_body(
            &summary(PathBuf::from("/tmp/r.xlsx")),
            &requirements,
            "0 0 9 * * Mon",
            chrono_tz::UTC,
            Utc::now(),
        );
        assert!(body.contains("Colecciones (Publicadas): 0 → sin metafields requeridos"));
    }

    #[test]
    fn no_recipients_is_config_error() {
        let err = notifier(&[])
            .build_message(&summary(PathBuf::from("/tmp/r.xlsx")), b"PK".to_vec(), Utc::now())
            .expect_err("should fail");
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[tokio::test]
    async fn no_recipients_is_checked_before_reading_the_report() {
        let err = notifier(&[])
            .notify(&summary(PathBuf::from("/nonexistent/r.xlsx")))
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[tokio::test]
    async fn unreadable_report_is_notify_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-metafields_2026-10-17.xlsx");

        let err = notifier(&["ana@example.com"])
            .notify(&summary(path))
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuditError::Notify(ref message) if message.contains("cannot read report")));
    }

    #[tokio::test]
    async fn transport_builds_with_full_smtp_settings() {
        let mut config = AuditConfig::default();
        config.smtp.host = Some("smtp.example.com".into());
        config.smtp.username = Some("informes@example.com".into());
        config.smtp.password = Some("secret".into());
        let notifier = SmtpNotifier::from_config(&config).expect("notifier");

        assert!(notifier.transport().is_ok());
    }

    #[tokio::test]
    async fn missing_smtp_settings_fail_before_sending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-metafields_2026-10-17.xlsx");
        std::fs::write(&path, b"PK").expect("write");

        let err = notifier(&["ana@example.com"])
            .notify(&summary(path))
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn message_carries_attachment() {
        let path = PathBuf::from("/tmp/missing-metafields_2026-10-17.xlsx");
        let message = notifier(&["ana@example.com", "luis@example.com"])
            .build_message(&summary(path), b"PK\x03\x04".to_vec(), Utc::now())
            .expect("message");
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("missing-metafields_2026-10-17.xlsx"));
        assert!(raw.contains(XLSX_MIME));
        assert!(raw.contains("ana@example.com"));
        assert!(raw.contains("luis@example.com"));
    }
}
