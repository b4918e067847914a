//! Scan orchestration: check every type, report, notify.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use mfa_graphql::GraphqlClient;
use tracing::{error, info, instrument};

use crate::checker::ResourceChecker;
use crate::client::admin_client;
use crate::config::AuditConfig;
use crate::error::AuditResult;
use crate::notify::{Notifier, SmtpNotifier};
use crate::report::{ReportWriter, XlsxReporter};
use crate::types::{MissingRecord, ResourceType, ScanResult, ScanSummary, TypeCounts, status_rank};

/// Runs full catalog scans.
pub struct Scanner {
    client: GraphqlClient,
    checkers: Vec<ResourceChecker>,
    reporter: Arc<dyn ReportWriter>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("endpoint", &self.client.endpoint())
            .field("checkers", &self.checkers)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    pub fn new(
        client: GraphqlClient,
        checkers: Vec<ResourceChecker>,
        reporter: Arc<dyn ReportWriter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            checkers,
            reporter,
            notifier,
        }
    }

    /// Production wiring: Admin API client, built-in checkers, xlsx, SMTP.
    pub fn from_config(config: &AuditConfig) -> AuditResult<Self> {
        let client = admin_client(&config.shopify)?;
        let checkers = ResourceType::ALL
            .into_iter()
            .map(|resource_type| {
                config
                    .requirements
                    .metafields(resource_type)
                    .map(|metafields| ResourceChecker::new(resource_type, metafields))
            })
            .collect::<AuditResult<Vec<_>>>()?;

        Ok(Self::new(
            client,
            checkers,
            Arc::new(XlsxReporter::new(config.report.dir.clone())),
            Arc::new(SmtpNotifier::from_config(config)?),
        ))
    }

    /// Run one scan end to end.
    ///
    /// Checkers run concurrently; the first failure aborts the scan before
    /// anything is reported or sent.
    #[instrument(skip_all)]
    pub async fn run(&self) -> AuditResult<ScanResult> {
        info!(checkers = self.checkers.len(), "scan started");

        let results = match try_join_all(
            self.checkers
                .iter()
                .map(|checker| checker.check(&self.client)),
        )
        .await
        {
            Ok(results) => results,
            Err(err) => {
                error!(error = %err, kind = err.kind(), "scan failed");
                return Err(err);
            }
        };

        let mut counts = TypeCounts::default();
        let mut records: Vec<MissingRecord> = Vec::new();
        for (checker, found) in self.checkers.iter().zip(results) {
            counts.set(checker.resource_type(), found.len());
            records.extend(found);
        }
        sort_by_status(&mut records);

        let run_date = Utc::now().date_naive();
        let report_path = self.reporter.write(&records, run_date).await?;
        let summary = ScanSummary {
            report_path: report_path.clone(),
            total: records.len(),
            counts,
        };
        self.notifier.notify(&summary).await?;

        let stats = self.client.stats();
        info!(
            missing = records.len(),
            products = counts.products,
            collections = counts.collections,
            pages = counts.pages,
            requests = stats.sent,
            report = %report_path.display(),
            "scan finished"
        );

        Ok(ScanResult {
            missing_count: records.len(),
            report_file_path: report_path.display().to_string(),
        })
    }
}

/// Highest status rank first; equal ranks keep their order.
pub fn sort_by_status(records: &mut [MissingRecord]) {
    records.sort_by_key(|record| std::cmp::Reverse(status_rank(&record.status)));
}
