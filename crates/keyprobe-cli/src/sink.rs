//! 진단 결과 출력 대상 구현.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use keyprobe_core::{
    CredentialKind, CredentialStatus, DiagnosticError, DiagnosticResult, EnvironmentVerdict,
    FleetEntry, FleetHealth, FleetReport, ProbeOutcome, ReportSink, StageOutcome,
};
use tracing::{debug, info};

const RULE_WIDTH: usize = 70;

/// 콘솔 표 출력.
///
/// 자격증명별 단계 결과와 조치 사항을 출력하고 마지막에 요약을 출력합니다.
pub struct ConsoleReportSink {
    progress: ProgressBar,
    completed: AtomicUsize,
}

impl ConsoleReportSink {
    /// 콘솔 출력 대상 생성. `show_progress`가 false면 진행률 표시줄을 숨깁니다.
    pub fn new(show_progress: bool) -> Result<Self> {
        let progress = if show_progress {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        Ok(Self {
            progress,
            completed: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ReportSink for ConsoleReportSink {
    async fn fleet_started(&self, total: usize) -> DiagnosticResult<()> {
        self.progress.set_length(total as u64);
        Ok(())
    }

    async fn credential_completed(&self, entry: &FleetEntry) -> DiagnosticResult<()> {
        let index = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let text = format_entry(index, entry);

        self.progress.suspend(|| println!("{}", text));
        self.progress.set_message(entry.identifier.clone());
        self.progress.inc(1);
        Ok(())
    }

    async fn fleet_completed(&self, report: &FleetReport) -> DiagnosticResult<()> {
        self.progress.finish_and_clear();
        println!("{}", format_table(report));
        println!("{}", format_summary(report));
        Ok(())
    }
}

/// JSON 출력. 파일 경로가 없으면 stdout으로 출력합니다.
#[derive(Debug, Clone, Default)]
pub struct JsonReportSink {
    output: Option<PathBuf>,
}

impl JsonReportSink {
    /// stdout 출력.
    pub fn stdout() -> Self {
        Self { output: None }
    }

    /// 파일 출력.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(path.into()),
        }
    }

    /// 리포트를 JSON 문자열로 변환.
    pub fn render(&self, report: &FleetReport) -> DiagnosticResult<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    async fn credential_completed(&self, entry: &FleetEntry) -> DiagnosticResult<()> {
        debug!(credential = %entry.identifier, status = %entry.status(), "Credential diagnosed");
        Ok(())
    }

    async fn fleet_completed(&self, report: &FleetReport) -> DiagnosticResult<()> {
        let json = self.render(report)?;

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, json).await.map_err(|e| {
                    DiagnosticError::Sink(format!("{}: {}", path.display(), e))
                })?;
                info!("Output written to: {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}

fn status_icon(status: CredentialStatus) -> &'static str {
    match status {
        CredentialStatus::Working => "✅",
        CredentialStatus::Failed => "❌",
        CredentialStatus::NoCredentials => "⚠️ ",
    }
}

fn outcome_icon(outcome: &StageOutcome) -> &'static str {
    match outcome {
        _ if outcome.passed() => "✅",
        StageOutcome::Probe(ProbeOutcome::Inconclusive { .. }) => "⚠️ ",
        StageOutcome::Probe(ProbeOutcome::NotWhitelisted { .. }) => "🚫",
        _ => "❌",
    }
}

fn describe_outcome(outcome: &StageOutcome) -> String {
    match outcome {
        StageOutcome::Probe(probe) => probe.to_string(),
        StageOutcome::SelfCheck { passed: true } => "HMAC-SHA256 서명 일치".to_string(),
        StageOutcome::SelfCheck { passed: false } => "HMAC-SHA256 서명 불일치".to_string(),
        StageOutcome::Environment(resolution) => match resolution.verdict() {
            EnvironmentVerdict::Resolved(env) => format!("{} 환경에서 동작", env),
            EnvironmentVerdict::Ambiguous(envs) => {
                let names: Vec<&str> = envs.iter().map(|env| env.name()).collect();
                format!("여러 환경에서 동작: {}", names.join(", "))
            }
            EnvironmentVerdict::NoMatch => "어떤 환경에서도 동작하지 않음".to_string(),
        },
    }
}

/// 자격증명 하나의 상세 결과.
pub fn format_entry(index: usize, entry: &FleetEntry) -> String {
    let mut out = String::new();
    let report = &entry.report;

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "🔍 [{}] {} ({}) - API Key: {}",
        index, entry.identifier, entry.kind, entry.masked_key
    );

    if entry.status() == CredentialStatus::NoCredentials {
        let _ = writeln!(out, "   ⚠️  API 키/시크릿 없음 - 진단 생략");
    }

    for record in report.stages() {
        let _ = writeln!(
            out,
            "   {} {:<22} {}",
            outcome_icon(&record.outcome),
            record.stage.title(),
            describe_outcome(&record.outcome)
        );

        if let StageOutcome::Environment(resolution) = &record.outcome {
            for attempt in resolution.attempts() {
                let profile = attempt
                    .profile
                    .as_ref()
                    .map(|outcome| outcome.to_string())
                    .unwrap_or_else(|| "건너뜀 (공개 엔드포인트 실패)".to_string());
                let _ = writeln!(out, "      - {:<10} {}", attempt.environment.name(), profile);
            }
        }
    }

    for recommendation in report.recommendations() {
        let _ = writeln!(out, "   💡 {}", recommendation);
    }

    let _ = write!(
        out,
        "   {} {}",
        status_icon(entry.status()),
        entry.status()
    );
    out
}

/// 자격증명 목록 표.
pub fn format_table(report: &FleetReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<4} {:<28} {:<10} {:<20} {:<16} {:<8}",
        "#", "NAME", "KIND", "API KEY", "STATUS", "STAGES"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH + 20));

    for (i, entry) in report.entries().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<28} {:<10} {:<20} {:<16} {}/{}",
            i + 1,
            truncate(&entry.identifier, 28),
            entry.kind.label(),
            entry.masked_key,
            entry.status(),
            entry.report.passed_count(),
            entry.report.stages().len()
        );
    }
    out
}

/// 플릿 요약과 판정.
pub fn format_summary(report: &FleetReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "📊 진단 요약");
    let _ = writeln!(out, "{}", rule);

    for kind in CredentialKind::ALL {
        let counts = report.counts_by_kind(kind);
        if counts.total > 0 {
            let _ = writeln!(
                out,
                "{:<10} {}/{} 동작",
                kind.label(),
                counts.working,
                counts.total
            );
        }
    }

    let _ = writeln!(
        out,
        "전체: {}/{} 동작 (성공률 {:.1}%)",
        report.working_count(),
        report.total_count(),
        report.success_rate_pct()
    );
    if report.no_credentials_count() > 0 {
        let _ = writeln!(out, "자격증명 누락: {}", report.no_credentials_count());
    }
    if report.interrupted() {
        let _ = writeln!(out, "⚠️  사용자 중단: 일부 자격증명은 진단되지 않았습니다.");
    }

    let verdict = match report.health() {
        FleetHealth::Empty => "ℹ️  진단할 자격증명이 없습니다.",
        FleetHealth::NoneWorking => "🚨 심각: 동작하는 API 자격증명이 없습니다. 거래가 불가능합니다.",
        FleetHealth::Partial => "⚠️  일부 자격증명만 동작합니다. 실패한 계정을 점검하세요.",
        FleetHealth::AllWorking => "✅ 모든 자격증명이 정상 동작합니다.",
    };
    let _ = write!(out, "{}", verdict);
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
