//! チェック結果のレポート出力
//!
//! 結果のスナップショット（`Report`）を作り、形式ごとのレンダラーで文字列化する。

mod csv;
mod html;
mod json;
mod text;

use crate::error::ReportError;
use crate::types::{CheckOutcome, CheckResults, EndpointConfig};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// レポート形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// プレーンテキスト
    #[default]
    Text,
    /// JSON
    Json,
    /// CSV
    Csv,
    /// HTML
    Html,
}

impl ReportFormat {
    /// ファイル拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }

    /// デフォルトの出力ファイル名
    pub fn default_filename(&self) -> String {
        format!("ollama_monitor_report.{}", self.extension())
    }

    /// レポートを文字列化
    pub fn render(&self, report: &Report) -> Result<String, ReportError> {
        match self {
            Self::Text => Ok(text::render(report)),
            Self::Json => json::render(report),
            Self::Csv => csv::render(report),
            Self::Html => html::render(report),
        }
    }
}

/// 集計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// エンドポイント数
    pub total_endpoints: usize,
    /// 成功数
    pub successful: usize,
    /// 失敗数（`failure`と`error`の合計）
    pub failed: usize,
}

/// エンドポイント1件分の行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// エンドポイントキー
    pub name: String,
    /// リクエストパス
    pub path: String,
    /// HTTPメソッド
    pub method: String,
    /// 結果
    pub status: CheckOutcome,
    /// ステータスコード
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 応答時間（秒、小数3桁に丸め）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_seconds: Option<f64>,
    /// エラーメッセージ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 試行回数
    pub attempts: u32,
}

/// レポート
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// 生成時刻
    pub generated_at: DateTime<Utc>,
    /// 集計
    pub summary: ReportSummary,
    /// 行（エンドポイントキー順）
    pub endpoints: Vec<ReportRow>,
}

impl Report {
    /// チェック結果からレポートを作成
    pub fn from_results(
        results: &CheckResults,
        endpoints: &BTreeMap<String, EndpointConfig>,
    ) -> Self {
        let rows: Vec<ReportRow> = results
            .iter()
            .map(|(name, result)| {
                let config = endpoints.get(name);
                ReportRow {
                    name: name.clone(),
                    path: config.map(|c| c.path.clone()).unwrap_or_else(|| name.clone()),
                    method: config
                        .map(|c| c.method.as_str())
                        .unwrap_or("GET")
                        .to_string(),
                    status: result.outcome,
                    status_code: result.status_code,
                    response_time_seconds: result
                        .response_time
                        .map(|rt| (rt * 1000.0).round() / 1000.0),
                    error: result.error_message.clone(),
                    attempts: result.attempts,
                }
            })
            .collect();

        let successful = rows.iter().filter(|r| r.status.is_success()).count();
        Self {
            generated_at: Utc::now(),
            summary: ReportSummary {
                total_endpoints: rows.len(),
                successful,
                failed: rows.len() - successful,
            },
            endpoints: rows,
        }
    }

    /// 生成時刻（`Z`サフィックスのRFC 3339）
    pub fn timestamp(&self) -> String {
        self.generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// レポートをファイルへ書き出す
pub async fn write_report(
    path: impl AsRef<Path>,
    format: ReportFormat,
    report: &Report,
) -> Result<(), ReportError> {
    let path = path.as_ref();
    let contents = format.render(report)?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), format = ?format, "Report written");
    Ok(())
}
